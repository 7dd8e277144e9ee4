//! Query cache: canonical keys, freshness windows, de-duplication.
//!
//! This module knows nothing about the transparency domain beyond the
//! shape of a cached page. Collections declare their own freshness
//! windows at the call site (the party lookup lives for days, the
//! expense exploration always refetches).

mod key;
mod store;

pub use key::{Cursor, QueryKey, SortOrder};
pub use store::{CacheEntry, CacheResult, CacheSource, CachedPage, Freshness, QueryCache};
