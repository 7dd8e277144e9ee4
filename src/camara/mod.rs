//! Transparency API: gateway, typed endpoints, cached client.

mod cached_client;
mod client;
mod gateway;
mod types;

pub use cached_client::{CachedCamaraClient, DEPUTY_PAGE_SIZE, EXPENSE_PAGE_SIZE};
pub use client::CamaraClient;
pub use gateway::{FetchError, Gateway};
pub use types::{
  DashboardStats, Deputy, DeputySummary, Expense, ExpensePage, Party, PartyRef, Proposal,
};
