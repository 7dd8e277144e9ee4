//! Pagination state machines for the list views.
//!
//! Two strategies share the query cache through the client: explicit
//! page numbers for the expense exploration, and append-only incremental
//! loading for the deputy list. Both are sans-IO: they hand out a
//! [`FetchTicket`] when a fetch is allowed, the view spawns the actual
//! request, and the completion comes back over the controller's channel
//! tagged with the ticket. `poll()` drains completions on each tick.
//!
//! Every ticket carries the generation current at issue time. A filter
//! change bumps the generation, so responses that arrive for a
//! superseded query are dropped at poll time instead of being rendered -
//! this is the only cancellation mechanism there is, and the only one
//! needed.

use tokio::sync::mpsc;

use crate::camara::FetchError;

/// Authorization for one fetch, handed out by a controller. The
/// completion message must echo it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
  pub generation: u64,
  /// Page number or record offset, depending on the controller.
  pub cursor: u32,
}

/// Completion of a fetch issued against a ticket.
#[derive(Debug)]
pub struct PageMsg<T> {
  pub generation: u64,
  pub cursor: u32,
  pub result: Result<PageData<T>, FetchError>,
}

#[derive(Debug, Clone)]
pub struct PageData<T> {
  pub items: Vec<T>,
  /// Server-reported total (page-based endpoints only).
  pub total: Option<u64>,
}

// ---------------------------------------------------------------------------
// Page-based pagination
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagedState {
  Idle,
  Loading,
  Loaded,
  /// The query succeeded with zero results - a state, not an error.
  Empty,
  Error,
}

/// Explicit page-number pagination with a server-reported total.
///
/// On a fetch failure the previously loaded items stay in place; the
/// view shows them under an error banner instead of a blank screen.
pub struct PagedQuery<T> {
  state: PagedState,
  page: u32,
  page_size: u32,
  /// None until the first response reports it.
  total: Option<u64>,
  items: Vec<T>,
  error: Option<String>,
  generation: u64,
  tx: mpsc::UnboundedSender<PageMsg<T>>,
  rx: mpsc::UnboundedReceiver<PageMsg<T>>,
}

impl<T> PagedQuery<T> {
  pub fn new(page_size: u32) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      state: PagedState::Idle,
      page: 1,
      page_size,
      total: None,
      items: Vec::new(),
      error: None,
      generation: 0,
      tx,
      rx,
    }
  }

  pub fn state(&self) -> PagedState {
    self.state
  }

  pub fn page(&self) -> u32 {
    self.page
  }

  pub fn total(&self) -> u64 {
    self.total.unwrap_or(0)
  }

  pub fn page_count(&self) -> u32 {
    self.total().div_ceil(u64::from(self.page_size)) as u32
  }

  pub fn items(&self) -> &[T] {
    &self.items
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  pub fn is_loading(&self) -> bool {
    self.state == PagedState::Loading
  }

  /// Sender for completion messages; clone it into spawned fetches.
  pub fn sender(&self) -> mpsc::UnboundedSender<PageMsg<T>> {
    self.tx.clone()
  }

  /// The query key changed (filter mutation): drop back to page 1 and
  /// supersede anything still in flight.
  pub fn restart(&mut self) -> FetchTicket {
    self.generation += 1;
    self.page = 1;
    self.total = None;
    self.state = PagedState::Loading;
    self.error = None;
    FetchTicket {
      generation: self.generation,
      cursor: 1,
    }
  }

  /// Request an explicit page. No-op while loading, or when the target
  /// is outside `[1, page_count]` (once a total is known).
  pub fn go_to_page(&mut self, page: u32) -> Option<FetchTicket> {
    if self.state == PagedState::Loading || page == 0 {
      return None;
    }
    if self.total.is_some() && page > self.page_count() {
      return None;
    }
    self.page = page;
    self.generation += 1;
    self.state = PagedState::Loading;
    Some(FetchTicket {
      generation: self.generation,
      cursor: page,
    })
  }

  pub fn next_page(&mut self) -> Option<FetchTicket> {
    self.go_to_page(self.page.saturating_add(1))
  }

  pub fn prev_page(&mut self) -> Option<FetchTicket> {
    if self.page <= 1 {
      return None;
    }
    self.go_to_page(self.page - 1)
  }

  /// Drain completions; returns true if the state changed.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;
    while let Ok(msg) = self.rx.try_recv() {
      if msg.generation != self.generation {
        tracing::debug!(
          got = msg.generation,
          current = self.generation,
          cursor = msg.cursor,
          "dropping superseded page response"
        );
        continue;
      }
      match msg.result {
        Ok(data) => {
          self.total = Some(data.total.unwrap_or(data.items.len() as u64));
          self.state = if data.items.is_empty() {
            PagedState::Empty
          } else {
            PagedState::Loaded
          };
          self.items = data.items;
          self.error = None;
        }
        Err(e) => {
          // Keep the previous items on screen.
          self.state = PagedState::Error;
          self.error = Some(e.user_message());
        }
      }
      changed = true;
    }
    changed
  }
}

// ---------------------------------------------------------------------------
// Incremental (infinite scroll) pagination
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollState {
  Idle,
  LoadingFirst,
  LoadingMore,
  /// A full page landed; more may be available.
  Settled,
  /// The last page came back short; no further fetches will be issued.
  Exhausted,
  Error,
}

/// Append-only incremental loading.
///
/// Load-more requests are serialized: the next page cannot be requested
/// until the previous one settles, so appends always apply in
/// request-issue order and a scroll trigger firing twice cannot queue a
/// duplicate page.
pub struct InfiniteQuery<T> {
  state: ScrollState,
  pages: Vec<Vec<T>>,
  page_size: u32,
  error: Option<String>,
  generation: u64,
  tx: mpsc::UnboundedSender<PageMsg<T>>,
  rx: mpsc::UnboundedReceiver<PageMsg<T>>,
}

impl<T> InfiniteQuery<T> {
  pub fn new(page_size: u32) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      state: ScrollState::Idle,
      pages: Vec::new(),
      page_size,
      error: None,
      generation: 0,
      tx,
      rx,
    }
  }

  pub fn state(&self) -> ScrollState {
    self.state
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  pub fn is_loading(&self) -> bool {
    matches!(self.state, ScrollState::LoadingFirst | ScrollState::LoadingMore)
  }

  pub fn exhausted(&self) -> bool {
    self.state == ScrollState::Exhausted
  }

  /// Number of records loaded so far.
  pub fn loaded(&self) -> usize {
    self.pages.iter().map(Vec::len).sum()
  }

  pub fn items(&self) -> impl Iterator<Item = &T> {
    self.pages.iter().flatten()
  }

  pub fn sender(&self) -> mpsc::UnboundedSender<PageMsg<T>> {
    self.tx.clone()
  }

  /// The query key changed: discard every loaded page and start over.
  /// Results from the old key must never mix with the new one.
  pub fn restart(&mut self) -> FetchTicket {
    self.generation += 1;
    self.pages.clear();
    self.error = None;
    self.state = ScrollState::LoadingFirst;
    FetchTicket {
      generation: self.generation,
      cursor: 0,
    }
  }

  /// Edge-triggered load-more signal from the view.
  ///
  /// Accepted only when settled (or retrying after an error) - never
  /// while a page is in flight and never once exhausted.
  pub fn on_scroll_threshold(&mut self) -> Option<FetchTicket> {
    match self.state {
      ScrollState::Settled | ScrollState::Error => {
        self.state = if self.pages.is_empty() {
          ScrollState::LoadingFirst
        } else {
          ScrollState::LoadingMore
        };
        Some(FetchTicket {
          generation: self.generation,
          cursor: self.loaded() as u32,
        })
      }
      _ => None,
    }
  }

  /// Drain completions; returns true if the state changed.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;
    while let Ok(msg) = self.rx.try_recv() {
      if msg.generation != self.generation {
        tracing::debug!(
          got = msg.generation,
          current = self.generation,
          cursor = msg.cursor,
          "dropping superseded scroll response"
        );
        continue;
      }
      match msg.result {
        Ok(data) => {
          let short = (data.items.len() as u32) < self.page_size;
          self.pages.push(data.items);
          self.state = if short {
            ScrollState::Exhausted
          } else {
            ScrollState::Settled
          };
          self.error = None;
        }
        Err(e) => {
          // Loaded pages stay; the next scroll event may retry.
          self.state = ScrollState::Error;
          self.error = Some(e.user_message());
        }
      }
      changed = true;
    }
    changed
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ok_page(ids: std::ops::Range<u32>, total: Option<u64>) -> Result<PageData<u32>, FetchError> {
    Ok(PageData {
      items: ids.collect(),
      total,
    })
  }

  fn failed() -> Result<PageData<u32>, FetchError> {
    Err(FetchError::Network("connection reset".to_string()))
  }

  #[test]
  fn test_restart_always_returns_to_first_page() {
    let mut pager: PagedQuery<u32> = PagedQuery::new(12);
    let ticket = pager.restart();
    assert_eq!(ticket.cursor, 1);

    pager
      .sender()
      .send(PageMsg {
        generation: ticket.generation,
        cursor: 1,
        result: ok_page(0..12, Some(100)),
      })
      .unwrap();
    pager.poll();
    let ticket = pager.go_to_page(5).unwrap();
    pager
      .sender()
      .send(PageMsg {
        generation: ticket.generation,
        cursor: 5,
        result: ok_page(48..60, Some(100)),
      })
      .unwrap();
    pager.poll();
    assert_eq!(pager.page(), 5);

    // Filter change: back to page 1 no matter where we were.
    let ticket = pager.restart();
    assert_eq!(ticket.cursor, 1);
    assert_eq!(pager.page(), 1);
  }

  #[test]
  fn test_go_to_page_out_of_range_is_noop() {
    let mut pager: PagedQuery<u32> = PagedQuery::new(12);
    let ticket = pager.restart();
    pager
      .sender()
      .send(PageMsg {
        generation: ticket.generation,
        cursor: 1,
        result: ok_page(0..12, Some(30)),
      })
      .unwrap();
    pager.poll();

    // 30 records / 12 per page = 3 pages.
    assert_eq!(pager.page_count(), 3);
    assert!(pager.go_to_page(0).is_none());
    assert!(pager.go_to_page(4).is_none());
    assert!(pager.go_to_page(3).is_some());
  }

  #[test]
  fn test_page_navigation_refused_while_loading() {
    let mut pager: PagedQuery<u32> = PagedQuery::new(12);
    let ticket = pager.restart();
    pager
      .sender()
      .send(PageMsg {
        generation: ticket.generation,
        cursor: 1,
        result: ok_page(0..12, Some(100)),
      })
      .unwrap();
    pager.poll();

    assert!(pager.next_page().is_some());
    // Already loading page 2; a second click must not double-fetch.
    assert!(pager.next_page().is_none());
  }

  #[test]
  fn test_error_retains_previous_items() {
    let mut pager: PagedQuery<u32> = PagedQuery::new(12);
    let ticket = pager.restart();
    pager
      .sender()
      .send(PageMsg {
        generation: ticket.generation,
        cursor: 1,
        result: ok_page(0..12, Some(100)),
      })
      .unwrap();
    pager.poll();
    assert_eq!(pager.items().len(), 12);

    let ticket = pager.next_page().unwrap();
    pager
      .sender()
      .send(PageMsg {
        generation: ticket.generation,
        cursor: 2,
        result: failed(),
      })
      .unwrap();
    pager.poll();

    assert_eq!(pager.state(), PagedState::Error);
    assert_eq!(pager.items().len(), 12);
    assert!(pager.error().unwrap().contains("connection reset"));
  }

  #[test]
  fn test_zero_results_is_empty_not_error() {
    let mut pager: PagedQuery<u32> = PagedQuery::new(12);
    let ticket = pager.restart();
    pager
      .sender()
      .send(PageMsg {
        generation: ticket.generation,
        cursor: 1,
        result: ok_page(0..0, Some(0)),
      })
      .unwrap();
    pager.poll();
    assert_eq!(pager.state(), PagedState::Empty);
    assert!(pager.error().is_none());
    // A known-zero total leaves no valid page to navigate to.
    assert!(pager.next_page().is_none());
  }

  #[test]
  fn test_superseded_page_response_is_dropped() {
    let mut pager: PagedQuery<u32> = PagedQuery::new(12);
    let old = pager.restart();
    // Filter changed before the response landed.
    let new = pager.restart();

    pager
      .sender()
      .send(PageMsg {
        generation: old.generation,
        cursor: 1,
        result: ok_page(0..12, Some(99)),
      })
      .unwrap();
    assert!(!pager.poll());
    assert_eq!(pager.items().len(), 0);
    assert!(pager.is_loading());

    pager
      .sender()
      .send(PageMsg {
        generation: new.generation,
        cursor: 1,
        result: ok_page(50..62, Some(12)),
      })
      .unwrap();
    assert!(pager.poll());
    assert_eq!(pager.items()[0], 50);
  }

  #[test]
  fn test_scroll_appends_in_issue_order() {
    let mut scroll: InfiniteQuery<u32> = InfiniteQuery::new(24);
    let first = scroll.restart();
    assert_eq!(first.cursor, 0);

    scroll
      .sender()
      .send(PageMsg {
        generation: first.generation,
        cursor: 0,
        result: ok_page(0..24, None),
      })
      .unwrap();
    scroll.poll();
    assert_eq!(scroll.state(), ScrollState::Settled);

    let more = scroll.on_scroll_threshold().unwrap();
    assert_eq!(more.cursor, 24);
    scroll
      .sender()
      .send(PageMsg {
        generation: more.generation,
        cursor: 24,
        result: ok_page(24..48, None),
      })
      .unwrap();
    scroll.poll();

    let loaded: Vec<u32> = scroll.items().copied().collect();
    assert_eq!(loaded, (0..48).collect::<Vec<u32>>());
  }

  #[test]
  fn test_double_scroll_trigger_issues_one_fetch() {
    let mut scroll: InfiniteQuery<u32> = InfiniteQuery::new(24);
    let first = scroll.restart();
    scroll
      .sender()
      .send(PageMsg {
        generation: first.generation,
        cursor: 0,
        result: ok_page(0..24, None),
      })
      .unwrap();
    scroll.poll();

    // Overlapping intersection events fire the trigger twice.
    assert!(scroll.on_scroll_threshold().is_some());
    assert!(scroll.on_scroll_threshold().is_none());
  }

  #[test]
  fn test_short_page_exhausts() {
    let mut scroll: InfiniteQuery<u32> = InfiniteQuery::new(24);
    let first = scroll.restart();
    scroll
      .sender()
      .send(PageMsg {
        generation: first.generation,
        cursor: 0,
        result: ok_page(0..10, None),
      })
      .unwrap();
    scroll.poll();

    assert!(scroll.exhausted());
    // Once exhausted, scroll events issue nothing.
    assert!(scroll.on_scroll_threshold().is_none());
    assert_eq!(scroll.loaded(), 10);
  }

  #[test]
  fn test_restart_discards_loaded_pages() {
    let mut scroll: InfiniteQuery<u32> = InfiniteQuery::new(24);
    let first = scroll.restart();
    scroll
      .sender()
      .send(PageMsg {
        generation: first.generation,
        cursor: 0,
        result: ok_page(0..24, None),
      })
      .unwrap();
    scroll.poll();
    assert_eq!(scroll.loaded(), 24);

    let second = scroll.restart();
    assert_eq!(scroll.loaded(), 0);
    assert_eq!(scroll.state(), ScrollState::LoadingFirst);
    assert_eq!(second.cursor, 0);
  }

  #[test]
  fn test_stale_generation_never_renders() {
    let mut scroll: InfiniteQuery<u32> = InfiniteQuery::new(24);
    // Rapid typed filter edits: "A", "Al", "Ana" - each restart
    // supersedes the previous fetch.
    let gen_a = scroll.restart();
    let gen_al = scroll.restart();
    let gen_ana = scroll.restart();

    // "Ana" resolves first, then the older responses straggle in.
    scroll
      .sender()
      .send(PageMsg {
        generation: gen_ana.generation,
        cursor: 0,
        result: ok_page(300..310, None),
      })
      .unwrap();
    scroll
      .sender()
      .send(PageMsg {
        generation: gen_a.generation,
        cursor: 0,
        result: ok_page(100..124, None),
      })
      .unwrap();
    scroll
      .sender()
      .send(PageMsg {
        generation: gen_al.generation,
        cursor: 0,
        result: ok_page(200..224, None),
      })
      .unwrap();
    scroll.poll();

    let loaded: Vec<u32> = scroll.items().copied().collect();
    assert_eq!(loaded, (300..310).collect::<Vec<u32>>());
  }

  #[test]
  fn test_failed_load_more_allows_retry() {
    let mut scroll: InfiniteQuery<u32> = InfiniteQuery::new(24);
    let first = scroll.restart();
    scroll
      .sender()
      .send(PageMsg {
        generation: first.generation,
        cursor: 0,
        result: ok_page(0..24, None),
      })
      .unwrap();
    scroll.poll();

    let more = scroll.on_scroll_threshold().unwrap();
    scroll
      .sender()
      .send(PageMsg {
        generation: more.generation,
        cursor: 24,
        result: failed(),
      })
      .unwrap();
    scroll.poll();

    assert_eq!(scroll.state(), ScrollState::Error);
    assert!(!scroll.exhausted());
    assert_eq!(scroll.loaded(), 24);

    // Next scroll event re-attempts from the same offset.
    let retry = scroll.on_scroll_threshold().unwrap();
    assert_eq!(retry.cursor, 24);
  }
}
