//! Detail session: bounded-lifetime state for one inspected deputy.
//!
//! Opening a session fetches the summary eagerly and declares every tab
//! as not-yet-requested; a tab's data is fetched the first time it
//! becomes active and then reused until the session closes. Closing
//! simply drops the session - its channel dies with it, so a fetch that
//! resolves afterwards has nowhere to deliver and is ignored.

use tokio::sync::mpsc;

use crate::camara::{Deputy, Expense, FetchError, Proposal};

/// Lifecycle of one lazily fetched piece of session data.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Fetch<T> {
  #[default]
  NotRequested,
  Loading,
  Loaded(T),
  Failed(String),
}

impl<T> Fetch<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, Fetch::Loading)
  }

  pub fn loaded(&self) -> Option<&T> {
    match self {
      Fetch::Loaded(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      Fetch::Failed(message) => Some(message),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DetailTab {
  Expenses,
  Proposals,
  Attendance,
}

impl DetailTab {
  pub const ALL: [DetailTab; 3] = [
    DetailTab::Expenses,
    DetailTab::Proposals,
    DetailTab::Attendance,
  ];

  pub fn label(self) -> &'static str {
    match self {
      DetailTab::Expenses => "Gastos Recentes",
      DetailTab::Proposals => "Proposições",
      DetailTab::Attendance => "Frequência",
    }
  }

  pub fn next(self) -> Self {
    match self {
      DetailTab::Expenses => DetailTab::Proposals,
      DetailTab::Proposals => DetailTab::Attendance,
      DetailTab::Attendance => DetailTab::Expenses,
    }
  }

  pub fn prev(self) -> Self {
    self.next().next()
  }
}

/// Fetch the session asks the view to issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailFetch {
  Summary,
  Expenses,
  Proposals,
}

/// Completion of a session fetch.
#[derive(Debug)]
pub enum DetailMsg {
  Summary(Result<Deputy, FetchError>),
  Expenses(Result<Vec<Expense>, FetchError>),
  Proposals(Result<Vec<Proposal>, FetchError>),
}

pub struct DetailSession {
  deputy_id: u64,
  summary: Fetch<Deputy>,
  expenses: Fetch<Vec<Expense>>,
  proposals: Fetch<Vec<Proposal>>,
  active: DetailTab,
  tx: mpsc::UnboundedSender<DetailMsg>,
  rx: mpsc::UnboundedReceiver<DetailMsg>,
}

impl DetailSession {
  /// Open a session. The summary fetch is never lazy - the returned
  /// instruction must be issued immediately.
  pub fn open(deputy_id: u64) -> (Self, DetailFetch) {
    let (tx, rx) = mpsc::unbounded_channel();
    let session = Self {
      deputy_id,
      summary: Fetch::Loading,
      expenses: Fetch::NotRequested,
      proposals: Fetch::NotRequested,
      active: DetailTab::Expenses,
      tx,
      rx,
    };
    (session, DetailFetch::Summary)
  }

  pub fn deputy_id(&self) -> u64 {
    self.deputy_id
  }

  pub fn active_tab(&self) -> DetailTab {
    self.active
  }

  pub fn summary(&self) -> &Fetch<Deputy> {
    &self.summary
  }

  pub fn expenses(&self) -> &Fetch<Vec<Expense>> {
    &self.expenses
  }

  pub fn proposals(&self) -> &Fetch<Vec<Proposal>> {
    &self.proposals
  }

  pub fn sender(&self) -> mpsc::UnboundedSender<DetailMsg> {
    self.tx.clone()
  }

  /// Make a tab active, returning the fetch to issue if this is its
  /// first activation (or a retry after a failure). A tab that is
  /// already loading or loaded issues nothing - that guard is what
  /// keeps at most one fetch in flight per tab.
  pub fn activate(&mut self, tab: DetailTab) -> Option<DetailFetch> {
    self.active = tab;
    match tab {
      DetailTab::Expenses => match self.expenses {
        Fetch::NotRequested | Fetch::Failed(_) => {
          self.expenses = Fetch::Loading;
          Some(DetailFetch::Expenses)
        }
        _ => None,
      },
      DetailTab::Proposals => match self.proposals {
        Fetch::NotRequested | Fetch::Failed(_) => {
          self.proposals = Fetch::Loading;
          Some(DetailFetch::Proposals)
        }
        _ => None,
      },
      // Placeholder tab in the current dataset; nothing to fetch.
      DetailTab::Attendance => None,
    }
  }

  /// Re-issue the summary fetch after a failure. Loading or loaded
  /// summaries are left alone, so re-opening an already open session
  /// can never duplicate the fetch.
  pub fn retry_summary(&mut self) -> Option<DetailFetch> {
    match self.summary {
      Fetch::Failed(_) => {
        self.summary = Fetch::Loading;
        Some(DetailFetch::Summary)
      }
      _ => None,
    }
  }

  /// Drain completions; returns true if anything changed.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;
    while let Ok(msg) = self.rx.try_recv() {
      match msg {
        DetailMsg::Summary(Ok(deputy)) => self.summary = Fetch::Loaded(deputy),
        DetailMsg::Summary(Err(e)) => self.summary = Fetch::Failed(e.user_message()),
        DetailMsg::Expenses(Ok(items)) => self.expenses = Fetch::Loaded(items),
        DetailMsg::Expenses(Err(e)) => self.expenses = Fetch::Failed(e.user_message()),
        DetailMsg::Proposals(Ok(items)) => self.proposals = Fetch::Loaded(items),
        DetailMsg::Proposals(Err(e)) => self.proposals = Fetch::Failed(e.user_message()),
      }
      changed = true;
    }
    changed
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn deputy(id: u64) -> Deputy {
    Deputy {
      id,
      nome_parlamentar: "Ana Paula".to_string(),
      partido: None,
      uf: "SP".to_string(),
      foto_url: None,
      email: None,
    }
  }

  fn expense() -> Expense {
    Expense {
      id: 1,
      politico: "Ana Paula".to_string(),
      partido: Some("PT".to_string()),
      tipo: "TELEFONIA".to_string(),
      fornecedor: None,
      data: "2024-01-15".parse().unwrap(),
      valor: 321.5,
      ai_resumo: None,
    }
  }

  #[test]
  fn test_open_fetches_summary_eagerly() {
    let (session, fetch) = DetailSession::open(42);
    assert_eq!(fetch, DetailFetch::Summary);
    assert!(session.summary().is_loading());
    assert_eq!(*session.expenses(), Fetch::NotRequested);
    assert_eq!(*session.proposals(), Fetch::NotRequested);
  }

  #[test]
  fn test_tab_fetches_exactly_once() {
    let (mut session, _) = DetailSession::open(42);

    assert_eq!(session.activate(DetailTab::Expenses), Some(DetailFetch::Expenses));
    // Second activation while loading: no duplicate fetch.
    assert_eq!(session.activate(DetailTab::Expenses), None);

    session
      .sender()
      .send(DetailMsg::Expenses(Ok(vec![expense()])))
      .unwrap();
    session.poll();
    assert!(session.expenses().loaded().is_some());

    // Loaded: switching back reuses the session data.
    session.activate(DetailTab::Proposals);
    assert_eq!(session.activate(DetailTab::Expenses), None);
  }

  #[test]
  fn test_failed_tab_retries_on_next_activation() {
    let (mut session, _) = DetailSession::open(42);
    session.activate(DetailTab::Proposals);
    session
      .sender()
      .send(DetailMsg::Proposals(Err(FetchError::Network(
        "timeout".to_string(),
      ))))
      .unwrap();
    session.poll();
    assert!(session.proposals().error().is_some());

    assert_eq!(
      session.activate(DetailTab::Proposals),
      Some(DetailFetch::Proposals)
    );
  }

  #[test]
  fn test_attendance_tab_never_fetches() {
    let (mut session, _) = DetailSession::open(42);
    assert_eq!(session.activate(DetailTab::Attendance), None);
    assert_eq!(session.active_tab(), DetailTab::Attendance);
  }

  #[test]
  fn test_not_found_summary_keeps_tabs_untouched() {
    let (mut session, _) = DetailSession::open(9999);
    session
      .sender()
      .send(DetailMsg::Summary(Err(FetchError::Http {
        status: 404,
        message: "not found".to_string(),
      })))
      .unwrap();
    session.poll();

    assert_eq!(session.summary().error(), Some("not found"));
    assert_eq!(*session.expenses(), Fetch::NotRequested);
    assert_eq!(*session.proposals(), Fetch::NotRequested);
  }

  #[test]
  fn test_open_session_never_duplicates_summary_fetch() {
    let (mut session, _) = DetailSession::open(42);
    // While loading and once loaded, no further summary fetch is issued.
    assert_eq!(session.retry_summary(), None);

    session
      .sender()
      .send(DetailMsg::Summary(Ok(deputy(42))))
      .unwrap();
    session.poll();
    assert_eq!(session.retry_summary(), None);
  }

  #[test]
  fn test_summary_resolves() {
    let (mut session, _) = DetailSession::open(42);
    session
      .sender()
      .send(DetailMsg::Summary(Ok(deputy(42))))
      .unwrap();
    assert!(session.poll());
    assert_eq!(session.summary().loaded().unwrap().id, 42);
  }

  #[test]
  fn test_tab_cycle_wraps() {
    assert_eq!(DetailTab::Expenses.next(), DetailTab::Proposals);
    assert_eq!(DetailTab::Attendance.next(), DetailTab::Expenses);
    assert_eq!(DetailTab::Expenses.prev(), DetailTab::Attendance);
  }
}
