use crate::camara::{CachedCamaraClient, DeputySummary, Party};
use crate::filters::{DeputyFilters, DeputyIntent};
use crate::pagination::{FetchTicket, InfiniteQuery, PageData, PageMsg, ScrollState};
use crate::query::Query;
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::truncate;
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::DeputyDetailView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// How close to the end of the loaded list the selection must get
/// before the next page is requested.
const SCROLL_TRIGGER_MARGIN: usize = 5;

const UFS: &[&str] = &[
  "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA", "MT", "MS", "MG", "PA", "PB", "PR",
  "PE", "PI", "RJ", "RN", "RS", "RO", "RR", "SC", "SP", "SE", "TO",
];

/// Infinite-scrolling list of deputies with party/state facets and a
/// client-side name search.
pub struct DeputyListView {
  client: CachedCamaraClient,
  filters: DeputyFilters,
  scroll: InfiniteQuery<DeputySummary>,
  parties: Query<Vec<Party>>,
  list_state: ListState,
  search: SearchInput,
}

impl DeputyListView {
  pub fn new(client: CachedCamaraClient) -> Self {
    let parties_client = client.clone();
    let mut parties = Query::new(move || {
      let client = parties_client.clone();
      async move { client.list_parties().await }
    });
    parties.fetch();

    let mut view = Self {
      client,
      filters: DeputyFilters::default(),
      scroll: InfiniteQuery::new(crate::camara::DEPUTY_PAGE_SIZE),
      parties,
      list_state: ListState::default(),
      search: SearchInput::new(),
    };
    let ticket = view.scroll.restart();
    view.spawn_fetch(ticket);
    view
  }

  fn spawn_fetch(&self, ticket: FetchTicket) {
    let client = self.client.clone();
    let filters = self.filters.clone();
    let tx = self.scroll.sender();
    tokio::spawn(async move {
      let result = client
        .list_deputies(&filters, ticket.cursor)
        .await
        .map(|items| PageData { items, total: None });
      let _ = tx.send(PageMsg {
        generation: ticket.generation,
        cursor: ticket.cursor,
        result,
      });
    });
  }

  /// Run an intent through the reducer. A change in the query key means
  /// the loaded pages belong to a different query: restart from the top.
  fn apply(&mut self, intent: DeputyIntent) {
    let next = self.filters.apply(intent);
    let key_changed = next.query_key(0) != self.filters.query_key(0);
    self.filters = next;
    if key_changed {
      let ticket = self.scroll.restart();
      self.spawn_fetch(ticket);
      self.list_state.select(Some(0));
    }
  }

  fn party_options(&self) -> Vec<String> {
    self
      .parties
      .data()
      .map(|parties| parties.iter().map(|p| p.sigla.clone()).collect())
      .unwrap_or_default()
  }

  /// Cycle a facet through `None -> options[0] -> ... -> None`.
  fn cycled(current: Option<&str>, options: &[String]) -> Option<String> {
    if options.is_empty() {
      return None;
    }
    match current {
      None => Some(options[0].clone()),
      Some(value) => {
        let idx = options.iter().position(|o| o == value);
        match idx {
          Some(i) if i + 1 < options.len() => Some(options[i + 1].clone()),
          _ => None,
        }
      }
    }
  }

  fn visible(&self) -> Vec<&DeputySummary> {
    self
      .scroll
      .items()
      .filter(|d| self.filters.matches(d))
      .collect()
  }

  fn move_selection(&mut self, delta: i32) {
    let len = self.visible().len();
    if len == 0 {
      return;
    }
    let current = self.list_state.selected().unwrap_or(0);
    let next = (current as i32 + delta).clamp(0, len as i32 - 1) as usize;
    self.list_state.select(Some(next));

    // Nearing the bottom of what's loaded is the load-more signal. The
    // controller guard makes a repeated trigger a no-op.
    if next + SCROLL_TRIGGER_MARGIN >= len {
      if let Some(ticket) = self.scroll.on_scroll_threshold() {
        self.spawn_fetch(ticket);
      }
    }
  }

  fn filter_line(&self) -> Line<'static> {
    let facet = |label: &str, value: Option<&str>| {
      vec![
        Span::styled(format!("{}: ", label), Style::default().fg(Color::DarkGray)),
        Span::styled(
          value.unwrap_or("all").to_string(),
          Style::default().fg(Color::Yellow),
        ),
        Span::raw("  "),
      ]
    };

    let mut spans = Vec::new();
    spans.extend(facet("Partido", self.filters.partido.as_deref()));
    spans.extend(facet("UF", self.filters.uf.as_deref()));
    if !self.filters.name_search.is_empty() {
      spans.push(Span::styled(
        format!("nome~{}", self.filters.name_search),
        Style::default().fg(Color::Cyan),
      ));
    }
    Line::from(spans)
  }
}

impl View for DeputyListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(query)) => {
        // Purely client-side: filters the loaded pages, never refetches.
        self.apply(DeputyIntent::SetNameSearch(query));
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Submitted(query)) => {
        self.apply(DeputyIntent::SetNameSearch(query));
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
      KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
      KeyCode::Char('P') => {
        let options = self.party_options();
        let next = Self::cycled(self.filters.partido.as_deref(), &options);
        self.apply(DeputyIntent::SetPartido(next));
      }
      KeyCode::Char('u') => {
        let options: Vec<String> = UFS.iter().map(|s| s.to_string()).collect();
        let next = Self::cycled(self.filters.uf.as_deref(), &options);
        self.apply(DeputyIntent::SetUf(next));
      }
      KeyCode::Char('C') => self.apply(DeputyIntent::Clear),
      KeyCode::Char('r') => {
        self.client.invalidate_collection("deputados");
        let ticket = self.scroll.restart();
        self.spawn_fetch(ticket);
      }
      KeyCode::Enter => {
        if let Some(idx) = self.list_state.selected() {
          if let Some(deputy) = self.visible().get(idx) {
            return ViewAction::Push(Box::new(DeputyDetailView::new(
              deputy.id,
              deputy.nome_parlamentar.clone(),
              self.client.clone(),
            )));
          }
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let items: Vec<ListItem> = self
      .visible()
      .iter()
      .map(|deputy| {
        let line = Line::from(vec![
          Span::styled(
            format!("{:<40}", truncate(&deputy.nome_parlamentar, 38)),
            Style::default().fg(Color::White),
          ),
          Span::styled(
            format!("{:<8}", deputy.party_label()),
            Style::default().fg(Color::Green),
          ),
          Span::styled(deputy.uf.clone(), Style::default().fg(Color::Cyan)),
        ]);
        ListItem::new(line)
      })
      .collect();

    let title = match self.scroll.state() {
      ScrollState::Idle | ScrollState::LoadingFirst => " Deputados (loading...) ".to_string(),
      ScrollState::LoadingMore => {
        format!(" Deputados ({}, carregando mais...) ", self.scroll.loaded())
      }
      ScrollState::Exhausted => format!(" Deputados ({}, todos carregados) ", self.scroll.loaded()),
      ScrollState::Error => format!(
        " Deputados ({}) (erro: {}) ",
        self.scroll.loaded(),
        self.scroll.error().unwrap_or("?")
      ),
      ScrollState::Settled => format!(" Deputados ({}) ", self.scroll.loaded()),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(1), Constraint::Min(1)])
      .split(inner);

    frame.render_widget(Paragraph::new(self.filter_line()), chunks[0]);

    if items.is_empty() && !self.scroll.is_loading() {
      let paragraph = Paragraph::new("Nenhum deputado encontrado com esses critérios.")
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, chunks[1]);
      self.search.render_overlay(frame, area);
      return;
    }

    ensure_valid_selection(&mut self.list_state, items.len());

    let list = List::new(items)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[1], &mut self.list_state);
    self.search.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Deputados".to_string()
  }

  fn tick(&mut self) {
    self.scroll.poll();
    self.parties.poll();
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("/", "buscar"),
      Shortcut::new("P", "partido"),
      Shortcut::new("u", "UF"),
      Shortcut::new("C", "limpar"),
      Shortcut::new("r", "refresh"),
    ]
  }
}
