use crate::camara::{CachedCamaraClient, EXPENSE_PAGE_SIZE};
use crate::filters::{ExpenseFilters, ExpenseIntent, PeriodPreset};
use crate::pagination::{FetchTicket, PageData, PageMsg, PagedQuery, PagedState};
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{format_brl, format_date, truncate};
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

/// Party options mirrored from the exploration filter dropdown.
const PARTIES: &[&str] = &["PT", "PL", "PP", "UNIÃO", "MDB", "PSD", "PSOL"];

/// Expense category options of the exploration filter.
const TIPOS: &[&str] = &[
  "COMBUSTÍVEIS",
  "TELEFONIA",
  "DIVULGAÇÃO",
  "ALIMENTAÇÃO",
  "HOSPEDAGEM",
  "PASSAGENS",
];

/// Page-based expense exploration with server-side facets and sorting.
pub struct ExpenseListView {
  client: CachedCamaraClient,
  filters: ExpenseFilters,
  pager: PagedQuery<crate::camara::Expense>,
  list_state: ratatui::widgets::ListState,
  search: SearchInput,
}

impl ExpenseListView {
  pub fn new(client: CachedCamaraClient) -> Self {
    let mut view = Self {
      client,
      filters: ExpenseFilters::default(),
      pager: PagedQuery::new(EXPENSE_PAGE_SIZE),
      list_state: ratatui::widgets::ListState::default(),
      search: SearchInput::new(),
    };
    let ticket = view.pager.restart();
    view.spawn_fetch(ticket);
    view
  }

  fn spawn_fetch(&self, ticket: FetchTicket) {
    let client = self.client.clone();
    let filters = self.filters.clone();
    let tx = self.pager.sender();
    tokio::spawn(async move {
      let result = client
        .explore_expenses(&filters, ticket.cursor)
        .await
        .map(|page| PageData {
          items: page.items,
          total: Some(page.total),
        });
      let _ = tx.send(PageMsg {
        generation: ticket.generation,
        cursor: ticket.cursor,
        result,
      });
    });
  }

  /// Run an intent through the reducer; a query-key change forces a
  /// refetch from page 1. Sorting included - order changes refetch, the
  /// loaded page is never re-sorted client-side.
  fn apply(&mut self, intent: ExpenseIntent) {
    let next = self.filters.apply(intent);
    let key_changed = next.query_key(1) != self.filters.query_key(1);
    self.filters = next;
    if key_changed {
      let ticket = self.pager.restart();
      self.spawn_fetch(ticket);
      self.list_state.select(Some(0));
    }
  }

  fn cycled(current: Option<&str>, options: &[&str]) -> Option<String> {
    match current {
      None => options.first().map(|s| s.to_string()),
      Some(value) => {
        let idx = options.iter().position(|o| *o == value);
        match idx {
          Some(i) if i + 1 < options.len() => Some(options[i + 1].to_string()),
          _ => None,
        }
      }
    }
  }

  fn cycle_period(&self) -> PeriodPreset {
    let cycle = PeriodPreset::CYCLE;
    let idx = cycle.iter().position(|p| *p == self.filters.periodo);
    match idx {
      Some(i) => cycle[(i + 1) % cycle.len()],
      // Custom range active: back to the start of the cycle.
      None => PeriodPreset::All,
    }
  }

  fn status_line(&self) -> Line<'static> {
    let mut spans = vec![
      Span::styled("ordenar: ", Style::default().fg(Color::DarkGray)),
      Span::styled(
        format!(
          "{} {}",
          self.filters.sort_by.as_str(),
          self.filters.sort_order.as_str()
        ),
        Style::default().fg(Color::Yellow),
      ),
      Span::raw("  "),
      Span::styled("filtros: ", Style::default().fg(Color::DarkGray)),
      Span::styled(self.filters.summary(), Style::default().fg(Color::Cyan)),
    ];
    if let Some(error) = self.pager.error() {
      spans.push(Span::raw("  "));
      spans.push(Span::styled(
        format!("erro: {} (dados anteriores mantidos)", error),
        Style::default().fg(Color::Red),
      ));
    }
    Line::from(spans)
  }
}

impl View for ExpenseListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Submitted(query)) => {
        // Server-side name facet: refetches and resets to page 1.
        self.apply(ExpenseIntent::SetText(query));
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Changed(_)) => return ViewAction::None,
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
      }
      KeyCode::Right | KeyCode::Char('n') => {
        if let Some(ticket) = self.pager.next_page() {
          self.spawn_fetch(ticket);
        }
      }
      KeyCode::Left | KeyCode::Char('b') => {
        if let Some(ticket) = self.pager.prev_page() {
          self.spawn_fetch(ticket);
        }
      }
      KeyCode::Char('s') => {
        self.apply(ExpenseIntent::SetSort(
          self.filters.sort_by.toggled(),
          self.filters.sort_order,
        ));
      }
      KeyCode::Char('o') => {
        self.apply(ExpenseIntent::SetSort(
          self.filters.sort_by,
          self.filters.sort_order.toggled(),
        ));
      }
      KeyCode::Char('P') => {
        let next = Self::cycled(self.filters.sigla_partido.as_deref(), PARTIES);
        self.apply(ExpenseIntent::SetPartido(next));
      }
      KeyCode::Char('t') => {
        let next = Self::cycled(self.filters.tipo_despesa.as_deref(), TIPOS);
        self.apply(ExpenseIntent::SetTipo(next));
      }
      KeyCode::Char('e') => {
        let next = self.cycle_period();
        self.apply(ExpenseIntent::SetPeriod(next));
      }
      KeyCode::Char('C') => self.apply(ExpenseIntent::Clear),
      KeyCode::Char('r') => {
        self.client.invalidate_collection("gastos");
        let ticket = self.pager.restart();
        self.spawn_fetch(ticket);
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let title = match self.pager.state() {
      PagedState::Idle | PagedState::Loading => " Gastos (loading...) ".to_string(),
      PagedState::Empty => " Gastos (0 registros) ".to_string(),
      _ => format!(
        " Gastos (página {}/{}, {} registros) ",
        self.pager.page(),
        self.pager.page_count().max(1),
        self.pager.total()
      ),
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

    frame.render_widget(Paragraph::new(self.status_line()), chunks[0]);

    if self.pager.state() == PagedState::Empty {
      let paragraph =
        Paragraph::new("Nenhum gasto encontrado para os filtros selecionados. (C limpa filtros)")
          .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, chunks[1]);
      self.search.render_overlay(frame, area);
      return;
    }

    let items: Vec<ListItem> = self
      .pager
      .items()
      .iter()
      .map(|expense| {
        let mut spans = vec![
          Span::styled(format_date(expense.data), Style::default().fg(Color::DarkGray)),
          Span::raw("  "),
          Span::styled(
            format!("{:>14}", format_brl(expense.valor)),
            Style::default().fg(Color::Yellow),
          ),
          Span::raw("  "),
          Span::styled(
            format!("{:<24}", truncate(&expense.tipo, 22)),
            Style::default().fg(Color::White),
          ),
          Span::raw(truncate(&expense.politico, 28)),
          Span::styled(
            format!(" ({})", expense.partido.as_deref().unwrap_or("-")),
            Style::default().fg(Color::Green),
          ),
        ];
        if expense.ai_resumo.is_some() {
          spans.push(Span::styled(" ✦", Style::default().fg(Color::Cyan)));
        }
        ListItem::new(Line::from(spans))
      })
      .collect();

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
    "Gastos".to_string()
  }

  fn tick(&mut self) {
    self.pager.poll();
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("←/→", "página"),
      Shortcut::new("s/o", "ordenação"),
      Shortcut::new("P/t/e", "facetas"),
      Shortcut::new("/", "nome"),
      Shortcut::new("C", "limpar"),
    ]
  }
}
