use crate::camara::{CachedCamaraClient, Proposal};
use crate::query::{Query, QueryState};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::truncate;
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// The proposal endpoint is limit-bounded, no pagination needed.
const PROPOSAL_LIST_LIMIT: u32 = 100;

/// Browsable list of legislative proposals.
pub struct ProposalListView {
  client: CachedCamaraClient,
  query: Query<Vec<Proposal>>,
  list_state: ListState,
}

impl ProposalListView {
  pub fn new(client: CachedCamaraClient) -> Self {
    let query_client = client.clone();
    let mut query = Query::new(move || {
      let client = query_client.clone();
      async move { client.list_proposals(PROPOSAL_LIST_LIMIT).await }
    });
    query.fetch();

    Self {
      client,
      query,
      list_state: ListState::default(),
    }
  }

  fn proposals(&self) -> &[Proposal] {
    self.query.data().map(Vec::as_slice).unwrap_or(&[])
  }
}

impl View for ProposalListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('r') => {
        self.client.invalidate_collection("proposicoes");
        self.query.refetch();
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let title = match self.query.state() {
      QueryState::Idle | QueryState::Loading => " Proposições (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Proposições (erro: {}) ", e),
      QueryState::Success(_) => format!(" Proposições ({}) ", self.proposals().len()),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.proposals().is_empty() && !self.query.is_loading() {
      let content = if self.query.error().is_some() {
        "Falha ao carregar proposições. Pressione 'r' para tentar de novo."
      } else {
        "Nenhuma proposição encontrada."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .proposals()
      .iter()
      .map(|proposal| {
        let mut spans = vec![
          Span::styled(
            format!("{:<16}", proposal.label()),
            Style::default().fg(Color::Cyan),
          ),
          Span::raw(truncate(&proposal.ementa, 80)),
        ];
        if proposal.analise.is_some() {
          spans.push(Span::styled(" ✦", Style::default().fg(Color::Green)));
        }
        ListItem::new(Line::from(spans))
      })
      .collect();

    ensure_valid_selection(&mut self.list_state, items.len());

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn breadcrumb_label(&self) -> String {
    "Proposições".to_string()
  }

  fn tick(&mut self) {
    self.query.poll();
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![Shortcut::new("r", "refresh"), Shortcut::new("q", "voltar")]
  }
}
