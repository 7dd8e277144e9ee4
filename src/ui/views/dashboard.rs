use crate::camara::{CachedCamaraClient, DashboardStats};
use crate::query::{Query, QueryState};
use crate::ui::renderfns::format_brl;
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Aggregate spending dashboard.
pub struct DashboardView {
  client: CachedCamaraClient,
  query: Query<DashboardStats>,
}

impl DashboardView {
  pub fn new(client: CachedCamaraClient) -> Self {
    let query_client = client.clone();
    let mut query = Query::new(move || {
      let client = query_client.clone();
      async move { client.dashboard_stats().await }
    });
    query.fetch();

    Self { client, query }
  }
}

impl View for DashboardView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('r') => {
        self.client.invalidate_collection("stats");
        self.query.refetch();
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let title = match self.query.state() {
      QueryState::Idle | QueryState::Loading => " Dashboard (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Dashboard (erro: {}) ", e),
      QueryState::Success(_) => " Dashboard ".to_string(),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let stats = match self.query.data() {
      Some(stats) => stats,
      None => {
        if let Some(error) = self.query.error() {
          let paragraph = Paragraph::new(format!(
            "Erro: {}\n\nPressione 'r' para tentar de novo.",
            error
          ))
          .style(Style::default().fg(Color::Red));
          frame.render_widget(paragraph, inner);
        }
        return;
      }
    };

    let stat = |label: &str, value: String, color: Color| {
      Line::from(vec![
        Span::styled(format!("{:<28}", label), Style::default().fg(Color::DarkGray)),
        Span::styled(value, Style::default().fg(color).bold()),
      ])
    };

    let lines = vec![
      Line::raw(""),
      stat(
        "Deputados monitorados",
        stats.total_deputados.to_string(),
        Color::Cyan,
      ),
      stat(
        "Proposições registradas",
        stats.total_proposicoes.to_string(),
        Color::Cyan,
      ),
      stat(
        "Total de gastos",
        format_brl(stats.total_gastos),
        Color::Yellow,
      ),
      stat(
        "Economia potencial estimada",
        format_brl(stats.savings_opportunity_estimate),
        Color::Green,
      ),
    ];

    frame.render_widget(Paragraph::new(lines), inner);
  }

  fn breadcrumb_label(&self) -> String {
    "Dashboard".to_string()
  }

  fn tick(&mut self) {
    self.query.poll();
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![Shortcut::new("r", "refresh"), Shortcut::new("q", "voltar")]
  }
}
