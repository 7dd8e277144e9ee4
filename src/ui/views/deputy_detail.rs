use crate::camara::CachedCamaraClient;
use crate::detail::{DetailFetch, DetailMsg, DetailSession, DetailTab, Fetch};
use crate::ui::renderfns::{format_brl, format_date, truncate};
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Detail view for one deputy: summary header plus lazily fetched tabs.
pub struct DeputyDetailView {
  client: CachedCamaraClient,
  session: DetailSession,
  /// Name carried over from the list, shown until the summary lands.
  name_hint: String,
}

impl DeputyDetailView {
  pub fn new(deputy_id: u64, name_hint: String, client: CachedCamaraClient) -> Self {
    let (mut session, summary_fetch) = DetailSession::open(deputy_id);
    let view_fetches: Vec<DetailFetch> = std::iter::once(summary_fetch)
      .chain(session.activate(DetailTab::Expenses))
      .collect();

    let view = Self {
      client,
      session,
      name_hint,
    };
    for fetch in view_fetches {
      view.spawn_fetch(fetch);
    }
    view
  }

  fn spawn_fetch(&self, fetch: DetailFetch) {
    let client = self.client.clone();
    let tx = self.session.sender();
    let id = self.session.deputy_id();
    tokio::spawn(async move {
      let msg = match fetch {
        DetailFetch::Summary => DetailMsg::Summary(client.get_deputy(id).await),
        DetailFetch::Expenses => DetailMsg::Expenses(client.deputy_expenses(id).await),
        DetailFetch::Proposals => DetailMsg::Proposals(client.deputy_proposals(id).await),
      };
      // The session may have been closed in the meantime; that's fine.
      let _ = tx.send(msg);
    });
  }

  fn activate(&mut self, tab: DetailTab) {
    if let Some(fetch) = self.session.activate(tab) {
      self.spawn_fetch(fetch);
    }
  }

  fn display_name(&self) -> &str {
    self
      .session
      .summary()
      .loaded()
      .map(|d| d.nome_parlamentar.as_str())
      .unwrap_or(&self.name_hint)
  }

  fn render_summary(&self, frame: &mut Frame, area: Rect) {
    let lines = match self.session.summary() {
      Fetch::Loading | Fetch::NotRequested => {
        vec![Line::styled("Carregando...", Style::default().fg(Color::DarkGray))]
      }
      Fetch::Failed(message) => vec![Line::styled(
        format!("Erro: {} (r para tentar de novo)", message),
        Style::default().fg(Color::Red),
      )],
      Fetch::Loaded(deputy) => vec![
        Line::from(vec![
          Span::styled(
            deputy.nome_parlamentar.clone(),
            Style::default().fg(Color::White).bold(),
          ),
          Span::raw("  "),
          Span::styled(
            deputy.party_label().to_string(),
            Style::default().fg(Color::Green),
          ),
          Span::raw(" · "),
          Span::styled(deputy.uf.clone(), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
          Span::styled("E-mail: ", Style::default().fg(Color::DarkGray)),
          Span::raw(
            deputy
              .email
              .clone()
              .unwrap_or_else(|| "não disponível".to_string()),
          ),
        ]),
      ],
    };
    frame.render_widget(Paragraph::new(lines), area);
  }

  fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
    let mut spans = Vec::new();
    for (i, tab) in DetailTab::ALL.iter().enumerate() {
      if i > 0 {
        spans.push(Span::styled(" │ ", Style::default().fg(Color::DarkGray)));
      }
      let style = if *tab == self.session.active_tab() {
        Style::default().fg(Color::Black).bg(Color::Cyan)
      } else {
        Style::default().fg(Color::Gray)
      };
      spans.push(Span::styled(format!(" {} ", tab.label()), style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
  }

  fn render_tab_content(&self, frame: &mut Frame, area: Rect) {
    match self.session.active_tab() {
      DetailTab::Expenses => self.render_expenses(frame, area),
      DetailTab::Proposals => self.render_proposals(frame, area),
      DetailTab::Attendance => {
        let paragraph = Paragraph::new(
          "Módulo de votações e frequência será liberado em uma próxima atualização.",
        )
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
      }
    }
  }

  fn render_expenses(&self, frame: &mut Frame, area: Rect) {
    let lines = match self.session.expenses() {
      Fetch::NotRequested | Fetch::Loading => {
        vec![Line::styled("Carregando gastos...", Style::default().fg(Color::DarkGray))]
      }
      Fetch::Failed(message) => vec![Line::styled(
        format!("Erro ao carregar gastos: {}", message),
        Style::default().fg(Color::Red),
      )],
      Fetch::Loaded(expenses) if expenses.is_empty() => {
        vec![Line::styled("Nenhum gasto registrado.", Style::default().fg(Color::DarkGray))]
      }
      Fetch::Loaded(expenses) => expenses
        .iter()
        .map(|expense| {
          Line::from(vec![
            Span::styled(format_date(expense.data), Style::default().fg(Color::DarkGray)),
            Span::raw("  "),
            Span::styled(
              format!("{:>14}", format_brl(expense.valor)),
              Style::default().fg(Color::Yellow),
            ),
            Span::raw("  "),
            Span::raw(truncate(&expense.tipo, 30)),
            Span::raw("  "),
            Span::styled(
              truncate(expense.fornecedor.as_deref().unwrap_or("fornecedor n/i"), 24),
              Style::default().fg(Color::DarkGray),
            ),
          ])
        })
        .collect(),
    };
    frame.render_widget(Paragraph::new(lines), area);
  }

  fn render_proposals(&self, frame: &mut Frame, area: Rect) {
    let lines = match self.session.proposals() {
      Fetch::NotRequested | Fetch::Loading => {
        vec![Line::styled("Carregando proposições...", Style::default().fg(Color::DarkGray))]
      }
      Fetch::Failed(message) => vec![Line::styled(
        format!("Erro ao carregar proposições: {}", message),
        Style::default().fg(Color::Red),
      )],
      Fetch::Loaded(proposals) if proposals.is_empty() => {
        vec![Line::styled("Nenhuma proposição encontrada.", Style::default().fg(Color::DarkGray))]
      }
      Fetch::Loaded(proposals) => proposals
        .iter()
        .flat_map(|proposal| {
          let mut header = vec![Span::styled(
            proposal.label(),
            Style::default().fg(Color::Cyan).bold(),
          )];
          if proposal.analise.is_some() {
            header.push(Span::styled(" ✦", Style::default().fg(Color::Green)));
          }
          [
            Line::from(header),
            Line::styled(
              format!("  {}", truncate(&proposal.ementa, 90)),
              Style::default().fg(Color::Gray),
            ),
          ]
        })
        .collect(),
    };
    frame.render_widget(Paragraph::new(lines), area);
  }
}

impl View for DeputyDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Tab | KeyCode::Right => {
        let next = self.session.active_tab().next();
        self.activate(next);
      }
      KeyCode::BackTab | KeyCode::Left => {
        let prev = self.session.active_tab().prev();
        self.activate(prev);
      }
      KeyCode::Char('r') => {
        if let Some(fetch) = self.session.retry_summary() {
          self.spawn_fetch(fetch);
        }
        // Re-activating a failed tab re-issues its fetch.
        self.activate(self.session.active_tab());
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(" {} ", self.display_name()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(3), // Summary header
        Constraint::Length(1), // Tab bar
        Constraint::Min(1),    // Tab content
      ])
      .split(inner);

    self.render_summary(frame, chunks[0]);
    self.render_tab_bar(frame, chunks[1]);
    self.render_tab_content(frame, chunks[2]);
  }

  fn breadcrumb_label(&self) -> String {
    self.display_name().to_string()
  }

  fn tick(&mut self) {
    self.session.poll();
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("Tab", "aba"),
      Shortcut::new("r", "refresh"),
      Shortcut::new("q", "voltar"),
    ]
  }
}
