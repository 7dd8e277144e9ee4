use crate::camara::CachedCamaraClient;
use crate::cache::QueryCache;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::renderfns::header::extract_host;
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::{DashboardView, DeputyListView, ExpenseListView, ProposalListView};
use color_eyre::{eyre::eyre, Result};
use crossterm::event::{KeyCode, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

/// Main application state: a stack of views over one shared client.
///
/// The query cache is constructed here and injected into the client -
/// one instance per process, shared by every view, never a hidden
/// global.
pub struct App {
  view_stack: Vec<Box<dyn View>>,
  command: CommandInput,
  client: CachedCamaraClient,
  title: String,
  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let cache = Arc::new(QueryCache::new());
    let client = CachedCamaraClient::new(&config, cache)
      .map_err(|e| eyre!("Failed to create API client: {}", e))?;

    let title = config
      .title
      .clone()
      .unwrap_or_else(|| extract_host(&config.api.base_url).to_string());

    Ok(Self {
      view_stack: vec![Box::new(DeputyListView::new(client.clone()))],
      command: CommandInput::new(),
      client,
      title,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(250));

    // Main loop
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {
        // Every view polls its controllers, so fetches started by a
        // view lower in the stack still resolve while it's covered.
        for view in &mut self.view_stack {
          view.tick();
        }
      }
    }
  }

  fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // Command palette has first claim on input
    match self.command.handle_key(key) {
      KeyResult::Handled => return,
      KeyResult::Event(CommandEvent::Submitted(cmd)) => {
        self.execute_command(&cmd);
        return;
      }
      KeyResult::Event(CommandEvent::Cancelled) => return,
      KeyResult::NotHandled => {}
    }

    if let Some(view) = self.view_stack.last_mut() {
      match view.handle_key(key) {
        ViewAction::Push(new_view) => self.view_stack.push(new_view),
        ViewAction::Pop => {
          if self.view_stack.len() > 1 {
            self.view_stack.pop();
          } else {
            self.should_quit = true;
          }
        }
        ViewAction::None => {}
      }
    }
  }

  fn execute_command(&mut self, cmd: &str) {
    let root: Option<Box<dyn View>> = match cmd {
      "deputados" => Some(Box::new(DeputyListView::new(self.client.clone()))),
      "gastos" => Some(Box::new(ExpenseListView::new(self.client.clone()))),
      "proposicoes" => Some(Box::new(ProposalListView::new(self.client.clone()))),
      "dashboard" => Some(Box::new(DashboardView::new(self.client.clone()))),
      "quit" => {
        self.should_quit = true;
        None
      }
      _ => {
        tracing::debug!(cmd, "unknown command");
        None
      }
    };

    if let Some(root) = root {
      self.view_stack.clear();
      self.view_stack.push(root);
    }
  }

  // Accessors for UI rendering

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn command(&self) -> &CommandInput {
    &self.command
  }

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn current_shortcuts(&self) -> Vec<Shortcut> {
    self
      .view_stack
      .last()
      .map(|view| view.shortcuts())
      .unwrap_or_default()
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|view| view.breadcrumb_label())
      .collect()
  }
}
