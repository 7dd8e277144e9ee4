pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::ListState;

/// Main draw function: header, current view, breadcrumb footer, and the
/// command overlay on top.
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Footer breadcrumb
    ])
    .split(frame.area());

  let title = app.title().to_string();
  let shortcuts = app.current_shortcuts();
  let breadcrumb = app.breadcrumb();

  renderfns::draw_header(frame, chunks[0], &title, &shortcuts);

  let content = chunks[1];
  if let Some(view) = app.current_view_mut() {
    view.render(frame, content);
  }

  renderfns::draw_footer(frame, chunks[2], &breadcrumb);

  app.command().render_overlay(frame, content);
}

/// Keep a list selection inside the current item count.
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  if len == 0 {
    state.select(None);
    return;
  }
  match state.selected() {
    Some(i) if i >= len => state.select(Some(len - 1)),
    None => state.select(Some(0)),
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_ensure_valid_selection() {
    let mut state = ListState::default();
    ensure_valid_selection(&mut state, 0);
    assert_eq!(state.selected(), None);

    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(0));

    state.select(Some(10));
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(2));
  }
}
