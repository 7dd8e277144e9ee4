/// Available commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "deputados",
    aliases: &["d", "dep", "deputies"],
    description: "Browse federal deputies",
  },
  Command {
    name: "gastos",
    aliases: &["g", "expenses"],
    description: "Explore parliamentary expenses",
  },
  Command {
    name: "proposicoes",
    aliases: &["p", "props", "proposals"],
    description: "Browse legislative proposals",
  },
  Command {
    name: "dashboard",
    aliases: &["home", "stats"],
    description: "Aggregate spending dashboard",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit c9s",
  },
];

/// How well a command matches the typed input; lower ranks first.
fn match_rank(cmd: &Command, input: &str) -> Option<u32> {
  if cmd.name == input {
    return Some(0);
  }
  if cmd.aliases.contains(&input) {
    return Some(1);
  }
  if cmd.name.starts_with(input) {
    return Some(2);
  }
  if cmd.aliases.iter().any(|a| a.starts_with(input)) {
    return Some(3);
  }
  if cmd.name.contains(input) {
    return Some(4);
  }
  if cmd.aliases.iter().any(|a| a.contains(input)) {
    return Some(5);
  }
  None
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input = input.trim().to_lowercase();

  if input.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| match_rank(cmd, &input).map(|rank| (cmd, rank)))
    .collect();

  matches.sort_by_key(|(_, rank)| *rank);
  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("gastos");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "gastos");
  }

  #[test]
  fn test_alias_match() {
    let suggestions = get_suggestions("d");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "deputados");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("prop");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "proposicoes");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("board");
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].name, "dashboard");
  }

  #[test]
  fn test_no_match() {
    assert!(get_suggestions("xyz").is_empty());
  }
}
