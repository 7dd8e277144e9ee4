use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  /// Custom title for the header (defaults to the API host if not set)
  pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
    }
  }
}

fn default_base_url() -> String {
  "http://localhost:8000".to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./c9s.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/c9s/config.yaml
  ///
  /// The API needs no credentials, so a missing config file just means
  /// defaults (localhost API).
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("c9s.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("c9s").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_points_at_localhost() {
    let config = Config::default();
    assert_eq!(config.api.base_url, "http://localhost:8000");
  }

  #[test]
  fn test_parse_full_config() {
    let config: Config = serde_yaml::from_str(
      "api:\n  base_url: https://api.example.org\ntitle: Transparência\n",
    )
    .unwrap();
    assert_eq!(config.api.base_url, "https://api.example.org");
    assert_eq!(config.title.as_deref(), Some("Transparência"));
  }

  #[test]
  fn test_partial_config_uses_defaults() {
    let config: Config = serde_yaml::from_str("title: Câmara\n").unwrap();
    assert_eq!(config.api.base_url, "http://localhost:8000");
  }
}
