//! Path utilities for the oracle.
//!
//! All data lives under `~/.oracle/`:
//! - `~/.oracle/config.toml` - main configuration

use std::path::PathBuf;

/// Returns the oracle home directory (`~/.oracle/`).
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".oracle")
}

/// Returns the default config file path (`~/.oracle/config.toml`).
pub fn default_config() -> PathBuf {
    home_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_lives_under_oracle_home() {
        let config = default_config();
        assert!(config.starts_with(home_dir()));
        assert!(config.to_string_lossy().contains(".oracle"));
    }
}
