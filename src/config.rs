// ⚙️ Configuration - environment driven settings shared by both binaries

use std::env;
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_IMAGE_DIR: &str = "image";

/// URL prefix the gallery page links images under
pub const IMAGE_URL_PREFIX: &str = "/image";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Address the web server listens on (LEDGER_BIND)
    pub bind_addr: String,

    /// Directory listed by the gallery page (LEDGER_IMAGE_DIR)
    pub image_dir: PathBuf,

    /// SQLite store; `None` keeps the seeded per-request ledger (LEDGER_DB)
    pub db_path: Option<PathBuf>,

    /// Emit JSON log lines (LEDGER_LOG_JSON)
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            db_path: None,
            log_json: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; lets tests avoid touching process env
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            bind_addr: lookup("LEDGER_BIND")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.bind_addr),
            image_dir: lookup("LEDGER_IMAGE_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.image_dir),
            db_path: lookup("LEDGER_DB")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            log_json: lookup("LEDGER_LOG_JSON")
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.log_json),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(config_from(&[]), Config::default());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("LEDGER_BIND", "127.0.0.1:8080"),
            ("LEDGER_IMAGE_DIR", "/srv/cats"),
            ("LEDGER_DB", "ledger.db"),
            ("LEDGER_LOG_JSON", "TRUE"),
        ]);

        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.image_dir, PathBuf::from("/srv/cats"));
        assert_eq!(config.db_path, Some(PathBuf::from("ledger.db")));
        assert!(config.log_json);
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config = config_from(&[("LEDGER_DB", "  "), ("LEDGER_BIND", ""), ("LEDGER_LOG_JSON", "nope")]);

        assert_eq!(config.db_path, None);
        assert_eq!(config.bind_addr, DEFAULT_BIND);
        assert!(!config.log_json);
    }
}
