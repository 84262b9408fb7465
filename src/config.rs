//! Runtime configuration.
//!
//! Every setting has a compiled-in default and can be overridden through an
//! environment variable, read once at startup.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_DB_PATH: &str = ".docs_db";
/// Default import cap: 10 MiB.
pub const DEFAULT_MAX_IMPORT_BYTES: u64 = 10 * 1024 * 1024;
/// Delay the editor waits after the last keystroke before auto-saving.
pub const AUTO_SAVE_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
    pub max_import_bytes: u64,
    /// Absolute base used when building share links. When unset, links are
    /// built from the request's Host header.
    pub base_url: Option<String>,
    /// Populate the sample documents when the store is empty.
    pub seed_defaults: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let bind = env::var("DOCS_BIND")
            .ok()
            .and_then(|v| match v.parse() {
                Ok(addr) => Some(addr),
                Err(e) => {
                    tracing::warn!("Ignoring invalid DOCS_BIND {:?}: {}", v, e);
                    None
                }
            })
            .unwrap_or_else(default_bind);

        let db_path = env::var("DOCS_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH));

        let max_import_bytes = env::var("DOCS_MAX_IMPORT_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_IMPORT_BYTES);

        let base_url = env::var("DOCS_BASE_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let seed_defaults = env::var("DOCS_SEED_DEFAULTS")
            .map(|v| !v.eq_ignore_ascii_case("false") && v != "0")
            .unwrap_or(true);

        Self {
            bind,
            db_path,
            max_import_bytes,
            base_url,
            seed_defaults,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            max_import_bytes: DEFAULT_MAX_IMPORT_BYTES,
            base_url: None,
            seed_defaults: true,
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bind_matches_constant() {
        assert_eq!(default_bind().to_string(), DEFAULT_BIND);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_import_bytes, 10 * 1024 * 1024);
        assert!(config.seed_defaults);
        assert!(config.base_url.is_none());
    }
}
