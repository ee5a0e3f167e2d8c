//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Zone used when neither the config nor the host can name one.
const FALLBACK_TIME_ZONE: &str = "UTC";

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Email of the user commands act as, unless `--as` overrides it.
    #[serde(default)]
    pub user: Option<String>,
    /// IANA zone for new plans and for reading zone-less times.
    #[serde(default)]
    pub default_time_zone: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("user", &self.user)
            .field("default_time_zone", &self.default_time_zone)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("wv.db"),
            user: None,
            default_time_zone: None,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // WV_DATABASE_PATH, WV_USER, WV_DEFAULT_TIME_ZONE
        figment = figment.merge(Env::prefixed("WV_"));

        figment.extract()
    }

    /// The zone for new plans: configured, else the host zone, else UTC.
    pub fn time_zone(&self) -> String {
        self.default_time_zone
            .clone()
            .filter(|tz| !tz.trim().is_empty())
            .or_else(|| iana_time_zone::get_timezone().ok())
            .unwrap_or_else(|| FALLBACK_TIME_ZONE.to_string())
    }
}

/// Returns the platform-specific config directory for wv.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("wv"))
}

/// Returns the platform-specific data directory for wv.
///
/// On Linux: `~/.local/share/wv`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("wv"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write as _;

    #[test]
    fn test_dirs_data_path_ends_with_wv() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "wv");
    }

    #[test]
    fn test_default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("wv.db"));
        assert_eq!(config.user, None);
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "database_path = \"/tmp/trips.db\"\nuser = \"ana@example.com\"\ndefault_time_zone = \"Asia/Tokyo\""
        )
        .unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/trips.db"));
        assert_eq!(config.user.as_deref(), Some("ana@example.com"));
        assert_eq!(config.time_zone(), "Asia/Tokyo");
    }

    #[test]
    fn test_time_zone_falls_back_when_unset() {
        let config = Config {
            default_time_zone: Some("  ".to_string()),
            ..Config::default()
        };
        assert!(!config.time_zone().trim().is_empty());
    }
}
