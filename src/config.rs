//! Configuration loading
//!
//! Settings live in a TOML file in the platform's standard configuration
//! directory. Every field has a default, so a missing file or a partial file
//! is fine. Credentials and the UI token may also come from the environment.

use crate::catalog::Credentials;
use crate::http::DEFAULT_TIMEOUT;
use crate::webshare::{Category, SearchRequest, Sort};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Name of the configuration file inside the configuration directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors that can occur while loading the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine the configuration directory location
    #[error("Failed to determine configuration directory location")]
    ConfigDirectoryNotFound,

    /// Failed to read the configuration file
    #[error("Failed to read configuration file {path}: {source}")]
    ReadFailed { path: PathBuf, source: io::Error },

    /// The configuration file is not valid TOML or has wrong field types
    #[error("Failed to parse configuration file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A value is present but unusable
    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub webshare: WebshareConfig,
    pub fedapi: FedApiConfig,
    pub csfd: CsfdConfig,
    pub http: HttpConfig,
    pub player: PlayerConfig,
}

/// Webshare account and search defaults
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebshareConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub base_url: String,
    /// Results per query
    pub limit: u32,
    pub sort: Sort,
    pub category: Category,
}

impl Default for WebshareConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            base_url: crate::webshare::DEFAULT_BASE_URL.to_string(),
            limit: 7,
            sort: Sort::default(),
            category: Category::default(),
        }
    }
}

impl fmt::Debug for WebshareConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebshareConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("limit", &self.limit)
            .field("sort", &self.sort)
            .field("category", &self.category)
            .finish()
    }
}

/// Stream resolver settings
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FedApiConfig {
    pub ui_token: Option<String>,
    pub base_url: String,
    pub suggest_url: String,
}

impl Default for FedApiConfig {
    fn default() -> Self {
        Self {
            ui_token: None,
            base_url: crate::fedapi::DEFAULT_BASE_URL.to_string(),
            suggest_url: crate::fedapi::DEFAULT_SUGGEST_URL.to_string(),
        }
    }
}

impl fmt::Debug for FedApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FedApiConfig")
            .field("ui_token", &self.ui_token.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("suggest_url", &self.suggest_url)
            .finish()
    }
}

/// Catalog scraper settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsfdConfig {
    pub base_url: String,
}

impl Default for CsfdConfig {
    fn default() -> Self {
        Self {
            base_url: crate::csfd::DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Timeout of every single HTTP call
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// External player used to play resolved URLs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Player executable; without one the URL is printed instead
    pub command: Option<String>,
    /// Extra arguments placed before the URL
    pub args: Vec<String>,
    /// Option prefix used to pass a subtitle URL, e.g. `--sub-file=`
    pub subtitle_option: Option<String>,
}

/// Values that take precedence over the configuration file
///
/// The CLI fills these from flags and environment variables.
#[derive(Default)]
pub struct Overrides {
    pub username: Option<String>,
    pub password: Option<String>,
    pub ui_token: Option<String>,
}

impl Config {
    /// Returns the default location of the configuration file
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let proj_dirs = directories::ProjectDirs::from("org", "simplestream", "simple-stream")
            .ok_or(ConfigError::ConfigDirectoryNotFound)?;
        Ok(proj_dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Loads the configuration
    ///
    /// An explicit `path` must exist. Without one the default location is
    /// used, and a missing file there yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    debug!(path = %path.display(), "No configuration file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Reads and parses one configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;

        debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http.timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.webshare.limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "webshare.limit",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Replaces file values with the given overrides where present
    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(username) = overrides.username {
            self.webshare.username = Some(username);
        }
        if let Some(password) = overrides.password {
            self.webshare.password = Some(password);
        }
        if let Some(token) = overrides.ui_token {
            self.fedapi.ui_token = Some(token);
        }
    }

    /// Webshare credentials, if both parts are configured and non-empty
    pub fn credentials(&self) -> Option<Credentials> {
        let username = self.webshare.username.as_deref().filter(|u| !u.is_empty())?;
        let password = self.webshare.password.as_deref().filter(|p| !p.is_empty())?;
        Some(Credentials::new(username, password))
    }

    /// The FedAPI UI token, if configured and non-empty
    pub fn ui_token(&self) -> Option<&str> {
        self.fedapi
            .ui_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// Per-call HTTP timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    /// Search parameters shared by every file search
    pub fn search_template(&self) -> SearchRequest {
        SearchRequest::default()
            .limit(self.webshare.limit)
            .sort(self.webshare.sort)
            .category(self.webshare.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config(
            r#"
[webshare]
username = "alice"
password = "secret"
sort = "recent"

[player]
command = "mpv"
args = ["--fs"]
"#,
        );

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.webshare.limit, 7);
        assert_eq!(config.webshare.sort, Sort::Recent);
        assert_eq!(config.webshare.category, Category::Video);
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.csfd.base_url, "https://www.csfd.cz");
        assert_eq!(config.player.command.as_deref(), Some("mpv"));

        let credentials = config.credentials().unwrap();
        assert_eq!(credentials.username, "alice");

        let template = config.search_template();
        assert_eq!(template.limit, 7);
        assert_eq!(template.sort, Sort::Recent);
    }

    #[test]
    fn test_empty_file_is_default() {
        let file = write_config("");
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.credentials().is_none());
        assert!(config.ui_token().is_none());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let file = write_config("[webshare\nusername = ");
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed { .. }));
    }

    #[test]
    fn test_unknown_sort_is_parse_error() {
        let file = write_config("[webshare]\nsort = \"random\"\n");
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed { .. }));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let file = write_config("[http]\ntimeout_secs = 0\n");
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "http.timeout_secs",
                ..
            }
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFailed { .. }));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let file = write_config("[webshare]\nusername = \"file-user\"\npassword = \"file-pass\"\n");
        let mut config = Config::load(Some(file.path())).unwrap();

        config.apply_overrides(Overrides {
            username: Some("env-user".to_string()),
            password: None,
            ui_token: Some(" token ".to_string()),
        });

        let credentials = config.credentials().unwrap();
        assert_eq!(credentials.username, "env-user");
        assert_eq!(credentials.password, "file-pass");
        assert_eq!(config.ui_token(), Some("token"));
    }

    #[test]
    fn test_blank_credentials_count_as_missing() {
        let mut config = Config::default();
        config.webshare.username = Some("alice".to_string());
        config.webshare.password = Some(String::new());
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = Config::default();
        config.webshare.password = Some("hunter2".to_string());
        config.fedapi.ui_token = Some("tok-123".to_string());
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("tok-123"));
    }
}
