// Configuration loading and parsing (config/bonsai.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the single config file inside `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "bonsai.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub chat: ChatConfig,
    pub scoreboard: ScoreboardConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the study API, e.g. `http://localhost:5000`. Empty means
    /// the client runs against the built-in offline tutor.
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
    #[serde(default = "default_max_username_length")]
    pub max_username_length: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Evaluation score (0-100) at or above which an answer counts as correct.
    #[serde(default = "default_pass_mark")]
    pub pass_mark: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreboardConfig {
    /// Names listed under the current user when the scoreboard opens.
    #[serde(default = "default_seed_names")]
    pub seed_names: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// SQLite file backing the session store. Empty resolves to the
    /// platform data directory.
    #[serde(default)]
    pub path: String,
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_min_password_length() -> usize {
    8
}

fn default_max_username_length() -> usize {
    20
}

fn default_pass_mark() -> f64 {
    70.0
}

fn default_seed_names() -> Vec<String> {
    vec!["Alice".into(), "Bob".into(), "Claude".into()]
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            min_password_length: default_min_password_length(),
            max_username_length: default_max_username_length(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        ChatConfig {
            pass_mark: default_pass_mark(),
        }
    }
}

impl Default for ScoreboardConfig {
    fn default() -> Self {
        ScoreboardConfig {
            seed_names: default_seed_names(),
        }
    }
}

impl Config {
    /// Whether a remote API is configured.
    pub fn is_online(&self) -> bool {
        !self.api.base_url.trim().is_empty()
    }

    /// Resolve the storage path, falling back to the platform data directory
    /// (and then the working directory) when the config leaves it empty.
    pub fn storage_path(&self) -> PathBuf {
        if !self.storage.path.trim().is_empty() {
            return PathBuf::from(self.storage.path.trim());
        }
        match directories::ProjectDirs::from("ai", "Bons", "bonsai") {
            Some(dirs) => dirs.data_dir().join("storage.db"),
            None => PathBuf::from("bonsai.db"),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/bonsai.toml` relative to `base_dir`.
///
/// Does not copy defaults; prefer `load_config()`.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config = parse_config(&text).map_err(|e| match e {
        ConfigError::ParseError { source, .. } => ConfigError::ParseError {
            path: path.clone(),
            source,
        },
        other => other,
    })?;
    Ok(config)
}

/// Parse and validate config text.
pub fn parse_config(text: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: PathBuf::from(CONFIG_FILE),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Seed `config/bonsai.toml` from `defaults/bonsai.toml` when it is missing.
/// Returns the path written, or `None` when the config was already there.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let source = base_dir.join("defaults").join(CONFIG_FILE);
    let target = base_dir.join("config").join(CONFIG_FILE);

    if target.exists() {
        return Ok(None);
    }
    if !source.exists() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "neither {} nor {} exists; run from the project root",
                target.display(),
                source.display()
            ),
        });
    }

    if let Some(config_dir) = target.parent() {
        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", config_dir.display()),
        })?;
    }
    std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!(
            "failed to copy {} to {}: {e}",
            source.display(),
            target.display()
        ),
    })?;
    Ok(Some(target))
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Seeds the config from `defaults/` before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_file(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let base_url = config.api.base_url.trim();
    if !base_url.is_empty()
        && !(base_url.starts_with("http://") || base_url.starts_with("https://"))
    {
        return Err(ConfigError::ValidationError {
            field: "api.base_url".into(),
            message: format!("must start with http:// or https://, got {base_url:?}"),
        });
    }

    if config.api.timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "api.timeout_secs".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.auth.min_password_length == 0 {
        return Err(ConfigError::ValidationError {
            field: "auth.min_password_length".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.auth.max_username_length == 0 {
        return Err(ConfigError::ValidationError {
            field: "auth.max_username_length".into(),
            message: "must be greater than 0".into(),
        });
    }

    let pass_mark = config.chat.pass_mark;
    if !(0.0..=100.0).contains(&pass_mark) {
        return Err(ConfigError::ValidationError {
            field: "chat.pass_mark".into(),
            message: format!("must be between 0 and 100 inclusive, got {pass_mark}"),
        });
    }

    if config
        .scoreboard
        .seed_names
        .iter()
        .any(|n| n.trim().is_empty())
    {
        return Err(ConfigError::ValidationError {
            field: "scoreboard.seed_names".into(),
            message: "names must not be blank".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[api]
base_url = "http://localhost:5000"
timeout_secs = 10

[auth]
min_password_length = 10
max_username_length = 16

[chat]
pass_mark = 60.0

[scoreboard]
seed_names = ["Ada", "Grace"]

[storage]
path = "/tmp/bonsai-test.db"
"#;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "bonsai-config-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn parses_full_config() {
        let config = parse_config(FULL).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:5000");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.auth.min_password_length, 10);
        assert_eq!(config.auth.max_username_length, 16);
        assert!((config.chat.pass_mark - 60.0).abs() < f64::EPSILON);
        assert_eq!(config.scoreboard.seed_names, vec!["Ada", "Grace"]);
        assert_eq!(config.storage_path(), PathBuf::from("/tmp/bonsai-test.db"));
        assert!(config.is_online());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = parse_config("[api]\n[auth]\n[chat]\n[scoreboard]\n").unwrap();
        assert!(config.api.base_url.is_empty());
        assert!(!config.is_online());
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.auth.min_password_length, 8);
        assert_eq!(config.auth.max_username_length, 20);
        assert!((config.chat.pass_mark - 70.0).abs() < f64::EPSILON);
        assert_eq!(config.scoreboard.seed_names, vec!["Alice", "Bob", "Claude"]);
    }

    #[test]
    fn missing_table_is_parse_error() {
        let err = parse_config("[api]\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn rejects_bad_base_url() {
        let text = FULL.replace("http://localhost:5000", "localhost:5000");
        let err = parse_config(&text).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "api.base_url"),
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn rejects_pass_mark_out_of_range() {
        let text = FULL.replace("pass_mark = 60.0", "pass_mark = 140.0");
        let err = parse_config(&text).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "chat.pass_mark"),
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn rejects_zero_password_length() {
        let text = FULL.replace("min_password_length = 10", "min_password_length = 0");
        assert!(matches!(
            parse_config(&text),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn rejects_blank_seed_name() {
        let text = FULL.replace(r#"["Ada", "Grace"]"#, r#"["Ada", "  "]"#);
        assert!(matches!(
            parse_config(&text),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn load_config_from_reports_missing_file() {
        let dir = temp_dir("missing");
        let err = load_config_from(&dir).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn ensure_config_file_copies_defaults_once() {
        let dir = temp_dir("copy");
        std::fs::create_dir_all(dir.join("defaults")).unwrap();
        std::fs::write(dir.join("defaults").join(CONFIG_FILE), FULL).unwrap();

        let copied = ensure_config_file(&dir).unwrap();
        assert_eq!(copied, Some(dir.join("config").join(CONFIG_FILE)));
        assert!(load_config_from(&dir).unwrap().is_online());

        // An edited config is never overwritten.
        std::fs::write(
            dir.join("config").join(CONFIG_FILE),
            "[api]\n[auth]\n[chat]\n[scoreboard]\n",
        )
        .unwrap();
        assert_eq!(ensure_config_file(&dir).unwrap(), None);
        assert!(!load_config_from(&dir).unwrap().is_online());
    }

    #[test]
    fn ensure_config_file_uses_existing_config_without_defaults() {
        let dir = temp_dir("no-defaults");
        std::fs::create_dir_all(dir.join("config")).unwrap();
        std::fs::write(dir.join("config").join(CONFIG_FILE), FULL).unwrap();
        assert_eq!(ensure_config_file(&dir).unwrap(), None);
    }

    #[test]
    fn ensure_config_file_errors_without_either_file() {
        let dir = temp_dir("empty");
        assert!(matches!(
            ensure_config_file(&dir),
            Err(ConfigError::DefaultsCopyError { .. })
        ));
    }
}
