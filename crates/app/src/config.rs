use std::fmt;
use std::path::{Path, PathBuf};

use services::IdentityToolkitConfig;

pub const DEFAULT_DB_URL: &str = "sqlite://assess.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    InvalidDbUrl { raw: String },
    Io(std::io::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidDbUrl { raw } => write!(f, "invalid sqlite url: {raw}"),
            ConfigError::Io(err) => write!(f, "cannot prepare database file: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

/// Runtime settings resolved from flags, the environment, and `.env`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_url: String,
    pub identity: Option<IdentityToolkitConfig>,
}

impl AppConfig {
    /// Resolve the database location and pick the identity provider.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database file cannot be created.
    pub fn resolve(db_url: String) -> Result<Self, ConfigError> {
        let db_url = normalize_sqlite_url(&db_url);
        prepare_sqlite_file(&db_url)?;
        Ok(Self {
            db_url,
            identity: IdentityToolkitConfig::from_env(),
        })
    }
}

/// Turn relative or bare paths into an absolute `sqlite://` URL.
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" {
        return trimmed.to_string();
    }

    let path_str = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);
    let (path_part, query) = match path_str.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path_str, None),
    };

    let path = Path::new(path_part);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    match query {
        Some(query) => format!("sqlite://{}?{query}", absolute.display()),
        None => format!("sqlite://{}", absolute.display()),
    }
}

/// Create the database file (and its directory) so the pool can open it.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), ConfigError> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let invalid = || ConfigError::InvalidDbUrl {
        raw: db_url.to_string(),
    };
    let path = db_url.strip_prefix("sqlite://").ok_or_else(invalid)?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(invalid());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}
