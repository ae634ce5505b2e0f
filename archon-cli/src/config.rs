//! Runtime configuration: defaults, optional JSON/YAML file, env overrides.
//!
//! Precedence (lowest to highest): built-in defaults, config file, then
//! the ARCHON_ENV / ARCHON_DB_PATH / ARCHON_TOKEN_TTL environment
//! variables.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub environment: String,
    pub database: DatabaseSection,
    pub security: SecuritySection,
    pub notifications: NotificationsSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecuritySection {
    pub token_ttl: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationsSection {
    pub email_enabled: bool,
    pub sms_enabled: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            database: DatabaseSection::default(),
            security: SecuritySection::default(),
            notifications: NotificationsSection::default(),
        }
    }
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: "./archon-data.json".to_string(),
        }
    }
}

impl Default for SecuritySection {
    fn default() -> Self {
        Self { token_ttl: 900 }
    }
}

impl Default for NotificationsSection {
    fn default() -> Self {
        Self {
            email_enabled: false,
            sms_enabled: false,
        }
    }
}

/// Resolved configuration the commands run against.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub database_path: PathBuf,
    pub token_ttl: i64,
    pub notifications: NotificationsSection,
}

pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut cfg = match path {
        Some(p) => read_config_file(p)?,
        None => FileConfig::default(),
    };

    if let Ok(env) = std::env::var("ARCHON_ENV") {
        cfg.environment = env;
    }
    if let Ok(db_path) = std::env::var("ARCHON_DB_PATH") {
        cfg.database.path = db_path;
    }
    if let Ok(ttl) = std::env::var("ARCHON_TOKEN_TTL") {
        cfg.security.token_ttl = ttl
            .parse()
            .context("ARCHON_TOKEN_TTL must be an integer number of seconds")?;
    }

    Ok(AppConfig {
        environment: cfg.environment,
        database_path: expand_home(&cfg.database.path),
        token_ttl: cfg.security.token_ttl,
        notifications: cfg.notifications,
    })
}

fn read_config_file(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml" | "yaml")
    );
    if is_yaml {
        serde_yaml::from_str(&raw).with_context(|| format!("parse {}", path.display()))
    } else {
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
    }
}

fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home);
        }
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}
