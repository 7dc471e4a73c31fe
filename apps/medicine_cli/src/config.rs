use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use client_core::{ClientOptions, DEFAULT_MEDICINE_ENDPOINT};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "medicine.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub endpoint_url: String,
    pub database_url: String,
    pub request_timeout_secs: Option<u64>,
    pub assume_online: Option<bool>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_MEDICINE_ENDPOINT.into(),
            database_url: "sqlite://./data/medicine_db.sqlite".into(),
            request_timeout_secs: None,
            assume_online: None,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn client_options(&self) -> Result<ClientOptions> {
        let endpoint = Url::parse(&self.endpoint_url)
            .with_context(|| format!("invalid endpoint url '{}'", self.endpoint_url))?;
        Ok(ClientOptions {
            endpoint,
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            assume_online: self.assume_online,
        })
    }
}

/// Defaults, then the TOML file, then environment variables. An explicit
/// `config_path` must exist; the default file is optional.
pub fn load_settings(config_path: Option<&Path>) -> Result<Settings> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut settings = match fs::read_to_string(&path) {
        Ok(raw) => toml::from_str::<Settings>(&raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?,
        Err(err) if err.kind() == ErrorKind::NotFound && config_path.is_none() => {
            Settings::default()
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    settings.database_url = normalize_database_url(&settings.database_url);
    Ok(settings)
}

pub fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(v) = lookup("MEDICINE_ENDPOINT_URL") {
        settings.endpoint_url = v;
    }

    if let Some(v) = lookup("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = lookup("MEDICINE_DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = lookup("MEDICINE_REQUEST_TIMEOUT_SECS") {
        let secs = v
            .parse::<u64>()
            .with_context(|| format!("MEDICINE_REQUEST_TIMEOUT_SECS is not a number: '{v}'"))?;
        settings.request_timeout_secs = Some(secs);
    }

    if let Some(v) = lookup("MEDICINE_ASSUME_ONLINE") {
        let online = match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            other => anyhow::bail!("MEDICINE_ASSUME_ONLINE must be a boolean, got '{other}'"),
        };
        settings.assume_online = Some(online);
    }

    if let Some(v) = lookup("MEDICINE_LOG") {
        settings.log_filter = v;
    }

    Ok(())
}

/// Rewrites bare paths and `sqlite:path` into `sqlite://path`. Directory
/// creation is left to `Storage::new`.
pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw = raw_database_url.trim();
    if raw.is_empty() {
        return Settings::default().database_url;
    }
    if raw.contains("://") || raw.starts_with("sqlite::memory:") {
        return raw.to_string();
    }

    let path = raw.strip_prefix("sqlite:").unwrap_or(raw).replace('\\', "/");
    format!("sqlite://{path}")
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
