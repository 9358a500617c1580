//! Gateway configuration loaded from `config/tutor.toml` and the environment.
//!
//! | Key | Env | Default |
//! |-----|-----|---------|
//! | bind_host | AITUTOR_BIND_HOST | `0.0.0.0` |
//! | ports | AITUTOR_PORTS (comma separated) | `8080,8081,8082,9090,9091,3000,5000` |
//! | api_base | AITUTOR_API_BASE | `https://generativelanguage.googleapis.com/v1beta` |
//! | model | AITUTOR_MODEL | `gemini-2.5-flash` |
//! | request_timeout_secs | AITUTOR_REQUEST_TIMEOUT_SECS | `60` |
//! | subjects | (file only) | built-in six subjects |
//!
//! The API key is not part of this struct; see [`load_api_key`].

use serde::Deserialize;
use std::path::Path;

use crate::error::{ConfigError, RegistryError};
use crate::subjects::SubjectRegistry;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_PORTS: &[u16] = &[8080, 8081, 8082, 9090, 9091, 3000, 5000];
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// `[[subjects]]` table entry replacing the built-in registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubjectEntry {
    pub name: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TutorConfig {
    pub bind_host: String,
    /// Tried in order; the first free one is used.
    pub ports: Vec<u16>,
    pub api_base: String,
    pub model: String,
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub subjects: Option<Vec<SubjectEntry>>,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            ports: DEFAULT_PORTS.to_vec(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            subjects: None,
        }
    }
}

impl TutorConfig {
    /// Precedence: env `AITUTOR_*` > file (`AITUTOR_CONFIG` path, else `config/tutor`) > defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("AITUTOR_CONFIG").unwrap_or_else(|_| "config/tutor".to_string());
        Self::load_from(Path::new(&path))
    }

    /// Same as [`TutorConfig::load`] with an explicit file. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ports: Vec<i64> = DEFAULT_PORTS.iter().map(|p| i64::from(*p)).collect();
        let built = config::Config::builder()
            .set_default("bind_host", "0.0.0.0")?
            .set_default("ports", ports)?
            .set_default("api_base", DEFAULT_API_BASE)?
            .set_default("model", DEFAULT_MODEL)?
            .set_default("request_timeout_secs", DEFAULT_TIMEOUT_SECS as i64)?
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("AITUTOR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("ports"),
            )
            .build()?;

        let cfg: TutorConfig = built.try_deserialize()?;
        if cfg.ports.is_empty() {
            return Err(ConfigError::NoPorts);
        }
        Ok(cfg)
    }

    /// Subject registry from `subjects`, or the built-in one when unset.
    pub fn registry(&self) -> Result<SubjectRegistry, RegistryError> {
        match &self.subjects {
            Some(entries) => SubjectRegistry::new(
                entries
                    .iter()
                    .map(|e| (e.name.clone(), e.keywords.clone())),
            ),
            None => Ok(SubjectRegistry::default()),
        }
    }
}

/// Reads `GEMINI_API_KEY`. Call `dotenvy::dotenv()` first so a `.env` file is honored.
pub fn load_api_key() -> Result<String, ConfigError> {
    normalize_api_key(std::env::var(API_KEY_ENV).ok())
}

fn normalize_api_key(raw: Option<String>) -> Result<String, ConfigError> {
    let raw = raw.ok_or(ConfigError::MissingApiKey)?;
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim();
    if unquoted.is_empty() {
        return Err(ConfigError::MissingApiKey);
    }
    Ok(unquoted.to_string())
}
