//! Configuration for the Babble client.
//!
//! Settings are read from `babble.json` in the working directory. Every key
//! is optional; a missing file means all defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BabbleError, Result};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "babble.json";

/// Default base URL of the lesson service.
fn default_service_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

/// Default directory exported documents are written to.
fn default_output_dir() -> String {
    ".".to_string()
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the lesson service.
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// Identifier of the signed-in user; the placeholder id is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Directory exported lesson documents are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            user_id: None,
            output_dir: default_output_dir(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `babble.json` exists but is invalid.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            BabbleError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads `babble.json` from `dir`, or defaults if it does not exist.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `BabbleError::ConfigParseError` if the file cannot be read or
    /// is not valid JSON, and `BabbleError::ConfigValidationError` if a value
    /// is invalid.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(BabbleError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| BabbleError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// - `serviceUrl` must be a non-empty `http://` or `https://` URL
    /// - `outputDir` must not be empty
    ///
    /// # Errors
    ///
    /// Returns `BabbleError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        let url = self.service_url.trim();
        if url.is_empty() {
            return Err(BabbleError::config_validation(
                "serviceUrl must not be empty",
                "Set serviceUrl to the lesson service address in your babble.json (e.g. http://127.0.0.1:5000)",
            ));
        }

        let host = url
            .strip_prefix("http://")
            .or_else(|| url.strip_prefix("https://"));
        if host.map_or(true, |h| h.trim_matches('/').is_empty()) {
            return Err(BabbleError::config_validation(
                format!("serviceUrl '{url}' is not an http(s) URL"),
                "Use a URL starting with http:// or https:// followed by a host",
            ));
        }

        if self.output_dir.trim().is_empty() {
            return Err(BabbleError::config_validation(
                "outputDir must not be empty",
                "Provide a valid output directory path in your babble.json (use '.' for current directory)",
            ));
        }

        Ok(())
    }
}
