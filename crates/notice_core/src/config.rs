//! Notice manager configuration.
//!
//! # Responsibility
//! - Name the option record, the AJAX action and its nonce field.
//! - Load overrides from JSON while keeping defaults for absent keys.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Option record holding every notice.
pub const DEFAULT_OPTION_NAME: &str = "xwp_anm_notices";
/// AJAX action (and nonce action) used for dismissal.
pub const DEFAULT_DISMISS_ACTION: &str = "xwp_anm_dismiss_notice";
/// Request field carrying the dismissal nonce.
pub const DEFAULT_NONCE_FIELD: &str = "_wpnonce";
/// Share of white mixed into a notice color for the alternative background.
pub const DEFAULT_LIGHTEN_FACTOR: f64 = 0.9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeConfig {
    pub option_name: String,
    pub dismiss_action: String,
    pub nonce_field: String,
    pub lighten_factor: f64,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            option_name: DEFAULT_OPTION_NAME.to_string(),
            dismiss_action: DEFAULT_DISMISS_ACTION.to_string(),
            nonce_field: DEFAULT_NONCE_FIELD.to_string(),
            lighten_factor: DEFAULT_LIGHTEN_FACTOR,
        }
    }
}

impl NoticeConfig {
    /// Parses configuration JSON; absent keys keep their defaults.
    ///
    /// # Errors
    /// - `ConfigError::Json` on malformed JSON.
    /// - `ConfigError::Invalid` when a value is out of range.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(ConfigError::Json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.option_name.trim().is_empty() {
            return Err(ConfigError::Invalid("option_name cannot be empty"));
        }
        if self.dismiss_action.trim().is_empty() {
            return Err(ConfigError::Invalid("dismiss_action cannot be empty"));
        }
        if self.nonce_field.trim().is_empty() {
            return Err(ConfigError::Invalid("nonce_field cannot be empty"));
        }
        if !(0.0..=1.0).contains(&self.lighten_factor) {
            return Err(ConfigError::Invalid("lighten_factor must be within 0..=1"));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Json(err) => write!(f, "invalid config json: {err}"),
            Self::Invalid(reason) => write!(f, "invalid config: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, NoticeConfig};

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            NoticeConfig::from_json_str(r#"{"option_name": "my_notices"}"#).expect("valid config");
        assert_eq!(config.option_name, "my_notices");
        assert_eq!(config.dismiss_action, "xwp_anm_dismiss_notice");
        assert_eq!(config.nonce_field, "_wpnonce");
    }

    #[test]
    fn rejects_out_of_range_factor() {
        let err = NoticeConfig::from_json_str(r#"{"lighten_factor": 1.5}"#)
            .expect_err("factor above 1 must fail");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_blank_names() {
        for json in [
            r#"{"option_name": " "}"#,
            r#"{"dismiss_action": ""}"#,
            r#"{"nonce_field": ""}"#,
        ] {
            let err = NoticeConfig::from_json_str(json).expect_err("blank name must fail");
            assert!(matches!(err, ConfigError::Invalid(_)), "{json}");
        }
        let err = NoticeConfig::from_json_str(r#"{"nonce_field": ""}"#).expect_err("blank field");
        assert_eq!(err.to_string(), "invalid config: nonce_field cannot be empty");
    }

    #[test]
    fn reads_config_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("notices.json");
        std::fs::write(&path, r#"{"nonce_field": "token"}"#).expect("write config");

        let config = NoticeConfig::from_json_file(&path).expect("config file");
        assert_eq!(config.nonce_field, "token");
    }
}
