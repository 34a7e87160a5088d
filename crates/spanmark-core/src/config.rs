//! spanmark Configuration Management
//!
//! Handles configuration from environment variables and TOML config files,
//! with defaults that reproduce the plain interleaver behavior.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::markup::OverlapPolicy;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Markup rendering configuration
    pub markup: MarkupConfig,

    /// Entity recognizer configuration
    pub extractor: ExtractorConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(EnvOverrides::from_env()?)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::ParseError { message, .. } => ConfigError::ParseError { path, message },
            other => other,
        })
    }

    /// Parse from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.with_overrides(EnvOverrides::from_env()?)
    }

    /// Apply every override that is present, then re-validate
    fn with_overrides(mut self, overrides: EnvOverrides) -> Result<Self, ConfigError> {
        overrides.apply(&mut self);
        self.validate()?;
        Ok(self)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let confidence = self.extractor.min_confidence;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ConfigError::InvalidValue {
                key: "extractor.min_confidence".to_string(),
                value: confidence.to_string(),
            });
        }
        Ok(())
    }
}

/// Values read from the environment; `None` when the variable is unset
#[derive(Debug, Clone, Default)]
struct EnvOverrides {
    overlap_policy: Option<OverlapPolicy>,
    paragraphs: Option<bool>,
    min_confidence: Option<f32>,
    gazetteer_path: Option<PathBuf>,
    log_level: Option<String>,
    json_format: Option<bool>,
}

impl EnvOverrides {
    fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`, which returns a variable's value if set
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let min_confidence = match lookup("SPANMARK_MIN_CONFIDENCE") {
            Some(value) => Some(value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "SPANMARK_MIN_CONFIDENCE".to_string(),
                value,
            })?),
            None => None,
        };

        Ok(Self {
            overlap_policy: lookup("SPANMARK_OVERLAP_POLICY")
                .map(|policy| policy.parse::<OverlapPolicy>())
                .transpose()?,
            paragraphs: lookup("SPANMARK_PARAGRAPHS")
                .map(|flag| parse_bool("SPANMARK_PARAGRAPHS", &flag))
                .transpose()?,
            min_confidence,
            gazetteer_path: lookup("SPANMARK_GAZETTEER").map(PathBuf::from),
            log_level: lookup("LOG_LEVEL"),
            json_format: lookup("LOG_JSON")
                .map(|flag| parse_bool("LOG_JSON", &flag))
                .transpose()?,
        })
    }

    fn apply(self, config: &mut AppConfig) {
        if let Some(policy) = self.overlap_policy {
            config.markup.overlap_policy = policy;
        }
        if let Some(paragraphs) = self.paragraphs {
            config.markup.paragraphs = paragraphs;
        }
        if let Some(confidence) = self.min_confidence {
            config.extractor.min_confidence = confidence;
        }
        if let Some(path) = self.gazetteer_path {
            config.extractor.gazetteer_path = Some(path);
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(json_format) = self.json_format {
            config.logging.json_format = json_format;
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Markup rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    /// How overlapping spans are treated
    pub overlap_policy: OverlapPolicy,

    /// Turn blank lines into `<p/>` breaks after rendering
    pub paragraphs: bool,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            overlap_policy: OverlapPolicy::Reject,
            paragraphs: false,
        }
    }
}

/// Entity recognizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Drop recognized entities below this confidence
    pub min_confidence: f32,

    /// Extra gazetteer entries (JSON file)
    pub gazetteer_path: Option<PathBuf>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            gazetteer_path: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.markup.overlap_policy, OverlapPolicy::Reject);
        assert!(!config.markup.paragraphs);
        assert_eq!(config.logging.level, "warn");
        assert!(config.extractor.gazetteer_path.is_none());
    }

    #[test]
    fn test_overlap_policy_parse() {
        assert_eq!(
            "reject".parse::<OverlapPolicy>().unwrap(),
            OverlapPolicy::Reject
        );
        assert_eq!(
            "last-wins".parse::<OverlapPolicy>().unwrap(),
            OverlapPolicy::LastWins
        );
        assert_eq!(
            "LAST_WINS".parse::<OverlapPolicy>().unwrap(),
            OverlapPolicy::LastWins
        );
        assert!("merge".parse::<OverlapPolicy>().is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "yes").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config = AppConfig::from_toml_str(
            r#"
            [markup]
            overlap_policy = "last_wins"

            [logging]
            json_format = true
            "#,
        )
        .unwrap();

        assert_eq!(config.markup.overlap_policy, OverlapPolicy::LastWins);
        assert!(!config.markup.paragraphs);
        assert!(config.logging.json_format);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_toml_rejects_bad_confidence() {
        let err = AppConfig::from_toml_str("[extractor]\nmin_confidence = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[markup]\nparagraphs = true").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert!(config.markup.paragraphs);
    }

    #[test]
    fn test_from_missing_file() {
        let err = AppConfig::from_file("/nonexistent/spanmark.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError { .. }));
    }
    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_every_field() {
        let overrides = EnvOverrides::from_lookup(lookup_from(&[
            ("SPANMARK_OVERLAP_POLICY", "last-wins"),
            ("SPANMARK_PARAGRAPHS", "true"),
            ("SPANMARK_MIN_CONFIDENCE", "0.8"),
            ("SPANMARK_GAZETTEER", "/etc/spanmark/gazetteer.json"),
            ("LOG_LEVEL", "debug"),
            ("LOG_JSON", "1"),
        ]))
        .unwrap();

        let config = AppConfig::default().with_overrides(overrides).unwrap();
        assert_eq!(config.markup.overlap_policy, OverlapPolicy::LastWins);
        assert!(config.markup.paragraphs);
        assert_eq!(config.extractor.min_confidence, 0.8);
        assert_eq!(
            config.extractor.gazetteer_path,
            Some(PathBuf::from("/etc/spanmark/gazetteer.json"))
        );
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
    }

    #[test]
    fn test_unset_env_keeps_file_values() {
        let file_config = AppConfig::from_toml_str(
            "[markup]\noverlap_policy = \"last_wins\"\n[logging]\nlevel = \"info\"\n",
        )
        .unwrap();

        let overrides = EnvOverrides::from_lookup(lookup_from(&[])).unwrap();
        let config = file_config.with_overrides(overrides).unwrap();
        assert_eq!(config.markup.overlap_policy, OverlapPolicy::LastWins);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_env_resets_file_values_to_defaults() {
        let file_config = AppConfig::from_toml_str(
            r#"
            [markup]
            overlap_policy = "last_wins"
            paragraphs = true

            [extractor]
            min_confidence = 0.9

            [logging]
            level = "debug"
            json_format = true
            "#,
        )
        .unwrap();

        let overrides = EnvOverrides::from_lookup(lookup_from(&[
            ("SPANMARK_OVERLAP_POLICY", "reject"),
            ("SPANMARK_PARAGRAPHS", "false"),
            ("SPANMARK_MIN_CONFIDENCE", "0.5"),
            ("LOG_LEVEL", "warn"),
            ("LOG_JSON", "false"),
        ]))
        .unwrap();

        let config = file_config.with_overrides(overrides).unwrap();
        assert_eq!(config.markup.overlap_policy, OverlapPolicy::Reject);
        assert!(!config.markup.paragraphs);
        assert_eq!(config.extractor.min_confidence, 0.5);
        assert_eq!(config.logging.level, "warn");
        assert!(!config.logging.json_format);
    }

    #[test]
    fn test_env_confidence_out_of_range() {
        let overrides =
            EnvOverrides::from_lookup(lookup_from(&[("SPANMARK_MIN_CONFIDENCE", "5")])).unwrap();
        let err = AppConfig::default().with_overrides(overrides).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_env_malformed_values() {
        for (key, value) in [
            ("SPANMARK_OVERLAP_POLICY", "merge"),
            ("SPANMARK_PARAGRAPHS", "sometimes"),
            ("SPANMARK_MIN_CONFIDENCE", "high"),
            ("LOG_JSON", "maybe"),
        ] {
            let result = EnvOverrides::from_lookup(lookup_from(&[(key, value)]));
            assert!(
                matches!(result, Err(ConfigError::InvalidValue { .. })),
                "{key}={value} should be rejected"
            );
        }
    }

    // The only test that touches the process environment.
    #[test]
    fn test_process_env() {
        std::env::set_var("SPANMARK_OVERLAP_POLICY", "reject");
        std::env::set_var("SPANMARK_PARAGRAPHS", "false");
        std::env::set_var("SPANMARK_MIN_CONFIDENCE", "0.7");

        let from_env = AppConfig::from_env();
        let file_config =
            AppConfig::from_toml_str("[markup]\noverlap_policy = \"last_wins\"\nparagraphs = true\n")
                .unwrap();
        let merged = file_config.with_env_override();

        std::env::set_var("SPANMARK_MIN_CONFIDENCE", "5");
        let out_of_range = AppConfig::from_env();

        std::env::remove_var("SPANMARK_OVERLAP_POLICY");
        std::env::remove_var("SPANMARK_PARAGRAPHS");
        std::env::remove_var("SPANMARK_MIN_CONFIDENCE");

        let from_env = from_env.unwrap();
        assert_eq!(from_env.markup.overlap_policy, OverlapPolicy::Reject);
        assert_eq!(from_env.extractor.min_confidence, 0.7);

        let merged = merged.unwrap();
        assert_eq!(merged.markup.overlap_policy, OverlapPolicy::Reject);
        assert!(!merged.markup.paragraphs);

        assert!(matches!(
            out_of_range,
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
