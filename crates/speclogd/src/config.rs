use serde::{Deserialize, Serialize};
use serde_json::Value;
use speclog::config::unwrap_section;
use speclog::{ConfigError, ParserConfig};

pub const DEFAULT_LANGUAGE_ID: &str = "spec-log";

/// Settings accepted through `initializationOptions` and
/// `workspace/didChangeConfiguration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Documents with any other language id are ignored.
    pub language_id: String,
    #[serde(flatten)]
    pub parser: ParserConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            language_id: DEFAULT_LANGUAGE_ID.to_string(),
            parser: ParserConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let value = unwrap_section(value);
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use speclog::AbsorptionPolicy;

    #[test]
    fn test_flattened_parser_settings() {
        let config = ServerConfig::from_value(json!({
            "languageId": "fourc-log",
            "absorption": "split",
            "scanBlocks": false
        }))
        .unwrap();
        assert_eq!(config.language_id, "fourc-log");
        assert_eq!(config.parser.absorption, AbsorptionPolicy::Split);
        assert!(!config.parser.scan_blocks);
        assert!(config.parser.document_links);
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_value(json!({ "specLog": {} })).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.language_id, "spec-log");
    }
}
