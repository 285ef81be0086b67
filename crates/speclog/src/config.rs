use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Which rows count as bulk data for folding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AbsorptionPolicy {
    /// Only rows made of numbers.
    Numeric,
    /// Rows made of numbers, times and timestamps, all in one class.
    #[default]
    Temporal,
    /// Like `Temporal`, but a run of pure numbers and a run containing
    /// timestamps are kept apart even when adjacent.
    Split,
}

/// Tunables for [`OutlineParser`](crate::OutlineParser).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParserConfig {
    pub absorption: AbsorptionPolicy,
    /// Attach scan entries (and fold their data block) under prompts.
    pub scan_blocks: bool,
    /// Emit links for `file=` paths in scan headers.
    pub document_links: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            absorption: AbsorptionPolicy::default(),
            scan_blocks: true,
            document_links: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid spec-log settings: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Key under which editors usually nest the settings of this tool.
pub const SETTINGS_SECTION: &str = "specLog";

impl ParserConfig {
    /// Reads the settings from a JSON object, either bare or nested under
    /// [`SETTINGS_SECTION`]. `null` yields the defaults.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let value = unwrap_section(value);
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Strips the [`SETTINGS_SECTION`] wrapper if present.
pub fn unwrap_section(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key(SETTINGS_SECTION) => {
            map.remove(SETTINGS_SECTION).unwrap_or(Value::Null)
        }
        other => other,
    }
}
