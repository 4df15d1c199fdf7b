//! Table construction and configuration errors
//!
//! Only building a table and loading tuning can fail. Everything that happens
//! inside a simulation step is absorbed locally (logged, then ignored) so one
//! bad contact can never halt the loop.

use std::fmt;

/// Errors surfaced while building a table or loading its tuning
#[derive(Debug)]
pub enum TableError {
    /// Required geometry was not supplied; the table cannot exist without it
    MissingGeometry {
        /// Which piece of geometry was absent
        asset: &'static str,
    },

    /// A light label did not have the `group:index` shape, or named an unknown group
    BadLightLabel {
        label: String,
    },

    /// Light index outside the group's fixed length
    LightIndexOutOfRange {
        group: &'static str,
        index: usize,
        len: usize,
    },

    /// Preset name not recognized
    UnknownPreset {
        name: String,
    },

    /// Tuning document was written for a different format version
    UnsupportedVersion {
        found: u32,
        expected: u32,
    },

    /// Tuning document could not be read
    TuningRead {
        path: String,
        source: std::io::Error,
    },

    /// Tuning document could not be parsed
    TuningParse(serde_json::Error),

    /// A tuning value is outside the range the table can work with
    InvalidTuning {
        name: &'static str,
        reason: &'static str,
    },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::MissingGeometry { asset } => {
                write!(f, "required table geometry '{}' is missing", asset)
            }
            TableError::BadLightLabel { label } => {
                write!(f, "malformed light label '{}' (expected group:index)", label)
            }
            TableError::LightIndexOutOfRange { group, index, len } => write!(
                f,
                "light index {} out of range for group '{}' (len {})",
                index, group, len
            ),
            TableError::UnknownPreset { name } => write!(f, "unknown table preset '{}'", name),
            TableError::UnsupportedVersion { found, expected } => write!(
                f,
                "tuning version {} is not supported (expected {})",
                found, expected
            ),
            TableError::TuningRead { path, source } => {
                write!(f, "failed to read tuning '{}': {}", path, source)
            }
            TableError::TuningParse(err) => write!(f, "failed to parse tuning: {}", err),
            TableError::InvalidTuning { name, reason } => {
                write!(f, "invalid tuning value '{}': {}", name, reason)
            }
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableError::TuningParse(err) => Some(err),
            TableError::TuningRead { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TableError {
    fn from(err: serde_json::Error) -> Self {
        TableError::TuningParse(err)
    }
}

/// Convenience alias: a `Result` using `TableError` as the error type.
pub type TableResult<T> = Result<T, TableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_asset() {
        let err = TableError::MissingGeometry { asset: "board" };
        assert!(err.to_string().contains("board"));
    }

    #[test]
    fn test_parse_error_has_source() {
        let parse = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = TableError::from(parse);
        assert!(std::error::Error::source(&err).is_some());
    }
}
