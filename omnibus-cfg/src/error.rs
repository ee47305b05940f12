use compact_str::CompactString;
use thiserror::Error;

use crate::ValueKind;

/// Errors from reading or writing a [`ConfigSet`] by name.
///
/// [`ConfigSet`]: crate::ConfigSet
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown setting '{name}'")]
    UnknownSetting { name: CompactString },

    #[error("setting '{name}' expects {expected} value, found {found}")]
    TypeMismatch {
        name: CompactString,
        expected: ValueKind,
        found: &'static str,
    },

    #[error("setting '{name}' expects {expected} value, could not parse '{value}'")]
    Parse {
        name: CompactString,
        expected: ValueKind,
        value: String,
    },
}

impl ConfigError {
    pub(crate) fn unknown(name: &str) -> Self {
        ConfigError::UnknownSetting {
            name: CompactString::new(name),
        }
    }

    pub fn mismatch(name: &str, expected: ValueKind, found: &'static str) -> Self {
        ConfigError::TypeMismatch {
            name: CompactString::new(name),
            expected,
            found,
        }
    }
}
