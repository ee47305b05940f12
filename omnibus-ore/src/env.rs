//! Utilities for reading environment variables.

use std::ffi::OsStr;

/// Values that are considered "true" for an environment variable, compared case-insensitively.
static TRUTHY: &[&str] = &["1", "yes", "true", "on"];
/// Values that are considered "false" for an environment variable, compared case-insensitively.
static FALSEY: &[&str] = &["0", "", "no", "false", "off"];

/// Parses the value of an environment variable used as a flag.
///
/// Returns `Some(true)` for `'1', 'yes', 'true', 'on'`, `Some(false)` for
/// `'0', '', 'no', 'false', 'off'`, and `None` for anything else.
pub fn parse_flag(value: &OsStr) -> Option<bool> {
    let value = value.to_ascii_lowercase();
    if TRUTHY.iter().any(|truthy| value == *truthy) {
        Some(true)
    } else if FALSEY.iter().any(|falsey| value == *falsey) {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn smoketest_flags() {
        for val in ["1", "yes", "true", "TRUE", "On"] {
            assert_eq!(parse_flag(OsStr::new(val)), Some(true), "{val}");
        }
        for val in ["0", "", "no", "NO", "false", "False", "off"] {
            assert_eq!(parse_flag(OsStr::new(val)), Some(false), "{val}");
        }
    }

    #[test]
    fn unrecognized_flags() {
        for val in ["maybe", "2", "enabled", " true"] {
            assert_eq!(parse_flag(OsStr::new(val)), None, "{val}");
        }
    }
}
