//! Pre-flight checks that a [`ConfigSet`] is consistent, run before any build work starts.

use std::fmt;

use compact_str::CompactString;
use omnibus_cfg::ConfigSet;
use thiserror::Error;

use crate::settings::{S3_ACCESS_KEY, S3_BUCKET, S3_SECRET_KEY, USE_S3_CACHING};

/// A check over a [`ConfigSet`].
type Rule = fn(&ConfigSet) -> Result<(), ValidationError>;

/// All of the rules, run in order.
static RULES: &[(&str, Rule)] = &[("s3_caching", valid_s3_config as Rule)];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid S3 configuration, 'use_s3_caching' is enabled but 's3_bucket' is not set ({0})")]
    InvalidS3Configuration(S3Settings),
}

/// Asserts that `configs` is in a valid state, stopping at the first rule that fails.
pub fn validate(configs: &ConfigSet) -> Result<(), ValidationError> {
    for (name, rule) in RULES {
        tracing::debug!(rule = name, "validating config");
        rule(configs)?;
    }
    Ok(())
}

/// Only the bucket is required, the access and secret keys may be left unset.
fn valid_s3_config(configs: &ConfigSet) -> Result<(), ValidationError> {
    if !USE_S3_CACHING.read(configs) {
        return Ok(());
    }
    match S3_BUCKET.read(configs) {
        Some(bucket) if !bucket.is_empty() => Ok(()),
        _ => Err(ValidationError::InvalidS3Configuration(S3Settings::read(
            configs,
        ))),
    }
}

/// Snapshot of the S3 caching settings, for diagnostics.
#[derive(Clone, PartialEq, Eq)]
pub struct S3Settings {
    pub s3_bucket: Option<CompactString>,
    pub s3_access_key: Option<CompactString>,
    pub s3_secret_key: Option<CompactString>,
}

impl S3Settings {
    pub fn read(configs: &ConfigSet) -> Self {
        S3Settings {
            s3_bucket: S3_BUCKET.read(configs),
            s3_access_key: S3_ACCESS_KEY.read(configs),
            s3_secret_key: S3_SECRET_KEY.read(configs),
        }
    }

    fn secret(&self) -> &'static str {
        match self.s3_secret_key {
            Some(_) => "********",
            None => "<unset>",
        }
    }
}

fn or_unset(val: &Option<CompactString>) -> &str {
    val.as_deref().unwrap_or("<unset>")
}

impl fmt::Display for S3Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "s3_bucket: {}, s3_access_key: {}, s3_secret_key: {}",
            or_unset(&self.s3_bucket),
            or_unset(&self.s3_access_key),
            self.secret(),
        )
    }
}

impl fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Settings")
            .field("s3_bucket", &self.s3_bucket)
            .field("s3_access_key", &self.s3_access_key)
            .field("s3_secret_key", &self.secret())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config_set;

    #[test]
    fn smoketest_defaults_are_valid() {
        let configs = config_set();
        assert_eq!(validate(&configs), Ok(()));
    }

    #[test]
    fn s3_fields_ignored_when_caching_disabled() {
        let configs = config_set();
        configs.set("s3_access_key", "AKIA").unwrap();
        configs.set("s3_bucket", "").unwrap();
        assert_eq!(validate(&configs), Ok(()));
    }

    #[test]
    fn s3_caching_requires_bucket() {
        let configs = config_set();
        configs.set("use_s3_caching", true).unwrap();
        configs.set("s3_access_key", "AKIA").unwrap();
        configs.set("s3_secret_key", "shh").unwrap();

        let err = validate(&configs).unwrap_err();
        let ValidationError::InvalidS3Configuration(settings) = &err;
        assert_eq!(settings.s3_bucket, None);
        assert_eq!(settings.s3_access_key.as_deref(), Some("AKIA"));
        assert_eq!(settings.s3_secret_key.as_deref(), Some("shh"));

        let msg = err.to_string();
        assert!(msg.contains("s3_bucket: <unset>"), "{msg}");
        assert!(msg.contains("s3_access_key: AKIA"), "{msg}");
        assert!(!msg.contains("shh"), "{msg}");
        assert!(!format!("{err:?}").contains("shh"));
    }

    #[test]
    fn s3_caching_rejects_empty_bucket() {
        let configs = config_set();
        configs.set("use_s3_caching", true).unwrap();
        configs.set("s3_bucket", "").unwrap();

        assert!(matches!(
            validate(&configs),
            Err(ValidationError::InvalidS3Configuration(_))
        ));
    }

    #[test]
    fn s3_caching_with_bucket_is_valid() {
        let configs = config_set();
        configs.set("use_s3_caching", true).unwrap();
        configs.set("s3_bucket", "my-bucket").unwrap();

        // Keys are not required.
        assert_eq!(validate(&configs), Ok(()));
    }
}
