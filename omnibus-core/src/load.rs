//! Loading overrides into a [`ConfigSet`].
//!
//! Overrides get applied on top of the defaults in the following order, later sources win:
//!
//! 1. A TOML config file of `setting = value` pairs, [`CONFIG_FILENAME`] by default.
//! 2. Environment variables named `OMNIBUS_<SETTING>`.
//! 3. `setting=value` strings, generally from the command line.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use omnibus_cfg::{ConfigError, ConfigSet, DynConfigValue, ValueKind};
use omnibus_ore::env::parse_flag;
use thiserror::Error;

/// Name of the config file we look for in the current directory.
pub static CONFIG_FILENAME: &str = "omnibus.toml";

/// Prefix of the environment variables that override settings.
pub static ENV_PREFIX: &str = "OMNIBUS_";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config file '{path}': {source}")]
    InvalidFile {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error("invalid environment variable '{var}': {source}")]
    InvalidEnv {
        var: String,
        #[source]
        source: ConfigError,
    },

    #[error("malformed override '{0}', expected 'setting=value'")]
    MalformedOverride(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everywhere overrides can come from.
#[derive(Debug, Default, Clone)]
pub struct Sources {
    /// Config file to load, if any.
    pub file: Option<PathBuf>,
    /// Environment variables, generally [`std::env::vars_os`].
    pub env: Vec<(OsString, OsString)>,
    /// `setting=value` overrides.
    pub overrides: Vec<String>,
}

impl Sources {
    /// Overrides from the current process: an explicitly provided config file, or
    /// [`CONFIG_FILENAME`] if it exists in the current directory, and the environment.
    pub fn from_process(file: Option<PathBuf>, overrides: Vec<String>) -> Self {
        let file = file.or_else(|| {
            let cwd = std::env::current_dir().ok()?;
            default_file(&cwd)
        });
        Sources {
            file,
            env: std::env::vars_os().collect(),
            overrides,
        }
    }
}

/// Returns the path to [`CONFIG_FILENAME`] within `dir`, if it exists.
pub fn default_file(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(CONFIG_FILENAME);
    path.is_file().then_some(path)
}

/// Builds a [`ConfigSet`] with all of the defaults and then applies every override from
/// `sources`.
pub fn load(sources: &Sources) -> Result<ConfigSet, LoadError> {
    let configs = crate::config_set();

    if let Some(path) = &sources.file {
        apply_file(&configs, path)?;
    }
    apply_env(&configs, sources.env.iter().cloned())?;
    apply_overrides(&configs, &sources.overrides)?;

    Ok(configs)
}

/// Applies every `setting = value` pair from the TOML file at `path`.
pub fn apply_file(configs: &ConfigSet, path: &Path) -> Result<(), LoadError> {
    tracing::info!(?path, "loading config file");

    let raw = std::fs::read_to_string(path).map_err(|source| LoadError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let table: toml::Table = toml::from_str(&raw).map_err(|source| LoadError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    apply_table(configs, &table).map_err(|source| LoadError::InvalidFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Applies every `setting = value` pair in `table`, only strings and booleans are supported.
///
/// Every pair is checked before any is applied, so on error `configs` is left untouched.
pub fn apply_table(configs: &ConfigSet, table: &toml::Table) -> Result<(), ConfigError> {
    let mut updates = Vec::with_capacity(table.len());
    for (name, value) in table {
        let expected = configs.kind(name)?;
        let value = match value {
            toml::Value::Boolean(val) => DynConfigValue::Bool(*val),
            toml::Value::String(val) => DynConfigValue::from(val.as_str()),
            other => return Err(ConfigError::mismatch(name, expected, other.type_str())),
        };
        if !expected.accepts(&value) {
            return Err(ConfigError::mismatch(name, expected, value.type_name()));
        }
        updates.push((name, value));
    }

    for (name, value) in updates {
        configs.set(name, value)?;
    }
    Ok(())
}

/// Applies every `OMNIBUS_<SETTING>` variable in `vars`.
///
/// Boolean settings accept `1`, `yes`, `true`, `on` and `0`, `no`, `false`, `off` or an empty
/// value, anything else is an error. Variables that don't name a setting are skipped.
pub fn apply_env<I>(configs: &ConfigSet, vars: I) -> Result<(), LoadError>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    for (var, value) in vars {
        let Some(var) = var.to_str() else {
            continue;
        };
        let Some(name) = var.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let name = name.to_ascii_lowercase();

        let Ok(kind) = configs.kind(&name) else {
            tracing::warn!(var, "ignoring environment variable for unknown setting");
            continue;
        };
        let result = match kind {
            ValueKind::Bool => match parse_flag(&value) {
                Some(flag) => configs.set(&name, flag),
                None => Err(ConfigError::Parse {
                    name: CompactString::new(&name),
                    expected: ValueKind::Bool,
                    value: value.to_string_lossy().into_owned(),
                }),
            },
            ValueKind::String | ValueKind::OptionalString => {
                let Some(value) = value.to_str() else {
                    tracing::warn!(var, "ignoring environment variable with non UTF-8 value");
                    continue;
                };
                configs.try_update(&name, value)
            }
        };
        result.map_err(|source| LoadError::InvalidEnv {
            var: var.to_string(),
            source,
        })?;
        tracing::debug!(var, "applied environment override");
    }
    Ok(())
}

/// Applies `setting=value` overrides, e.g. `use_s3_caching=true`. Whitespace around the
/// setting and the value is ignored.
pub fn apply_overrides(configs: &ConfigSet, overrides: &[String]) -> Result<(), LoadError> {
    for raw in overrides {
        let Some((name, value)) = raw.split_once('=') else {
            return Err(LoadError::MalformedOverride(raw.clone()));
        };
        configs.try_update(name.trim(), value.trim())?;
    }
    Ok(())
}
