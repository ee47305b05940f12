//! Configuration settings for `omnibus`.
//!
//! Settings are declared as `static` [`Config`]s, registered once on a [`ConfigSetBuilder`],
//! and then read and overridden through the resulting [`ConfigSet`]. A [`ConfigSet`] is cheap
//! to clone and every clone observes the same values.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{
    Arc, RwLock,
    atomic::{AtomicBool, Ordering},
};

use compact_str::CompactString;
use omnibus_ore::assert_none;

mod error;

pub use error::ConfigError;

/// Printed in place of the value of a sensitive [`Config`].
static REDACTED: &str = "********";

/// A single configuration setting.
pub struct Config<V: ConfigDefault> {
    name: &'static str,
    desc: &'static str,
    value: V,
    sensitive: bool,
}

impl<V: ConfigDefault> Config<V> {
    /// Define a new [`Config`] with a default value.
    pub const fn new(name: &'static str, desc: &'static str, default: V) -> Self {
        Config {
            name,
            desc,
            value: default,
            sensitive: false,
        }
    }

    /// Marks this [`Config`] as a secret, its value will never be displayed.
    pub const fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn desc(&self) -> &'static str {
        self.desc
    }

    /// Read the value of this [`Config`] from the provided [`ConfigSet`].
    ///
    /// # Panics
    /// * If this [`Config`] was never registered with the [`ConfigSetBuilder`].
    pub fn read(&self, set: &ConfigSet) -> V::StoredValue {
        let Some(entry) = set.configs.get(self.name) else {
            panic!("tried to read unregistered config {}", self.name);
        };
        V::from_dyn(&entry.value)
    }
}

/// A thread-safe shareable set of [`Config`]s.
#[derive(Clone, Debug)]
pub struct ConfigSet {
    configs: Arc<BTreeMap<CompactString, ConfigSetEntry>>,
}

impl ConfigSet {
    /// Returns a new [`ConfigSetBuilder`].
    pub fn builder() -> ConfigSetBuilder {
        ConfigSetBuilder::default()
    }

    fn entry(&self, name: &str) -> Result<&ConfigSetEntry, ConfigError> {
        self.configs
            .get(name)
            .ok_or_else(|| ConfigError::unknown(name))
    }

    /// Returns the current value of the config named `name`.
    pub fn get(&self, name: &str) -> Result<DynConfigValue, ConfigError> {
        Ok(self.entry(name)?.value.load())
    }

    /// Overrides the config named `name` with `value`.
    ///
    /// # Errors
    ///
    /// * If no config named `name` exists in this set.
    /// * If `value` is not the kind of value the config holds.
    ///
    pub fn set(&self, name: &str, value: impl Into<DynConfigValue>) -> Result<(), ConfigError> {
        let entry = self.entry(name)?;
        let kind = entry.value.kind();
        entry
            .value
            .update(value.into())
            .map_err(|rejected| ConfigError::mismatch(name, kind, rejected.type_name()))?;
        tracing::debug!(name, %kind, "config overridden");
        Ok(())
    }

    /// Update the config named `name` by parsing `value`.
    ///
    /// # Errors
    ///
    /// * If no config named `name` exists in this set.
    /// * If the config specified by `name` cannot parse `value`.
    ///
    pub fn try_update(&self, name: &str, value: &str) -> Result<(), ConfigError> {
        let kind = self.entry(name)?.value.kind();
        let parsed = kind.parse(value).ok_or_else(|| ConfigError::Parse {
            name: CompactString::new(name),
            expected: kind,
            value: value.to_string(),
        })?;
        self.set(name, parsed)
    }

    /// Clears the optional config named `name`.
    pub fn unset(&self, name: &str) -> Result<(), ConfigError> {
        self.set(name, DynConfigValue::Unset)
    }

    /// Update [`Config`] in this [`ConfigSet`] with the specified value.
    ///
    /// # Panics
    /// * If [`Config`] was not previously registered with the original [`ConfigSetBuilder`].
    pub fn update<V: ConfigDefault>(&self, config: &'static Config<V>, value: V) {
        let entry = self
            .configs
            .get(config.name)
            .expect("tried to update unregistered config");
        if let Err(rejected) = entry.value.update(value.into_stored().into_dyn()) {
            unreachable!("tried to update {} with {rejected:?}", config.name);
        }
    }

    /// Returns the kind of value held by the config named `name`.
    pub fn kind(&self, name: &str) -> Result<ValueKind, ConfigError> {
        Ok(self.entry(name)?.value.kind())
    }

    /// Returns the description of the config named `name`.
    pub fn desc(&self, name: &str) -> Result<&'static str, ConfigError> {
        Ok(self.entry(name)?.desc)
    }

    /// Returns the current value of `name` formatted for display, secrets are redacted.
    pub fn display_value(&self, name: &str) -> Result<String, ConfigError> {
        Ok(self.entry(name)?.render())
    }

    /// Names of all the configs in this set, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.configs.keys().map(|name| name.as_str())
    }
}

impl fmt::Display for ConfigSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, entry) in &*self.configs {
            writeln!(f, "{} => {}\n\t└─ '{}'", name, entry.render(), entry.desc)?;
        }
        Ok(())
    }
}

/// Single entry within a [`ConfigSet`].
#[derive(Clone, Debug)]
pub struct ConfigSetEntry {
    value: DynConfigValueShared,
    desc: &'static str,
    sensitive: bool,
}

impl ConfigSetEntry {
    fn render(&self) -> String {
        match self.value.load() {
            DynConfigValue::Unset => DynConfigValue::Unset.to_string(),
            _ if self.sensitive => REDACTED.to_string(),
            value => value.to_string(),
        }
    }
}

/// A builder for a [`ConfigSet`].
#[derive(Default, Debug)]
pub struct ConfigSetBuilder {
    configs: BTreeMap<CompactString, ConfigSetEntry>,
}

impl ConfigSetBuilder {
    /// Register a [`Config`] into this [`ConfigSetBuilder`] with the default value.
    ///
    /// The default is evaluated here, once, so defaults computed at runtime (e.g. the current
    /// directory) are captured when the set is built and not on every read.
    pub fn register<V: ConfigDefault>(&mut self, config: &'static Config<V>) -> &mut Self {
        let value = match V::KIND.share(config.value.into_stored().into_dyn()) {
            Ok(value) => value,
            Err(rejected) => unreachable!("default {rejected:?} is not {}", V::KIND),
        };
        let entry = ConfigSetEntry {
            value,
            desc: config.desc,
            sensitive: config.sensitive,
        };
        let prev = self
            .configs
            .insert(CompactString::const_new(config.name), entry);
        assert_none!(prev, "config '{}' registered more than once", config.name);
        self
    }

    /// Consumes this [`ConfigSetBuilder`] construting a [`ConfigSet`].
    pub fn build(self) -> ConfigSet {
        tracing::trace!(count = self.configs.len(), "built config set");
        ConfigSet {
            configs: Arc::new(self.configs),
        }
    }
}

/// The kinds of values a [`Config`] can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    String,
    /// A string that may also be unset.
    OptionalString,
}

impl ValueKind {
    /// Parses `raw` into a value of this kind, `true` or `false` for booleans.
    pub fn parse(self, raw: &str) -> Option<DynConfigValue> {
        match self {
            ValueKind::Bool => raw.parse().ok().map(DynConfigValue::Bool),
            ValueKind::String | ValueKind::OptionalString => {
                Some(DynConfigValue::String(CompactString::new(raw)))
            }
        }
    }

    /// Returns `true` if a config of this kind can hold `value`.
    pub fn accepts(self, value: &DynConfigValue) -> bool {
        matches!(
            (self, value),
            (ValueKind::Bool, DynConfigValue::Bool(_))
                | (ValueKind::String, DynConfigValue::String(_))
                | (ValueKind::OptionalString, DynConfigValue::String(_))
                | (ValueKind::OptionalString, DynConfigValue::Unset)
        )
    }

    fn share(self, value: DynConfigValue) -> Result<DynConfigValueShared, DynConfigValue> {
        let shared = match (self, value) {
            (ValueKind::Bool, DynConfigValue::Bool(val)) => {
                DynConfigValueShared::Bool(Arc::new(AtomicBool::new(val)))
            }
            (ValueKind::String, DynConfigValue::String(val)) => {
                DynConfigValueShared::String(Arc::new(RwLock::new(val)))
            }
            (ValueKind::OptionalString, DynConfigValue::String(val)) => {
                DynConfigValueShared::OptionalString(Arc::new(RwLock::new(Some(val))))
            }
            (ValueKind::OptionalString, DynConfigValue::Unset) => {
                DynConfigValueShared::OptionalString(Arc::new(RwLock::new(None)))
            }
            (_, value) => return Err(value),
        };
        Ok(shared)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let desc = match self {
            ValueKind::Bool => "a boolean",
            ValueKind::String => "a string",
            ValueKind::OptionalString => "an optional string",
        };
        f.write_str(desc)
    }
}

/// Types that can be provided as a default to a [`Config`].
pub trait ConfigDefault {
    /// The type that actually gets stored in a [`ConfigSet`].
    type StoredValue: ConfigValue;
    /// The kind of value the [`Config`] holds.
    const KIND: ValueKind;

    fn into_stored(&self) -> Self::StoredValue;
    fn from_dyn(val: &DynConfigValueShared) -> Self::StoredValue;
}

impl ConfigDefault for bool {
    type StoredValue = bool;
    const KIND: ValueKind = ValueKind::Bool;

    fn into_stored(&self) -> Self::StoredValue {
        *self
    }

    fn from_dyn(val: &DynConfigValueShared) -> Self::StoredValue {
        let DynConfigValueShared::Bool(val) = val else {
            panic!("programming error, found {val:?} for bool")
        };
        val.load(Ordering::SeqCst)
    }
}

impl ConfigDefault for &str {
    type StoredValue = CompactString;
    const KIND: ValueKind = ValueKind::String;

    fn into_stored(&self) -> Self::StoredValue {
        CompactString::new(self)
    }

    fn from_dyn(val: &DynConfigValueShared) -> Self::StoredValue {
        read_string(val)
    }
}

impl ConfigDefault for String {
    type StoredValue = CompactString;
    const KIND: ValueKind = ValueKind::String;

    fn into_stored(&self) -> Self::StoredValue {
        CompactString::new(self)
    }

    fn from_dyn(val: &DynConfigValueShared) -> Self::StoredValue {
        read_string(val)
    }
}

/// A string default that is computed when the [`ConfigSet`] gets built.
impl ConfigDefault for fn() -> CompactString {
    type StoredValue = CompactString;
    const KIND: ValueKind = ValueKind::String;

    fn into_stored(&self) -> Self::StoredValue {
        (*self)()
    }

    fn from_dyn(val: &DynConfigValueShared) -> Self::StoredValue {
        read_string(val)
    }
}

impl ConfigDefault for Option<&str> {
    type StoredValue = Option<CompactString>;
    const KIND: ValueKind = ValueKind::OptionalString;

    fn into_stored(&self) -> Self::StoredValue {
        self.map(CompactString::new)
    }

    fn from_dyn(val: &DynConfigValueShared) -> Self::StoredValue {
        let DynConfigValueShared::OptionalString(val) = val else {
            panic!("programming error, found {val:?} for optional string")
        };
        let read_lock = val
            .read()
            .expect("DynConfigValueShared::OptionalString lock poisoned");
        read_lock.clone()
    }
}

fn read_string(val: &DynConfigValueShared) -> CompactString {
    let DynConfigValueShared::String(val) = val else {
        panic!("programming error, found {val:?} for string")
    };
    let read_lock = val
        .read()
        .expect("DynConfigValueShared::String lock poisoned");
    read_lock.clone()
}

pub trait ConfigValue {
    fn into_dyn(self) -> DynConfigValue;
}

impl ConfigValue for bool {
    fn into_dyn(self) -> DynConfigValue {
        DynConfigValue::Bool(self)
    }
}

impl ConfigValue for CompactString {
    fn into_dyn(self) -> DynConfigValue {
        DynConfigValue::String(self)
    }
}

impl ConfigValue for Option<CompactString> {
    fn into_dyn(self) -> DynConfigValue {
        match self {
            Some(val) => DynConfigValue::String(val),
            None => DynConfigValue::Unset,
        }
    }
}

/// "Type erased" configuration values.
///
/// We prefer an enum as opposed to something like `Box<dyn Value>` because enums offer better
/// performance and are easier to reason about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DynConfigValue {
    Bool(bool),
    String(CompactString),
    /// No value, only valid for [`ValueKind::OptionalString`].
    Unset,
}

impl DynConfigValue {
    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            DynConfigValue::Bool(_) => "bool",
            DynConfigValue::String(_) => "string",
            DynConfigValue::Unset => "unset",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DynConfigValue::Bool(val) => Some(*val),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DynConfigValue::String(val) => Some(val.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for DynConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynConfigValue::Bool(val) => write!(f, "{val}"),
            DynConfigValue::String(val) => write!(f, "{val}"),
            DynConfigValue::Unset => write!(f, "<unset>"),
        }
    }
}

impl From<bool> for DynConfigValue {
    fn from(val: bool) -> Self {
        DynConfigValue::Bool(val)
    }
}

impl From<&str> for DynConfigValue {
    fn from(val: &str) -> Self {
        DynConfigValue::String(CompactString::new(val))
    }
}

impl From<String> for DynConfigValue {
    fn from(val: String) -> Self {
        DynConfigValue::String(CompactString::from(val))
    }
}

impl From<CompactString> for DynConfigValue {
    fn from(val: CompactString) -> Self {
        DynConfigValue::String(val)
    }
}

impl From<Option<&str>> for DynConfigValue {
    fn from(val: Option<&str>) -> Self {
        match val {
            Some(val) => DynConfigValue::from(val),
            None => DynConfigValue::Unset,
        }
    }
}

/// Shareable instance of [`DynConfigValue`].
#[derive(Clone, Debug)]
pub enum DynConfigValueShared {
    Bool(Arc<AtomicBool>),
    String(Arc<RwLock<CompactString>>),
    OptionalString(Arc<RwLock<Option<CompactString>>>),
}

impl DynConfigValueShared {
    pub fn kind(&self) -> ValueKind {
        match self {
            DynConfigValueShared::Bool(_) => ValueKind::Bool,
            DynConfigValueShared::String(_) => ValueKind::String,
            DynConfigValueShared::OptionalString(_) => ValueKind::OptionalString,
        }
    }

    /// Returns a snapshot of the current value.
    pub fn load(&self) -> DynConfigValue {
        match self {
            DynConfigValueShared::Bool(val) => DynConfigValue::Bool(val.load(Ordering::SeqCst)),
            DynConfigValueShared::String(val) => {
                let read_lock = val
                    .read()
                    .expect("DynConfigValueShared::String lock poisoned");
                DynConfigValue::String(read_lock.clone())
            }
            DynConfigValueShared::OptionalString(val) => {
                let read_lock = val
                    .read()
                    .expect("DynConfigValueShared::OptionalString lock poisoned");
                read_lock.clone().into_dyn()
            }
        }
    }

    /// Stores `value`, handing it back if it's the wrong kind.
    pub fn update(&self, value: DynConfigValue) -> Result<(), DynConfigValue> {
        match (self, value) {
            (DynConfigValueShared::Bool(shared), DynConfigValue::Bool(val)) => {
                shared.store(val, Ordering::SeqCst);
            }
            (DynConfigValueShared::String(shared), DynConfigValue::String(val)) => {
                let mut write_lock = shared
                    .write()
                    .expect("DynConfigValueShared::String lock poisoned");
                *write_lock = val;
            }
            (DynConfigValueShared::OptionalString(shared), DynConfigValue::String(val)) => {
                let mut write_lock = shared
                    .write()
                    .expect("DynConfigValueShared::OptionalString lock poisoned");
                *write_lock = Some(val);
            }
            (DynConfigValueShared::OptionalString(shared), DynConfigValue::Unset) => {
                let mut write_lock = shared
                    .write()
                    .expect("DynConfigValueShared::OptionalString lock poisoned");
                *write_lock = None;
            }
            (_, rejected) => return Err(rejected),
        }
        Ok(())
    }
}

impl fmt::Display for DynConfigValueShared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.load())
    }
}
