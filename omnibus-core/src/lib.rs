//! The settings every `omnibus` build reads, how they get loaded, and the checks that run
//! before any build work starts.
//!
//! There is no global config, build a [`ConfigSet`] once with [`config_set`] (or
//! [`load::load`] to include overrides) and hand it to everything that needs it.

use omnibus_cfg::ConfigSet;

pub mod load;
pub mod paths;
pub mod settings;
pub mod validate;

pub use validate::{S3Settings, ValidationError, validate};

/// Returns a [`ConfigSet`] with every setting registered at its default value.
pub fn config_set() -> ConfigSet {
    let mut builder = ConfigSet::builder();
    settings::register_configs(&mut builder);
    builder.build()
}
