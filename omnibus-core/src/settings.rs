//! Every [`Config`] that an `omnibus` run knows about.

use compact_str::CompactString;
use omnibus_cfg::{Config, ConfigSetBuilder};

// Directories.

pub static CACHE_DIR: Config<&'static str> = Config::new(
    "cache_dir",
    "The absolute path to the directory on the build machine where code will be cached.",
    "/var/cache/omnibus/cache",
);

pub static SOURCE_DIR: Config<&'static str> = Config::new(
    "source_dir",
    "The absolute path to the directory on the build machine where source code will be downloaded.",
    "/var/cache/omnibus/src",
);

pub static BUILD_DIR: Config<&'static str> = Config::new(
    "build_dir",
    "The absolute path to the directory on the build machine where software will be built.",
    "/var/cache/omnibus/build",
);

pub static PACKAGE_DIR: Config<&'static str> = Config::new(
    "package_dir",
    "The absolute path to the directory on the build machine where packages will be constructed.",
    "/var/cache/omnibus/pkg",
);

/// Relative to [`PROJECT_ROOT`].
pub static PROJECT_DIR: Config<&'static str> = Config::new(
    "project_dir",
    "The relative path of the directory containing project definitions.",
    "config/projects",
);

/// Relative to [`PROJECT_ROOT`].
pub static SOFTWARE_DIR: Config<&'static str> = Config::new(
    "software_dir",
    "The relative path of the directory containing software definitions.",
    "config/software",
);

/// Captured once, when the [`ConfigSet`] is built.
///
/// [`ConfigSet`]: omnibus_cfg::ConfigSet
pub static PROJECT_ROOT: Config<fn() -> CompactString> = Config::new(
    "project_root",
    "The root directory in which to look for project and software definitions.",
    current_dir as fn() -> CompactString,
);

// TODO: Conflated with the install path of a project, decide which one wins.
pub static INSTALL_DIR: Config<&'static str> =
    Config::new("install_dir", "Installation directory.", "/opt/chef");

// S3 caching.

pub static USE_S3_CACHING: Config<bool> = Config::new(
    "use_s3_caching",
    "Cache software artifacts in S3 for quicker build times, requires 's3_bucket'.",
    false,
);

pub static S3_BUCKET: Config<Option<&'static str>> = Config::new(
    "s3_bucket",
    "The name of the S3 bucket to cache software artifacts in.",
    None,
);

pub static S3_ACCESS_KEY: Config<Option<&'static str>> = Config::new(
    "s3_access_key",
    "The S3 access key to use with S3 caching.",
    None,
);

pub static S3_SECRET_KEY: Config<Option<&'static str>> = Config::new(
    "s3_secret_key",
    "The S3 secret key to use with S3 caching.",
    None,
)
.sensitive();

// Miscellaneous.

pub static OVERRIDE_FILE: Config<Option<&'static str>> = Config::new(
    "override_file",
    "Path to a file that overrides the versions of software to build.",
    None,
);

pub static SOLARIS_COMPILER: Config<Option<&'static str>> = Config::new(
    "solaris_compiler",
    "The compiler to use when building on Solaris.",
    None,
);

pub static APPEND_TIMESTAMP: Config<bool> = Config::new(
    "append_timestamp",
    "Append a timestamp to the build version.",
    true,
);

/// Registers all of the settings above.
pub fn register_configs(builder: &mut ConfigSetBuilder) {
    builder
        .register(&CACHE_DIR)
        .register(&SOURCE_DIR)
        .register(&BUILD_DIR)
        .register(&PACKAGE_DIR)
        .register(&PROJECT_DIR)
        .register(&SOFTWARE_DIR)
        .register(&PROJECT_ROOT)
        .register(&INSTALL_DIR)
        .register(&USE_S3_CACHING)
        .register(&S3_BUCKET)
        .register(&S3_ACCESS_KEY)
        .register(&S3_SECRET_KEY)
        .register(&OVERRIDE_FILE)
        .register(&SOLARIS_COMPILER)
        .register(&APPEND_TIMESTAMP);
}

fn current_dir() -> CompactString {
    match std::env::current_dir() {
        Ok(dir) => CompactString::new(dir.to_string_lossy()),
        Err(err) => {
            tracing::warn!(%err, "failed to read the current directory, using '.'");
            CompactString::const_new(".")
        }
    }
}

#[cfg(test)]
mod test {
    use omnibus_cfg::{DynConfigValue, ValueKind};

    use super::*;
    use crate::config_set;

    #[test]
    fn smoketest_defaults() {
        let configs = config_set();

        let expected: &[(&str, DynConfigValue)] = &[
            ("cache_dir", "/var/cache/omnibus/cache".into()),
            ("source_dir", "/var/cache/omnibus/src".into()),
            ("build_dir", "/var/cache/omnibus/build".into()),
            ("package_dir", "/var/cache/omnibus/pkg".into()),
            ("project_dir", "config/projects".into()),
            ("software_dir", "config/software".into()),
            ("install_dir", "/opt/chef".into()),
            ("use_s3_caching", false.into()),
            ("s3_bucket", DynConfigValue::Unset),
            ("s3_access_key", DynConfigValue::Unset),
            ("s3_secret_key", DynConfigValue::Unset),
            ("override_file", DynConfigValue::Unset),
            ("solaris_compiler", DynConfigValue::Unset),
            ("append_timestamp", true.into()),
        ];
        for (name, value) in expected {
            assert_eq!(configs.get(name).as_ref(), Ok(value), "{name}");
        }

        // Everything registered is accounted for.
        assert_eq!(configs.names().count(), expected.len() + 1);
    }

    #[test]
    fn smoketest_project_root() {
        let cwd = std::env::current_dir().unwrap();
        let configs = config_set();

        let root = PROJECT_ROOT.read(&configs);
        assert_eq!(root, cwd.to_string_lossy());
        assert_eq!(PROJECT_ROOT.read(&configs), root);

        configs.set("project_root", "/src/omnibus-software").unwrap();
        assert_eq!(PROJECT_ROOT.read(&configs), "/src/omnibus-software");
    }

    #[test]
    fn override_every_setting() {
        let configs = config_set();
        let names: Vec<_> = configs.names().map(|name| name.to_string()).collect();

        for name in names {
            let value = match configs.kind(&name).unwrap() {
                ValueKind::Bool => {
                    let current = configs.get(&name).unwrap().as_bool().unwrap();
                    DynConfigValue::Bool(!current)
                }
                ValueKind::String | ValueKind::OptionalString => {
                    DynConfigValue::from(format!("/tmp/{name}"))
                }
            };
            configs.set(&name, value.clone()).unwrap();
            assert_eq!(configs.get(&name), Ok(value), "{name}");
        }

        assert!(USE_S3_CACHING.read(&configs));
        assert!(!APPEND_TIMESTAMP.read(&configs));
        assert_eq!(S3_BUCKET.read(&configs).as_deref(), Some("/tmp/s3_bucket"));
    }

    #[test]
    fn secret_key_is_redacted() {
        let configs = config_set();
        configs.set("s3_secret_key", "super-secret").unwrap();

        assert_eq!(S3_SECRET_KEY.read(&configs).as_deref(), Some("super-secret"));
        assert!(!configs.to_string().contains("super-secret"));
    }
}
