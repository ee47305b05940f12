//! Paths derived from more than one setting.

use std::path::{Path, PathBuf};

use omnibus_cfg::ConfigSet;

use crate::settings::{PROJECT_DIR, PROJECT_ROOT, SOFTWARE_DIR};

/// Directory containing project definitions, [`PROJECT_DIR`] within [`PROJECT_ROOT`].
pub fn project_path(configs: &ConfigSet) -> PathBuf {
    let root = PROJECT_ROOT.read(configs);
    Path::new(root.as_str()).join(PROJECT_DIR.read(configs).as_str())
}

/// Directory containing software definitions, [`SOFTWARE_DIR`] within [`PROJECT_ROOT`].
pub fn software_path(configs: &ConfigSet) -> PathBuf {
    let root = PROJECT_ROOT.read(configs);
    Path::new(root.as_str()).join(SOFTWARE_DIR.read(configs).as_str())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn smoketest_paths() {
        let configs = crate::config_set();
        configs.set("project_root", "/src/omnibus-chef").unwrap();

        assert_eq!(
            project_path(&configs),
            PathBuf::from("/src/omnibus-chef/config/projects")
        );
        assert_eq!(
            software_path(&configs),
            PathBuf::from("/src/omnibus-chef/config/software")
        );
    }

    #[test]
    fn absolute_dir_replaces_root() {
        let configs = crate::config_set();
        configs.set("software_dir", "/opt/software-defs").unwrap();
        assert_eq!(software_path(&configs), PathBuf::from("/opt/software-defs"));
    }
}
