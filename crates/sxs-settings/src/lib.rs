mod layout;
mod store;
mod version_map;

pub use layout::{default_settings_root, SettingsLayout, SETTINGS_HOME_ENV};
pub use store::{parse_settings_file, settings_file_version, Settings, SettingsStore};
pub use version_map::VersionPathMap;
