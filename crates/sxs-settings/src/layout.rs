use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Overrides the settings root on every host when set.
pub const SETTINGS_HOME_ENV: &str = "UNITY_SXS_HOME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsLayout {
    root: PathBuf,
}

impl SettingsLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join("settings.toml")
    }
}

pub fn default_settings_root() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os(SETTINGS_HOME_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(home));
    }

    if cfg!(windows) {
        let app_data = std::env::var("LOCALAPPDATA")
            .context("LOCALAPPDATA is not set; cannot resolve Windows settings root")?;
        return Ok(PathBuf::from(app_data).join("UnitySXS"));
    }

    let home = std::env::var("HOME").context("HOME is not set; cannot resolve settings root")?;
    Ok(PathBuf::from(home).join(".unity-sxs"))
}
