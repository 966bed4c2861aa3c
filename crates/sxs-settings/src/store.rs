use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{SettingsLayout, VersionPathMap};

/// Process-wide persisted state: loaded once before a launch, saved once
/// after the editor exits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "settings_file_version")]
    pub version: u32,
    #[serde(default)]
    pub first_run_completed: bool,
    #[serde(default)]
    pub versions: VersionPathMap,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: settings_file_version(),
            first_run_completed: false,
            versions: VersionPathMap::new(),
        }
    }
}

pub fn settings_file_version() -> u32 {
    1
}

pub fn parse_settings_file(content: &str) -> Result<Settings> {
    let value = toml::from_str::<toml::Value>(content)?;
    let settings = value
        .try_into::<Settings>()
        .context("failed parsing settings")?;
    let expected = settings_file_version();
    if settings.version != expected {
        anyhow::bail!(
            "unsupported settings version {} (expected {})",
            settings.version,
            expected
        );
    }
    Ok(settings)
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_layout(layout: &SettingsLayout) -> Self {
        Self::new(layout.settings_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: absent or unusable data reads as a first run.
    pub fn load(&self) -> Settings {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no settings file; starting fresh");
            return Settings::default();
        }

        let loaded = fs::read_to_string(&self.path)
            .with_context(|| format!("failed reading settings: {}", self.path.display()))
            .and_then(|content| {
                parse_settings_file(&content)
                    .with_context(|| format!("failed parsing settings: {}", self.path.display()))
            });
        match loaded {
            Ok(settings) => {
                debug!(
                    path = %self.path.display(),
                    versions = settings.versions.len(),
                    first_run_completed = settings.first_run_completed,
                    "loaded settings"
                );
                settings
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "ignoring unusable settings file");
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating settings directory: {}", parent.display())
            })?;
        }

        let mut settings = settings.clone();
        settings.version = settings_file_version();
        let content = toml::to_string(&settings)
            .with_context(|| format!("failed serializing settings: {}", self.path.display()))?;
        fs::write(&self.path, content)
            .with_context(|| format!("failed writing settings: {}", self.path.display()))
    }
}
