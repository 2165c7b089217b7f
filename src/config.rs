//! Persisted user configuration (lives in the OS config directory).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{ProjectSettings, ScaleSelector, TimeScale};

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Settings given to newly created projects.
    pub default_settings: ProjectSettings,
    /// Manually pinned time scale; `None` means auto-detect.
    pub pinned_scale: Option<TimeScale>,
    pub last_project: Option<PathBuf>,
}

impl AppConfig {
    /// Location of `settings.json`, falling back to the working directory
    /// when the platform has no config directory.
    pub fn default_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "GanttEngine") {
            proj_dirs.config_dir().join(SETTINGS_FILE)
        } else {
            PathBuf::from(".").join(SETTINGS_FILE)
        }
    }

    /// Load from `path`. A missing or unreadable file yields the defaults.
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn scale_selector(&self) -> ScaleSelector {
        ScaleSelector::pinned(self.pinned_scale)
    }

    /// Remember the selector's pin (or lack of one).
    pub fn set_scale_selector(&mut self, selector: &ScaleSelector) {
        self.pinned_scale = selector.pinned_scale();
    }
}
