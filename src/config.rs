use crate::context::SessionContext;
use crate::error::{AdminError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Overrides the profile location.
pub const PROFILE_ENV: &str = "STACKADM_PROFILE";

/// On-disk store of the signed-in session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub default_context: Option<SessionContext>,
}

impl Profile {
    /// Loads the profile at `path`. A missing file is an empty profile.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Profile::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| AdminError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| AdminError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AdminError::Config(format!("{}: {}", parent.display(), e)))?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| AdminError::Config(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| AdminError::Config(format!("{}: {}", path.display(), e)))
    }

    /// `$STACKADM_PROFILE`, else `~/.stackadm/profile.json`.
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(PROFILE_ENV) {
            return Ok(PathBuf::from(path));
        }
        Ok(dirs::home_dir()
            .ok_or_else(|| AdminError::Config("could not find home directory".to_string()))?
            .join(".stackadm")
            .join("profile.json"))
    }
}
