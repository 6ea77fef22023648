//! Filesystem locations derived from a config record.
//!
//! Resolution is lazy: nothing but the staging directory is created or checked,
//! so an unknown player or an out-of-range slot still yields a path.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::{APP_DIR_NAME, SAVE_PREFIX};

/// Steam app id of Schedule I, used to find the Proton prefix off Windows.
const STEAM_APP_ID: u32 = 3164500;
/// Directory the game creates before a player profile exists.
const TEMP_PLAYER_DIR: &str = "TempPlayer";

/// Where the game keeps its saves and where archives are staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Directory holding one sub-directory per player id.
    pub saves_base: PathBuf,
    /// Shared, process-wide staging directory.
    pub staging_dir: PathBuf,
}

/// Concrete paths for one config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPaths {
    pub saves_root: PathBuf,
    pub slot_dir: PathBuf,
    pub staging_dir: PathBuf,
}

impl Layout {
    pub fn new(saves_base: impl Into<PathBuf>, staging_dir: impl Into<PathBuf>) -> Self {
        Self { saves_base: saves_base.into(), staging_dir: staging_dir.into() }
    }

    /// Platform default: the game's save base and `<temp>/schedulesync`.
    pub fn detect() -> Option<Self> {
        Some(Self::new(default_saves_base()?, default_staging_dir()))
    }

    pub fn saves_root(&self, cfg: &SyncConfig) -> PathBuf {
        self.saves_base.join(&cfg.player_id)
    }

    pub fn slot_dir(&self, cfg: &SyncConfig) -> PathBuf {
        self.saves_root(cfg).join(slot_dir_name(cfg.slot_number()))
    }

    /// Creates the staging directory if it is not there yet.
    pub fn ensure_staging(&self) -> Result<&Path> {
        fs::create_dir_all(&self.staging_dir).map_err(|e| SyncError::DestinationCreateFailed {
            path: self.staging_dir.clone(),
            source: e,
        })?;
        Ok(&self.staging_dir)
    }

    /// Resolves all three locations and makes sure staging exists.
    pub fn resolve(&self, cfg: &SyncConfig) -> Result<SlotPaths> {
        self.ensure_staging()?;
        Ok(SlotPaths {
            saves_root: self.saves_root(cfg),
            slot_dir: self.slot_dir(cfg),
            staging_dir: self.staging_dir.clone(),
        })
    }
}

pub fn slot_dir_name(number: impl std::fmt::Display) -> String {
    format!("{SAVE_PREFIX}{number}")
}

pub fn default_staging_dir() -> PathBuf {
    std::env::temp_dir().join(APP_DIR_NAME)
}

/// `...\AppData\LocalLow\TVGS\Schedule I\Saves`, natively or inside the Proton prefix.
pub fn default_saves_base() -> Option<PathBuf> {
    let appdata = if cfg!(target_os = "windows") {
        let roaming = PathBuf::from(std::env::var_os("APPDATA")?);
        roaming.parent()?.to_path_buf()
    } else {
        proton_appdata(Path::new(&std::env::var_os("HOME")?))
    };
    Some(saves_base_in(&appdata))
}

/// `AppData` of the Wine user inside the game's Proton prefix.
fn proton_appdata(home: &Path) -> PathBuf {
    home.join(".steam/steam/steamapps/compatdata")
        .join(STEAM_APP_ID.to_string())
        .join("pfx/drive_c/users/steamuser/AppData")
}

fn saves_base_in(appdata: &Path) -> PathBuf {
    appdata.join("LocalLow").join("TVGS").join("Schedule I").join("Saves")
}

/// First player directory under the saves base, skipping the game's temp profile.
pub fn detect_player_id(saves_base: &Path) -> Option<String> {
    let mut names: Vec<String> = fs::read_dir(saves_base)
        .ok()?
        .flatten()
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|n| n != TEMP_PLAYER_DIR)
        .collect();
    names.sort();
    names.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saves_base_sits_under_local_low() {
        let base = saves_base_in(Path::new("C:/Users/me/AppData"));
        assert!(base.ends_with("LocalLow/TVGS/Schedule I/Saves"));
        assert!(base.starts_with("C:/Users/me/AppData"));
    }

    #[test]
    fn proton_prefix_uses_game_app_id() {
        let appdata = proton_appdata(Path::new("/home/me"));
        assert_eq!(
            appdata,
            Path::new("/home/me/.steam/steam/steamapps/compatdata/3164500")
                .join("pfx/drive_c/users/steamuser/AppData")
        );
    }

    #[test]
    fn default_saves_base_has_game_suffix() {
        if let Some(base) = default_saves_base() {
            assert!(base.ends_with("LocalLow/TVGS/Schedule I/Saves"));
        }
    }
}
