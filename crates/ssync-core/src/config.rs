//! Config record and its JSON file.
//!
//! The record is the only state that outlives a single engine call. It is owned
//! by the caller and handed to every operation; nothing here keeps a global copy.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};
use crate::paths::{Layout, detect_player_id};
use crate::{APP_DIR_NAME, TRACING_TARGET};

/// Slot selected when no config file exists yet (0-based, i.e. `SaveGame_5`).
pub const DEFAULT_SAVE_SLOT: i8 = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Steam id of the local player; names the saves root.
    #[serde(rename = "steamid")]
    pub player_id: String,
    /// 0-based slot index. Slot directories on disk are 1-based.
    pub save_slot: i8,
    pub bucket_name: String,
    pub blob_name: String,
}

impl SyncConfig {
    /// 1-based number used in the slot directory name.
    pub fn slot_number(&self) -> i16 {
        i16::from(self.save_slot) + 1
    }
}

pub fn load_config(path: &Path) -> Result<SyncConfig> {
    let file = File::open(path).map_err(|e| SyncError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| SyncError::json(path, e))
}

pub fn save_config(path: &Path, cfg: &SyncConfig) -> Result<()> {
    let data = serde_json::to_vec_pretty(cfg).map_err(|e| SyncError::json(path, e))?;
    fs::write(path, data).map_err(|e| SyncError::io(path, e))
}

/// Loads the config, or writes and returns a default one if the file is missing.
///
/// The default picks the first player directory found under the saves base and
/// the last slot.
pub fn load_or_init_config(path: &Path, layout: &Layout) -> Result<SyncConfig> {
    if path.exists() {
        return load_config(path);
    }
    let cfg = SyncConfig {
        player_id: detect_player_id(&layout.saves_base).unwrap_or_default(),
        save_slot: DEFAULT_SAVE_SLOT,
        ..SyncConfig::default()
    };
    tracing::info!(
        target: TRACING_TARGET,
        path = %path.display(),
        player_id = %cfg.player_id,
        "Writing default config"
    );
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SyncError::io(parent, e))?;
    }
    save_config(path, &cfg)?;
    Ok(cfg)
}

/// Per-user config directory for this tool, created if absent.
pub fn config_dir() -> Result<PathBuf> {
    let base = user_config_dir().ok_or_else(|| {
        let e = std::io::Error::new(std::io::ErrorKind::NotFound, "no user config directory");
        SyncError::io("<config dir>", e)
    })?;
    let dir = base.join(APP_DIR_NAME);
    fs::create_dir_all(&dir).map_err(|e| SyncError::io(&dir, e))?;
    Ok(dir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.json"))
}

/// Location of the object store credential file. Its contents are not managed here.
pub fn credentials_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("credentials.json"))
}

fn user_config_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        std::env::var_os("APPDATA").map(PathBuf::from)
    } else if cfg!(target_os = "macos") {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support"))
    } else {
        std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
    }
}

/// Reads one top-level field from a JSON object file.
pub fn read_json_field(path: &Path, field: &str) -> Result<serde_json::Value> {
    let data = fs::read(path).map_err(|e| SyncError::io(path, e))?;
    let mut raw: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(&data).map_err(|e| SyncError::json(path, e))?;
    raw.remove(field).ok_or_else(|| SyncError::FieldNotFound {
        path: path.to_path_buf(),
        field: field.to_string(),
    })
}
