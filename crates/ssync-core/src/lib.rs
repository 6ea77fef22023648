//! ssync-core: save slot sync engine for Schedule I
//!
//! This crate keeps a small surface:
//! - Path resolution from a config record (saves root, slot dir, staging)
//! - Slot scanning under a player's saves root
//! - Identity-remapping zip archiver (pack and restore a slot)
//! - Object store boundary and the backup/restore pipelines
//!
pub mod archive;
pub mod config;
pub mod error;
pub mod paths;
pub mod slots;
pub mod store;
pub mod sync;

pub use archive::{archive_slot, extract_slot};
pub use config::{SyncConfig, load_config, load_or_init_config, read_json_field, save_config};
pub use error::{PipelineError, Result, Stage, StoreError, SyncError};
pub use paths::{Layout, SlotPaths, detect_player_id};
pub use slots::{SlotIndicator, list_slots, organisation_name};
pub use store::{Credentials, LocalStore, ObjectStore, RemoteLocator};
pub use sync::Syncer;

/// Tracing target for engine events.
pub const TRACING_TARGET: &str = "ssync_core";

/// Directory name prefix of a save slot, followed by its 1-based number.
pub const SAVE_PREFIX: &str = "SaveGame_";
/// Base name (without `.zip`) of the archive uploaded by a backup.
pub const BACKUP_NAME: &str = "backup-world";
/// Name of the staging directory under the system temp dir, and of the config dir.
pub const APP_DIR_NAME: &str = "schedulesync";
/// Identity-neutral player segment used by saves on disk.
pub const PLACEHOLDER_PLAYER: &str = "Player_0";
/// Number of slots the game offers.
pub const SLOT_COUNT: usize = 5;
