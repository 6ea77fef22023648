//! Identity-remapping zip archiver.
//!
//! Saves on disk live under the game's neutral `Player_0` profile. When a slot
//! is packed, every path segment equal to `Player_0` is renamed to
//! `Player_<player id>`; extraction maps it back. Entry names are always
//! forward-slash paths relative to the slot directory.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::FileOptions;

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::paths::Layout;
use crate::{PLACEHOLDER_PLAYER, TRACING_TARGET};

/// `Player_<id>` for the configured player.
///
/// An empty id would turn the pattern into a bare `Player_` and rewrite
/// unrelated segments, so it is refused.
pub fn player_segment(cfg: &SyncConfig) -> Result<String> {
    if cfg.player_id.trim().is_empty() {
        return Err(SyncError::EmptyPlayerId);
    }
    Ok(format!("Player_{}", cfg.player_id))
}

/// Archive entry name for a path relative to the slot directory.
pub fn to_remote_name(rel: &Path, player: &str) -> String {
    rel.components()
        .map(|c| {
            let seg = c.as_os_str().to_string_lossy();
            if seg == PLACEHOLDER_PLAYER { player.to_string() } else { seg.into_owned() }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Inverse of [`to_remote_name`]: a plain textual replacement on the stored name.
pub fn to_local_name(name: &str, player: &str) -> String {
    name.replace(player, PLACEHOLDER_PLAYER)
}

/// Packs the configured slot into `<staging>/<base_name>.zip`, replacing any previous file.
///
/// On error the archive file is left as-is and must not be used.
pub fn archive_slot(layout: &Layout, cfg: &SyncConfig, base_name: &str) -> Result<PathBuf> {
    let player = player_segment(cfg)?;
    let paths = layout.resolve(cfg)?;
    let source = paths.slot_dir.as_path();
    if !source.is_dir() {
        return Err(SyncError::SourceMissing { path: source.to_path_buf() });
    }

    let dest = paths.staging_dir.join(format!("{base_name}.zip"));
    let file = File::create(&dest).map_err(|e| SyncError::archive_write(&dest, e))?;
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = 0usize;
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|e| SyncError::archive_write(&dest, io::Error::from(e)))?;
        let Ok(rel) = entry.path().strip_prefix(source) else {
            continue;
        };
        if rel.as_os_str().is_empty() {
            continue;
        }
        let name = to_remote_name(rel, &player);
        if entry.file_type().is_dir() {
            zip.add_directory(format!("{name}/"), options)
                .map_err(|e| SyncError::archive_write(&dest, e))?;
        } else {
            let meta = entry
                .metadata()
                .map_err(|e| SyncError::archive_write(&dest, io::Error::from(e)))?;
            let opts = match file_mode(&meta) {
                Some(mode) => options.unix_permissions(mode),
                None => options,
            };
            zip.start_file(name.as_str(), opts).map_err(|e| SyncError::archive_write(&dest, e))?;
            let mut src = File::open(entry.path()).map_err(|e| SyncError::io(entry.path(), e))?;
            io::copy(&mut src, &mut zip).map_err(|e| SyncError::archive_write(&dest, e))?;
        }
        tracing::debug!(target: TRACING_TARGET, entry = %name, "Archived entry");
        entries += 1;
    }
    zip.finish().map_err(|e| SyncError::archive_write(&dest, e))?;

    tracing::info!(
        target: TRACING_TARGET,
        source = %source.display(),
        archive = %dest.display(),
        entries,
        "Slot archived"
    );
    Ok(dest)
}

/// Replaces the configured slot directory with the contents of `archive`.
///
/// The archive is opened and every entry name checked before anything is
/// deleted. After that the slot is cleared, and an error part-way leaves it
/// partially populated.
pub fn extract_slot(archive: &Path, layout: &Layout, cfg: &SyncConfig) -> Result<PathBuf> {
    let player = player_segment(cfg)?;
    let dest = layout.slot_dir(cfg);

    let open_failed = |source: zip::result::ZipError| SyncError::ArchiveOpenFailed {
        path: archive.to_path_buf(),
        source,
    };
    let file = File::open(archive).map_err(|e| open_failed(e.into()))?;
    let mut zip = zip::ZipArchive::new(file).map_err(open_failed)?;
    for name in zip.file_names() {
        join_entry(&dest, &to_local_name(name, &player))?;
    }

    match fs::remove_dir_all(&dest) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(SyncError::DestinationClearFailed { path: dest, source: e }),
    }
    fs::create_dir_all(&dest).map_err(|e| SyncError::DestinationCreateFailed {
        path: dest.clone(),
        source: e,
    })?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(open_failed)?;
        let rel = to_local_name(entry.name(), &player);
        let out = join_entry(&dest, &rel)?;
        if entry.is_dir() {
            fs::create_dir_all(&out).map_err(|e| SyncError::DestinationCreateFailed {
                path: out.clone(),
                source: e,
            })?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent).map_err(|e| SyncError::DestinationCreateFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let mut f = File::create(&out).map_err(|e| SyncError::DestinationCreateFailed {
            path: out.clone(),
            source: e,
        })?;
        io::copy(&mut entry, &mut f).map_err(|e| SyncError::io(&out, e))?;
        if let Some(mode) = entry.unix_mode() {
            set_file_mode(&out, mode)?;
        }
        tracing::debug!(target: TRACING_TARGET, entry = %rel, "Extracted entry");
    }

    tracing::info!(
        target: TRACING_TARGET,
        archive = %archive.display(),
        slot = %dest.display(),
        entries = zip.len(),
        "Slot restored"
    );
    Ok(dest)
}

/// Joins a relative entry name onto `dest`, refusing anything that would land outside it.
fn join_entry(dest: &Path, rel: &str) -> Result<PathBuf> {
    let mut out = dest.to_path_buf();
    for comp in Path::new(rel).components() {
        match comp {
            Component::Normal(seg) => out.push(seg),
            Component::CurDir => {}
            _ => return Err(SyncError::UnsafeEntry { name: rel.to_string() }),
        }
    }
    if out == dest {
        return Err(SyncError::UnsafeEntry { name: rel.to_string() });
    }
    Ok(out)
}

#[cfg(unix)]
fn file_mode(meta: &fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(meta.permissions().mode())
}

#[cfg(not(unix))]
fn file_mode(_meta: &fs::Metadata) -> Option<u32> {
    None
}

#[cfg(unix)]
fn set_file_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o777))
        .map_err(|e| SyncError::io(path, e))
}

#[cfg(not(unix))]
fn set_file_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
