//! Backup and restore pipelines.
//!
//! Each call runs at most one archive or extract and one transfer, in order, on
//! the caller's thread. The staging directory is shared, so callers must not
//! run two pipelines at once.

use std::path::PathBuf;

use crate::archive::{archive_slot, extract_slot};
use crate::config::SyncConfig;
use crate::error::{PipelineError, Stage, StoreError, SyncError};
use crate::paths::Layout;
use crate::store::{Credentials, ObjectStore, RemoteLocator};
use crate::{BACKUP_NAME, TRACING_TARGET};

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

pub struct Syncer<S> {
    layout: Layout,
    store: S,
}

impl<S: ObjectStore> Syncer<S> {
    pub fn new(layout: Layout, store: S) -> Self {
        Self { layout, store }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Archives the configured slot and uploads it to `(bucket, blob)`.
    pub fn backup(&self, cfg: &SyncConfig) -> PipelineResult<RemoteLocator> {
        let archive = archive_slot(&self.layout, cfg, BACKUP_NAME)
            .map_err(PipelineError::at(Stage::Archive))?;
        let locator = locator(cfg);
        self.store
            .upload(&archive, &locator.bucket, &locator.object)
            .map_err(|e| remote_failed("upload", &locator, e))
            .map_err(PipelineError::at(Stage::Upload))?;
        tracing::info!(
            target: TRACING_TARGET,
            slot = cfg.slot_number(),
            remote = %locator,
            "Backup complete"
        );
        Ok(locator)
    }

    /// Downloads `(bucket, blob)` into staging and replaces the configured slot with it.
    pub fn restore(&self, cfg: &SyncConfig) -> PipelineResult<PathBuf> {
        let locator = locator(cfg);
        let staging = self.layout.ensure_staging().map_err(PipelineError::at(Stage::Download))?;
        let archive = self
            .store
            .download(&locator.bucket, &locator.object, staging)
            .map_err(|e| remote_failed("download", &locator, e))
            .map_err(PipelineError::at(Stage::Download))?;
        let slot = extract_slot(&archive, &self.layout, cfg)
            .map_err(PipelineError::at(Stage::Extract))?;
        tracing::info!(
            target: TRACING_TARGET,
            remote = %locator,
            slot = %slot.display(),
            "Restore complete"
        );
        Ok(slot)
    }

    /// Collects every bucket visible with `creds`.
    pub fn buckets(&self, creds: &Credentials) -> PipelineResult<Vec<String>> {
        let fail = |e| PipelineError {
            stage: Stage::List,
            source: SyncError::RemoteTransferFailed {
                op: "list",
                bucket: "*".into(),
                object: "*".into(),
                source: e,
            },
        };
        let mut names = Vec::new();
        for name in self.store.list_buckets(creds).map_err(fail)? {
            names.push(name.map_err(fail)?);
        }
        Ok(names)
    }
}

fn locator(cfg: &SyncConfig) -> RemoteLocator {
    RemoteLocator { bucket: cfg.bucket_name.clone(), object: cfg.blob_name.clone() }
}

fn remote_failed(op: &'static str, locator: &RemoteLocator, source: StoreError) -> SyncError {
    SyncError::RemoteTransferFailed {
        op,
        bucket: locator.bucket.clone(),
        object: locator.object.clone(),
        source,
    }
}
