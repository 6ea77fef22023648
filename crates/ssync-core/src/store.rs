//! Object store boundary.
//!
//! The engine only needs upload, download and bucket listing of single named
//! objects. [`LocalStore`] implements them over a directory tree
//! (`<root>/<bucket>/<object>`); a cloud client plugs in through the same trait.

use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use crate::TRACING_TARGET;
use crate::config::read_json_field;
use crate::error::{Result, StoreError, SyncError};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Bucket names as they arrive. The listing is over once the iterator returns `None`.
pub type BucketIter<'a> = Box<dyn Iterator<Item = StoreResult<String>> + 'a>;

pub trait ObjectStore {
    fn upload(&self, local: &Path, bucket: &str, object: &str) -> StoreResult<()>;

    /// Downloads into `dest_dir` and returns the written file.
    fn download(&self, bucket: &str, object: &str, dest_dir: &Path) -> StoreResult<PathBuf>;

    fn list_buckets(&self, creds: &Credentials) -> StoreResult<BucketIter<'_>>;
}

/// Where a backup ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLocator {
    pub bucket: String,
    pub object: String,
}

impl fmt::Display for RemoteLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.object)
    }
}

/// Credential file handed to the store out of band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub path: PathBuf,
}

impl Credentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// `project_id` of a service-account style credential file.
    pub fn project_id(&self) -> Result<String> {
        match read_json_field(&self.path, "project_id")? {
            serde_json::Value::String(s) => Ok(s),
            _ => Err(SyncError::FieldNotFound {
                path: self.path.clone(),
                field: "project_id".to_string(),
            }),
        }
    }
}

/// Directory-backed store: buckets are sub-directories of `root`, objects are files.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> StoreResult<PathBuf> {
        let dir = self.root.join(checked_name(bucket)?);
        if !dir.is_dir() {
            return Err(StoreError::BucketNotFound(bucket.to_string()));
        }
        Ok(dir)
    }
}

/// Rejects names that could step outside the store root.
fn checked_name(name: &str) -> StoreResult<&str> {
    let bad = name.is_empty()
        || name.starts_with('/')
        || name.contains('\\')
        || name.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad { Err(StoreError::InvalidName(name.to_string())) } else { Ok(name) }
}

impl ObjectStore for LocalStore {
    fn upload(&self, local: &Path, bucket: &str, object: &str) -> StoreResult<()> {
        let target = self.bucket_dir(bucket)?.join(checked_name(object)?);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut src = File::open(local)?;
        // Copied aside and renamed; a failed copy leaves the stored object untouched.
        let mut part = target.clone().into_os_string();
        part.push(".part");
        let part = PathBuf::from(part);
        let mut dst = File::create(&part)?;
        let size = io::copy(&mut src, &mut dst)?;
        dst.sync_all()?;
        fs::rename(&part, &target)?;
        tracing::info!(
            target: TRACING_TARGET,
            local = %local.display(),
            bucket,
            object,
            size,
            "Uploaded object"
        );
        Ok(())
    }

    fn download(&self, bucket: &str, object: &str, dest_dir: &Path) -> StoreResult<PathBuf> {
        let source = self.bucket_dir(bucket)?.join(checked_name(object)?);
        if !source.is_file() {
            return Err(StoreError::ObjectNotFound(format!("{bucket}/{object}")));
        }
        let file_name = object.rsplit('/').next().unwrap_or(object);
        fs::create_dir_all(dest_dir)?;
        let dest = dest_dir.join(file_name);
        let size = fs::copy(&source, &dest)?;
        tracing::info!(
            target: TRACING_TARGET,
            bucket,
            object,
            local = %dest.display(),
            size,
            "Downloaded object"
        );
        Ok(dest)
    }

    fn list_buckets(&self, creds: &Credentials) -> StoreResult<BucketIter<'_>> {
        tracing::debug!(
            target: TRACING_TARGET,
            credentials = %creds.path.display(),
            "Listing buckets"
        );
        let rd = fs::read_dir(&self.root)?;
        Ok(Box::new(rd.filter_map(|entry| match entry {
            Ok(e) if e.file_type().map(|t| t.is_dir()).unwrap_or(false) => {
                Some(Ok(e.file_name().to_string_lossy().into_owned()))
            }
            Ok(_) => None,
            Err(e) => Some(Err(StoreError::Io(e))),
        })))
    }
}
