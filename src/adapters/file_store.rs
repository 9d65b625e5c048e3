//! File-backed [`StoragePort`].
//!
//! One file per key at `<root>/<namespace>/<key>.json`.  Writes go to a
//! sibling temp file which is synced and renamed over the target, so a
//! power cut leaves either the old or the new value.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::{StorageError, StoragePort};

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Use `root` as the state directory, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            warn!("FileStore: cannot create {}: {}", root.display(), e);
            StorageError::IoError
        })?;
        info!("FileStore: state in {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, namespace: &str, key: &str) -> PathBuf {
        self.root.join(namespace).join(format!("{key}.json"))
    }
}

fn io_error(context: &str, path: &Path, e: &std::io::Error) -> StorageError {
    warn!("FileStore: {} {}: {}", context, path.display(), e);
    match e.kind() {
        ErrorKind::NotFound => StorageError::NotFound,
        ErrorKind::StorageFull => StorageError::Full,
        _ => StorageError::IoError,
    }
}

impl StoragePort for FileStore {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let path = self.path_for(namespace, key);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StorageError::NotFound),
            Err(e) => return Err(io_error("read", &path, &e)),
        };
        if data.len() > buf.len() {
            return Err(StorageError::Full);
        }
        buf[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(namespace, key);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| io_error("mkdir", dir, &e))?;
        }
        let tmp = path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).map_err(|e| io_error("create", &tmp, &e))?;
        file.write_all(data)
            .and_then(|()| file.sync_all())
            .map_err(|e| io_error("write", &tmp, &e))?;
        fs::rename(&tmp, &path).map_err(|e| io_error("rename", &path, &e))
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(namespace, key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("delete", &path, &e)),
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.path_for(namespace, key).is_file()
    }
}
