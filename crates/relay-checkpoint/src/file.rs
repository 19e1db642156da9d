use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::debug;

use relay_types::BlockHeight;

use crate::error::{CheckpointError, CheckpointResult};
use crate::traits::CheckpointStore;

/// Checkpoint kept as a decimal height in a single text file.
///
/// Writes never touch the target file in place: the new value is written and
/// fsynced to a temporary file in the same directory, which is then renamed
/// over the target. A crash at any point leaves either the old or the new
/// value, never a torn one. A `Mutex` serializes every read and write.
pub struct FileCheckpointStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCheckpointStore {
    /// Use the checkpoint at `path`. The file itself may not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Like [`new`](Self::new), but create the parent directory if missing.
    pub fn create(path: impl Into<PathBuf>) -> CheckpointResult<Self> {
        let store = Self::new(path);
        let dir = store.dir().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| CheckpointError::Io { path: dir, source })?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn read_locked(&self) -> CheckpointResult<BlockHeight> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BlockHeight::ZERO),
            Err(e) => return Err(io_error(&self.path)(e)),
        };
        match text.split_whitespace().next() {
            None => Ok(BlockHeight::ZERO),
            Some(token) => token.parse().map_err(|_| CheckpointError::Corrupt {
                path: self.path.clone(),
                content: text.trim().to_string(),
            }),
        }
    }

    fn write_locked(&self, height: BlockHeight) -> CheckpointResult<()> {
        let dir = self.dir();
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_error(dir))?;
        tmp.write_all(height.to_string().as_bytes())
            .map_err(io_error(tmp.path()))?;
        tmp.as_file()
            .sync_all()
            .map_err(io_error(tmp.path()))?;
        tmp.persist(&self.path)
            .map_err(|e| io_error(&self.path)(e.error))?;
        sync_dir(dir).map_err(io_error(dir))?;
        Ok(())
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> CheckpointError {
    let path = path.to_path_buf();
    move |source| CheckpointError::Io { path, source }
}

/// Make the rename itself durable.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

impl CheckpointStore for FileCheckpointStore {
    fn get(&self) -> CheckpointResult<BlockHeight> {
        let _guard = self.lock.lock().expect("checkpoint mutex poisoned");
        self.read_locked()
    }

    fn set(&self, height: BlockHeight) -> CheckpointResult<()> {
        let _guard = self.lock.lock().expect("checkpoint mutex poisoned");
        self.write_locked(height)?;
        debug!(%height, path = %self.path.display(), "checkpoint persisted");
        Ok(())
    }
}

impl std::fmt::Debug for FileCheckpointStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCheckpointStore")
            .field("path", &self.path)
            .finish()
    }
}
