//! Collection file persistence.
//!
//! The whole collection lives in one JSON array file. Writes go to a
//! sibling temp file which is fsynced and renamed over the original, so a
//! crash leaves either the old or the new collection on disk.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::balade::Balade;
use super::errors::{StoreError, StoreResult};

/// Location of one collection file
#[derive(Debug, Clone)]
pub struct CollectionFile {
    path: PathBuf,
}

impl CollectionFile {
    /// `<data_dir>/<database>/<collection>.json`
    pub fn new(data_dir: &Path, database: &str, collection: &str) -> Self {
        Self {
            path: data_dir.join(database).join(format!("{}.json", collection)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record. A missing file is an empty collection.
    pub fn load(&self) -> StoreResult<Vec<Balade>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io_at_path("Failed to open", &self.path, e)),
        };

        let records: Vec<Balade> = serde_json::from_reader(BufReader::new(file))?;
        Ok(records)
    }

    /// Replace the file contents with `records`
    pub fn save(&self, records: &[Balade]) -> StoreResult<()> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| {
                StoreError::io(
                    format!("No parent directory for {}", self.path.display()),
                    ErrorKind::InvalidInput.into(),
                )
            })?;
        fs::create_dir_all(dir)
            .map_err(|e| StoreError::io_at_path("Failed to create directory", dir, e))?;

        let tmp_path = self.path.with_extension("json.tmp");
        let replaced = write_synced(&tmp_path, records).and_then(|()| {
            fs::rename(&tmp_path, &self.path)
                .map_err(|e| StoreError::io_at_path("Failed to replace", &self.path, e))
        });
        if let Err(e) = replaced {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        // Rename is committed at this point
        if let Err(e) = fsync_dir(dir) {
            tracing::warn!(error = %e, "collection written but directory fsync failed");
        }
        Ok(())
    }
}

fn write_synced(path: &Path, records: &[Balade]) -> StoreResult<()> {
    let file =
        File::create(path).map_err(|e| StoreError::io_at_path("Failed to create", path, e))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, records)?;
    writer
        .flush()
        .map_err(|e| StoreError::io_at_path("Failed to write", path, e))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| StoreError::io_at_path("fsync failed for", path, e))
}

#[cfg(unix)]
fn fsync_dir(path: &Path) -> StoreResult<()> {
    let dir = OpenOptions::new()
        .read(true)
        .open(path)
        .map_err(|e| StoreError::io_at_path("Failed to open directory", path, e))?;

    dir.sync_all()
        .map_err(|e| StoreError::io_at_path("fsync directory failed", path, e))
}

#[cfg(not(unix))]
fn fsync_dir(_path: &Path) -> StoreResult<()> {
    Ok(())
}
