//! On-disk snapshot backend.
//!
//! Each key is one file in the storage directory:
//!
//! ```text
//! [magic: 4 bytes "FWIZ"][version: 1 byte][length: 4 bytes LE][blob: N bytes][crc32: 4 bytes LE]
//! ```
//!
//! Writes go to a temporary file that is fsynced and then renamed over the
//! target, so a crash leaves either the old snapshot or the new one.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crc32fast::Hasher;
use uuid::Uuid;

use crate::error::PersistError;

use super::storage::SnapshotStorage;

const MAGIC: [u8; 4] = *b"FWIZ";
const FRAME_VERSION: u8 = 1;
const HEADER_LEN: usize = 4 + 1 + 4;
const MAX_BLOB_SIZE: usize = 64 * 1024 * 1024;

fn checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

fn frame(blob: &[u8]) -> Result<Vec<u8>, PersistError> {
    let len = u32::try_from(blob.len())
        .ok()
        .filter(|_| blob.len() <= MAX_BLOB_SIZE)
        .ok_or_else(|| PersistError::storage(format!("snapshot of {} bytes is too large", blob.len())))?;

    let mut out = Vec::with_capacity(HEADER_LEN + blob.len() + 4);
    out.extend_from_slice(&MAGIC);
    out.push(FRAME_VERSION);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(blob);
    out.extend_from_slice(&checksum(blob).to_le_bytes());
    Ok(out)
}

fn corrupt(message: impl Into<String>) -> PersistError {
    PersistError::Corrupt {
        message: message.into(),
    }
}

fn unframe(bytes: &[u8]) -> Result<Vec<u8>, PersistError> {
    if bytes.len() < HEADER_LEN + 4 {
        return Err(corrupt(format!("snapshot file truncated at {} bytes", bytes.len())));
    }
    let (header, rest) = bytes.split_at(HEADER_LEN);
    if header[..4] != MAGIC {
        return Err(corrupt("invalid magic bytes"));
    }
    if header[4] != FRAME_VERSION {
        return Err(corrupt(format!(
            "unsupported frame version: {} (expected {FRAME_VERSION})",
            header[4]
        )));
    }
    let len = u32::from_le_bytes([header[5], header[6], header[7], header[8]]) as usize;
    if len > MAX_BLOB_SIZE || rest.len() != len + 4 {
        return Err(corrupt(format!(
            "length mismatch: header says {len}, file holds {}",
            rest.len().saturating_sub(4)
        )));
    }
    let (blob, crc_bytes) = rest.split_at(len);
    let stored = u32::from_le_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
    let computed = checksum(blob);
    if stored != computed {
        return Err(corrupt(format!(
            "CRC mismatch: stored={stored:08x}, computed={computed:08x}"
        )));
    }
    Ok(blob.to_vec())
}

fn io_err(context: &str, path: &Path, err: &std::io::Error) -> PersistError {
    PersistError::storage(format!("{context} {}: {err}", path.display()))
}

/// Directory of framed snapshot files.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Opens `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `PersistError::Storage` if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| io_err("create storage dir", &dir, &e))?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(PersistError::storage(format!("invalid storage key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.snap")))
    }
}

impl SnapshotStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => unframe(&bytes).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err("read snapshot", &path, &e)),
        }
    }

    fn store(&self, key: &str, blob: &[u8]) -> Result<(), PersistError> {
        let path = self.path_for(key)?;
        let framed = frame(blob)?;
        let temp_path = path.with_extension(format!("snap.tmp.{}", Uuid::new_v4()));

        let write = || -> std::io::Result<()> {
            let mut file: File = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)?;
            file.write_all(&framed)?;
            file.sync_all()?;
            fs::rename(&temp_path, &path)
        };

        write().map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            io_err("write snapshot", &path, &e)
        })
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err("remove snapshot", &path, &e)),
        }
    }
}
