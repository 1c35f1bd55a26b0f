//! File backend
//!
//! Keeps the property map in memory and persists it as a snapshot file after
//! every mutation.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (18 bytes)                                       │
//! │   Magic: "PKV1" (4) | Version: u16 (2) | CRC: u32 (4)   │
//! │   PayloadLen: u64 (8)                                   │
//! ├─────────────────────────────────────────────────────────┤
//! │ Payload (variable)                                      │
//! │   bincode(BTreeMap<String, Scalar>)                     │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Snapshots are written to `{path}.tmp`, synced, then renamed over `{path}`,
//! so a crash leaves either the old or the new snapshot.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::error::{PropError, Result};

use super::{check_size, entry_usage, PropertyBackend, Scalar};

/// Magic bytes identifying a PropKV snapshot
const MAGIC: &[u8; 4] = b"PKV1";

/// Current snapshot format version
const VERSION: u16 = 1;

/// Magic (4) + Version (2) + CRC (4) + PayloadLen (8)
const HEADER_SIZE: usize = 18;

/// Property store persisted to a single snapshot file
pub struct FileBackend {
    path: PathBuf,
    data: RwLock<BTreeMap<String, Scalar>>,
    limit: usize,
}

impl FileBackend {
    /// Open an existing snapshot or start an empty one at `path`
    pub fn open(path: impl AsRef<Path>, limit: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = if path.exists() {
            let map = Self::load(&path)?;
            tracing::debug!(path = %path.display(), keys = map.len(), "loaded snapshot");
            map
        } else {
            tracing::debug!(path = %path.display(), "starting empty snapshot");
            BTreeMap::new()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
            limit,
        })
    }

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Snapshot I/O
    // =========================================================================

    fn load(path: &Path) -> Result<BTreeMap<String, Scalar>> {
        let mut bytes = Vec::new();
        File::open(path)?.read_to_end(&mut bytes)?;

        if bytes.len() < HEADER_SIZE {
            return Err(PropError::Storage(format!(
                "Snapshot too short: {} bytes",
                bytes.len()
            )));
        }
        if &bytes[0..4] != MAGIC {
            return Err(PropError::Storage("Bad snapshot magic".to_string()));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(PropError::Storage(format!(
                "Unsupported snapshot version {}",
                version
            )));
        }

        let crc = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&bytes[10..18]);
        let end = usize::try_from(u64::from_le_bytes(len_bytes))
            .ok()
            .and_then(|len| HEADER_SIZE.checked_add(len))
            .ok_or_else(|| PropError::Storage("Snapshot length out of range".to_string()))?;

        let payload = bytes
            .get(HEADER_SIZE..end)
            .ok_or_else(|| PropError::Storage("Truncated snapshot payload".to_string()))?;

        if crc32fast::hash(payload) != crc {
            return Err(PropError::Storage("Snapshot checksum mismatch".to_string()));
        }

        Ok(bincode::deserialize(payload)?)
    }

    /// Write the whole map (called with the write lock held)
    fn persist(&self, data: &BTreeMap<String, Scalar>) -> Result<()> {
        let payload = bincode::serialize(data)?;
        let crc = crc32fast::hash(&payload);

        let tmp_path = self.path.with_extension("tmp");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;

        let mut writer = BufWriter::new(file);
        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&crc.to_le_bytes())?;
        writer.write_all(&(payload.len() as u64).to_le_bytes())?;
        writer.write_all(&payload)?;
        writer.flush()?;

        let file = writer.into_inner().map_err(|e| {
            PropError::Storage(format!("Failed to flush snapshot: {}", e))
        })?;
        file.sync_all()?;

        fs::rename(&tmp_path, &self.path)?;
        tracing::trace!(path = %self.path.display(), bytes = payload.len(), "snapshot written");
        Ok(())
    }
}

/// Put back the entry a failed mutation replaced, so memory matches disk
fn restore(data: &mut BTreeMap<String, Scalar>, key: &str, previous: Option<Scalar>) {
    tracing::warn!(key, "snapshot write failed, mutation rolled back");
    match previous {
        Some(value) => {
            data.insert(key.to_string(), value);
        }
        None => {
            data.remove(key);
        }
    }
}

impl PropertyBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<Scalar>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: Scalar) -> Result<()> {
        check_size(key, &value, self.limit)?;
        let mut data = self.data.write();
        let previous = data.insert(key.to_string(), value);
        if let Err(e) = self.persist(&data) {
            restore(&mut data, key, previous);
            return Err(e);
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut data = self.data.write();
        if let Some(previous) = data.remove(key) {
            if let Err(e) = self.persist(&data) {
                restore(&mut data, key, Some(previous));
                return Err(e);
            }
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.data.read().keys().cloned().collect())
    }

    fn total_byte_usage(&self) -> Result<u64> {
        Ok(self.data.read().iter().map(|(k, v)| entry_usage(k, v)).sum())
    }

    fn value_size_limit(&self) -> usize {
        self.limit
    }
}
