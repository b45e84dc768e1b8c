//! Data file access
//!
//! Low-level reads and writes against the single store file: header
//! validation, CRC-protected meta slots, and append-only node blocks.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::Result;
use crate::CorkboardError;

use super::{FORMAT_VERSION, HEADER_SIZE, MAGIC, MAX_BLOCK_BYTES, META_SLOT_SIZE};

/// Committed store state, as recorded in a meta slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Meta {
    /// Commit counter, monotonically increasing
    pub txid: u64,

    /// Block offset of the root node (0 = empty tree)
    pub root: u64,

    /// Number of live entries at this commit
    pub entry_count: u64,
}

impl Meta {
    fn encode(&self) -> [u8; META_SLOT_SIZE as usize] {
        let mut buf = [0u8; META_SLOT_SIZE as usize];
        buf[0..8].copy_from_slice(&self.txid.to_le_bytes());
        buf[8..16].copy_from_slice(&self.root.to_le_bytes());
        buf[16..24].copy_from_slice(&self.entry_count.to_le_bytes());
        let crc = crc32fast::hash(&buf[0..24]);
        buf[24..28].copy_from_slice(&crc.to_le_bytes());
        buf
    }

    /// Parse a slot; returns None when the CRC does not hold (never-written
    /// slot, or a commit torn mid-write)
    fn decode(buf: &[u8]) -> Option<Meta> {
        let stored_crc = u32::from_le_bytes(buf[24..28].try_into().unwrap());
        if crc32fast::hash(&buf[0..24]) != stored_crc {
            return None;
        }
        let txid = u64::from_le_bytes(buf[0..8].try_into().unwrap());
        if txid == 0 {
            return None;
        }
        Some(Meta {
            txid,
            root: u64::from_le_bytes(buf[8..16].try_into().unwrap()),
            entry_count: u64::from_le_bytes(buf[16..24].try_into().unwrap()),
        })
    }
}

/// Handle to the store's single data file
///
/// All access goes through an internal mutex; committed blocks are immutable,
/// so holding the lock only for the duration of one seek-and-read keeps
/// readers and the writer from interleaving mid-block.
pub(super) struct DataFile {
    file: Mutex<File>,
    path: PathBuf,
}

impl DataFile {
    /// Create a fresh data file with an empty-tree meta slot
    pub(super) fn create(path: &Path) -> Result<(Self, Meta)> {
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(path)?;

        let meta = Meta {
            txid: 1,
            root: 0,
            entry_count: 0,
        };

        let mut header = [0u8; HEADER_SIZE as usize];
        header[0..4].copy_from_slice(MAGIC);
        header[4..6].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
        // Bytes 6..8 reserved; the never-written slot stays zeroed and fails
        // its CRC check on open.
        let slot = slot_offset(meta.txid) as usize;
        header[slot..slot + META_SLOT_SIZE as usize].copy_from_slice(&meta.encode());

        file.write_all(&header)?;
        file.sync_all()?;

        Ok((
            Self {
                file: Mutex::new(file),
                path: path.to_path_buf(),
            },
            meta,
        ))
    }

    /// Open an existing data file, recovering the latest committed meta
    pub(super) fn open(path: &Path) -> Result<(Self, Meta)> {
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;

        let mut header = [0u8; HEADER_SIZE as usize];
        file.seek(SeekFrom::Start(0))?;
        file.read_exact(&mut header)?;

        if &header[0..4] != MAGIC {
            return Err(CorkboardError::Corruption(format!(
                "invalid magic: expected CRKB, got {:?}",
                &header[0..4]
            )));
        }

        let version = u16::from_le_bytes(header[4..6].try_into().unwrap());
        if version != FORMAT_VERSION {
            return Err(CorkboardError::Corruption(format!(
                "unsupported format version: {}",
                version
            )));
        }

        // Both slots are candidates; the valid one with the highest txid is
        // the last fully-committed state.
        let slot_a = Meta::decode(&header[8..8 + META_SLOT_SIZE as usize]);
        let slot_b = Meta::decode(
            &header[8 + META_SLOT_SIZE as usize..8 + 2 * META_SLOT_SIZE as usize],
        );

        let meta = match (slot_a, slot_b) {
            (Some(a), Some(b)) => {
                if a.txid > b.txid {
                    a
                } else {
                    b
                }
            }
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => {
                return Err(CorkboardError::Corruption(
                    "no valid meta slot".to_string(),
                ))
            }
        };

        Ok((
            Self {
                file: Mutex::new(file),
                path: path.to_path_buf(),
            },
            meta,
        ))
    }

    /// Open the file at `path`, creating it when absent
    pub(super) fn open_or_create(path: &Path) -> Result<(Self, Meta)> {
        if path.exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Append a node block, returning its offset
    pub(super) fn append_block(&self, payload: &[u8]) -> Result<u64> {
        let mut file = self.file.lock();
        let offset = file.seek(SeekFrom::End(0))?;

        let len = payload.len() as u32;
        let crc = crc32fast::hash(payload);
        file.write_all(&len.to_le_bytes())?;
        file.write_all(&crc.to_le_bytes())?;
        file.write_all(payload)?;

        Ok(offset)
    }

    /// Read and verify the node block at `offset`
    pub(super) fn read_block(&self, offset: u64) -> Result<Vec<u8>> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;

        let mut header = [0u8; 8];
        file.read_exact(&mut header)?;

        let len = u32::from_le_bytes(header[0..4].try_into().unwrap());
        let stored_crc = u32::from_le_bytes(header[4..8].try_into().unwrap());

        if len > MAX_BLOCK_BYTES {
            return Err(CorkboardError::Corruption(format!(
                "block length {} exceeds limit at offset {}",
                len, offset
            )));
        }

        let mut payload = vec![0u8; len as usize];
        file.read_exact(&mut payload)?;

        if crc32fast::hash(&payload) != stored_crc {
            return Err(CorkboardError::Corruption(format!(
                "block checksum mismatch at offset {}",
                offset
            )));
        }

        Ok(payload)
    }

    /// Publish a commit by overwriting the alternate meta slot
    ///
    /// Callers must ensure the blocks the meta references are flushed first.
    pub(super) fn write_meta(&self, meta: &Meta) -> Result<()> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(slot_offset(meta.txid)))?;
        file.write_all(&meta.encode())?;
        Ok(())
    }

    /// Force all written data to durable media
    pub(super) fn sync(&self) -> Result<()> {
        self.file.lock().sync_all()?;
        Ok(())
    }

    /// Path of the underlying file
    pub(super) fn path(&self) -> &Path {
        &self.path
    }
}

/// Meta slots alternate by txid parity, so a torn slot write can only damage
/// the slot being replaced, never the last committed one.
fn slot_offset(txid: u64) -> u64 {
    8 + (txid % 2) * META_SLOT_SIZE
}
