//! The Store
//!
//! Copy-on-write B-tree over the append-only data file.
//!
//! ## Concurrency Model: Single-Writer / Multiple-Reader
//!
//! - **Mutations** (insert/remove/compact): serialized by `write_lock`.
//!   A mutation appends new versions of every node on the changed path,
//!   then commits by flipping the alternate meta slot.
//! - **Reads** (get/iter/len): snapshot the committed root under the state
//!   RwLock, then walk blocks that are already immutable on disk. A reader
//!   never sees a partially-applied mutation.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::config::{Config, SyncStrategy};
use crate::error::Result;
use crate::CorkboardError;

use super::file::{DataFile, Meta};
use super::iter::StoreIter;
use super::node::Node;
use super::{DATA_FILENAME, MAX_KEY_BYTES, MAX_NODE_ENTRIES, MAX_VALUE_BYTES};

/// Outcome of rewriting one level of the tree during insert
enum InsertOutcome {
    /// The subtree was rewritten in place (new offset, possibly new min key)
    Placed { offset: u64, min_key: String },

    /// The subtree split into two siblings
    Split {
        left: (String, u64),
        right: (String, u64),
    },
}

/// Ordered durable key-value store backed by a single data file
pub struct Store {
    /// Store configuration
    config: Config,

    /// Handle to the data file (internal mutex)
    file: DataFile,

    /// Last committed meta; the read path's snapshot source
    state: RwLock<Meta>,

    /// Serializes mutations (insert/remove)
    write_lock: Mutex<()>,

    /// Commits since the last fsync (for SyncStrategy::EveryNCommits)
    unsynced_commits: AtomicUsize,
}

impl Store {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Create the data directory if it doesn't exist
    /// 2. Open or create the data file
    /// 3. Recover the latest committed meta slot
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let path = config.data_dir.join(DATA_FILENAME);
        let (file, meta) = DataFile::open_or_create(&path)?;

        tracing::info!(
            path = %path.display(),
            txid = meta.txid,
            entries = meta.entry_count,
            "opened data file"
        );

        Ok(Self {
            config,
            file,
            state: RwLock::new(meta),
            write_lock: Mutex::new(()),
            unsynced_commits: AtomicUsize::new(0),
        })
    }

    /// Open with a data directory path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let mut config = Config::default();
        config.data_dir = path.to_path_buf();
        Self::open(config)
    }

    // =========================================================================
    // Point Operations
    // =========================================================================

    /// Get the current value for a key
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let root = self.state.read().root;
        if root == 0 {
            return Ok(None);
        }
        self.lookup(root, key)
    }

    /// Insert or overwrite the value at `key`
    ///
    /// Returns the previous value if one existed.
    pub fn insert(&self, key: &str, value: &[u8]) -> Result<Option<Vec<u8>>> {
        if key.len() > MAX_KEY_BYTES {
            return Err(CorkboardError::Storage(format!(
                "key length {} exceeds limit",
                key.len()
            )));
        }
        if value.len() > MAX_VALUE_BYTES {
            return Err(CorkboardError::Storage(format!(
                "value length {} exceeds limit",
                value.len()
            )));
        }

        let _guard = self.write_lock.lock();
        let meta = *self.state.read();

        let (new_root, prev) = if meta.root == 0 {
            let offset =
                self.append_node(&Node::Leaf(vec![(key.to_string(), value.to_vec())]))?;
            (offset, None)
        } else {
            let (outcome, prev) = self.insert_rec(meta.root, key, value)?;
            let root = match outcome {
                InsertOutcome::Placed { offset, .. } => offset,
                InsertOutcome::Split { left, right } => {
                    self.append_node(&Node::Branch(vec![left, right]))?
                }
            };
            (root, prev)
        };

        let entry_count = meta.entry_count + u64::from(prev.is_none());
        self.commit(Meta {
            txid: meta.txid + 1,
            root: new_root,
            entry_count,
        })?;

        Ok(prev)
    }

    /// Remove the entry at `key`
    ///
    /// Returns the removed value, or `None` when the key was absent (in which
    /// case nothing is committed).
    pub fn remove(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let _guard = self.write_lock.lock();
        let meta = *self.state.read();

        if meta.root == 0 {
            return Ok(None);
        }

        let (outcome, removed) = self.remove_rec(meta.root, key)?;
        let removed = match removed {
            Some(value) => value,
            None => return Ok(None),
        };

        let mut new_root = outcome.map(|(_, offset)| offset).unwrap_or(0);

        // A root branch left with a single child just forwards to it; drop
        // such levels so the height tracks the entry count back down.
        while new_root != 0 {
            match self.read_node(new_root)? {
                Node::Branch(entries) if entries.len() == 1 => new_root = entries[0].1,
                _ => break,
            }
        }

        self.commit(Meta {
            txid: meta.txid + 1,
            root: new_root,
            entry_count: meta.entry_count - 1,
        })?;

        Ok(Some(removed))
    }

    // =========================================================================
    // Iteration & Introspection
    // =========================================================================

    /// Iterate all entries in ascending key order
    ///
    /// The iterator walks the root committed at creation time, so it yields a
    /// consistent snapshot even while mutations land concurrently.
    pub fn iter(&self) -> StoreIter<'_> {
        let root = self.state.read().root;
        StoreIter::new(self, root)
    }

    /// Number of committed entries
    pub fn len(&self) -> u64 {
        self.state.read().entry_count
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Force the data file to durable media
    pub fn sync(&self) -> Result<()> {
        self.file.sync()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the data file
    pub fn data_path(&self) -> &Path {
        self.file.path()
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Rewrite the data file, dropping superseded node versions
    ///
    /// The append-only file grows with every commit; compaction bulk-loads
    /// the live entries into a fresh file and atomically renames it over the
    /// old one. Exclusive access (`&mut self`) keeps iterators and concurrent
    /// operations out for the duration.
    pub fn compact(&mut self) -> Result<()> {
        let entries: Vec<(String, Vec<u8>)> = self.iter().collect::<Result<_>>()?;
        let meta = *self.state.read();

        let tmp_path = self.file.path().with_extension("db.compact");
        let (tmp, _) = DataFile::create(&tmp_path)?;

        // Bulk-load bottom-up: pack sorted entries into full leaves, then
        // stack branch levels until a single root remains.
        let root = if entries.is_empty() {
            0
        } else {
            let mut level: Vec<(String, u64)> = Vec::new();
            for chunk in entries.chunks(MAX_NODE_ENTRIES) {
                let min_key = chunk[0].0.clone();
                let offset = tmp.append_block(&Node::Leaf(chunk.to_vec()).encode())?;
                level.push((min_key, offset));
            }
            while level.len() > 1 {
                let mut next = Vec::new();
                for chunk in level.chunks(MAX_NODE_ENTRIES) {
                    let min_key = chunk[0].0.clone();
                    let offset = tmp.append_block(&Node::Branch(chunk.to_vec()).encode())?;
                    next.push((min_key, offset));
                }
                level = next;
            }
            level[0].1
        };

        let new_meta = Meta {
            txid: meta.txid + 1,
            root,
            entry_count: entries.len() as u64,
        };
        tmp.sync()?;
        tmp.write_meta(&new_meta)?;
        tmp.sync()?;
        drop(tmp);

        let path = self.file.path().to_path_buf();
        fs::rename(&tmp_path, &path)?;

        let (file, recovered) = DataFile::open(&path)?;
        self.file = file;
        *self.state.write() = recovered;
        self.unsynced_commits.store(0, Ordering::Relaxed);

        tracing::info!(entries = recovered.entry_count, "compacted data file");

        Ok(())
    }

    // =========================================================================
    // Internal Tree Walks
    // =========================================================================

    /// Read and decode the node block at `offset`
    pub(super) fn read_node(&self, offset: u64) -> Result<Node> {
        let payload = self.file.read_block(offset)?;
        Node::decode(&payload)
    }

    fn append_node(&self, node: &Node) -> Result<u64> {
        self.file.append_block(&node.encode())
    }

    /// Descend from `offset` to the leaf that could hold `key`
    fn lookup(&self, mut offset: u64, key: &str) -> Result<Option<Vec<u8>>> {
        loop {
            match self.read_node(offset)? {
                Node::Leaf(mut entries) => {
                    return Ok(
                        match entries.binary_search_by(|(k, _)| k.as_str().cmp(key)) {
                            Ok(idx) => Some(entries.swap_remove(idx).1),
                            Err(_) => None,
                        },
                    );
                }
                Node::Branch(entries) => {
                    let idx = entries.partition_point(|(k, _)| k.as_str() <= key);
                    if idx == 0 {
                        // Key sorts below every subtree minimum
                        return Ok(None);
                    }
                    offset = entries[idx - 1].1;
                }
            }
        }
    }

    fn insert_rec(
        &self,
        offset: u64,
        key: &str,
        value: &[u8],
    ) -> Result<(InsertOutcome, Option<Vec<u8>>)> {
        match self.read_node(offset)? {
            Node::Leaf(mut entries) => {
                let prev = match entries.binary_search_by(|(k, _)| k.as_str().cmp(key)) {
                    Ok(idx) => Some(std::mem::replace(&mut entries[idx].1, value.to_vec())),
                    Err(idx) => {
                        entries.insert(idx, (key.to_string(), value.to_vec()));
                        None
                    }
                };
                Ok((self.write_leaf(entries)?, prev))
            }
            Node::Branch(mut entries) => {
                let idx = entries.partition_point(|(k, _)| k.as_str() <= key);
                // A key below every minimum goes into the leftmost child,
                // whose min key the recursion then lowers.
                let child_idx = idx.saturating_sub(1);

                let (child_outcome, prev) =
                    self.insert_rec(entries[child_idx].1, key, value)?;
                match child_outcome {
                    InsertOutcome::Placed { offset, min_key } => {
                        entries[child_idx] = (min_key, offset);
                    }
                    InsertOutcome::Split { left, right } => {
                        entries[child_idx] = left;
                        entries.insert(child_idx + 1, right);
                    }
                }
                Ok((self.write_branch(entries)?, prev))
            }
        }
    }

    /// Append a rewritten leaf, splitting when over capacity
    fn write_leaf(&self, mut entries: Vec<(String, Vec<u8>)>) -> Result<InsertOutcome> {
        if entries.len() <= MAX_NODE_ENTRIES {
            let min_key = entries[0].0.clone();
            let offset = self.append_node(&Node::Leaf(entries))?;
            return Ok(InsertOutcome::Placed { offset, min_key });
        }

        let right_entries = entries.split_off(entries.len() / 2);
        let left_min = entries[0].0.clone();
        let right_min = right_entries[0].0.clone();
        let left_offset = self.append_node(&Node::Leaf(entries))?;
        let right_offset = self.append_node(&Node::Leaf(right_entries))?;

        Ok(InsertOutcome::Split {
            left: (left_min, left_offset),
            right: (right_min, right_offset),
        })
    }

    /// Append a rewritten branch, splitting when over capacity
    fn write_branch(&self, mut entries: Vec<(String, u64)>) -> Result<InsertOutcome> {
        if entries.len() <= MAX_NODE_ENTRIES {
            let min_key = entries[0].0.clone();
            let offset = self.append_node(&Node::Branch(entries))?;
            return Ok(InsertOutcome::Placed { offset, min_key });
        }

        let right_entries = entries.split_off(entries.len() / 2);
        let left_min = entries[0].0.clone();
        let right_min = right_entries[0].0.clone();
        let left_offset = self.append_node(&Node::Branch(entries))?;
        let right_offset = self.append_node(&Node::Branch(right_entries))?;

        Ok(InsertOutcome::Split {
            left: (left_min, left_offset),
            right: (right_min, right_offset),
        })
    }

    /// Remove `key` under `offset`
    ///
    /// Returns the rewritten subtree as `Some((min key, offset))`, or `None`
    /// when the subtree emptied out, plus the removed value. When the key is
    /// absent nothing is rewritten and the original offset is returned.
    fn remove_rec(
        &self,
        offset: u64,
        key: &str,
    ) -> Result<(Option<(String, u64)>, Option<Vec<u8>>)> {
        match self.read_node(offset)? {
            Node::Leaf(mut entries) => {
                let idx = match entries.binary_search_by(|(k, _)| k.as_str().cmp(key)) {
                    Ok(idx) => idx,
                    Err(_) => return Ok((Some((entries[0].0.clone(), offset)), None)),
                };

                let (_, value) = entries.remove(idx);
                if entries.is_empty() {
                    return Ok((None, Some(value)));
                }

                let min_key = entries[0].0.clone();
                let new_offset = self.append_node(&Node::Leaf(entries))?;
                Ok((Some((min_key, new_offset)), Some(value)))
            }
            Node::Branch(mut entries) => {
                let idx = entries.partition_point(|(k, _)| k.as_str() <= key);
                if idx == 0 {
                    return Ok((Some((entries[0].0.clone(), offset)), None));
                }
                let child_idx = idx - 1;

                let (child_result, removed) = self.remove_rec(entries[child_idx].1, key)?;
                if removed.is_none() {
                    return Ok((Some((entries[0].0.clone(), offset)), None));
                }

                match child_result {
                    Some((min_key, offset)) => entries[child_idx] = (min_key, offset),
                    None => {
                        entries.remove(child_idx);
                    }
                }

                if entries.is_empty() {
                    return Ok((None, removed));
                }

                let min_key = entries[0].0.clone();
                let new_offset = self.append_node(&Node::Branch(entries))?;
                Ok((Some((min_key, new_offset)), removed))
            }
        }
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Publish a new committed state
    ///
    /// Appended blocks must reach the disk before the meta slot that points
    /// at them, hence the fsync on either side of the slot write.
    fn commit(&self, meta: Meta) -> Result<()> {
        let durable = match self.config.sync_strategy {
            SyncStrategy::EveryCommit => true,
            SyncStrategy::EveryNCommits { count } => {
                self.unsynced_commits.fetch_add(1, Ordering::Relaxed) + 1 >= count
            }
        };

        if durable {
            self.file.sync()?;
        }
        self.file.write_meta(&meta)?;
        if durable {
            self.file.sync()?;
            self.unsynced_commits.store(0, Ordering::Relaxed);
        }

        *self.state.write() = meta;

        tracing::debug!(
            txid = meta.txid,
            entries = meta.entry_count,
            durable,
            "committed"
        );

        Ok(())
    }
}
