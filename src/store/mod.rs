//! Store Module
//!
//! Ordered persistent key-value store over a single data file.
//!
//! ## Responsibilities
//! - Durable string-key → value mapping that survives restarts
//! - Ascending key-order iteration for deterministic listing
//! - Atomic per-key mutation with crash-safe commits
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Header (64 bytes)                           │
//! │ ┌──────────┬──────────┬───────────────────┐ │
//! │ │Magic (4) │Version(2)│ Reserved (2)      │ │
//! │ ├──────────┴──────────┴───────────────────┤ │
//! │ │ Meta Slot A (28)  │  Meta Slot B (28)   │ │
//! │ │ txid │ root │ count │ CRC32             │ │
//! │ └─────────────────────────────────────────┘ │
//! ├─────────────────────────────────────────────┤
//! │ Node Blocks (append-only)                   │
//! │ ┌────────┬────────┬───────────────────────┐ │
//! │ │Len (4) │CRC (4) │ Encoded leaf / branch │ │
//! │ └────────┴────────┴───────────────────────┘ │
//! │ ... (repeated, never rewritten in place)    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Commit Protocol
//! A mutation appends fresh copies of every node on the changed root-to-leaf
//! path, then flips the alternate meta slot to the new root with a higher
//! txid. On open the valid slot with the highest txid wins, so a torn tail
//! past the last committed root is ignored. Committed blocks are immutable,
//! which lets readers walk an old root without locking out the writer.

mod file;
mod iter;
mod node;
mod tree;

pub use iter::StoreIter;
pub use tree::Store;

/// Magic bytes identifying a Corkboard data file
pub(crate) const MAGIC: &[u8; 4] = b"CRKB";

/// Data file format version
pub(crate) const FORMAT_VERSION: u16 = 1;

/// Fixed header size: magic + version + reserved + two meta slots
pub(crate) const HEADER_SIZE: u64 = 64;

/// Size of one meta slot: txid (8) + root (8) + entry count (8) + crc (4)
pub(crate) const META_SLOT_SIZE: u64 = 28;

/// Name of the store's data file inside the data directory
pub(crate) const DATA_FILENAME: &str = "corkboard.db";

/// Max entries per tree node before it splits
pub(crate) const MAX_NODE_ENTRIES: usize = 64;

/// Upper bound on a single node block, used to reject corrupt lengths
pub(crate) const MAX_BLOCK_BYTES: u32 = 256 * 1024 * 1024;

/// Keys are length-prefixed with u16
pub(crate) const MAX_KEY_BYTES: usize = u16::MAX as usize;

/// Values are length-prefixed with u32
pub(crate) const MAX_VALUE_BYTES: usize = u32::MAX as usize;
