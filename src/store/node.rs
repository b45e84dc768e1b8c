//! Tree node encoding
//!
//! Encodes leaf and branch nodes to the on-disk block payload format.
//!
//! Layout (little-endian):
//! - Leaf:   `[0x01][count u16]` then per entry `[key_len u16][val_len u32][key][value]`
//! - Branch: `[0x02][count u16]` then per entry `[key_len u16][child u64][key]`

use crate::error::Result;
use crate::CorkboardError;

/// Node tag byte for leaves
const TAG_LEAF: u8 = 0x01;
/// Node tag byte for branches
const TAG_BRANCH: u8 = 0x02;

/// A single tree node, decoded from a block payload
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Node {
    /// Sorted (key, value) entries
    Leaf(Vec<(String, Vec<u8>)>),

    /// Sorted (min key of subtree, child block offset) entries
    Branch(Vec<(String, u64)>),
}

impl Node {
    /// Encode this node into a block payload
    pub(super) fn encode(&self) -> Vec<u8> {
        match self {
            Node::Leaf(entries) => {
                let mut buf = Vec::with_capacity(3 + entries.len() * 16);
                buf.push(TAG_LEAF);
                buf.extend_from_slice(&(entries.len() as u16).to_le_bytes());
                for (key, value) in entries {
                    buf.extend_from_slice(&(key.len() as u16).to_le_bytes());
                    buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
                    buf.extend_from_slice(key.as_bytes());
                    buf.extend_from_slice(value);
                }
                buf
            }
            Node::Branch(entries) => {
                let mut buf = Vec::with_capacity(3 + entries.len() * 16);
                buf.push(TAG_BRANCH);
                buf.extend_from_slice(&(entries.len() as u16).to_le_bytes());
                for (key, child) in entries {
                    buf.extend_from_slice(&(key.len() as u16).to_le_bytes());
                    buf.extend_from_slice(&child.to_le_bytes());
                    buf.extend_from_slice(key.as_bytes());
                }
                buf
            }
        }
    }

    /// Decode a node from a block payload
    pub(super) fn decode(payload: &[u8]) -> Result<Node> {
        let mut cursor = Cursor::new(payload);
        let tag = cursor.take(1)?[0];
        let count = u16::from_le_bytes(cursor.take(2)?.try_into().unwrap()) as usize;

        match tag {
            TAG_LEAF => {
                let mut entries = Vec::with_capacity(count);
                for _ in 0..count {
                    let key_len =
                        u16::from_le_bytes(cursor.take(2)?.try_into().unwrap()) as usize;
                    let val_len =
                        u32::from_le_bytes(cursor.take(4)?.try_into().unwrap()) as usize;
                    let key = decode_key(cursor.take(key_len)?)?;
                    let value = cursor.take(val_len)?.to_vec();
                    entries.push((key, value));
                }
                cursor.finish()?;
                Ok(Node::Leaf(entries))
            }
            TAG_BRANCH => {
                let mut entries = Vec::with_capacity(count);
                for _ in 0..count {
                    let key_len =
                        u16::from_le_bytes(cursor.take(2)?.try_into().unwrap()) as usize;
                    let child = u64::from_le_bytes(cursor.take(8)?.try_into().unwrap());
                    let key = decode_key(cursor.take(key_len)?)?;
                    entries.push((key, child));
                }
                cursor.finish()?;
                Ok(Node::Branch(entries))
            }
            other => Err(CorkboardError::Corruption(format!(
                "unknown node tag: {:#04x}",
                other
            ))),
        }
    }
}

fn decode_key(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| CorkboardError::Corruption("non-UTF-8 key in node".to_string()))
}

/// Bounds-checked reader over a block payload
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or_else(truncated)?;
        if end > self.data.len() {
            return Err(truncated());
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// All declared entries must consume the payload exactly
    fn finish(self) -> Result<()> {
        if self.pos != self.data.len() {
            return Err(CorkboardError::Corruption(
                "trailing bytes after node entries".to_string(),
            ));
        }
        Ok(())
    }
}

fn truncated() -> CorkboardError {
    CorkboardError::Corruption("truncated node payload".to_string())
}
