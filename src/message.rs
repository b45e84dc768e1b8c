//! Message records and operation inputs
//!
//! The `Message` struct is both the stored value (bincode) and the wire
//! shape (serde JSON, camelCase field names with the legacy `attachmentURL`
//! spelling). Each service operation takes its own typed input struct; all
//! fields arrive optional so that missing ones become field-level validation
//! errors instead of deserialization failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single message record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique identifier (UUID v4), assigned at creation, immutable
    pub id: String,

    /// Message title
    pub title: String,

    /// Message body
    pub body: String,

    /// Optional attachment URL; empty string when absent
    #[serde(rename = "attachmentURL")]
    pub attachment_url: String,

    /// Creation time, immutable after insert
    pub created_at: DateTime<Utc>,

    /// Last update time; `None` until the first update
    pub updated_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Serialize to the stored value format
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from the stored value format
    pub fn decode(bytes: &[u8]) -> Result<Message> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Input for the create operation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateMessage {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub body: Option<String>,

    #[serde(default, rename = "attachmentURL")]
    pub attachment_url: Option<String>,
}

/// Input for the update operation
///
/// Omitted or empty fields keep their current value (shallow merge).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMessage {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub body: Option<String>,

    #[serde(default, rename = "attachmentURL")]
    pub attachment_url: Option<String>,
}

/// Input for the list operation
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ListMessages {
    /// 1-based page number; defaults to 1
    #[serde(default)]
    pub page: Option<i64>,

    /// Page size; defaults to 10
    #[serde(default)]
    pub limit: Option<i64>,
}

/// One page of the ordered message sequence
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    /// Total number of messages in the store
    pub total: u64,

    /// The requested page (1-based)
    pub page: u64,

    /// The requested page size
    pub limit: u64,

    /// `ceil(total / limit)`
    pub total_pages: u64,

    /// The `[(page-1)*limit, page*limit)` window, clamped to range
    pub data: Vec<Message>,
}
