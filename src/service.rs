//! Message Service
//!
//! Owns the record lifecycle: identifier generation, timestamp capture, and
//! merge-on-update semantics, composed out of store calls.
//!
//! ## Responsibilities
//! - Validate operation inputs before any store access (fail fast)
//! - Generate collision-resistant ids (UUID v4)
//! - Paginate over the store's ordered iteration

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{FieldError, Result};
use crate::message::{CreateMessage, ListMessages, Message, MessagePage, UpdateMessage};
use crate::store::Store;
use crate::CorkboardError;

/// Default page number for list
const DEFAULT_PAGE: u64 = 1;
/// Default page size for list
const DEFAULT_LIMIT: u64 = 10;

/// The record service, sharing one store instance across all requests
pub struct MessageService {
    store: Arc<Store>,
}

impl MessageService {
    /// Create a service over an already-opened store
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Create a new message
    ///
    /// Requires non-empty `title` and `body`; a non-empty `attachmentURL`
    /// must parse as an absolute URL. Assigns a fresh UUID v4 id and the
    /// creation timestamp.
    pub fn create(&self, input: CreateMessage) -> Result<Message> {
        let mut errors = Vec::new();

        let title = match input.title.as_deref() {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => {
                errors.push(FieldError::new("title", "title is required"));
                String::new()
            }
        };
        let body = match input.body.as_deref() {
            Some(b) if !b.is_empty() => b.to_string(),
            _ => {
                errors.push(FieldError::new("body", "body is required"));
                String::new()
            }
        };
        let attachment_url = input.attachment_url.unwrap_or_default();
        if !attachment_url.is_empty() && !is_valid_url(&attachment_url) {
            errors.push(FieldError::new(
                "attachmentURL",
                "attachmentURL must be a valid URL",
            ));
        }

        if !errors.is_empty() {
            return Err(CorkboardError::Validation(errors));
        }

        let message = Message {
            id: Uuid::new_v4().to_string(),
            title,
            body,
            attachment_url,
            created_at: Utc::now(),
            updated_at: None,
        };

        self.store.insert(&message.id, &message.encode()?)?;
        tracing::debug!(id = %message.id, "created message");

        Ok(message)
    }

    /// List messages with offset/limit pagination
    ///
    /// Results are ordered ascending by id (the store's key order), which is
    /// not creation order. An out-of-range page yields an empty slice.
    pub fn list(&self, query: ListMessages) -> Result<MessagePage> {
        let mut errors = Vec::new();

        let page = match query.page {
            None => DEFAULT_PAGE,
            Some(p) if p >= 1 => p as u64,
            Some(_) => {
                errors.push(FieldError::new("page", "page must be a positive integer"));
                DEFAULT_PAGE
            }
        };
        let limit = match query.limit {
            None => DEFAULT_LIMIT,
            Some(l) if l >= 1 => l as u64,
            Some(_) => {
                errors.push(FieldError::new("limit", "limit must be a positive integer"));
                DEFAULT_LIMIT
            }
        };

        if !errors.is_empty() {
            return Err(CorkboardError::Validation(errors));
        }

        let mut messages = Vec::new();
        for entry in self.store.iter() {
            let (_, bytes) = entry?;
            messages.push(Message::decode(&bytes)?);
        }

        let total = messages.len() as u64;
        let total_pages = total.div_ceil(limit);
        let start = (page - 1).saturating_mul(limit).min(total);
        let end = page.saturating_mul(limit).min(total);
        let data = messages[start as usize..end as usize].to_vec();

        Ok(MessagePage {
            total,
            page,
            limit,
            total_pages,
            data,
        })
    }

    /// Fetch a message by id
    pub fn get(&self, id: &str) -> Result<Message> {
        match self.store.get(id)? {
            Some(bytes) => Message::decode(&bytes),
            None => Err(CorkboardError::NotFound { id: id.to_string() }),
        }
    }

    /// Update a message, merging over the stored record
    ///
    /// Omitted or empty fields keep their current value. The stored record is
    /// read, a full replacement is built (same id and `created_at`, fresh
    /// `updated_at`), and the snapshot is overwritten in one store call.
    pub fn update(&self, id: &str, input: UpdateMessage) -> Result<Message> {
        if let Some(url) = input.attachment_url.as_deref() {
            if !url.is_empty() && !is_valid_url(url) {
                return Err(CorkboardError::invalid(
                    "attachmentURL",
                    "attachmentURL must be a valid URL",
                ));
            }
        }

        let existing = self.get(id)?;

        let updated = Message {
            id: existing.id,
            title: merge_field(input.title, existing.title),
            body: merge_field(input.body, existing.body),
            attachment_url: merge_field(input.attachment_url, existing.attachment_url),
            created_at: existing.created_at,
            updated_at: Some(Utc::now()),
        };

        self.store.insert(id, &updated.encode()?)?;
        tracing::debug!(id = %updated.id, "updated message");

        Ok(updated)
    }

    /// Delete a message by id, returning the deleted record
    pub fn delete(&self, id: &str) -> Result<Message> {
        match self.store.remove(id)? {
            Some(bytes) => {
                tracing::debug!(id, "deleted message");
                Message::decode(&bytes)
            }
            None => Err(CorkboardError::NotFound { id: id.to_string() }),
        }
    }

    /// The shared store handle
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }
}

/// Merge rule for updates: a supplied non-empty value replaces, anything
/// else keeps the current one
fn merge_field(new: Option<String>, current: String) -> String {
    match new {
        Some(value) if !value.is_empty() => value,
        _ => current,
    }
}

/// Syntactic URL check: must parse as a URI with scheme and authority
fn is_valid_url(s: &str) -> bool {
    match s.parse::<http::Uri>() {
        Ok(uri) => uri.scheme().is_some() && uri.authority().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::is_valid_url;

    #[test]
    fn test_url_validation() {
        assert!(is_valid_url("https://example.com/file.png"));
        assert!(is_valid_url("http://localhost:8080/a?b=c"));
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url("/relative/path"));
        assert!(!is_valid_url(""));
    }
}
