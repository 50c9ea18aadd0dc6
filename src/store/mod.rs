//! Destination for validated standings.
//!
//! A write replaces the whole document at a fixed path. There is no
//! precondition or merge; the last writer wins.

pub mod firestore;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::AuthError;
use crate::data::models::StandingsDocument;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Invalid destination path: {0}")]
    InvalidPath(String),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("HTTP error: {status_code} {status} - {message}")]
    Http {
        status_code: u16,
        status: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),
}

impl StoreError {
    /// Parse a Google API error body (`{"error": {"status", "message"}}`).
    pub fn from_response(status_code: u16, body: &str) -> Self {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
            let error = json.get("error").unwrap_or(&json);
            let status = error
                .get("status")
                .and_then(|v| v.as_str())
                .unwrap_or("UNKNOWN")
                .to_string();
            let message = error
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or(body)
                .to_string();
            return Self::Http {
                status_code,
                status,
                message,
            };
        }

        Self::Http {
            status_code,
            status: "UNKNOWN".to_string(),
            message: body.to_string(),
        }
    }
}

/// `<collection path>/<document id>` of the standings record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    collection: String,
    document: String,
}

impl DocumentPath {
    /// Collection paths alternate collection/document segments, so they
    /// must have an odd number of non-empty segments.
    pub fn new(collection: &str, document: &str) -> Result<Self, StoreError> {
        let collection = collection.trim_matches('/');
        let segments: Vec<&str> = collection.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(StoreError::InvalidPath(format!(
                "empty segment in collection path {collection:?}"
            )));
        }
        if segments.len() % 2 == 0 {
            return Err(StoreError::InvalidPath(format!(
                "collection path {collection:?} has an even number of segments"
            )));
        }
        if document.is_empty() || document.contains('/') {
            return Err(StoreError::InvalidPath(format!(
                "document id {document:?} must be a single non-empty segment"
            )));
        }

        Ok(Self {
            collection: collection.to_string(),
            document: document.to_string(),
        })
    }
}

impl std::fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.document)
    }
}

#[async_trait]
pub trait StandingsStore: Send + Sync {
    /// Overwrite the document at `path`. Called at most once per run and
    /// never retried.
    async fn write(&self, path: &DocumentPath, document: &StandingsDocument)
        -> Result<(), StoreError>;
}
