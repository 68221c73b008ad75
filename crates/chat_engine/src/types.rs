use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type CycleId = u64;

/// Body of `POST /query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

/// Response of `POST /query`. Both fields tolerate absence and `null`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
}

impl QueryResponse {
    pub fn answer_text(&self) -> &str {
        self.answer.as_deref().unwrap_or_default()
    }

    pub fn source_list(&self) -> &[String] {
        self.sources.as_deref().unwrap_or_default()
    }
}

/// Body of `POST /database/retrieve_chunk`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRequest {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChunkResponse {
    #[serde(default)]
    pub page_content: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Response of `GET /database/list_indexed_items`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexedItemsResponse {
    #[serde(default)]
    pub n_items: usize,
    #[serde(default)]
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    QueryCompleted {
        cycle_id: CycleId,
        result: Result<QueryResponse, QueryError>,
    },
    ChunkCompleted {
        source_id: String,
        result: Result<ChunkResponse, QueryError>,
    },
    IndexListed {
        result: Result<IndexedItemsResponse, QueryError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct QueryError {
    pub kind: FailureKind,
    pub message: String,
}

impl QueryError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Network,
    Timeout,
    /// Only produced when status checking is enabled.
    HttpStatus(u16),
    MalformedResponse,
    ProcessingError,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::MalformedResponse => write!(f, "malformed response"),
            FailureKind::ProcessingError => write!(f, "processing error"),
        }
    }
}
