//! Chat engine: query endpoint client and background request execution.
mod client;
mod engine;
mod types;

pub use client::{
    QueryClient, QuerySettings, ReqwestQueryClient, CHUNK_PATH, INDEX_PATH, QUERY_PATH,
};
pub use engine::{EngineError, EngineHandle};
pub use types::{
    ChunkRequest, ChunkResponse, CycleId, EngineEvent, FailureKind, IndexedItemsResponse,
    QueryError, QueryRequest, QueryResponse,
};
