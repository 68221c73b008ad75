use std::io;
use std::sync::{mpsc, Arc};
use std::thread;

use chat_logging::{chat_info, chat_warn};
use thiserror::Error;

use crate::client::{QueryClient, QuerySettings, ReqwestQueryClient};
use crate::{ChunkRequest, CycleId, EngineEvent, QueryError, QueryRequest};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] io::Error),
    #[error("failed to build http client: {0}")]
    Client(#[from] QueryError),
}

enum EngineCommand {
    Query { cycle_id: CycleId, query: String },
    RetrieveChunk { source_id: String },
    ListIndexed,
}

/// Runs requests on a background tokio runtime. Every command becomes its own task, so
/// completions are reported in whatever order the server answers.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: QuerySettings) -> Result<Self, EngineError> {
        let client = ReqwestQueryClient::new(settings)?;
        Self::with_client(Arc::new(client))
    }

    pub fn with_client(client: Arc<dyn QueryClient>) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let client = client.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(client.as_ref(), command, event_tx).await;
                });
            }
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn query(&self, cycle_id: CycleId, query: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Query {
            cycle_id,
            query: query.into(),
        });
    }

    pub fn retrieve_chunk(&self, source_id: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::RetrieveChunk {
            source_id: source_id.into(),
        });
    }

    pub fn list_indexed_items(&self) {
        let _ = self.cmd_tx.send(EngineCommand::ListIndexed);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }
}

async fn handle_command(
    client: &dyn QueryClient,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Query { cycle_id, query } => {
            chat_info!("Dispatching cycle={} query_len={}", cycle_id, query.len());
            let result = client.query(&QueryRequest { query }).await;
            match &result {
                Ok(response) => chat_info!(
                    "Cycle {} answered: answer_len={} sources={}",
                    cycle_id,
                    response.answer_text().len(),
                    response.source_list().len()
                ),
                Err(err) => chat_warn!("Cycle {} failed: {}", cycle_id, err),
            }
            let _ = event_tx.send(EngineEvent::QueryCompleted { cycle_id, result });
        }
        EngineCommand::RetrieveChunk { source_id } => {
            let result = client
                .retrieve_chunk(&ChunkRequest {
                    id: source_id.clone(),
                })
                .await;
            if let Err(err) = &result {
                chat_warn!("Chunk {} failed: {}", source_id, err);
            }
            let _ = event_tx.send(EngineEvent::ChunkCompleted { source_id, result });
        }
        EngineCommand::ListIndexed => {
            let result = client.list_indexed_items().await;
            match &result {
                Ok(listing) => chat_info!(
                    "Index lists {} items ({} ids returned)",
                    listing.n_items,
                    listing.ids.len()
                ),
                Err(err) => chat_warn!("Index listing failed: {}", err),
            }
            let _ = event_tx.send(EngineEvent::IndexListed { result });
        }
    }
}
