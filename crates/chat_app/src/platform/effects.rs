use std::sync::Arc;

use chat_core::{Effect, Msg, QueryAnswer};
use chat_engine::{
    EngineError, EngineEvent, EngineHandle, QueryClient, QuerySettings, ReqwestQueryClient,
};
use chat_logging::{chat_debug, chat_info, chat_warn};

/// Executes IO effects on the engine and turns its completions back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: QuerySettings) -> Result<Self, EngineError> {
        chat_info!("Query server: {}", settings.base_url);
        let client = ReqwestQueryClient::new(settings)?;
        Self::with_client(Arc::new(client))
    }

    pub fn with_client(client: Arc<dyn QueryClient>) -> Result<Self, EngineError> {
        Ok(Self {
            engine: EngineHandle::with_client(client)?,
        })
    }

    /// Runs IO effects and returns whether a scroll to bottom was requested.
    pub fn enqueue(&self, effects: Vec<Effect>) -> bool {
        let mut scroll = false;
        for effect in effects {
            match effect {
                Effect::DispatchQuery { cycle_id, query } => {
                    chat_debug!("DispatchQuery cycle_id={} query={:?}", cycle_id, query);
                    self.engine.query(cycle_id, query);
                }
                Effect::RetrieveChunk { source_id } => {
                    chat_debug!("RetrieveChunk source_id={}", source_id);
                    self.engine.retrieve_chunk(source_id);
                }
                Effect::ListIndexedItems => {
                    chat_debug!("ListIndexedItems");
                    self.engine.list_indexed_items();
                }
                Effect::ScrollToBottom => scroll = true,
            }
        }
        scroll
    }

    pub fn drain_messages(&self) -> Vec<Msg> {
        let mut inbox = Vec::new();
        while let Some(event) = self.engine.try_recv() {
            inbox.push(map_event(event));
        }
        inbox
    }
}

/// Every failure kind collapses into the single user-facing error.
fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::QueryCompleted { cycle_id, result } => match result {
            Ok(response) => {
                let answer = QueryAnswer::new(
                    response.answer.unwrap_or_default(),
                    response.sources.unwrap_or_default(),
                );
                Msg::QueryAnswered { cycle_id, answer }
            }
            Err(err) => {
                chat_warn!("Cycle {} failed: {}", cycle_id, err);
                Msg::QueryFailed { cycle_id }
            }
        },
        EngineEvent::ChunkCompleted { source_id, result } => match result {
            Ok(chunk) => Msg::ChunkRetrieved {
                source_id,
                content: chunk.page_content,
            },
            Err(err) => {
                chat_warn!("Source {} could not be retrieved: {}", source_id, err);
                Msg::ChunkFailed { source_id }
            }
        },
        EngineEvent::IndexListed { result } => match result {
            Ok(listing) => Msg::IndexListed { ids: listing.ids },
            Err(err) => {
                chat_warn!("Indexed items could not be listed: {}", err);
                Msg::IndexListFailed
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::map_event;
    use chat_core::{Msg, QueryAnswer};
    use chat_engine::{
        ChunkResponse, EngineEvent, FailureKind, IndexedItemsResponse, QueryError, QueryResponse,
    };

    fn error(kind: FailureKind) -> QueryError {
        QueryError {
            kind,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn answer_with_missing_fields_maps_to_empty_values() {
        let msg = map_event(EngineEvent::QueryCompleted {
            cycle_id: 3,
            result: Ok(QueryResponse::default()),
        });
        assert_eq!(
            msg,
            Msg::QueryAnswered {
                cycle_id: 3,
                answer: QueryAnswer::default(),
            }
        );
    }

    #[test]
    fn every_failure_kind_maps_to_query_failed() {
        for kind in [
            FailureKind::Network,
            FailureKind::Timeout,
            FailureKind::MalformedResponse,
            FailureKind::HttpStatus(500),
        ] {
            let msg = map_event(EngineEvent::QueryCompleted {
                cycle_id: 1,
                result: Err(error(kind)),
            });
            assert_eq!(msg, Msg::QueryFailed { cycle_id: 1 });
        }
    }

    #[test]
    fn chunk_events_map_to_chunk_messages() {
        let ok = map_event(EngineEvent::ChunkCompleted {
            source_id: "a".to_string(),
            result: Ok(ChunkResponse {
                page_content: "body".to_string(),
                ..ChunkResponse::default()
            }),
        });
        assert_eq!(
            ok,
            Msg::ChunkRetrieved {
                source_id: "a".to_string(),
                content: "body".to_string(),
            }
        );

        let failed = map_event(EngineEvent::ChunkCompleted {
            source_id: "b".to_string(),
            result: Err(error(FailureKind::Network)),
        });
        assert_eq!(
            failed,
            Msg::ChunkFailed {
                source_id: "b".to_string()
            }
        );
    }

    #[test]
    fn index_events_map_to_listing_messages() {
        let ok = map_event(EngineEvent::IndexListed {
            result: Ok(IndexedItemsResponse {
                n_items: 1,
                ids: vec!["policy.pdf:0:0".to_string()],
            }),
        });
        assert_eq!(
            ok,
            Msg::IndexListed {
                ids: vec!["policy.pdf:0:0".to_string()]
            }
        );

        let failed = map_event(EngineEvent::IndexListed {
            result: Err(error(FailureKind::Timeout)),
        });
        assert_eq!(failed, Msg::IndexListFailed);
    }
}
