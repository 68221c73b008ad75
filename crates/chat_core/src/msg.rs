#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the query input.
    InputChanged(String),
    /// User triggered send for the current input.
    SendClicked,
    /// The query endpoint answered for a cycle.
    QueryAnswered {
        cycle_id: crate::CycleId,
        answer: QueryAnswer,
    },
    /// Network, parse or handling failure for a cycle.
    QueryFailed { cycle_id: crate::CycleId },
    /// User clicked the sources button of a bot entry.
    SourcesToggled { entry_id: crate::EntryId },
    /// User asked to inspect a cited source.
    ChunkRequested { source_id: String },
    /// Source chunk content arrived.
    ChunkRetrieved { source_id: String, content: String },
    /// Source chunk could not be fetched.
    ChunkFailed { source_id: String },
    /// User asked for the list of indexed chunks.
    IndexListRequested,
    /// Indexed chunk ids arrived.
    IndexListed { ids: Vec<String> },
    /// Indexed chunk ids could not be fetched.
    IndexListFailed,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}

/// Successful response payload as seen by the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryAnswer {
    pub answer: String,
    pub sources: Vec<String>,
}

impl QueryAnswer {
    pub fn new(answer: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            answer: answer.into(),
            sources,
        }
    }
}
