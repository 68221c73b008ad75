#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Post `{query}` to the query endpoint; the answer comes back tagged with `cycle_id`.
    DispatchQuery {
        cycle_id: crate::CycleId,
        query: String,
    },
    /// Fetch the content of a cited source chunk.
    RetrieveChunk { source_id: String },
    /// Fetch the ids of all indexed chunks.
    ListIndexedItems,
    /// Move the transcript viewport to its maximum scroll extent.
    ScrollToBottom,
}
