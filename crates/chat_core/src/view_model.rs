use crate::EntryId;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub input: String,
    pub entries: Vec<EntryView>,
    pub in_flight: usize,
    pub dirty: bool,
}

/// Visual role of a transcript entry; the frontend styles each one differently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRole {
    User,
    Bot,
    Error,
    Pending,
    Divider,
    SourceChunk { source_id: String },
    /// Listing of indexed ids, one per line of the entry text.
    IndexedItems { count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView {
    pub entry_id: EntryId,
    pub role: EntryRole,
    pub text: String,
    pub sources: Option<SourcesView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcesView {
    pub button_label: String,
    pub expanded: bool,
    pub items: Vec<String>,
}
