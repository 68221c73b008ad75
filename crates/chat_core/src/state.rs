use std::collections::BTreeSet;

use crate::view_model::{AppViewModel, EntryRole, EntryView, SourcesView};

pub type CycleId = u64;
pub type EntryId = u64;

/// Text shown for every failed query cycle.
pub const COMMUNICATION_ERROR_TEXT: &str = "Error communicating with the server.";
/// Text of the transient placeholder shown while a query is in flight.
pub const PENDING_TEXT: &str = "I am thinking...";

const SOURCES_COLLAPSED_LABEL: &str = "Show sources +";
const SOURCES_EXPANDED_LABEL: &str = "Show sources -";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    User {
        text: String,
    },
    Bot {
        answer: String,
        sources: Option<SourcesBlock>,
    },
    Error {
        text: String,
    },
    /// Placeholder owned by one in-flight cycle.
    Pending {
        cycle_id: CycleId,
    },
    Divider,
    SourceChunk {
        source_id: String,
        content: String,
    },
    /// Ids of everything indexed on the server.
    IndexedItems {
        ids: Vec<String>,
    },
}

/// Collapsible citation list attached to a bot answer. Starts collapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcesBlock {
    items: Vec<String>,
    expanded: bool,
}

impl SourcesBlock {
    /// Returns `None` for an empty list: no block is rendered then.
    pub fn collapsed(items: Vec<String>) -> Option<Self> {
        if items.is_empty() {
            None
        } else {
            Some(Self {
                items,
                expanded: false,
            })
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn toggle(&mut self) {
        self.expanded = !self.expanded;
    }

    pub fn button_label(&self) -> &'static str {
        if self.expanded {
            SOURCES_EXPANDED_LABEL
        } else {
            SOURCES_COLLAPSED_LABEL
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub entry_id: EntryId,
    pub entry: Entry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    input: String,
    transcript: Vec<TranscriptEntry>,
    /// Cycles awaiting a response. A settled or unknown cycle is absent.
    awaiting: BTreeSet<CycleId>,
    next_cycle_id: CycleId,
    next_entry_id: EntryId,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            input: String::new(),
            transcript: Vec::new(),
            awaiting: BTreeSet::new(),
            next_cycle_id: 1,
            next_entry_id: 1,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn is_awaiting(&self, cycle_id: CycleId) -> bool {
        self.awaiting.contains(&cycle_id)
    }

    pub fn in_flight(&self) -> usize {
        self.awaiting.len()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            input: self.input.clone(),
            entries: self.transcript.iter().map(entry_view).collect(),
            in_flight: self.in_flight(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything visible changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn set_input(&mut self, text: String) {
        if self.input != text {
            self.input = text;
            self.dirty = true;
        }
    }

    pub(crate) fn take_input(&mut self) -> String {
        self.dirty = true;
        std::mem::take(&mut self.input)
    }

    pub(crate) fn begin_cycle(&mut self) -> CycleId {
        let cycle_id = self.next_cycle_id;
        self.next_cycle_id += 1;
        self.awaiting.insert(cycle_id);
        cycle_id
    }

    /// Settles an awaiting cycle. Returns false if the cycle is unknown or already settled,
    /// in which case nothing changes.
    pub(crate) fn settle_cycle(&mut self, cycle_id: CycleId) -> bool {
        self.awaiting.remove(&cycle_id)
    }

    pub(crate) fn append(&mut self, entry: Entry) -> EntryId {
        let entry_id = self.next_entry_id;
        self.next_entry_id += 1;
        self.transcript.push(TranscriptEntry { entry_id, entry });
        self.dirty = true;
        entry_id
    }

    pub(crate) fn remove_placeholder(&mut self, cycle_id: CycleId) -> bool {
        let position = self.transcript.iter().position(|item| {
            matches!(item.entry, Entry::Pending { cycle_id: owner } if owner == cycle_id)
        });
        match position {
            Some(index) => {
                self.transcript.remove(index);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    pub(crate) fn toggle_sources(&mut self, entry_id: EntryId) -> bool {
        let block = self
            .transcript
            .iter_mut()
            .find(|item| item.entry_id == entry_id)
            .and_then(|item| match &mut item.entry {
                Entry::Bot {
                    sources: Some(block),
                    ..
                } => Some(block),
                _ => None,
            });
        match block {
            Some(block) => {
                block.toggle();
                self.dirty = true;
                true
            }
            None => false,
        }
    }
}

fn entry_view(item: &TranscriptEntry) -> EntryView {
    let (role, text, sources) = match &item.entry {
        Entry::User { text } => (EntryRole::User, text.clone(), None),
        Entry::Bot { answer, sources } => (
            EntryRole::Bot,
            answer.clone(),
            sources.as_ref().map(|block| SourcesView {
                button_label: block.button_label().to_string(),
                expanded: block.is_expanded(),
                items: block.items().to_vec(),
            }),
        ),
        Entry::Error { text } => (EntryRole::Error, text.clone(), None),
        Entry::Pending { .. } => (EntryRole::Pending, PENDING_TEXT.to_string(), None),
        Entry::Divider => (EntryRole::Divider, String::new(), None),
        Entry::SourceChunk { source_id, content } => (
            EntryRole::SourceChunk {
                source_id: source_id.clone(),
            },
            content.clone(),
            None,
        ),
        Entry::IndexedItems { ids } => (
            EntryRole::IndexedItems { count: ids.len() },
            ids.join("\n"),
            None,
        ),
    };
    EntryView {
        entry_id: item.entry_id,
        role,
        text,
        sources,
    }
}
