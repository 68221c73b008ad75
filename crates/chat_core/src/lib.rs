//! Chat core: pure transcript state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::{Msg, QueryAnswer};
pub use state::{
    AppState, CycleId, Entry, EntryId, SourcesBlock, TranscriptEntry,
    COMMUNICATION_ERROR_TEXT, PENDING_TEXT,
};
pub use update::update;
pub use view_model::{AppViewModel, EntryRole, EntryView, SourcesView};
