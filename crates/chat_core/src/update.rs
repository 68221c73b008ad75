use crate::{AppState, Effect, Entry, Msg, SourcesBlock, COMMUNICATION_ERROR_TEXT};

const INDEX_LIST_ERROR_TEXT: &str = "Could not list indexed items.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(text) => {
            state.set_input(text);
            Vec::new()
        }
        Msg::SendClicked => {
            // Only the empty string is rejected; whitespace is sent as typed.
            if state.input().is_empty() {
                return (state, Vec::new());
            }
            let query = state.take_input();
            state.append(Entry::User {
                text: query.clone(),
            });
            let cycle_id = state.begin_cycle();
            state.append(Entry::Pending { cycle_id });
            vec![
                Effect::ScrollToBottom,
                Effect::ScrollToBottom,
                Effect::DispatchQuery { cycle_id, query },
            ]
        }
        Msg::QueryAnswered { cycle_id, answer } => {
            if !state.settle_cycle(cycle_id) {
                return (state, Vec::new());
            }
            state.remove_placeholder(cycle_id);
            state.append(Entry::Bot {
                answer: answer.answer,
                sources: SourcesBlock::collapsed(answer.sources),
            });
            state.append(Entry::Divider);
            vec![Effect::ScrollToBottom, Effect::ScrollToBottom]
        }
        Msg::QueryFailed { cycle_id } => {
            if !state.settle_cycle(cycle_id) {
                return (state, Vec::new());
            }
            state.remove_placeholder(cycle_id);
            state.append(Entry::Error {
                text: COMMUNICATION_ERROR_TEXT.to_string(),
            });
            vec![Effect::ScrollToBottom]
        }
        Msg::SourcesToggled { entry_id } => {
            state.toggle_sources(entry_id);
            Vec::new()
        }
        Msg::ChunkRequested { source_id } => {
            if source_id.is_empty() {
                Vec::new()
            } else {
                vec![Effect::RetrieveChunk { source_id }]
            }
        }
        Msg::ChunkRetrieved { source_id, content } => {
            state.append(Entry::SourceChunk { source_id, content });
            vec![Effect::ScrollToBottom]
        }
        Msg::ChunkFailed { source_id } => {
            state.append(Entry::Error {
                text: format!("Could not retrieve source {source_id}."),
            });
            vec![Effect::ScrollToBottom]
        }
        Msg::IndexListRequested => vec![Effect::ListIndexedItems],
        Msg::IndexListed { ids } => {
            state.append(Entry::IndexedItems { ids });
            vec![Effect::ScrollToBottom]
        }
        Msg::IndexListFailed => {
            state.append(Entry::Error {
                text: INDEX_LIST_ERROR_TEXT.to_string(),
            });
            vec![Effect::ScrollToBottom]
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
