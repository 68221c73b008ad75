use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use chat_core::{update, AppState, Msg};
use chat_logging::{chat_info, chat_warn};
use clap::Parser;

use super::config::{Args, ClientConfig};
use super::effects::EffectRunner;
use super::logging;
use super::ui::input::{self, Command};
use super::ui::render::{self, Viewport};

/// Engine completions are polled at this interval while no input arrives.
const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// Rows reserved below the transcript for the status line and prompt.
const CHROME_ROWS: u16 = 2;

enum LoopEvent {
    Msg(Msg),
    /// Lines to move the transcript window by.
    Scroll(isize),
    /// Stdin reached end of file. Queries already sent are still awaited.
    InputClosed,
    Quit,
}

pub fn run_app() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::initialize(&args.log_path());

    let config = match &args.config {
        Some(path) => ClientConfig::load(path),
        None => ClientConfig::default(),
    }
    .apply_args(&args);

    let runner = EffectRunner::new(config.query_settings()).context("starting query engine")?;
    let (event_tx, event_rx) = mpsc::channel::<LoopEvent>();
    spawn_stdin_reader(event_tx);

    let mut app = ChatApp::new(runner, io::stdout());
    app.render().context("drawing transcript")?;
    app.run(event_rx)
}

fn spawn_stdin_reader(event_tx: mpsc::Sender<LoopEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.lock().read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(err) => {
                    chat_warn!("Failed to read input: {}", err);
                    break;
                }
            }
            let events = match input::parse_line(&line) {
                Command::Quit => {
                    let _ = event_tx.send(LoopEvent::Quit);
                    return;
                }
                Command::Scroll(delta) => vec![LoopEvent::Scroll(delta)],
                Command::Invalid(reason) => {
                    chat_warn!("Ignored command: {}", reason);
                    Vec::new()
                }
                command => input::into_msgs(command)
                    .into_iter()
                    .map(LoopEvent::Msg)
                    .collect(),
            };
            for event in events {
                if event_tx.send(event).is_err() {
                    return;
                }
            }
        }
        let _ = event_tx.send(LoopEvent::InputClosed);
    });
}

/// Owns the transcript state; every mutation happens on the thread running [`ChatApp::run`].
struct ChatApp<W: Write> {
    state: AppState,
    runner: EffectRunner,
    viewport: Viewport,
    out: W,
}

impl<W: Write> ChatApp<W> {
    fn new(runner: EffectRunner, out: W) -> Self {
        Self {
            state: AppState::new(),
            runner,
            viewport: Viewport::new(transcript_rows()),
            out,
        }
    }

    /// Runs until `:quit`, or until input is closed and every sent query has settled.
    fn run(&mut self, event_rx: mpsc::Receiver<LoopEvent>) -> anyhow::Result<()> {
        let mut input_closed = false;
        loop {
            if input_closed {
                thread::sleep(POLL_INTERVAL);
            } else {
                match event_rx.recv_timeout(POLL_INTERVAL) {
                    Ok(LoopEvent::Msg(msg)) => self.dispatch_msg(msg),
                    Ok(LoopEvent::Scroll(delta)) => {
                        self.scroll_by(delta).context("drawing transcript")?
                    }
                    Ok(LoopEvent::Quit) => break,
                    Ok(LoopEvent::InputClosed) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                        chat_info!(
                            "Input closed; waiting for {} queries in flight",
                            self.state.in_flight()
                        );
                        input_closed = true;
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                }
            }
            for msg in self.runner.drain_messages() {
                self.dispatch_msg(msg);
            }
            if self.state.consume_dirty() {
                self.render().context("drawing transcript")?;
            }
            if input_closed && self.state.in_flight() == 0 {
                break;
            }
        }
        chat_info!(
            "Exiting with {} entries, {} queries in flight",
            self.state.transcript().len(),
            self.state.in_flight()
        );
        Ok(())
    }

    fn dispatch_msg(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        if self.runner.enqueue(effects) {
            self.scroll_to_bottom();
        }
    }

    fn scroll_to_bottom(&mut self) {
        let (width, _) = terminal_size();
        let total = render::build_lines(&self.state.view(), width).len();
        self.viewport.scroll_to_bottom(total);
    }

    /// Moves the window only; the transcript itself is untouched.
    fn scroll_by(&mut self, delta: isize) -> io::Result<()> {
        let (width, _) = terminal_size();
        let total = render::build_lines(&self.state.view(), width).len();
        self.viewport.scroll_by(delta, total);
        self.render()
    }

    fn render(&mut self) -> io::Result<()> {
        let (width, _) = terminal_size();
        self.viewport.resize(transcript_rows());
        let view = self.state.view();
        let lines = render::build_lines(&view, width);
        render::draw(&mut self.out, &lines, &self.viewport, &view)
    }
}

fn terminal_size() -> (usize, u16) {
    crossterm::terminal::size()
        .map(|(cols, rows)| (usize::from(cols), rows))
        .unwrap_or((80, 24))
}

fn transcript_rows() -> usize {
    let (_, rows) = terminal_size();
    usize::from(rows.saturating_sub(CHROME_ROWS))
}

#[cfg(test)]
mod tests {
    use std::sync::{mpsc, Arc};
    use std::time::Duration;

    use chat_core::{EntryRole, Msg};
    use chat_engine::{
        ChunkRequest, ChunkResponse, FailureKind, IndexedItemsResponse, QueryClient, QueryError,
        QueryRequest, QueryResponse,
    };

    use super::{ChatApp, LoopEvent};
    use crate::platform::effects::EffectRunner;

    /// Answers after a delay so the query is still in flight when input closes.
    struct SlowClient {
        answer: Result<QueryResponse, QueryError>,
    }

    #[async_trait::async_trait]
    impl QueryClient for SlowClient {
        async fn query(&self, _request: &QueryRequest) -> Result<QueryResponse, QueryError> {
            std::thread::sleep(Duration::from_millis(200));
            self.answer.clone()
        }

        async fn retrieve_chunk(
            &self,
            _request: &ChunkRequest,
        ) -> Result<ChunkResponse, QueryError> {
            Ok(ChunkResponse::default())
        }

        async fn list_indexed_items(&self) -> Result<IndexedItemsResponse, QueryError> {
            Ok(IndexedItemsResponse::default())
        }
    }

    fn app_with(answer: Result<QueryResponse, QueryError>) -> ChatApp<Vec<u8>> {
        let runner = EffectRunner::with_client(Arc::new(SlowClient { answer })).unwrap();
        ChatApp::new(runner, Vec::new())
    }

    fn send_then(events: Vec<LoopEvent>) -> mpsc::Receiver<LoopEvent> {
        let (event_tx, event_rx) = mpsc::channel();
        event_tx
            .send(LoopEvent::Msg(Msg::InputChanged("hello".to_string())))
            .unwrap();
        event_tx.send(LoopEvent::Msg(Msg::SendClicked)).unwrap();
        for event in events {
            event_tx.send(event).unwrap();
        }
        event_rx
    }

    fn roles(app: &ChatApp<Vec<u8>>) -> Vec<EntryRole> {
        app.state.view().entries.into_iter().map(|e| e.role).collect()
    }

    #[test]
    fn closed_input_waits_for_the_answer_before_exiting() {
        let mut app = app_with(Ok(QueryResponse {
            answer: Some("30 days".to_string()),
            sources: Some(vec!["policy.pdf".to_string()]),
        }));
        app.run(send_then(vec![LoopEvent::InputClosed])).unwrap();

        assert_eq!(
            roles(&app),
            vec![EntryRole::User, EntryRole::Bot, EntryRole::Divider]
        );
        assert_eq!(app.state.in_flight(), 0);
        let written = String::from_utf8_lossy(&app.out);
        assert!(written.contains("bot> 30 days"));
    }

    #[test]
    fn closed_input_waits_for_the_error_before_exiting() {
        let mut app = app_with(Err(QueryError {
            kind: FailureKind::Network,
            message: "connection refused".to_string(),
        }));
        // Dropping the sender counts as closed input too.
        app.run(send_then(Vec::new())).unwrap();

        assert_eq!(roles(&app), vec![EntryRole::User, EntryRole::Error]);
        let written = String::from_utf8_lossy(&app.out);
        assert!(written.contains("!! Error communicating with the server."));
    }

    #[test]
    fn quit_exits_without_waiting() {
        let mut app = app_with(Ok(QueryResponse::default()));
        app.run(send_then(vec![LoopEvent::Quit])).unwrap();

        assert_eq!(roles(&app), vec![EntryRole::User, EntryRole::Pending]);
        assert_eq!(app.state.in_flight(), 1);
    }

    #[test]
    fn scrolling_leaves_the_transcript_alone() {
        let mut app = app_with(Ok(QueryResponse::default()));
        let (event_tx, event_rx) = mpsc::channel();
        event_tx.send(LoopEvent::Scroll(-5)).unwrap();
        event_tx.send(LoopEvent::Scroll(5)).unwrap();
        event_tx.send(LoopEvent::Quit).unwrap();
        app.run(event_rx).unwrap();

        assert!(app.state.transcript().is_empty());
        assert!(!app.state.consume_dirty());
        assert_eq!(app.viewport.top(), 0);
        assert!(String::from_utf8_lossy(&app.out).contains("waiting: 0"));
    }
}
