use std::io::{self, Write};

use chat_core::{AppViewModel, EntryRole, EntryView};
use crossterm::cursor::{MoveTo, MoveToNextLine};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::queue;

const USER_PREFIX: &str = "you> ";
const BOT_PREFIX: &str = "bot> ";
const ERROR_PREFIX: &str = "!! ";
const DIVIDER_CHAR: char = '-';
const HELP_TEXT: &str = ":sources <n>  :chunk <id>  :chunks  :up/:down [n]  :quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    User,
    Bot,
    Error,
    Pending,
    Divider,
    SourcesButton,
    SourceItem,
    Chunk,
    Index,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub style: LineStyle,
    pub text: String,
}

impl Line {
    fn new(style: LineStyle, text: impl Into<String>) -> Self {
        Self {
            style,
            text: text.into(),
        }
    }
}

/// Scroll window over the rendered transcript lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    top: usize,
    height: usize,
}

impl Viewport {
    pub fn new(height: usize) -> Self {
        Self {
            top: 0,
            height: height.max(1),
        }
    }

    pub fn top(&self) -> usize {
        self.top
    }

    pub fn resize(&mut self, height: usize) {
        self.height = height.max(1);
    }

    /// Sets the scroll position to its maximum extent for `total` lines.
    pub fn scroll_to_bottom(&mut self, total: usize) {
        self.top = total.saturating_sub(self.height);
    }

    /// Moves the window by `delta` lines, clamped to `[0, total - height]`.
    pub fn scroll_by(&mut self, delta: isize, total: usize) {
        let max_top = total.saturating_sub(self.height);
        let top = if delta < 0 {
            self.top.saturating_sub(delta.unsigned_abs())
        } else {
            self.top.saturating_add(delta.unsigned_abs())
        };
        self.top = top.min(max_top);
    }

    pub fn visible<'a>(&self, lines: &'a [Line]) -> &'a [Line] {
        // The transcript can shrink when a placeholder is removed.
        let start = self.top.min(lines.len());
        let end = (start + self.height).min(lines.len());
        &lines[start..end]
    }
}

pub fn build_lines(view: &AppViewModel, width: usize) -> Vec<Line> {
    let width = width.max(8);
    let mut lines = Vec::new();
    for entry in &view.entries {
        push_entry(&mut lines, entry, width);
    }
    lines
}

fn push_entry(lines: &mut Vec<Line>, entry: &EntryView, width: usize) {
    match &entry.role {
        EntryRole::User => push_wrapped(lines, LineStyle::User, USER_PREFIX, &entry.text, width),
        EntryRole::Bot => {
            push_wrapped(lines, LineStyle::Bot, BOT_PREFIX, &entry.text, width);
            if let Some(sources) = &entry.sources {
                lines.push(Line::new(
                    LineStyle::SourcesButton,
                    format!("     [{}] {}", entry.entry_id, sources.button_label),
                ));
                if sources.expanded {
                    for item in &sources.items {
                        push_wrapped(lines, LineStyle::SourceItem, "       - ", item, width);
                    }
                }
            }
        }
        EntryRole::Error => push_wrapped(lines, LineStyle::Error, ERROR_PREFIX, &entry.text, width),
        EntryRole::Pending => push_wrapped(lines, LineStyle::Pending, BOT_PREFIX, &entry.text, width),
        EntryRole::Divider => lines.push(Line::new(
            LineStyle::Divider,
            DIVIDER_CHAR.to_string().repeat(width),
        )),
        EntryRole::SourceChunk { source_id } => {
            let prefix = format!("[{source_id}] ");
            push_wrapped(lines, LineStyle::Chunk, &prefix, &entry.text, width);
        }
        EntryRole::IndexedItems { count } => {
            lines.push(Line::new(LineStyle::Index, format!("[index: {count} items]")));
            if *count > 0 {
                push_wrapped(lines, LineStyle::Index, "  ", &entry.text, width);
            }
        }
    }
}

/// Wraps on character count; continuation lines are indented to the prefix width.
fn push_wrapped(lines: &mut Vec<Line>, style: LineStyle, prefix: &str, text: &str, width: usize) {
    let indent = " ".repeat(prefix.chars().count());
    let room = width.saturating_sub(indent.len()).max(1);
    let mut first = true;
    for paragraph in text.split('\n') {
        let chars: Vec<char> = paragraph.chars().collect();
        let chunks: Vec<String> = if chars.is_empty() {
            vec![String::new()]
        } else {
            chars.chunks(room).map(|c| c.iter().collect()).collect()
        };
        for chunk in chunks {
            let lead = if first { prefix } else { indent.as_str() };
            lines.push(Line::new(style, format!("{lead}{chunk}")));
            first = false;
        }
    }
}

fn color_for(style: LineStyle) -> Color {
    match style {
        LineStyle::User => Color::Cyan,
        LineStyle::Bot => Color::White,
        LineStyle::Error => Color::Red,
        LineStyle::Pending => Color::DarkGrey,
        LineStyle::Divider => Color::DarkGrey,
        LineStyle::SourcesButton => Color::Yellow,
        LineStyle::SourceItem => Color::Yellow,
        LineStyle::Chunk => Color::Green,
        LineStyle::Index => Color::Magenta,
    }
}

/// Redraws the visible window, a status line and the input prompt.
pub fn draw<W: Write>(
    out: &mut W,
    lines: &[Line],
    viewport: &Viewport,
    view: &AppViewModel,
) -> io::Result<()> {
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    for line in viewport.visible(lines) {
        queue!(
            out,
            SetForegroundColor(color_for(line.style)),
            Print(&line.text),
            ResetColor,
            MoveToNextLine(1)
        )?;
    }
    let status = format!("waiting: {} | {}", view.in_flight, HELP_TEXT);
    queue!(
        out,
        SetForegroundColor(Color::DarkGrey),
        Print(status),
        ResetColor,
        MoveToNextLine(1),
        Print("> ")
    )?;
    out.flush()
}
