use chat_core::{EntryId, Msg};

const CMD_SOURCES: &str = ":sources";
const CMD_CHUNK: &str = ":chunk";
const CMD_CHUNKS: &str = ":chunks";
const CMD_UP: &str = ":up";
const CMD_DOWN: &str = ":down";
const CMD_QUIT: &str = ":quit";

/// Lines moved by `:up` or `:down` without a count.
pub const SCROLL_STEP: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text typed into the input; sent as a query.
    Send(String),
    ToggleSources(EntryId),
    InspectSource(String),
    ListChunks,
    /// Moves the transcript window; negative is towards older lines.
    Scroll(isize),
    Quit,
    /// Recognised command with unusable arguments.
    Invalid(String),
}

/// Parses one line read from stdin. Only the line terminator is stripped, so
/// whitespace typed by the user survives into the query. A leading `::` escapes
/// a literal colon.
pub fn parse_line(raw: &str) -> Command {
    let line = raw.strip_suffix('\n').unwrap_or(raw);
    let line = line.strip_suffix('\r').unwrap_or(line);

    if let Some(escaped) = line.strip_prefix("::") {
        return Command::Send(format!(":{escaped}"));
    }
    if line == CMD_QUIT {
        return Command::Quit;
    }
    if let Some(arg) = command_arg(line, CMD_SOURCES) {
        return match arg.parse::<EntryId>() {
            Ok(entry_id) => Command::ToggleSources(entry_id),
            Err(_) => Command::Invalid(format!("{CMD_SOURCES} expects an entry number")),
        };
    }
    if let Some(arg) = command_arg(line, CMD_CHUNK) {
        return if arg.is_empty() {
            Command::Invalid(format!("{CMD_CHUNK} expects a source id"))
        } else {
            Command::InspectSource(arg.to_string())
        };
    }
    if let Some(arg) = command_arg(line, CMD_CHUNKS) {
        return if arg.is_empty() {
            Command::ListChunks
        } else {
            Command::Invalid(format!("{CMD_CHUNKS} takes no arguments"))
        };
    }
    if let Some(arg) = command_arg(line, CMD_UP) {
        return scroll_command(CMD_UP, arg, -1);
    }
    if let Some(arg) = command_arg(line, CMD_DOWN) {
        return scroll_command(CMD_DOWN, arg, 1);
    }
    Command::Send(line.to_string())
}

fn command_arg<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(name)?;
    if rest.is_empty() || rest.starts_with(' ') {
        Some(rest.trim())
    } else {
        None
    }
}

fn scroll_command(name: &str, arg: &str, sign: isize) -> Command {
    if arg.is_empty() {
        return Command::Scroll(sign * SCROLL_STEP as isize);
    }
    match arg.parse::<isize>() {
        Ok(lines) if lines >= 0 => Command::Scroll(sign * lines),
        _ => Command::Invalid(format!("{name} expects a line count")),
    }
}

/// Messages the controller receives for a command. `Scroll` only moves the window and
/// `Quit`/`Invalid` do nothing to the transcript, so those produce none.
pub fn into_msgs(command: Command) -> Vec<Msg> {
    match command {
        Command::Send(text) => vec![Msg::InputChanged(text), Msg::SendClicked],
        Command::ToggleSources(entry_id) => vec![Msg::SourcesToggled { entry_id }],
        Command::InspectSource(source_id) => vec![Msg::ChunkRequested { source_id }],
        Command::ListChunks => vec![Msg::IndexListRequested],
        Command::Scroll(_) | Command::Quit | Command::Invalid(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_line_is_sent_without_terminator() {
        assert_eq!(
            parse_line("What is the refund policy?\r\n"),
            Command::Send("What is the refund policy?".to_string())
        );
        assert_eq!(parse_line("  padded  \n"), Command::Send("  padded  ".to_string()));
    }

    #[test]
    fn empty_line_sends_empty_input() {
        assert_eq!(parse_line("\n"), Command::Send(String::new()));
        assert_eq!(
            into_msgs(parse_line("\n")),
            vec![Msg::InputChanged(String::new()), Msg::SendClicked]
        );
    }

    #[test]
    fn commands_are_recognised() {
        assert_eq!(parse_line(":quit\n"), Command::Quit);
        assert_eq!(parse_line(":sources 4\n"), Command::ToggleSources(4));
        assert_eq!(
            parse_line(":chunk policy.pdf:1:0\n"),
            Command::InspectSource("policy.pdf:1:0".to_string())
        );
        assert!(matches!(parse_line(":sources x\n"), Command::Invalid(_)));
        assert!(matches!(parse_line(":chunk\n"), Command::Invalid(_)));
        assert_eq!(parse_line(":chunks\n"), Command::ListChunks);
        assert!(matches!(parse_line(":chunks all\n"), Command::Invalid(_)));
    }

    #[test]
    fn scroll_commands_take_optional_counts() {
        assert_eq!(parse_line(":up\n"), Command::Scroll(-(SCROLL_STEP as isize)));
        assert_eq!(parse_line(":down\n"), Command::Scroll(SCROLL_STEP as isize));
        assert_eq!(parse_line(":up 3\n"), Command::Scroll(-3));
        assert_eq!(parse_line(":down 25\n"), Command::Scroll(25));
        assert!(matches!(parse_line(":up -3\n"), Command::Invalid(_)));
        assert!(matches!(parse_line(":down many\n"), Command::Invalid(_)));
        assert_eq!(parse_line(":upward\n"), Command::Send(":upward".to_string()));
        assert!(into_msgs(Command::Scroll(4)).is_empty());
    }

    #[test]
    fn command_prefix_inside_word_is_plain_text() {
        assert_eq!(
            parse_line(":sourcesX\n"),
            Command::Send(":sourcesX".to_string())
        );
        assert_eq!(parse_line("::quit\n"), Command::Send(":quit".to_string()));
    }

    #[test]
    fn toggle_maps_to_sources_message() {
        assert_eq!(
            into_msgs(Command::ToggleSources(2)),
            vec![Msg::SourcesToggled { entry_id: 2 }]
        );
        assert!(into_msgs(Command::Quit).is_empty());
        assert_eq!(into_msgs(Command::ListChunks), vec![Msg::IndexListRequested]);
    }
}
