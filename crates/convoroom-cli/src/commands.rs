//! Parsing typed lines.

use convoroom_proto::RoomId;

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text for the current room.
    Say(String),
    /// `/join <room>`
    Join(RoomId),
    /// `/new`: create a room and enter it.
    New,
    /// `/leave`
    Leave,
    /// `/rooms`: rooms this user created.
    Rooms,
    /// `/help`
    Help,
    /// `/quit`
    Quit,
    /// A slash command that did not parse.
    Invalid(String),
}

/// Help text for `/help`.
pub const HELP: &str = "\
/join <room>  enter a room
/new          create a room and enter it
/leave        leave the current room
/rooms        list rooms you created
/quit         exit
anything else is sent to the current room";

/// Parse a line. Blank lines yield `None`.
pub fn parse(line: &str) -> Option<Command> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }

    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return Some(Command::Say(line.to_string()));
    };

    let mut words = rest.split_whitespace();
    let command = match (words.next(), words.next(), words.next()) {
        (Some("join" | "j"), Some(room), None) => Command::Join(RoomId::new(room)),
        (Some("join" | "j"), _, _) => Command::Invalid("usage: /join <room>".into()),
        (Some("new"), None, _) => Command::New,
        (Some("leave"), None, _) => Command::Leave,
        (Some("rooms"), None, _) => Command::Rooms,
        (Some("help" | "?"), None, _) => Command::Help,
        (Some("quit" | "q" | "exit"), None, _) => Command::Quit,
        (Some(other), _, _) => Command::Invalid(format!("unknown command /{other}")),
        (None, _, _) => Command::Invalid("empty command".into()),
    };
    Some(command)
}
