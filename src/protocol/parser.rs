//! Chat input parsing
//!
//! Classifies raw client lines into [`ChatInput`].

use crate::protocol::commands::{ChatInput, Command};

/// Parses a raw line received from a client.
///
/// The line is trimmed first. `@` lines split at the first space into
/// recipient and body; `/` lines must match a command exactly.
pub fn parse_input(raw: &str) -> ChatInput {
    let line = raw.trim();

    if line.is_empty() {
        return ChatInput::Empty;
    }

    if let Some(rest) = line.strip_prefix('@') {
        let (recipient, body) = rest.split_once(' ').unwrap_or((rest, ""));
        return ChatInput::Private {
            recipient: recipient.to_string(),
            body: body.to_string(),
        };
    }

    if line.starts_with('/') {
        let command = match line {
            "/list" => Command::LIST,
            "/quit" => Command::QUIT,
            other => Command::UNKNOWN(other.to_string()),
        };
        return ChatInput::Command(command);
    }

    ChatInput::Broadcast(line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_message_splits_at_first_space() {
        assert_eq!(
            parse_input("@bob hello there  friend\r\n"),
            ChatInput::Private {
                recipient: "bob".into(),
                body: "hello there  friend".into(),
            }
        );
    }

    #[test]
    fn private_message_without_body() {
        assert_eq!(
            parse_input("@bob"),
            ChatInput::Private {
                recipient: "bob".into(),
                body: String::new(),
            }
        );
        assert_eq!(
            parse_input("@"),
            ChatInput::Private {
                recipient: String::new(),
                body: String::new(),
            }
        );
    }

    #[test]
    fn commands_match_exactly() {
        assert_eq!(parse_input("/list"), ChatInput::Command(Command::LIST));
        assert_eq!(parse_input("  /quit \n"), ChatInput::Command(Command::QUIT));
        assert_eq!(
            parse_input("/list all"),
            ChatInput::Command(Command::UNKNOWN("/list all".into()))
        );
        assert_eq!(
            parse_input("/QUIT"),
            ChatInput::Command(Command::UNKNOWN("/QUIT".into()))
        );
    }

    #[test]
    fn everything_else_is_broadcast() {
        assert_eq!(parse_input("hi @bob"), ChatInput::Broadcast("hi @bob".into()));
        assert_eq!(parse_input("   \r\n"), ChatInput::Empty);
    }
}
