//! Module `commands`
//!
//! Data structures for one classified line of client input.

/// A slash command.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    LIST,
    QUIT,
    /// Any other `/...` line, kept verbatim for the reply
    UNKNOWN(String),
}

/// One inbound line after classification.
#[derive(Debug, PartialEq, Eq)]
pub enum ChatInput {
    /// `@recipient body`
    Private { recipient: String, body: String },
    Command(Command),
    /// Plain text relayed to everyone
    Broadcast(String),
    /// Blank line; ignored
    Empty,
}

/// What the worker should do after a line has been routed.
#[derive(Debug, PartialEq, Eq)]
pub enum RouteOutcome {
    Continue,
    Disconnect,
}
