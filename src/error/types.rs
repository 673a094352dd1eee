//! Error types
//!
//! Defines domain-specific error types for each part of the chat server.

use std::fmt;
use std::io;
use std::time::Duration;

/// Registry errors, raised while admitting a client
#[derive(Debug, PartialEq, Eq)]
pub enum RegistryError {
    EmptyId,
    InvalidId(String),
    IdTooLong(usize),
    DuplicateId(String),
    ServerFull(usize),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::EmptyId => write!(f, "Client identifier is empty"),
            RegistryError::InvalidId(id) => {
                write!(f, "Client identifier contains whitespace: {:?}", id)
            }
            RegistryError::IdTooLong(max) => {
                write!(f, "Client identifier longer than {} bytes", max)
            }
            RegistryError::DuplicateId(id) => write!(f, "Client identifier already in use: {}", id),
            RegistryError::ServerFull(max) => write!(f, "Server full ({} clients)", max),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Handshake errors
#[derive(Debug, PartialEq, Eq)]
pub enum HandshakeError {
    Disconnected,
    TooManyAttempts(usize),
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeError::Disconnected => write!(f, "Client disconnected during handshake"),
            HandshakeError::TooManyAttempts(n) => {
                write!(f, "No valid identifier after {} attempts", n)
            }
        }
    }
}

impl std::error::Error for HandshakeError {}

/// General chat server error that encompasses all error types
#[derive(Debug)]
pub enum ChatServerError {
    Registry(RegistryError),
    Handshake(HandshakeError),
    Io(io::Error),
    Bind { addr: String, source: io::Error },
    Config(config::ConfigError),
    IdleTimeout(Duration),
}

impl fmt::Display for ChatServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatServerError::Registry(e) => write!(f, "Registry error: {}", e),
            ChatServerError::Handshake(e) => write!(f, "Handshake error: {}", e),
            ChatServerError::Io(e) => write!(f, "I/O error: {}", e),
            ChatServerError::Bind { addr, source } => {
                write!(f, "Failed to bind to {}: {}", addr, source)
            }
            ChatServerError::Config(e) => write!(f, "Configuration error: {}", e),
            ChatServerError::IdleTimeout(d) => {
                write!(f, "Client idle for more than {}s", d.as_secs())
            }
        }
    }
}

impl std::error::Error for ChatServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChatServerError::Registry(e) => Some(e),
            ChatServerError::Handshake(e) => Some(e),
            ChatServerError::Io(e) => Some(e),
            ChatServerError::Bind { source, .. } => Some(source),
            ChatServerError::Config(e) => Some(e),
            ChatServerError::IdleTimeout(_) => None,
        }
    }
}

impl From<RegistryError> for ChatServerError {
    fn from(error: RegistryError) -> Self {
        ChatServerError::Registry(error)
    }
}

impl From<HandshakeError> for ChatServerError {
    fn from(error: HandshakeError) -> Self {
        ChatServerError::Handshake(error)
    }
}

impl From<io::Error> for ChatServerError {
    fn from(error: io::Error) -> Self {
        ChatServerError::Io(error)
    }
}

impl From<config::ConfigError> for ChatServerError {
    fn from(error: config::ConfigError) -> Self {
        ChatServerError::Config(error)
    }
}
