//! Error handlers
//!
//! Logs errors at a level matching their severity and maps the ones a
//! client can act on to the line sent back over the wire.

use crate::error::types::{ChatServerError, HandshakeError, RegistryError};
use log::{error, info, warn};
use std::io::ErrorKind;

/// Log a chat server error raised by one connection
pub fn handle_error(peer: &str, err: &ChatServerError) {
    match err {
        ChatServerError::Handshake(HandshakeError::Disconnected) => {
            info!("{} left before completing the handshake", peer)
        }
        ChatServerError::IdleTimeout(_) => info!("Disconnecting {}: {}", peer, err),
        ChatServerError::Io(e)
            if matches!(
                e.kind(),
                ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe
            ) =>
        {
            info!("Connection to {} dropped: {}", peer, e)
        }
        ChatServerError::Registry(_) | ChatServerError::Handshake(_) => {
            warn!("Rejected {}: {}", peer, err)
        }
        _ => error!("Chat server error for {}: {}", peer, err),
    }
}

/// Line sent to a client whose registration was refused
pub fn error_reply(err: &RegistryError) -> String {
    match err {
        RegistryError::EmptyId => "Identifier cannot be empty.".to_string(),
        RegistryError::InvalidId(_) => "Identifier must not contain spaces.".to_string(),
        RegistryError::IdTooLong(max) => {
            format!("Identifier too long (max {} bytes).", max)
        }
        RegistryError::DuplicateId(id) => format!("ID {} is already in use.", id),
        RegistryError::ServerFull(_) => "Server is full. Try again later.".to_string(),
    }
}

/// Whether the client may try another identifier after this error
pub fn is_retryable(err: &RegistryError) -> bool {
    !matches!(err, RegistryError::ServerFull(_))
}
