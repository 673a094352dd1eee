//! Client connection handling
//!
//! Per-connection worker, its session lifecycle, and the outbound queue
//! every other worker uses to reach it.

pub mod connection;
pub mod handler;
pub mod session;

pub use connection::Outbox;
pub use handler::handle_client;
pub use session::{Member, Session, SessionState};
