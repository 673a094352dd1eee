//! Group chat server
//!
//! A line-oriented TCP chat server. Clients pick an identifier, then send
//! broadcasts, `@id` private messages, `/list` and `/quit`. The earliest
//! connected client is announced as coordinator.

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;

pub use config::ServerConfig;
pub use error::ChatServerError;
pub use registry::Registry;
pub use server::Server;
