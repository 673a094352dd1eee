//! Chat protocol implementation
//!
//! Handles input classification, routing, and response formatting.

pub mod commands;
pub mod handlers;
pub mod parser;
pub mod responses;

pub use commands::{ChatInput, Command, RouteOutcome};
pub use handlers::route_input;
pub use parser::parse_input;
