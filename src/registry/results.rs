//! Registry result types
//!
//! Defines result structures returned by registry operations.

/// Result of a successful registration
#[derive(Debug)]
pub struct JoinResult {
    pub session_id: u64,
    /// Coordinator elected because of this join
    pub elected: Option<String>,
}

/// Result of removing a client
#[derive(Debug)]
pub struct LeaveResult {
    pub was_coordinator: bool,
    /// Coordinator elected because of this departure
    pub elected: Option<String>,
    /// Clients still registered after the removal
    pub remaining: usize,
}
