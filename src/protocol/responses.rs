//! Chat response lines
//!
//! Every line the server writes to clients is built here.

pub const ENTER_ID: &str = "Enter your unique ID:";
pub const YOU_ARE_COORDINATOR: &str = "You are the coordinator.";
pub const USER_LIST_HEADER: &str = "Connected Users:";
pub const TOO_MANY_ATTEMPTS: &str = "Too many invalid attempts. Goodbye.";

pub fn welcome(id: &str) -> String {
    format!(
        "Welcome, {}! If you are the first client, you will be the coordinator.",
        id
    )
}

pub fn coordinator_is(id: &str) -> String {
    format!("Coordinator is: {}", id)
}

pub fn new_coordinator(id: &str) -> String {
    format!("New coordinator is {}", id)
}

pub fn joined(id: &str) -> String {
    format!("{} has joined the chat.", id)
}

pub fn left(id: &str) -> String {
    format!("{} has left the chat.", id)
}

pub fn chat(sender: &str, text: &str) -> String {
    format!("{}: {}", sender, text)
}

pub fn private_from(sender: &str, body: &str) -> String {
    format!("[Private from {}]: {}", sender, body)
}

pub fn recipient_not_found(id: &str) -> String {
    format!("Recipient {} not found.", id)
}

pub fn unknown_command(line: &str) -> String {
    format!("Unknown command: {}", line)
}

pub fn message_too_long(max: usize) -> String {
    format!("Message too long (max {} bytes).", max)
}

/// `/list` reply: header followed by one `- id` line per client.
pub fn user_list(ids: &[String]) -> Vec<String> {
    std::iter::once(USER_LIST_HEADER.to_string())
        .chain(ids.iter().map(|id| format!("- {}", id)))
        .collect()
}
