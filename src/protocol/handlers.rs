//! Message routing for the chat server.
//!
//! Dispatches one classified line from a registered client: private
//! messages to a single recipient, commands back to the sender, everything
//! else to all clients.

use log::{debug, info};

use crate::client::connection::{Delivery, Outbox};
use crate::protocol::commands::{ChatInput, Command, RouteOutcome};
use crate::protocol::responses;
use crate::registry::Registry;

/// Routes one line from `sender`.
///
/// `reply` is the sender's own outbox. `/quit` only reports
/// [`RouteOutcome::Disconnect`]; the worker performs the teardown.
pub async fn route_input(
    sender: &str,
    reply: &Outbox,
    input: ChatInput,
    registry: &Registry,
) -> RouteOutcome {
    match input {
        ChatInput::Empty => RouteOutcome::Continue,
        ChatInput::Private { recipient, body } => {
            handle_private(sender, reply, &recipient, &body, registry).await
        }
        ChatInput::Command(command) => handle_command(sender, reply, command, registry).await,
        ChatInput::Broadcast(text) => {
            debug!("Broadcast from {}: {}", sender, text);
            registry.broadcast(&responses::chat(sender, &text)).await;
            RouteOutcome::Continue
        }
    }
}

async fn handle_private(
    sender: &str,
    reply: &Outbox,
    recipient: &str,
    body: &str,
    registry: &Registry,
) -> RouteOutcome {
    match registry.lookup(recipient).await {
        Some(outbox) => {
            if outbox.send_line(responses::private_from(sender, body)) == Delivery::Gone {
                debug!("Private message from {} to departed {}", sender, recipient);
            }
        }
        None => {
            info!("Recipient {} not found (from {})", recipient, sender);
            reply.send_line(responses::recipient_not_found(recipient));
        }
    }
    RouteOutcome::Continue
}

async fn handle_command(
    sender: &str,
    reply: &Outbox,
    command: Command,
    registry: &Registry,
) -> RouteOutcome {
    match command {
        Command::LIST => {
            let ids = registry.snapshot().await;
            reply.send_lines(responses::user_list(&ids));
            RouteOutcome::Continue
        }
        Command::QUIT => {
            info!("Client {} requested to quit", sender);
            RouteOutcome::Disconnect
        }
        Command::UNKNOWN(line) => {
            debug!("Unknown command from {}: {}", sender, line);
            reply.send_line(responses::unknown_command(&line));
            RouteOutcome::Continue
        }
    }
}
