//! Module `state`
//!
//! The shared chat state: registered clients and the coordinator tracker.
//! Both live behind one lock so that every membership change and the
//! coordinator update following it are applied as one unit.
//!
//! Join, leave and election notices are queued on the outboxes while the
//! lock is held. Queueing never waits (see [`Outbox::send_line`]), and it
//! keeps those notices in the same order for every client. Socket writes
//! still happen in each connection's writer task.

use std::collections::HashMap;

use crate::client::connection::{Outbox, deliver_all};
use crate::error::RegistryError;
use crate::protocol::responses;
use crate::registry::coordinator::CoordinatorTracker;
use crate::registry::results::{JoinResult, LeaveResult};

/// One registered client.
#[derive(Debug)]
pub struct ClientEntry {
    session_id: u64,
    outbox: Outbox,
}

/// Registered clients plus the current coordinator.
#[derive(Debug)]
pub struct ChatState {
    clients: HashMap<String, ClientEntry>,
    coordinator: CoordinatorTracker,
    next_session: u64,
    max_clients: usize,
    max_id_length: usize,
}

impl ChatState {
    pub fn new(max_clients: usize, max_id_length: usize) -> Self {
        Self {
            clients: HashMap::new(),
            coordinator: CoordinatorTracker::new(),
            next_session: 0,
            max_clients,
            max_id_length,
        }
    }

    /// Admits `id`, runs the join-side coordinator election and announces
    /// both to every client.
    ///
    /// The greeting (welcome plus coordinator status) is queued on `outbox`
    /// before the entry is inserted, so it reaches the client ahead of any
    /// message relayed to it.
    pub fn register(&mut self, id: &str, outbox: Outbox) -> Result<JoinResult, RegistryError> {
        self.validate_id(id)?;

        if self.clients.len() >= self.max_clients {
            return Err(RegistryError::ServerFull(self.max_clients));
        }
        if self.clients.contains_key(id) {
            return Err(RegistryError::DuplicateId(id.to_string()));
        }

        let status = match self.coordinator.current() {
            Some(coordinator) => responses::coordinator_is(coordinator),
            None => responses::YOU_ARE_COORDINATOR.to_string(),
        };
        outbox.send_lines([responses::welcome(id), status]);

        let session_id = self.next_session;
        self.next_session += 1;
        self.clients
            .insert(id.to_string(), ClientEntry { session_id, outbox });

        let elected = self.coordinator.on_join(members(&self.clients));
        debug_assert!(self.coordinator_is_consistent());

        let recipients = self.outboxes();
        if let Some(coordinator) = &elected {
            deliver_all(&recipients, &responses::new_coordinator(coordinator));
        }
        deliver_all(&recipients, &responses::joined(id));

        Ok(JoinResult {
            session_id,
            elected,
        })
    }

    /// Removes `id` if it is still registered under `session_id`, then
    /// announces the departure and any new coordinator to those remaining.
    pub fn remove(&mut self, id: &str, session_id: u64) -> Option<LeaveResult> {
        match self.clients.get(id) {
            Some(entry) if entry.session_id == session_id => {}
            _ => return None,
        }
        self.clients.remove(id);

        let was_coordinator = self.coordinator.is_coordinator(id);
        let elected = self.coordinator.on_leave(id, members(&self.clients));
        debug_assert!(self.coordinator_is_consistent());

        let recipients = self.outboxes();
        deliver_all(&recipients, &responses::left(id));
        if let Some(coordinator) = &elected {
            deliver_all(&recipients, &responses::new_coordinator(coordinator));
        }

        Some(LeaveResult {
            was_coordinator,
            elected,
            remaining: recipients.len(),
        })
    }

    pub fn lookup(&self, id: &str) -> Option<&Outbox> {
        self.clients.get(id).map(|entry| &entry.outbox)
    }

    /// Registered identifiers in join order.
    pub fn snapshot(&self) -> Vec<String> {
        let mut entries: Vec<(&String, u64)> = self
            .clients
            .iter()
            .map(|(id, entry)| (id, entry.session_id))
            .collect();
        entries.sort_by_key(|(_, session)| *session);
        entries.into_iter().map(|(id, _)| id.clone()).collect()
    }

    /// Outboxes of all registered clients, in join order.
    pub fn outboxes(&self) -> Vec<Outbox> {
        let mut entries: Vec<&ClientEntry> = self.clients.values().collect();
        entries.sort_by_key(|entry| entry.session_id);
        entries.into_iter().map(|e| e.outbox.clone()).collect()
    }

    pub fn coordinator(&self) -> Option<&str> {
        self.coordinator.current()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.clients.len() >= self.max_clients
    }

    /// Coordinator is unset iff nobody is registered, and otherwise names a
    /// registered client.
    pub fn coordinator_is_consistent(&self) -> bool {
        match self.coordinator.current() {
            None => self.clients.is_empty(),
            Some(id) => self.clients.contains_key(id),
        }
    }

    fn validate_id(&self, id: &str) -> Result<(), RegistryError> {
        if id.is_empty() {
            return Err(RegistryError::EmptyId);
        }
        if id.len() > self.max_id_length {
            return Err(RegistryError::IdTooLong(self.max_id_length));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(RegistryError::InvalidId(id.to_string()));
        }
        Ok(())
    }
}

fn members(clients: &HashMap<String, ClientEntry>) -> impl Iterator<Item = (&str, u64)> {
    clients
        .iter()
        .map(|(id, entry)| (id.as_str(), entry.session_id))
}
