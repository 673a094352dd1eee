//! Client session lifecycle
//!
//! Tracks which stage of its life a connection is in and, once the
//! handshake succeeds, which registry entry it owns.

use log::debug;
use std::net::SocketAddr;

/// Stages a connection moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Handshaking,
    Active,
    Disconnecting,
    Closed,
}

/// A registered client: its identifier and the session id it was admitted under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    id: String,
    session_id: u64,
}

impl Member {
    pub fn new(id: impl Into<String>, session_id: u64) -> Self {
        Self {
            id: id.into(),
            session_id,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }
}

/// Lifecycle state of one connection.
pub struct Session {
    peer: SocketAddr,
    state: SessionState,
    member: Option<Member>,
}

impl Session {
    pub fn new(peer: SocketAddr) -> Self {
        Self {
            peer,
            state: SessionState::Connecting,
            member: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Client id once registered, otherwise the peer address.
    pub fn label(&self) -> String {
        match &self.member {
            Some(member) => format!("{} ({})", member.id, self.peer),
            None => self.peer.to_string(),
        }
    }

    pub fn begin_handshake(&mut self) {
        self.transition(SessionState::Handshaking);
    }

    /// Records the registry entry this session now owns.
    pub fn activate(&mut self, member: Member) {
        self.member = Some(member);
        self.transition(SessionState::Active);
    }

    /// Moves to `Disconnecting`, handing back the entry to deregister.
    ///
    /// Returns `None` if the session never registered.
    pub fn begin_disconnect(&mut self) -> Option<Member> {
        self.transition(SessionState::Disconnecting);
        self.member.take()
    }

    pub fn close(&mut self) {
        self.transition(SessionState::Closed);
    }

    fn transition(&mut self, next: SessionState) {
        debug!("{}: {:?} -> {:?}", self.label(), self.state, next);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[test]
    fn walks_through_every_state() {
        let mut session = Session::new(peer());
        assert_eq!(session.state(), SessionState::Connecting);

        session.begin_handshake();
        assert_eq!(session.state(), SessionState::Handshaking);

        session.activate(Member::new("alice", 3));
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.label(), "alice (127.0.0.1:40000)");

        let member = session.begin_disconnect();
        assert_eq!(member, Some(Member::new("alice", 3)));
        assert_eq!(session.state(), SessionState::Disconnecting);

        session.close();
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn unregistered_session_has_nothing_to_deregister() {
        let mut session = Session::new(peer());
        session.begin_handshake();
        assert_eq!(session.begin_disconnect(), None);
        assert_eq!(session.label(), "127.0.0.1:40000");
    }
}
