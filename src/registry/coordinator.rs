//! Module `coordinator`
//!
//! Tracks which connected client is the coordinator. The coordinator is the
//! earliest still-connected registrant, i.e. the member with the lowest
//! session id. Elections only happen when a client joins with no
//! coordinator set, or when the coordinator itself leaves.

/// Holds the identifier of the current coordinator, if any.
#[derive(Debug, Default)]
pub struct CoordinatorTracker {
    current: Option<String>,
}

impl CoordinatorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current coordinator.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_coordinator(&self, id: &str) -> bool {
        self.current.as_deref() == Some(id)
    }

    /// Re-evaluates after `members` gained a client.
    ///
    /// Returns the newly elected coordinator, or `None` if the existing one
    /// stays in place.
    pub fn on_join<'a, I>(&mut self, members: I) -> Option<String>
    where
        I: IntoIterator<Item = (&'a str, u64)>,
    {
        if self.current.is_some() {
            return None;
        }
        self.elect(members)
    }

    /// Re-evaluates after `departed` left; `members` no longer contains it.
    ///
    /// Returns the newly elected coordinator. When the last member leaves
    /// the tracker is cleared and nothing is returned.
    pub fn on_leave<'a, I>(&mut self, departed: &str, members: I) -> Option<String>
    where
        I: IntoIterator<Item = (&'a str, u64)>,
    {
        if !self.is_coordinator(departed) {
            return None;
        }
        self.current = None;
        self.elect(members)
    }

    fn elect<'a, I>(&mut self, members: I) -> Option<String>
    where
        I: IntoIterator<Item = (&'a str, u64)>,
    {
        self.current = earliest_registrant(members).map(str::to_string);
        self.current.clone()
    }
}

/// Picks the member with the lowest session id.
pub fn earliest_registrant<'a, I>(members: I) -> Option<&'a str>
where
    I: IntoIterator<Item = (&'a str, u64)>,
{
    members
        .into_iter()
        .min_by_key(|(_, session)| *session)
        .map(|(id, _)| id)
}
