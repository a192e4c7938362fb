use std::fmt;

/// Derived label of the call carried by a room.
///
/// Never persisted or sent on the wire; it mirrors the transitions the
/// coordinator makes observable through its outbound events.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CallState {
    /// Fewer than two members.
    Waiting,
    /// Both members present, offer/answer in flight.
    Negotiating,
    /// An answer has been relayed.
    Connected,
    /// Rejected, ended, or a member went away.
    Ended,
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CallState::Waiting => "waiting",
            CallState::Negotiating => "negotiating",
            CallState::Connected => "connected",
            CallState::Ended => "ended",
        };
        f.write_str(label)
    }
}
