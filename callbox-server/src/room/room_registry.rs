use callbox_core::{CallState, ConnectionId, RoomId};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Maximum number of connections a room holds.
pub const ROOM_CAPACITY: usize = 2;

/// What the registry knows about one open connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    pub room_id: Option<RoomId>,
    pub display_name: String,
}

#[derive(Debug)]
struct RoomEntry {
    members: HashSet<ConnectionId>,
    /// Set when the room first reaches two members; cleared only by eviction.
    ready_fired: bool,
    state: CallState,
}

impl RoomEntry {
    fn new() -> Self {
        Self {
            members: HashSet::with_capacity(ROOM_CAPACITY),
            ready_fired: false,
            state: CallState::Waiting,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Newly added; `members` is the post-join room size.
    Joined { members: usize },
    /// Already a member of this room; only the display name was refreshed.
    Rejoined { members: usize },
    /// The room already holds `ROOM_CAPACITY` other connections.
    RoomFull,
}

/// Result of removing a connection from its room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room_id: RoomId,
    pub remaining: Vec<ConnectionId>,
}

/// In-memory bookkeeping of connections and the rooms they share.
///
/// Cloning is cheap and every clone sees the same maps. A room mutation runs
/// under that room's map entry guard, so two racing joins cannot both observe
/// a single member. Missing keys are reported as `None`/empty, never as errors.
///
/// Lock order is rooms before connections; no method holds a connection guard
/// while acquiring a room guard.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    connections: Arc<DashMap<ConnectionId, ConnectionRecord>>,
    rooms: Arc<DashMap<RoomId, RoomEntry>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, connection_id: ConnectionId) {
        self.connections
            .entry(connection_id)
            .or_insert_with(|| ConnectionRecord {
                room_id: None,
                display_name: String::new(),
            });
    }

    /// Put `connection_id` into `room_id`, creating the room on first use.
    ///
    /// A connection that sits in a different room must `leave` it first.
    pub fn join(
        &self,
        connection_id: ConnectionId,
        room_id: RoomId,
        display_name: String,
    ) -> JoinOutcome {
        let mut room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            info!(room_id = %room_id, "Creating room");
            RoomEntry::new()
        });

        let outcome = if room.members.contains(&connection_id) {
            JoinOutcome::Rejoined {
                members: room.members.len(),
            }
        } else if room.members.len() >= ROOM_CAPACITY {
            return JoinOutcome::RoomFull;
        } else {
            room.members.insert(connection_id);
            JoinOutcome::Joined {
                members: room.members.len(),
            }
        };

        let mut record = self
            .connections
            .entry(connection_id)
            .or_insert_with(|| ConnectionRecord {
                room_id: None,
                display_name: String::new(),
            });
        record.room_id = Some(room_id);
        record.display_name = display_name;

        outcome
    }

    /// Take `connection_id` out of its room. `None` when it was in no room.
    pub fn leave(&self, connection_id: &ConnectionId) -> Option<Departure> {
        let room_id = self.connections.get_mut(connection_id)?.room_id.take()?;
        Some(self.vacate(connection_id, room_id))
    }

    /// Forget `connection_id` entirely, leaving its room if it had one.
    pub fn disconnect(&self, connection_id: &ConnectionId) -> Option<Departure> {
        let (_, record) = self.connections.remove(connection_id)?;
        let room_id = record.room_id?;
        Some(self.vacate(connection_id, room_id))
    }

    fn vacate(&self, connection_id: &ConnectionId, room_id: RoomId) -> Departure {
        let remaining: Vec<ConnectionId> = match self.rooms.get_mut(&room_id) {
            Some(mut room) => {
                room.members.remove(connection_id);
                if !room.members.is_empty() {
                    room.state = CallState::Ended;
                }
                room.members.iter().copied().collect()
            }
            None => Vec::new(),
        };

        if remaining.is_empty()
            && self
                .rooms
                .remove_if(&room_id, |_, room| room.members.is_empty())
                .is_some()
        {
            info!(room_id = %room_id, "Room vacated");
        }

        Departure { room_id, remaining }
    }

    pub fn lookup(&self, connection_id: &ConnectionId) -> Option<ConnectionRecord> {
        self.connections
            .get(connection_id)
            .map(|record| record.value().clone())
    }

    pub fn is_connected(&self, connection_id: &ConnectionId) -> bool {
        self.connections.contains_key(connection_id)
    }

    pub fn members_of(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|room| room.members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// The room both connections currently belong to, if any.
    pub fn shared_room(&self, a: &ConnectionId, b: &ConnectionId) -> Option<RoomId> {
        let room_id = self.lookup(a)?.room_id?;
        let shared = self
            .rooms
            .get(&room_id)
            .is_some_and(|room| room.members.contains(a) && room.members.contains(b));
        shared.then_some(room_id)
    }

    /// Returns true exactly once per occupancy of `room_id`: the first time it
    /// is called while the room holds `ROOM_CAPACITY` members.
    pub fn mark_ready(&self, room_id: &RoomId) -> bool {
        let Some(mut room) = self.rooms.get_mut(room_id) else {
            return false;
        };
        if room.ready_fired || room.members.len() < ROOM_CAPACITY {
            return false;
        }
        room.ready_fired = true;
        room.state = CallState::Negotiating;
        true
    }

    pub fn call_state(&self, room_id: &RoomId) -> Option<CallState> {
        self.rooms.get(room_id).map(|room| room.state)
    }

    pub fn set_call_state(&self, room_id: &RoomId, state: CallState) {
        if let Some(mut room) = self.rooms.get_mut(room_id) {
            room.state = state;
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}
