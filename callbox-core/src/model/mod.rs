mod call_state;
mod connection;
mod room;
mod signaling;

pub use call_state::CallState;
pub use connection::ConnectionId;
pub use room::RoomId;
pub use signaling::{ClientEvent, DecodeError, IceServerConfig, ServerEvent};
