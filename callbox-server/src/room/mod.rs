mod coordinator;
mod coordinator_command;
mod room_registry;

pub use coordinator::*;
pub use coordinator_command::*;
pub use room_registry::*;
