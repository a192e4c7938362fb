use callbox_core::{ClientEvent, ConnectionId};

/// Commands fed into the coordinator by the transport edge, in arrival order.
#[derive(Debug)]
pub enum CoordinatorCommand {
    /// A transport link opened.
    Connected { connection_id: ConnectionId },

    /// A decoded frame from an open link.
    Inbound {
        connection_id: ConnectionId,
        event: ClientEvent,
    },

    /// The link closed or its outbound side failed.
    Disconnected { connection_id: ConnectionId },
}
