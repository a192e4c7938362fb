use async_trait::async_trait;
use callbox_core::{ConnectionId, ServerEvent};

/// Outbound side of the coordinator: whatever owns the live connections.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Queue `event` for one connection. Unknown or closed destinations are
    /// dropped; delivery is never retried.
    async fn deliver(&self, connection_id: &ConnectionId, event: ServerEvent);
}
