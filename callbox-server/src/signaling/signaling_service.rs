use crate::room::CoordinatorCommand;
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use callbox_core::{ConnectionId, IceServerConfig, ServerEvent};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

struct SignalingInner {
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
    ice_servers: Vec<IceServerConfig>,
}

/// Owns the outbound queue of every open WebSocket and the sender side of
/// the coordinator's command channel.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    pub(crate) coordinator_tx: mpsc::Sender<CoordinatorCommand>,
}

impl SignalingService {
    pub fn new(
        coordinator_tx: mpsc::Sender<CoordinatorCommand>,
        ice_servers: Vec<IceServerConfig>,
    ) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                connections: DashMap::new(),
                ice_servers,
            }),
            coordinator_tx,
        }
    }

    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn add_connection(&self, connection_id: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.connections.insert(connection_id, tx);
    }

    pub fn remove_connection(&self, connection_id: &ConnectionId) {
        self.inner.connections.remove(connection_id);
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    pub fn send_event(&self, connection_id: &ConnectionId, event: &ServerEvent) {
        let Some(connection) = self.inner.connections.get(connection_id) else {
            debug!(%connection_id, op = event.op(), "Destination already gone, dropping");
            return;
        };

        match event.encode() {
            Ok(json) => {
                // A closed queue means the socket is shutting down; its
                // disconnect command does the cleanup.
                if connection.send(Message::Text(json.into())).is_err() {
                    debug!(%connection_id, op = event.op(), "Outbound queue closed, dropping");
                }
            }
            Err(e) => error!("Failed to serialize {} event: {}", event.op(), e),
        }
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn deliver(&self, connection_id: &ConnectionId, event: ServerEvent) {
        self.send_event(connection_id, &event);
    }
}
