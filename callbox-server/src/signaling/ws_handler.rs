use crate::{CoordinatorCommand, SignalingService};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use callbox_core::{ClientEvent, ConnectionId, ServerEvent};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    let connection_id = ConnectionId::new();

    ws.on_upgrade(move |socket| handle_socket(socket, connection_id, service))
}

async fn handle_socket(socket: WebSocket, connection_id: ConnectionId, service: SignalingService) {
    info!(%connection_id, "New WebSocket connection");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.add_connection(connection_id, tx);
    service.send_event(
        &connection_id,
        &ServerEvent::Welcome {
            connection_id,
            ice_servers: service.ice_servers(),
        },
    );

    if service
        .coordinator_tx
        .send(CoordinatorCommand::Connected { connection_id })
        .await
        .is_err()
    {
        error!(%connection_id, "Signaling coordinator is gone, refusing connection");
        service.remove_connection(&connection_id);
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match ClientEvent::decode(text.as_str()) {
                        Ok(event) => {
                            let cmd = CoordinatorCommand::Inbound {
                                connection_id,
                                event,
                            };
                            if let Err(e) = service.coordinator_tx.send(cmd).await {
                                error!("Signaling coordinator died: {}", e);
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(%connection_id, error = %e, "Rejected malformed frame");
                            service.send_event(&connection_id, &ServerEvent::from(&e));
                        }
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.remove_connection(&connection_id);
    let _ = service
        .coordinator_tx
        .send(CoordinatorCommand::Disconnected { connection_id })
        .await;

    info!(%connection_id, "WebSocket disconnected");
}
