use crate::room::coordinator_command::CoordinatorCommand;
use crate::room::room_registry::{Departure, JoinOutcome, ROOM_CAPACITY, RoomRegistry};
use crate::signaling::SignalingOutput;
use callbox_core::{CallState, ClientEvent, ConnectionId, RoomId, ServerEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Call-lifecycle actor.
///
/// Every join, relay and disconnect goes through one command channel and is
/// applied to completion before the next one is read, which is what keeps
/// room membership changes and relays in arrival order.
pub struct SignalingCoordinator {
    registry: RoomRegistry,
    command_rx: mpsc::Receiver<CoordinatorCommand>,
    signaling: Arc<dyn SignalingOutput>,
}

impl SignalingCoordinator {
    pub fn new(
        registry: RoomRegistry,
        command_rx: mpsc::Receiver<CoordinatorCommand>,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Self {
        Self {
            registry,
            command_rx,
            signaling,
        }
    }

    /// Main loop. Must be spawned; returns once every command sender is gone.
    pub async fn run(mut self) {
        info!("Signaling coordinator started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;
        }

        info!("Command channel closed. Signaling coordinator stopped.");
    }

    async fn handle_command(&self, cmd: CoordinatorCommand) {
        match cmd {
            CoordinatorCommand::Connected { connection_id } => {
                debug!(%connection_id, "Registering connection");
                self.registry.connect(connection_id);
            }

            CoordinatorCommand::Inbound {
                connection_id,
                event,
            } => {
                debug!(%connection_id, op = event.op(), "Inbound event");
                self.handle_event(connection_id, event).await;
            }

            CoordinatorCommand::Disconnected { connection_id } => {
                match self.registry.disconnect(&connection_id) {
                    Some(departure) => {
                        info!(%connection_id, room_id = %departure.room_id, "Connection left room by disconnecting");
                        self.notify_departure(connection_id, &departure, None).await;
                    }
                    None => debug!(%connection_id, "Connection closed outside any room"),
                }
            }
        }
    }

    async fn handle_event(&self, origin: ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::JoinRoom { room_id, user_name } => {
                self.join(origin, room_id, user_name).await;
            }

            ClientEvent::Offer { to, from, offer } => {
                check_sender(origin, from, "offer");
                let event = ServerEvent::IncomingOffer {
                    from: origin,
                    offer,
                };
                if let Some(room_id) = self.relay(origin, to, event).await {
                    self.registry
                        .set_call_state(&room_id, CallState::Negotiating);
                }
            }

            ClientEvent::Answer { to, from, answer } => {
                check_sender(origin, from, "answer");
                let event = ServerEvent::IncomingAnswer {
                    from: origin,
                    answer,
                };
                if let Some(room_id) = self.relay(origin, to, event).await {
                    info!(room_id = %room_id, "Call connected");
                    self.registry.set_call_state(&room_id, CallState::Connected);
                }
            }

            ClientEvent::IceCandidate {
                to,
                from,
                candidate,
            } => {
                check_sender(origin, from, "ice-candidate");
                let event = ServerEvent::IceCandidate {
                    from: origin,
                    candidate,
                };
                self.relay(origin, to, event).await;
            }

            ClientEvent::RejectCall { to } => {
                let event = ServerEvent::CallRejected { from: origin };
                if let Some(room_id) = self.relay(origin, to, event).await {
                    info!(room_id = %room_id, connection_id = %origin, "Call rejected");
                    self.registry.set_call_state(&room_id, CallState::Ended);
                }
            }

            ClientEvent::EndCall { to } => {
                let event = ServerEvent::CallEnded { from: origin };
                let delivered = self.relay(origin, to, event).await.map(|_| to);

                if let Some(departure) = self.registry.leave(&origin) {
                    info!(connection_id = %origin, room_id = %departure.room_id, "Call ended");
                    self.notify_departure(origin, &departure, delivered).await;
                }
            }
        }
    }

    async fn join(&self, origin: ConnectionId, room_id: RoomId, user_name: String) {
        let previous = self.registry.lookup(&origin).and_then(|r| r.room_id);
        if previous.as_ref().is_some_and(|prev| prev != &room_id) {
            // A refused switch keeps the current room.
            if self.registry.members_of(&room_id).len() >= ROOM_CAPACITY {
                info!(connection_id = %origin, room_id = %room_id, "Room is full, staying put");
                self.signaling
                    .deliver(&origin, ServerEvent::RoomFull { room_id })
                    .await;
                return;
            }

            if let Some(departure) = self.registry.leave(&origin) {
                info!(connection_id = %origin, from = %departure.room_id, to = %room_id, "Switching rooms");
                self.notify_departure(origin, &departure, None).await;
            }
        }

        match self
            .registry
            .join(origin, room_id.clone(), user_name.clone())
        {
            JoinOutcome::RoomFull => {
                info!(connection_id = %origin, room_id = %room_id, "Room is full, join refused");
                self.signaling
                    .deliver(&origin, ServerEvent::RoomFull { room_id })
                    .await;
            }

            JoinOutcome::Rejoined { members } => {
                debug!(connection_id = %origin, room_id = %room_id, members, "Repeated join");
            }

            JoinOutcome::Joined { members } => {
                info!(connection_id = %origin, room_id = %room_id, user_name = %user_name, members, "Joined room");

                if members == ROOM_CAPACITY && self.registry.mark_ready(&room_id) {
                    info!(room_id = %room_id, "Room ready");

                    for peer in self.registry.members_of(&room_id) {
                        if peer == origin {
                            continue;
                        }
                        let event = ServerEvent::UserJoined {
                            user_id: origin,
                            user_name: user_name.clone(),
                        };
                        self.signaling.deliver(&peer, event).await;
                    }

                    self.signaling
                        .deliver(&origin, ServerEvent::RoomReady { room_id })
                        .await;
                }
            }
        }
    }

    /// Forward `event` to `to` when both ends share a room. Returns that room,
    /// or `None` when the event was dropped.
    async fn relay(
        &self,
        origin: ConnectionId,
        to: ConnectionId,
        event: ServerEvent,
    ) -> Option<RoomId> {
        let Some(room_id) = self.registry.shared_room(&origin, &to) else {
            debug!(
                from = %origin,
                %to,
                op = event.op(),
                "Dropping event: destination is not in the sender's room"
            );
            return None;
        };

        debug!(from = %origin, %to, op = event.op(), "Relaying");
        self.signaling.deliver(&to, event).await;
        Some(room_id)
    }

    /// Tell every remaining member that `departed` is gone, except `skip`,
    /// which already heard about it.
    async fn notify_departure(
        &self,
        departed: ConnectionId,
        departure: &Departure,
        skip: Option<ConnectionId>,
    ) {
        for member in &departure.remaining {
            if Some(*member) == skip {
                continue;
            }
            let event = ServerEvent::UserDisconnected { user_id: departed };
            self.signaling.deliver(member, event).await;
        }
    }
}

fn check_sender(origin: ConnectionId, declared: ConnectionId, op: &'static str) {
    if origin != declared {
        debug!(%origin, %declared, op, "Declared sender differs from connection; using connection id");
    }
}
