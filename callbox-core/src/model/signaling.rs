use crate::model::connection::ConnectionId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// Frame sent by a participant. Negotiation payloads stay raw JSON text so
/// they can be forwarded without being parsed.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    JoinRoom {
        room_id: RoomId,
        user_name: String,
    },
    Offer {
        to: ConnectionId,
        from: ConnectionId,
        offer: Box<RawValue>,
    },
    Answer {
        to: ConnectionId,
        from: ConnectionId,
        answer: Box<RawValue>,
    },
    IceCandidate {
        to: ConnectionId,
        from: ConnectionId,
        candidate: Box<RawValue>,
    },
    RejectCall {
        to: ConnectionId,
    },
    EndCall {
        to: ConnectionId,
    },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("unknown op `{0}`")]
    UnknownOp(String),

    #[error("invalid `{op}` payload: {source}")]
    InvalidPayload {
        op: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    /// The `op` of the offending frame, when it got that far.
    pub fn op(&self) -> Option<&str> {
        match self {
            DecodeError::Envelope(_) => None,
            DecodeError::UnknownOp(op) => Some(op),
            DecodeError::InvalidPayload { op, .. } => Some(op),
        }
    }
}

#[derive(Deserialize)]
struct Envelope<'a> {
    op: String,
    #[serde(borrow)]
    d: &'a RawValue,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinRoomPayload {
    room_id: RoomId,
    user_name: String,
}

#[derive(Deserialize)]
struct OfferPayload {
    to: ConnectionId,
    from: ConnectionId,
    offer: Box<RawValue>,
}

#[derive(Deserialize)]
struct AnswerPayload {
    to: ConnectionId,
    from: ConnectionId,
    answer: Box<RawValue>,
}

#[derive(Deserialize)]
struct CandidatePayload {
    to: ConnectionId,
    from: ConnectionId,
    candidate: Box<RawValue>,
}

#[derive(Deserialize)]
struct AddressedPayload {
    to: ConnectionId,
}

fn payload<T>(op: &str, d: &RawValue) -> Result<T, DecodeError>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_str(d.get()).map_err(|source| DecodeError::InvalidPayload {
        op: op.to_owned(),
        source,
    })
}

impl ClientEvent {
    /// Decode one `{"op": ..., "d": ...}` text frame.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let envelope: Envelope<'_> = serde_json::from_str(text).map_err(DecodeError::Envelope)?;
        let op = envelope.op.as_str();
        let d = envelope.d;

        let event = match op {
            "join-room" => {
                let p: JoinRoomPayload = payload(op, d)?;
                ClientEvent::JoinRoom {
                    room_id: p.room_id,
                    user_name: p.user_name,
                }
            }
            "offer" => {
                let p: OfferPayload = payload(op, d)?;
                ClientEvent::Offer {
                    to: p.to,
                    from: p.from,
                    offer: p.offer,
                }
            }
            "answer" => {
                let p: AnswerPayload = payload(op, d)?;
                ClientEvent::Answer {
                    to: p.to,
                    from: p.from,
                    answer: p.answer,
                }
            }
            "ice-candidate" => {
                let p: CandidatePayload = payload(op, d)?;
                ClientEvent::IceCandidate {
                    to: p.to,
                    from: p.from,
                    candidate: p.candidate,
                }
            }
            "reject-call" => ClientEvent::RejectCall {
                to: payload::<AddressedPayload>(op, d)?.to,
            },
            "end-call" => ClientEvent::EndCall {
                to: payload::<AddressedPayload>(op, d)?.to,
            },
            other => return Err(DecodeError::UnknownOp(other.to_owned())),
        };

        Ok(event)
    }

    pub fn op(&self) -> &'static str {
        match self {
            ClientEvent::JoinRoom { .. } => "join-room",
            ClientEvent::Offer { .. } => "offer",
            ClientEvent::Answer { .. } => "answer",
            ClientEvent::IceCandidate { .. } => "ice-candidate",
            ClientEvent::RejectCall { .. } => "reject-call",
            ClientEvent::EndCall { .. } => "end-call",
        }
    }
}

/// Frame sent by the coordinator to exactly one connection.
#[derive(Debug, Clone, Serialize)]
#[serde(
    tag = "op",
    content = "d",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    Welcome {
        connection_id: ConnectionId,
        ice_servers: Vec<IceServerConfig>,
    },
    UserJoined {
        user_id: ConnectionId,
        user_name: String,
    },
    RoomReady {
        room_id: RoomId,
    },
    IncomingOffer {
        from: ConnectionId,
        offer: Box<RawValue>,
    },
    IncomingAnswer {
        from: ConnectionId,
        answer: Box<RawValue>,
    },
    IceCandidate {
        from: ConnectionId,
        candidate: Box<RawValue>,
    },
    CallRejected {
        from: ConnectionId,
    },
    CallEnded {
        from: ConnectionId,
    },
    UserDisconnected {
        user_id: ConnectionId,
    },
    RoomFull {
        room_id: RoomId,
    },
    SignalError {
        #[serde(skip_serializing_if = "Option::is_none")]
        op: Option<String>,
        reason: String,
    },
}

impl ServerEvent {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn op(&self) -> &'static str {
        match self {
            ServerEvent::Welcome { .. } => "welcome",
            ServerEvent::UserJoined { .. } => "user-joined",
            ServerEvent::RoomReady { .. } => "room-ready",
            ServerEvent::IncomingOffer { .. } => "incoming-offer",
            ServerEvent::IncomingAnswer { .. } => "incoming-answer",
            ServerEvent::IceCandidate { .. } => "ice-candidate",
            ServerEvent::CallRejected { .. } => "call-rejected",
            ServerEvent::CallEnded { .. } => "call-ended",
            ServerEvent::UserDisconnected { .. } => "user-disconnected",
            ServerEvent::RoomFull { .. } => "room-full",
            ServerEvent::SignalError { .. } => "signal-error",
        }
    }
}

impl From<&DecodeError> for ServerEvent {
    fn from(err: &DecodeError) -> Self {
        ServerEvent::SignalError {
            op: err.op().map(str::to_owned),
            reason: err.to_string(),
        }
    }
}
