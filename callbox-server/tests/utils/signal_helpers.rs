use callbox_core::{ClientEvent, ConnectionId, RoomId};
use serde_json::value::RawValue;

/// Raw JSON text used as an opaque negotiation payload.
pub fn raw(json: &str) -> Box<RawValue> {
    RawValue::from_string(json.to_owned()).expect("test payload must be valid JSON")
}

pub fn join(room: &str, user_name: &str) -> ClientEvent {
    ClientEvent::JoinRoom {
        room_id: RoomId::from(room),
        user_name: user_name.to_owned(),
    }
}

pub fn offer(to: ConnectionId, from: ConnectionId, payload: &str) -> ClientEvent {
    ClientEvent::Offer {
        to,
        from,
        offer: raw(payload),
    }
}

pub fn answer(to: ConnectionId, from: ConnectionId, payload: &str) -> ClientEvent {
    ClientEvent::Answer {
        to,
        from,
        answer: raw(payload),
    }
}

pub fn candidate(to: ConnectionId, from: ConnectionId, payload: &str) -> ClientEvent {
    ClientEvent::IceCandidate {
        to,
        from,
        candidate: raw(payload),
    }
}

/// Wire frame for `join-room`.
pub fn join_frame(room: &str, user_name: &str) -> String {
    serde_json::json!({"op": "join-room", "d": {"roomId": room, "userName": user_name}})
        .to_string()
}

/// Wire frame for an addressed negotiation message; `payload` is inserted verbatim.
pub fn negotiation_frame(
    op: &str,
    field: &str,
    to: ConnectionId,
    from: ConnectionId,
    payload: &str,
) -> String {
    format!(
        r#"{{"op":"{}","d":{{"to":"{}","from":"{}","{}":{}}}}}"#,
        op, to, from, field, payload
    )
}
