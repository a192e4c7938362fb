use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{TestServer, WsClient, join_frame, negotiation_frame};

#[tokio::test]
async fn test_websocket_call_flow() {
    init_tracing();

    let server = TestServer::start().await.expect("Failed to start server");

    let mut alice = WsClient::connect(&server).await.expect("Alice connect");
    let mut bob = WsClient::connect(&server).await.expect("Bob connect");
    assert_ne!(alice.connection_id, bob.connection_id);
    assert_eq!(
        alice.welcome["d"]["iceServers"]
            .as_array()
            .map(|servers| servers.len()),
        Some(5)
    );

    alice
        .send_text(join_frame("r1", "Alice"))
        .await
        .expect("Alice join");
    // Let Alice's join land first so she is the one told about Bob.
    tokio::time::sleep(Duration::from_millis(200)).await;
    bob.send_text(join_frame("r1", "Bob")).await.expect("Bob join");

    let joined = alice.recv(2000).await.expect("user-joined");
    assert_eq!(joined["op"], "user-joined");
    assert_eq!(joined["d"]["userId"], bob.connection_id.to_string());
    assert_eq!(joined["d"]["userName"], "Bob");

    let ready = bob.recv(2000).await.expect("room-ready");
    assert_eq!(ready["op"], "room-ready");
    assert_eq!(ready["d"]["roomId"], "r1");

    let offer = r#"{"type":"offer", "sdp":"v=0\r\n"}"#;
    bob.send_text(negotiation_frame(
        "offer",
        "offer",
        alice.connection_id,
        bob.connection_id,
        offer,
    ))
    .await
    .expect("Bob offer");

    let incoming = alice.recv_text(2000).await.expect("incoming-offer");
    assert_eq!(
        incoming,
        format!(
            r#"{{"op":"incoming-offer","d":{{"from":"{}","offer":{}}}}}"#,
            bob.connection_id, offer
        )
    );

    let answer = r#"{"type":"answer","sdp":"y"}"#;
    alice
        .send_text(negotiation_frame(
            "answer",
            "answer",
            bob.connection_id,
            alice.connection_id,
            answer,
        ))
        .await
        .expect("Alice answer");

    let incoming = bob.recv(2000).await.expect("incoming-answer");
    assert_eq!(incoming["op"], "incoming-answer");
    assert_eq!(incoming["d"]["from"], alice.connection_id.to_string());
    assert_eq!(incoming["d"]["answer"]["sdp"], "y");

    let alice_id = alice.connection_id;
    alice.close().await.expect("Alice close");

    let gone = bob.recv(2000).await.expect("user-disconnected");
    assert_eq!(gone["op"], "user-disconnected");
    assert_eq!(gone["d"]["userId"], alice_id.to_string());

    bob.close().await.expect("Bob close");
}
