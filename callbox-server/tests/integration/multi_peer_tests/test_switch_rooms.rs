use callbox_core::{RoomId, ServerEvent};

use crate::integration::{create_test_coordinator, init_tracing};
use crate::utils::offer;

#[tokio::test]
async fn test_switching_rooms_leaves_the_old_one() {
    init_tracing();

    let mut harness = create_test_coordinator();
    let a = harness.connect().await;
    let b = harness.connect().await;
    let c = harness.connect().await;

    harness.join(a, "r1", "Alice").await;
    harness.join(b, "r1", "Bob").await;
    harness.join(c, "r2", "Carol").await;
    harness.next_delivery().await;
    harness.next_delivery().await;

    harness.join(a, "r2", "Alice").await;

    let left = harness.next_delivery().await;
    assert_eq!(left.to, b);
    assert!(matches!(
        left.event,
        ServerEvent::UserDisconnected { user_id } if user_id == a
    ));

    let joined = harness.next_delivery().await;
    assert_eq!(joined.to, c);
    assert!(matches!(
        joined.event,
        ServerEvent::UserJoined { user_id, .. } if user_id == a
    ));

    let ready = harness.next_delivery().await;
    assert_eq!(ready.to, a);
    assert!(matches!(
        ready.event,
        ServerEvent::RoomReady { ref room_id } if *room_id == RoomId::from("r2")
    ));

    assert_eq!(harness.registry.members_of(&RoomId::from("r1")), vec![b]);
    assert_eq!(
        harness.registry.lookup(&a).and_then(|r| r.room_id),
        Some(RoomId::from("r2"))
    );
}

#[tokio::test]
async fn test_switching_into_full_room_keeps_current_call() {
    init_tracing();

    let mut harness = create_test_coordinator();
    let (r1, r2) = (RoomId::from("r1"), RoomId::from("r2"));

    let a = harness.connect().await;
    let b = harness.connect().await;
    let c = harness.connect().await;
    let d = harness.connect().await;
    harness.join(a, "r1", "Alice").await;
    harness.join(b, "r1", "Bob").await;
    harness.join(c, "r2", "Carol").await;
    harness.join(d, "r2", "Dave").await;
    for _ in 0..4 {
        harness.next_delivery().await;
    }

    harness.join(a, "r2", "Alice").await;

    let refused = harness.next_delivery().await;
    assert_eq!(refused.to, a);
    assert!(matches!(
        refused.event,
        ServerEvent::RoomFull { ref room_id } if *room_id == r2
    ));
    harness.expect_no_delivery().await;

    let mut members = harness.registry.members_of(&r1);
    members.sort_by_key(|id| id.to_string());
    let mut expected = vec![a, b];
    expected.sort_by_key(|id| id.to_string());
    assert_eq!(members, expected);
    assert_eq!(harness.registry.members_of(&r2).len(), 2);
    assert_eq!(
        harness.registry.lookup(&a).and_then(|r| r.room_id),
        Some(r1.clone())
    );

    // The pair in r1 can still negotiate.
    harness.send(a, offer(b, a, r#"{"sdp":"x"}"#)).await;
    let relayed = harness.next_delivery().await;
    assert_eq!(relayed.to, b);
    assert!(matches!(
        relayed.event,
        ServerEvent::IncomingOffer { from, .. } if from == a
    ));
}
