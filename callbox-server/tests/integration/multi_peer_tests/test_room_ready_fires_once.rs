use callbox_core::ServerEvent;

use crate::integration::{create_test_coordinator, init_tracing};

#[tokio::test]
async fn test_rejoin_does_not_refire_room_ready() {
    init_tracing();

    let mut harness = create_test_coordinator();
    let a = harness.connect().await;
    let b = harness.connect().await;

    harness.join(a, "r1", "Alice").await;
    harness.join(b, "r1", "Bob").await;
    harness.next_delivery().await;
    harness.next_delivery().await;

    harness.join(b, "r1", "Bobby").await;
    harness.join(a, "r1", "Alice").await;
    harness.expect_no_delivery().await;

    assert_eq!(harness.registry.lookup(&b).unwrap().display_name, "Bobby");
}

#[tokio::test]
async fn test_room_ready_fires_once_per_occupancy() {
    init_tracing();

    let mut harness = create_test_coordinator();
    let a = harness.connect().await;
    let b = harness.connect().await;
    let c = harness.connect().await;
    let d = harness.connect().await;

    harness.join(a, "r1", "Alice").await;
    harness.join(b, "r1", "Bob").await;
    harness.next_delivery().await;
    harness.next_delivery().await;

    // A leaves; a newcomer filling the seat is the same occupancy.
    harness.disconnect(a).await;
    harness.next_delivery().await;
    harness.join(c, "r1", "Carol").await;
    harness.expect_no_delivery().await;

    // Empty the room completely, then start over.
    harness.disconnect(b).await;
    harness.next_delivery().await;
    harness.disconnect(c).await;
    harness.expect_no_delivery().await;
    assert_eq!(harness.registry.room_count(), 0);

    let e = harness.connect().await;
    harness.join(d, "r1", "Dave").await;
    harness.expect_no_delivery().await;
    harness.join(e, "r1", "Erin").await;

    let joined = harness.next_delivery().await;
    assert_eq!(joined.to, d);
    assert!(matches!(
        joined.event,
        ServerEvent::UserJoined { user_id, .. } if user_id == e
    ));
    let ready = harness.next_delivery().await;
    assert_eq!(ready.to, e);
    assert!(matches!(ready.event, ServerEvent::RoomReady { .. }));
}
