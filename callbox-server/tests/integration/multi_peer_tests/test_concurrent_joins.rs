use callbox_core::{ConnectionId, RoomId, ServerEvent};
use callbox_server::CoordinatorCommand;

use crate::integration::{create_test_coordinator, init_tracing};
use crate::utils::join;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_pair_exactly_two() {
    init_tracing();

    let mut harness = create_test_coordinator();
    let ids: Vec<ConnectionId> = (0..8).map(|_| ConnectionId::new()).collect();

    for id in &ids {
        harness
            .command(CoordinatorCommand::Connected { connection_id: *id })
            .await;
    }

    let harness_ref = &harness;
    let joins = ids.iter().map(|id| async move {
        harness_ref.send(*id, join("busy", "someone")).await;
    });
    futures::future::join_all(joins).await;

    // One user-joined + one room-ready for the pair, room-full for the rest.
    let (mut joined, mut ready, mut full) = (0, 0, 0);
    for _ in 0..ids.len() {
        match harness.next_delivery().await.event {
            ServerEvent::UserJoined { .. } => joined += 1,
            ServerEvent::RoomReady { .. } => ready += 1,
            ServerEvent::RoomFull { .. } => full += 1,
            other => panic!("Unexpected event {:?}", other),
        }
    }
    harness.expect_no_delivery().await;

    assert_eq!((joined, ready, full), (1, 1, ids.len() - 2));
    assert_eq!(harness.registry.members_of(&RoomId::from("busy")).len(), 2);
}
