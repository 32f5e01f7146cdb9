use meshcall_client::{MeshCommand, NegotiationState};
use meshcall_core::PeerId;

use crate::integration::{init_tracing, spawn_mesh};
use crate::utils::{SentSignal, wait_for_snapshot};

#[tokio::test]
async fn test_leave_twice_releases_everything_once() {
    init_tracing();

    let alice = spawn_mesh("alice").await;
    for peer in ["bob", "carol"] {
        alice
            .send(MeshCommand::ParticipantJoined {
                peer_id: PeerId::from(peer),
                username: peer.into(),
            })
            .await;
    }
    wait_for_snapshot(&alice.handle, |s| {
        s.links.values().all(|state| *state == NegotiationState::OfferSent) && s.links.len() == 2
    })
    .await;

    alice.handle.leave().await;
    alice.handle.leave().await;

    let snapshot = alice.handle.snapshot();
    assert!(snapshot.left);
    assert!(snapshot.links.is_empty());
    assert!(snapshot.participants.is_empty());
    assert!(snapshot.remote_streams.is_empty());

    assert!(alice.connections.connections().iter().all(|c| c.is_closed()));
    assert!(alice.media.is_stopped());
    assert!(alice.media.tracks().iter().all(|t| t.is_ended()));

    let leaves = alice
        .signaling
        .count(|s| matches!(s, SentSignal::LeaveRoom))
        .await;
    let disconnects = alice
        .signaling
        .count(|s| matches!(s, SentSignal::Disconnect))
        .await;
    assert_eq!(leaves, 1);
    assert_eq!(disconnects, 1);
}

#[tokio::test]
async fn test_commands_after_leave_are_rejected() {
    init_tracing();

    let alice = spawn_mesh("alice").await;
    alice.handle.leave().await;

    let accepted = alice
        .handle
        .send(MeshCommand::ParticipantJoined {
            peer_id: PeerId::from("bob"),
            username: "Bob".into(),
        })
        .await;

    assert!(!accepted);
    assert!(alice.connections.connections().is_empty());
}

#[tokio::test]
async fn test_dropping_all_handles_leaves_the_room() {
    init_tracing();

    let alice = spawn_mesh("alice").await;
    let signaling = alice.signaling.clone();
    let media = alice.media.clone();
    drop(alice);

    let left = crate::utils::eventually(|| media.is_stopped()).await;
    assert!(left);
    assert_eq!(
        signaling
            .count(|s| matches!(s, SentSignal::LeaveRoom))
            .await,
        1
    );
}
