use std::sync::Arc;

use meshcall_client::{MeshCommand, NegotiationState};
use meshcall_core::{PeerId, SessionDescription};
use tokio::sync::Semaphore;

use crate::integration::{init_tracing, spawn_mesh, spawn_mesh_with};
use crate::utils::{MockConnectionFactory, SentSignal, wait_for_signal, wait_for_snapshot};

#[tokio::test]
async fn test_answer_from_unknown_peer_is_dropped() {
    init_tracing();

    let alice = spawn_mesh("alice").await;

    alice
        .send(MeshCommand::AnswerReceived {
            from: PeerId::from("ghost"),
            answer: SessionDescription::answer("nobody-asked"),
        })
        .await;
    alice
        .send(MeshCommand::ParticipantJoined {
            peer_id: PeerId::from("bob"),
            username: "Bob".into(),
        })
        .await;

    let snapshot = wait_for_snapshot(&alice.handle, |s| s.links.len() == 1).await;
    assert!(snapshot.participant(&PeerId::from("ghost")).is_none());
}

#[tokio::test]
async fn test_answer_while_answering_is_dropped() {
    init_tracing();

    let mut alice = spawn_mesh("alice").await;
    let carol = PeerId::from("carol");

    alice
        .send(MeshCommand::OfferReceived {
            from: carol.clone(),
            username: "Carol".into(),
            offer: SessionDescription::offer("carol-offer"),
        })
        .await;
    wait_for_signal(&mut alice.signal_rx, |s| matches!(s, SentSignal::Answer { .. })).await;

    alice
        .send(MeshCommand::AnswerReceived {
            from: carol.clone(),
            answer: SessionDescription::answer("confused"),
        })
        .await;

    wait_for_snapshot(&alice.handle, |s| {
        s.link_state(&carol) == Some(NegotiationState::Connected)
    })
    .await;
    let connection = alice.connections.latest(&carol).expect("Connection for carol");
    assert_eq!(
        connection.remote_descriptions(),
        vec![SessionDescription::offer("carol-offer")]
    );
}

#[tokio::test]
async fn test_new_offer_on_established_link_replaces_it() {
    init_tracing();

    let mut alice = spawn_mesh("alice").await;
    let carol = PeerId::from("carol");

    for round in 0..2 {
        alice
            .send(MeshCommand::OfferReceived {
                from: carol.clone(),
                username: "Carol".into(),
                offer: SessionDescription::offer(format!("carol-offer-{}", round)),
            })
            .await;
        wait_for_signal(&mut alice.signal_rx, |s| matches!(s, SentSignal::Answer { .. })).await;
        wait_for_snapshot(&alice.handle, |s| {
            s.link_state(&carol) == Some(NegotiationState::Connected)
        })
        .await;
    }

    let connections = alice.connections.connections_to(&carol);
    assert_eq!(connections.len(), 2);
    assert!(connections[0].is_closed());
    assert!(!connections[1].is_closed());
    assert_eq!(alice.handle.snapshot().participants.len(), 1);
}

#[tokio::test]
async fn test_offer_finishing_after_leave_is_discarded() {
    init_tracing();

    let gate = Arc::new(Semaphore::new(0));
    let connections = MockConnectionFactory::with_offer_gate(gate.clone());
    let alice = spawn_mesh_with("alice", connections).await;
    let bob = PeerId::from("bob");

    alice
        .send(MeshCommand::ParticipantJoined {
            peer_id: bob.clone(),
            username: "Bob".into(),
        })
        .await;
    wait_for_snapshot(&alice.handle, |s| {
        s.link_state(&bob) == Some(NegotiationState::OfferSent)
    })
    .await;

    alice.handle.leave().await;
    gate.add_permits(1);
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    assert!(alice.signaling.offers_to(&bob).await.is_empty());
    assert!(alice.connections.latest(&bob).expect("Connection for bob").is_closed());
    assert_eq!(
        alice
            .signaling
            .count(|s| matches!(s, SentSignal::LeaveRoom))
            .await,
        1
    );
}
