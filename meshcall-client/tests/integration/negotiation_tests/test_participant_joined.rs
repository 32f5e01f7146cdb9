use meshcall_client::{MeshCommand, NegotiationState};
use meshcall_core::{PeerId, RoomId, SessionDescription};

use crate::integration::{TEST_ROOM, init_tracing, spawn_mesh};
use crate::utils::{SentSignal, wait_for_signal, wait_for_snapshot};

#[tokio::test]
async fn test_connected_signaling_joins_room() {
    init_tracing();

    let mut alice = spawn_mesh("alice").await;

    let join = wait_for_signal(&mut alice.signal_rx, |s| {
        matches!(s, SentSignal::JoinRoom { .. })
    })
    .await;
    assert_eq!(
        join,
        SentSignal::JoinRoom {
            room_id: RoomId::from(TEST_ROOM),
            username: "alice".into(),
        }
    );

    let snapshot = wait_for_snapshot(&alice.handle, |s| s.signaling_connected).await;
    assert_eq!(snapshot.local_id, Some(PeerId::from("alice")));
}

#[tokio::test]
async fn test_participant_joined_sends_offer_with_local_tracks() {
    init_tracing();

    let mut alice = spawn_mesh("alice").await;
    let bob = PeerId::from("bob");

    alice
        .send(MeshCommand::ParticipantJoined {
            peer_id: bob.clone(),
            username: "Bob".into(),
        })
        .await;

    let offer = wait_for_signal(&mut alice.signal_rx, |s| {
        matches!(s, SentSignal::Offer { .. })
    })
    .await;
    assert!(matches!(offer, SentSignal::Offer { ref to, .. } if to == &bob));

    let snapshot = wait_for_snapshot(&alice.handle, |s| {
        s.link_state(&bob) == Some(NegotiationState::OfferSent)
    })
    .await;
    assert_eq!(snapshot.participant(&bob).map(|p| p.username.as_str()), Some("Bob"));

    let connection = alice.connections.latest(&bob).expect("Connection for bob");
    assert_eq!(connection.track_count(), alice.media.tracks().len());

    // The local candidate is only forwarded after the offer went out.
    let signals = alice.signaling.signals().await;
    let offer_pos = signals
        .iter()
        .position(|s| matches!(s, SentSignal::Offer { .. }))
        .expect("Offer sent");
    let ice_pos = signals
        .iter()
        .position(|s| matches!(s, SentSignal::Ice { .. }));
    if let Some(ice_pos) = ice_pos {
        assert!(ice_pos > offer_pos);
    }
}

#[tokio::test]
async fn test_duplicate_announcement_keeps_single_link() {
    init_tracing();

    let mut alice = spawn_mesh("alice").await;
    let bob = PeerId::from("bob");

    for _ in 0..3 {
        alice
            .send(MeshCommand::ParticipantJoined {
                peer_id: bob.clone(),
                username: "Bob".into(),
            })
            .await;
    }
    wait_for_signal(&mut alice.signal_rx, |s| matches!(s, SentSignal::Offer { .. })).await;

    let snapshot = wait_for_snapshot(&alice.handle, |s| s.links.len() == 1).await;
    assert_eq!(snapshot.participants.len(), 1);
    assert_eq!(alice.connections.connections_to(&bob).len(), 1);
    assert_eq!(alice.signaling.offers_to(&bob).await.len(), 1);
}

#[tokio::test]
async fn test_self_announcement_is_ignored() {
    init_tracing();

    let alice = spawn_mesh("alice").await;

    alice
        .send(MeshCommand::ParticipantJoined {
            peer_id: PeerId::from("alice"),
            username: "alice".into(),
        })
        .await;
    alice
        .send(MeshCommand::ParticipantJoined {
            peer_id: PeerId::from("bob"),
            username: "Bob".into(),
        })
        .await;

    let snapshot = wait_for_snapshot(&alice.handle, |s| s.participants.len() == 1).await;
    assert_eq!(snapshot.participants[0].id, PeerId::from("bob"));
    assert!(alice.connections.connections_to(&PeerId::from("alice")).is_empty());
}

#[tokio::test]
async fn test_offer_from_new_peer_is_answered() {
    init_tracing();

    let mut alice = spawn_mesh("alice").await;
    let carol = PeerId::from("carol");

    alice
        .send(MeshCommand::OfferReceived {
            from: carol.clone(),
            username: "Carol".into(),
            offer: SessionDescription::offer("remote-offer"),
        })
        .await;

    let answer = wait_for_signal(&mut alice.signal_rx, |s| {
        matches!(s, SentSignal::Answer { .. })
    })
    .await;
    assert!(matches!(answer, SentSignal::Answer { ref to, .. } if to == &carol));

    // The mock transport reports `connected` once both descriptions are set.
    wait_for_snapshot(&alice.handle, |s| {
        s.link_state(&carol) == Some(NegotiationState::Connected)
    })
    .await;

    let connection = alice.connections.latest(&carol).expect("Connection for carol");
    assert_eq!(
        connection.remote_descriptions(),
        vec![SessionDescription::offer("remote-offer")]
    );
}

#[tokio::test]
async fn test_connection_creation_failure_leaves_no_link() {
    init_tracing();

    let alice = spawn_mesh("alice").await;
    alice.connections.fail_creates(true);

    alice
        .send(MeshCommand::ParticipantJoined {
            peer_id: PeerId::from("bob"),
            username: "Bob".into(),
        })
        .await;

    let snapshot = wait_for_snapshot(&alice.handle, |s| !s.participants.is_empty()).await;
    assert!(snapshot.links.is_empty());
    assert!(alice.signaling.offers_to(&PeerId::from("bob")).await.is_empty());
}
