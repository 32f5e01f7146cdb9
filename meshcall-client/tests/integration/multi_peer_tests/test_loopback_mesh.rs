use std::sync::Arc;

use meshcall_client::{MeshCommand, MeshHandle, NegotiationState};
use meshcall_core::PeerId;
use tokio::sync::Semaphore;

use crate::integration::{init_tracing, spawn_relayed_mesh};
use crate::utils::{LoopbackRelay, MockConnectionFactory, wait_for_snapshot};

async fn fully_connected(handle: &MeshHandle, peers: &[&str]) {
    let expected: Vec<PeerId> = peers.iter().map(|p| PeerId::from(*p)).collect();
    wait_for_snapshot(handle, |s| {
        s.links.len() == expected.len()
            && expected
                .iter()
                .all(|p| s.link_state(p) == Some(NegotiationState::Connected))
    })
    .await;
}

#[tokio::test]
async fn test_existing_member_offers_to_newcomer() {
    init_tracing();

    let relay = LoopbackRelay::new();
    let a_conns = MockConnectionFactory::new();
    let b_conns = MockConnectionFactory::new();

    let a = spawn_relayed_mesh(&relay, "peer-a", Arc::new(a_conns.clone())).await;
    wait_for_snapshot(&a, |s| s.signaling_connected).await;
    let b = spawn_relayed_mesh(&relay, "peer-b", Arc::new(b_conns.clone())).await;

    fully_connected(&a, &["peer-b"]).await;
    fully_connected(&b, &["peer-a"]).await;

    // A was already in the room: A created the offer, B answered.
    let a_side = a_conns.latest(&PeerId::from("peer-b")).expect("A -> B connection");
    let b_side = b_conns.latest(&PeerId::from("peer-a")).expect("B -> A connection");
    assert!(a_side.remote_descriptions()[0].sdp.starts_with("answer:"));
    assert!(b_side.remote_descriptions()[0].sdp.starts_with("offer:"));

    let b_snapshot = b.snapshot();
    assert_eq!(b_snapshot.participants.len(), 1);
    assert_eq!(b_snapshot.participants[0].username, "peer-a");
}

#[tokio::test]
async fn test_three_peers_form_full_mesh() {
    init_tracing();

    let relay = LoopbackRelay::new();
    let names = ["peer-a", "peer-b", "peer-c"];
    let mut handles = Vec::new();

    for name in names {
        let handle =
            spawn_relayed_mesh(&relay, name, Arc::new(MockConnectionFactory::new())).await;
        handles.push(handle);
    }

    for (i, handle) in handles.iter().enumerate() {
        let others: Vec<&str> = names
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, n)| *n)
            .collect();
        fully_connected(handle, &others).await;
    }

    // Everyone sees the others in join order, exactly once.
    let c_snapshot = handles[2].snapshot();
    let roster: Vec<&str> = c_snapshot
        .participants
        .iter()
        .map(|p| p.id.as_str())
        .collect();
    assert_eq!(roster.len(), 2);
    assert!(roster.contains(&"peer-a") && roster.contains(&"peer-b"));
}

#[tokio::test]
async fn test_leaving_member_disappears_from_others() {
    init_tracing();

    let relay = LoopbackRelay::new();
    let a = spawn_relayed_mesh(&relay, "peer-a", Arc::new(MockConnectionFactory::new())).await;
    wait_for_snapshot(&a, |s| s.signaling_connected).await;
    let b = spawn_relayed_mesh(&relay, "peer-b", Arc::new(MockConnectionFactory::new())).await;

    fully_connected(&a, &["peer-b"]).await;

    b.leave().await;

    let snapshot = wait_for_snapshot(&a, |s| s.participants.is_empty()).await;
    assert!(snapshot.links.is_empty());
    assert_eq!(relay.member_ids(), vec![PeerId::from("peer-a")]);
}

#[tokio::test]
async fn test_simultaneous_offers_converge_on_larger_id() {
    init_tracing();

    let relay = LoopbackRelay::new();
    let a_gate = Arc::new(Semaphore::new(0));
    let b_gate = Arc::new(Semaphore::new(0));
    let a_conns = MockConnectionFactory::with_offer_gate(a_gate.clone());
    let b_conns = MockConnectionFactory::with_offer_gate(b_gate.clone());
    let (peer_a, peer_b) = (PeerId::from("peer-a"), PeerId::from("peer-b"));

    let a = spawn_relayed_mesh(&relay, "peer-a", Arc::new(a_conns.clone())).await;
    wait_for_snapshot(&a, |s| s.signaling_connected).await;
    let b = spawn_relayed_mesh(&relay, "peer-b", Arc::new(b_conns.clone())).await;
    wait_for_snapshot(&b, |s| s.signaling_connected).await;

    // The relay told A about B; B also learns about A before any offer is out.
    wait_for_snapshot(&a, |s| s.link_state(&peer_b) == Some(NegotiationState::OfferSent)).await;
    assert!(
        b.send(MeshCommand::ParticipantJoined {
            peer_id: peer_a.clone(),
            username: "peer-a".into(),
        })
        .await
    );
    wait_for_snapshot(&b, |s| s.link_state(&peer_a) == Some(NegotiationState::OfferSent)).await;

    a_gate.add_permits(1);
    b_gate.add_permits(1);

    fully_connected(&a, &["peer-b"]).await;
    fully_connected(&b, &["peer-a"]).await;

    // "peer-b" is larger: its offer won, A discarded its own link and answered.
    let a_side = a_conns.connections_to(&peer_b);
    assert_eq!(a_side.len(), 2);
    assert!(a_side[0].is_closed());
    assert!(a_side[1].remote_descriptions()[0].sdp.starts_with("offer:"));

    let b_side = b_conns.connections_to(&peer_a);
    assert_eq!(b_side.len(), 1);
    assert_eq!(b_side[0].remote_descriptions().len(), 1);
    assert!(b_side[0].remote_descriptions()[0].sdp.starts_with("answer:"));
}
