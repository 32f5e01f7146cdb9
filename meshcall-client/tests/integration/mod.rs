
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Level;

use meshcall_client::{
    ConnectionFactory, LocalMediaSession, MediaConstraints, Mesh, MeshCommand, MeshHandle,
    SyntheticDevices,
};
use meshcall_core::{Membership, PeerId};

use crate::utils::{LoopbackRelay, MockConnectionFactory, MockSignalingOutput, SentSignal};

pub const TEST_ROOM: &str = "room-1";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub async fn synthetic_media() -> Arc<LocalMediaSession> {
    let devices = SyntheticDevices::default();
    let media = LocalMediaSession::acquire(&devices, &MediaConstraints::default())
        .await
        .expect("Synthetic devices must provide media");
    Arc::new(media)
}

/// A mesh driven directly through its command channel.
pub struct TestMesh {
    pub handle: MeshHandle,
    pub signaling: MockSignalingOutput,
    pub signal_rx: mpsc::UnboundedReceiver<SentSignal>,
    pub connections: MockConnectionFactory,
    pub media: Arc<LocalMediaSession>,
}

impl TestMesh {
    pub async fn send(&self, cmd: MeshCommand) {
        assert!(self.handle.send(cmd).await, "Mesh stopped unexpectedly");
    }
}

/// Spawn a mesh whose relay already reported `local_id` and a live connection.
pub async fn spawn_mesh(local_id: &str) -> TestMesh {
    spawn_mesh_with(local_id, MockConnectionFactory::new()).await
}

pub async fn spawn_mesh_with(local_id: &str, connections: MockConnectionFactory) -> TestMesh {
    let media = synthetic_media().await;
    let (handle, inbox) = MeshHandle::channel();
    let (signaling, signal_rx) = MockSignalingOutput::new();

    let mesh = Mesh::new(
        Membership::new(TEST_ROOM, local_id),
        inbox,
        Arc::new(signaling.clone()),
        Arc::new(connections.clone()),
        media.clone(),
    );
    tokio::spawn(mesh.run());

    let test_mesh = TestMesh {
        handle,
        signaling,
        signal_rx,
        connections,
        media,
    };
    test_mesh
        .send(MeshCommand::Welcome {
            self_id: PeerId::from(local_id),
        })
        .await;
    test_mesh
        .send(MeshCommand::SignalingStatus { connected: true })
        .await;
    test_mesh
}

/// Spawn a mesh attached to a shared loopback relay.
pub async fn spawn_relayed_mesh(
    relay: &LoopbackRelay,
    local_id: &str,
    connections: Arc<dyn ConnectionFactory>,
) -> MeshHandle {
    spawn_relayed_mesh_with_media(relay, local_id, connections, synthetic_media().await)
}

/// Same as [`spawn_relayed_mesh`], but the caller keeps the media session.
pub fn spawn_relayed_mesh_with_media(
    relay: &LoopbackRelay,
    local_id: &str,
    connections: Arc<dyn ConnectionFactory>,
    media: Arc<LocalMediaSession>,
) -> MeshHandle {
    let (handle, inbox) = MeshHandle::channel();
    let signaling = relay.attach(local_id, handle.clone());

    let mesh = Mesh::new(
        Membership::new(TEST_ROOM, local_id),
        inbox,
        signaling,
        connections,
        media,
    );
    tokio::spawn(mesh.run());
    handle
}
