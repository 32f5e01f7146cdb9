use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use meshcall_client::{ReconnectPolicy, RelayEvent, RelaySink, RelaySocket, TransportError};
use meshcall_core::{ClientSignal, PeerId, RoomId, ServerSignal};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

use crate::integration::init_tracing;
use crate::utils::WAIT_TIMEOUT_MS;

struct ChannelSink(mpsc::UnboundedSender<RelayEvent<ServerSignal>>);

#[async_trait]
impl RelaySink<ServerSignal> for ChannelSink {
    async fn deliver(&self, event: RelayEvent<ServerSignal>) -> bool {
        self.0.send(event).is_ok()
    }
}

pub fn fast_policy() -> ReconnectPolicy {
    ReconnectPolicy {
        initial_delay_ms: 20,
        max_delay_ms: 50,
        max_attempts: None,
    }
}

pub async fn listen() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    (listener, url)
}

pub async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let accept = async {
        let (stream, _) = listener.accept().await.unwrap();
        accept_async(stream).await.unwrap()
    };
    tokio::time::timeout(Duration::from_millis(WAIT_TIMEOUT_MS), accept)
        .await
        .expect("Timed out waiting for client")
}

pub async fn send_frame(ws: &mut WebSocketStream<TcpStream>, signal: &ServerSignal) {
    let json = serde_json::to_string(signal).unwrap();
    ws.send(Message::text(json)).await.unwrap();
}

pub async fn next_frame(ws: &mut WebSocketStream<TcpStream>) -> ClientSignal {
    let read = async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("Client went away: {:?}", other),
            }
        }
    };
    tokio::time::timeout(Duration::from_millis(WAIT_TIMEOUT_MS), read)
        .await
        .expect("Timed out waiting for client frame")
}

async fn next_event(
    rx: &mut mpsc::UnboundedReceiver<RelayEvent<ServerSignal>>,
) -> RelayEvent<ServerSignal> {
    tokio::time::timeout(Duration::from_millis(WAIT_TIMEOUT_MS), rx.recv())
        .await
        .expect("Timed out waiting for relay event")
        .expect("Relay socket stopped")
}

#[tokio::test]
async fn test_frames_flow_both_ways() {
    init_tracing();

    let (listener, url) = listen().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let socket = RelaySocket::connect(url, fast_policy(), ChannelSink(tx));

    assert!(matches!(
        socket.send(&ClientSignal::LeaveRoom {}),
        Err(TransportError::NotConnected)
    ));

    let mut server = accept(&listener).await;
    assert!(matches!(next_event(&mut rx).await, RelayEvent::Connected));
    assert!(socket.is_connected());

    send_frame(
        &mut server,
        &ServerSignal::Welcome {
            user_id: PeerId::from("p1"),
        },
    )
    .await;
    match next_event(&mut rx).await {
        RelayEvent::Message(ServerSignal::Welcome { user_id }) => {
            assert_eq!(user_id, PeerId::from("p1"))
        }
        other => panic!("Expected welcome, got {:?}", other),
    }

    socket
        .send(&ClientSignal::JoinRoom {
            room_id: RoomId::from("r1"),
            username: "amy".into(),
        })
        .unwrap();
    assert_eq!(
        next_frame(&mut server).await,
        ClientSignal::JoinRoom {
            room_id: RoomId::from("r1"),
            username: "amy".into(),
        }
    );
}

#[tokio::test]
async fn test_malformed_frames_are_skipped() {
    init_tracing();

    let (listener, url) = listen().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _socket = RelaySocket::connect(url, fast_policy(), ChannelSink(tx));

    let mut server = accept(&listener).await;
    assert!(matches!(next_event(&mut rx).await, RelayEvent::Connected));

    server
        .send(Message::text(r#"{"event":"no-such-event","data":{}}"#))
        .await
        .unwrap();
    send_frame(
        &mut server,
        &ServerSignal::UserDisconnected {
            user_id: PeerId::from("p2"),
        },
    )
    .await;

    assert!(matches!(
        next_event(&mut rx).await,
        RelayEvent::Message(ServerSignal::UserDisconnected { .. })
    ));
}

#[tokio::test]
async fn test_reconnects_after_server_drop() {
    init_tracing();

    let (listener, url) = listen().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let socket = RelaySocket::connect(url, fast_policy(), ChannelSink(tx));

    let server = accept(&listener).await;
    assert!(matches!(next_event(&mut rx).await, RelayEvent::Connected));

    drop(server);
    assert!(matches!(next_event(&mut rx).await, RelayEvent::Disconnected));

    let mut server = accept(&listener).await;
    assert!(matches!(next_event(&mut rx).await, RelayEvent::Connected));

    socket.send(&ClientSignal::LeaveRoom {}).unwrap();
    assert_eq!(next_frame(&mut server).await, ClientSignal::LeaveRoom {});
}

#[tokio::test]
async fn test_close_flushes_queue_and_stops() {
    init_tracing();

    let (listener, url) = listen().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let socket = RelaySocket::connect(url, fast_policy(), ChannelSink(tx));

    let mut server = accept(&listener).await;
    assert!(matches!(next_event(&mut rx).await, RelayEvent::Connected));

    socket.send(&ClientSignal::LeaveRoom {}).unwrap();
    socket.close();

    assert_eq!(next_frame(&mut server).await, ClientSignal::LeaveRoom {});
    assert!(matches!(next_event(&mut rx).await, RelayEvent::Disconnected));
    assert!(matches!(
        socket.send(&ClientSignal::LeaveRoom {}),
        Err(TransportError::Closed)
    ));

    // No reconnect after an explicit close.
    let reconnect = tokio::time::timeout(Duration::from_millis(200), listener.accept()).await;
    assert!(reconnect.is_err());
}
