use crate::signaling::{ReconnectPolicy, TransportError};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Что сокет сообщает своему получателю.
#[derive(Debug)]
pub enum RelayEvent<I> {
    Connected,
    Disconnected,
    Message(I),
}

/// Получатель входящих событий relay-сокета.
#[async_trait]
pub trait RelaySink<I: Send + 'static>: Send + Sync + 'static {
    /// `false`, если получатель больше не принимает события: сокет закрывается.
    async fn deliver(&self, event: RelayEvent<I>) -> bool;
}

#[derive(PartialEq)]
enum PumpOutcome {
    Reconnect,
    Stop,
}

/// JSON-сокет к relay-серверу с автоматическим переподключением.
///
/// Отправка не блокирует: сообщение сериализуется сразу и уходит в очередь
/// фоновой задачи. Пока соединения нет, `send` отвечает `NotConnected`.
pub struct RelaySocket {
    url: String,
    outbound: mpsc::UnboundedSender<String>,
    status: watch::Receiver<bool>,
    shutdown: watch::Sender<bool>,
}

impl RelaySocket {
    pub fn connect<I, S>(url: impl Into<String>, policy: ReconnectPolicy, sink: S) -> Self
    where
        I: DeserializeOwned + Send + 'static,
        S: RelaySink<I>,
    {
        let url = url.into();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(false);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(run_socket(
            url.clone(),
            policy,
            sink,
            outbound_rx,
            status_tx,
            shutdown_rx,
        ));

        Self {
            url,
            outbound: outbound_tx,
            status: status_rx,
            shutdown: shutdown_tx,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn send<O: Serialize>(&self, msg: &O) -> Result<(), TransportError> {
        if *self.shutdown.borrow() {
            return Err(TransportError::Closed);
        }
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        let json = serde_json::to_string(msg)?;
        self.outbound
            .send(json)
            .map_err(|_| TransportError::Closed)
    }

    pub fn is_connected(&self) -> bool {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.status.clone()
    }

    /// Закрыть сокет после отправки уже поставленных в очередь сообщений.
    pub fn close(&self) {
        if self.shutdown.send_replace(true) {
            return;
        }
        info!("Closing relay socket {}", self.url);
    }
}

impl Drop for RelaySocket {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

async fn run_socket<I, S>(
    url: String,
    policy: ReconnectPolicy,
    sink: S,
    mut outbound: mpsc::UnboundedReceiver<String>,
    status: watch::Sender<bool>,
    mut shutdown: watch::Receiver<bool>,
) where
    I: DeserializeOwned + Send + 'static,
    S: RelaySink<I>,
{
    let mut attempt: u32 = 0;

    loop {
        if *shutdown.borrow() {
            break;
        }

        match open(&url).await {
            Ok(ws) => {
                info!("Connected to relay {}", url);
                attempt = 0;

                // Все, что было поставлено в очередь до разрыва, уже неактуально.
                while outbound.try_recv().is_ok() {}

                status.send_replace(true);
                if !sink.deliver(RelayEvent::Connected).await {
                    break;
                }

                let outcome = pump(ws, &sink, &mut outbound, &mut shutdown).await;

                status.send_replace(false);
                let sink_alive = sink.deliver(RelayEvent::Disconnected).await;
                if outcome == PumpOutcome::Stop || !sink_alive {
                    break;
                }
                warn!("Lost connection to relay {}", url);
            }
            Err(e) => {
                warn!(
                    "Failed to connect to relay {} (attempt {}): {}",
                    url,
                    attempt + 1,
                    e
                );
            }
        }

        attempt += 1;
        if !policy.allows(attempt) {
            error!("Giving up on relay {} after {} attempts", url, attempt);
            break;
        }

        let delay = policy.delay_for(attempt);
        debug!("Reconnecting to relay {} in {:?}", url, delay);
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            res = shutdown.changed() => {
                if res.is_err() {
                    break;
                }
            }
        }
    }

    status.send_replace(false);
    info!("Relay socket {} finished", url);
}

async fn open(url: &str) -> Result<WsStream, TransportError> {
    let (ws, _) = connect_async(url).await?;
    Ok(ws)
}

async fn pump<I, S>(
    ws: WsStream,
    sink: &S,
    outbound: &mut mpsc::UnboundedReceiver<String>,
    shutdown: &mut watch::Receiver<bool>,
) -> PumpOutcome
where
    I: DeserializeOwned + Send + 'static,
    S: RelaySink<I>,
{
    let (mut writer, mut reader) = ws.split();

    loop {
        // Очередь исходящих разбирается раньше shutdown: leave-room должен уйти.
        tokio::select! {
            biased;

            out = outbound.recv() => {
                let Some(json) = out else {
                    let _ = writer.close().await;
                    return PumpOutcome::Stop;
                };
                if let Err(e) = writer.send(Message::Text(json.into())).await {
                    warn!("Relay write error: {}", e);
                    return PumpOutcome::Reconnect;
                }
            }

            res = shutdown.changed() => {
                if res.is_err() || *shutdown.borrow() {
                    let _ = writer.send(Message::Close(None)).await;
                    return PumpOutcome::Stop;
                }
            }

            frame = reader.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<I>(&text) {
                            Ok(msg) => {
                                if !sink.deliver(RelayEvent::Message(msg)).await {
                                    return PumpOutcome::Stop;
                                }
                            }
                            Err(e) => warn!("Invalid relay message: {:?}", e),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return PumpOutcome::Reconnect,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Relay read error: {}", e);
                        return PumpOutcome::Reconnect;
                    }
                }
            }
        }
    }
}
