use crate::media::{LocalTrack, MediaKind, RemoteTrack};
use crate::transport::sample_pump::spawn_sample_pump;
use crate::transport::{
    ConnectionFactory, ConnectionState, LinkEvents, RealtimeConnection, TransportConfig,
};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use meshcall_core::{IceCandidate, PeerId, SdpType, SessionDescription};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::api::setting_engine::SettingEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

/// Фабрика соединений на базе `webrtc`.
#[derive(Clone, Default)]
pub struct WebRtcConnectionFactory {
    config: TransportConfig,
}

impl WebRtcConnectionFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ConnectionFactory for WebRtcConnectionFactory {
    async fn create(&self, events: LinkEvents) -> Result<Arc<dyn RealtimeConnection>> {
        let connection = WebRtcConnection::new(self.config.clone(), events).await?;
        Ok(Arc::new(connection))
    }
}

pub struct WebRtcConnection {
    pub peer_id: PeerId,
    pub peer_connection: Arc<RTCPeerConnection>,
    /// `true` после `close()`: останавливает насосы кадров.
    closed: watch::Sender<bool>,
}

impl WebRtcConnection {
    /// Инициализация нового WebRTC соединения.
    /// Все колбэки соединения уходят в `events`, то есть в очередь цикла Mesh.
    pub async fn new(config: TransportConfig, events: LinkEvents) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let mut settings = SettingEngine::default();
        settings.set_include_loopback_candidate(config.include_loopback_candidates);

        let api = APIBuilder::new()
            .with_setting_engine(settings)
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);
        let peer_id = events.peer_id().clone();

        // A. Состояние соединения
        let state_events = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let events = state_events.clone();

                Box::pin(async move {
                    info!(
                        "Peer Connection State changed for {} (generation {}): {:?}",
                        events.peer_id(),
                        events.generation(),
                        s
                    );
                    events.state_changed(map_state(s));
                })
            },
        ));

        // B. Trickle ICE: локальные кандидаты уходят пиру через relay
        let ice_events = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let events = ice_events.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                events.candidate_generated(IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                    username_fragment: init.username_fragment,
                });
            })
        }));

        // C. Удаленные треки
        let track_events = events.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let events = track_events.clone();

                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => MediaKind::Audio,
                        RTPCodecType::Video => MediaKind::Video,
                        other => {
                            warn!(
                                "Ignoring remote track of kind {:?} from {}",
                                other,
                                events.peer_id()
                            );
                            return;
                        }
                    };
                    debug!("Remote {:?} track from {}", kind, events.peer_id());
                    events.track_added(RemoteTrack {
                        id: track.id(),
                        stream_id: track.stream_id(),
                        kind,
                    });
                })
            },
        ));

        let (closed, _) = watch::channel(false);

        Ok(Self {
            peer_id,
            peer_connection,
            closed,
        })
    }
}

#[async_trait]
impl RealtimeConnection for WebRtcConnection {
    async fn add_track(&self, track: Arc<LocalTrack>) -> Result<()> {
        let mime_type = match track.kind() {
            MediaKind::Audio => MIME_TYPE_OPUS,
            MediaKind::Video => MIME_TYPE_VP8,
        };
        let local = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: mime_type.to_owned(),
                ..Default::default()
            },
            track.id().to_owned(),
            track.stream_id().to_owned(),
        ));

        let rtp_sender = self
            .peer_connection
            .add_track(local.clone() as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .with_context(|| format!("Failed to attach {:?} track {}", track.kind(), track.id()))?;

        // RTCP нужно вычитывать, иначе интерцепторы не получают отчеты
        tokio::spawn(async move {
            let mut rtcp_buf = vec![0u8; 1500];
            while rtp_sender.read(&mut rtcp_buf).await.is_ok() {}
        });

        spawn_sample_pump(track, local, self.closed.subscribe());
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_local_description(to_rtc_description(desc)?)
            .await?;
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_remote_description(to_rtc_description(desc)?)
            .await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.send_replace(true);
        self.peer_connection.close().await?;
        Ok(())
    }
}

fn to_rtc_description(desc: SessionDescription) -> Result<RTCSessionDescription> {
    let rtc = match desc.sdp_type {
        SdpType::Offer => RTCSessionDescription::offer(desc.sdp)?,
        SdpType::Answer => RTCSessionDescription::answer(desc.sdp)?,
        SdpType::Pranswer => RTCSessionDescription::pranswer(desc.sdp)?,
        SdpType::Rollback => bail!("SDP rollback is not supported"),
    };
    Ok(rtc)
}

fn map_state(state: RTCPeerConnectionState) -> ConnectionState {
    match state {
        RTCPeerConnectionState::Connecting => ConnectionState::Connecting,
        RTCPeerConnectionState::Connected => ConnectionState::Connected,
        RTCPeerConnectionState::Disconnected => ConnectionState::Disconnected,
        RTCPeerConnectionState::Failed => ConnectionState::Failed,
        RTCPeerConnectionState::Closed => ConnectionState::Closed,
        _ => ConnectionState::New,
    }
}
