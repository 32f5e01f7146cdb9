use crate::media::{LocalTrack, MediaKind};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;
use webrtc::media::Sample;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Opus-кадр тишины (TOC 0xf8, CELT 20 мс).
const OPUS_SILENCE: [u8; 3] = [0xf8, 0xff, 0xfe];

/// Ключевой VP8-кадр 16x16 с пустым содержимым.
const VP8_BLANK_KEYFRAME: [u8; 20] = [
    0x50, 0x01, 0x00, 0x9d, 0x01, 0x2a, 0x10, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00,
];

const AUDIO_FRAME: Duration = Duration::from_millis(20);
const VIDEO_FRAME: Duration = Duration::from_millis(33);
/// Выключенная камера шлет черный кадр раз в секунду, чтобы трек не пропал у пира.
const DISABLED_VIDEO_FRAME: Duration = Duration::from_secs(1);

pub(crate) fn frame_interval(kind: MediaKind, enabled: bool) -> Duration {
    match (kind, enabled) {
        (MediaKind::Audio, _) => AUDIO_FRAME,
        (MediaKind::Video, true) => VIDEO_FRAME,
        (MediaKind::Video, false) => DISABLED_VIDEO_FRAME,
    }
}

/// Синтетический источник не дает полезной нагрузки, поэтому включенный и
/// выключенный трек несут один и тот же кадр. Меняется только частота.
pub(crate) fn placeholder_frame(kind: MediaKind) -> Bytes {
    match kind {
        MediaKind::Audio => Bytes::from_static(&OPUS_SILENCE),
        MediaKind::Video => Bytes::from_static(&VP8_BLANK_KEYFRAME),
    }
}

/// Пишет кадры локального трека в `sink` до остановки трека или закрытия
/// соединения (`closed` становится `true` или отправитель уходит).
pub(crate) fn spawn_sample_pump(
    track: Arc<LocalTrack>,
    sink: Arc<TrackLocalStaticSample>,
    mut closed: watch::Receiver<bool>,
) {
    tokio::spawn(async move {
        let frame = placeholder_frame(track.kind());

        loop {
            let interval = frame_interval(track.kind(), track.is_enabled());
            let sample = Sample {
                data: frame.clone(),
                duration: interval,
                ..Default::default()
            };
            if let Err(e) = sink.write_sample(&sample).await {
                debug!("write_sample failed for {:?} track {}: {}", track.kind(), track.id(), e);
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = track.ended() => break,
                res = closed.changed() => {
                    if res.is_err() || *closed.borrow() {
                        break;
                    }
                }
            }
        }

        debug!("Sample pump for {:?} track {} stopped", track.kind(), track.id());
    });
}
