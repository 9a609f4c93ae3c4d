//! Scenario tests for the PVR stream bridge
//!
//! This suite drives `StreamBridge` against a scripted in-memory backend and
//! verifies:
//! - Stream map contents and descriptor identity across layout changes
//! - RDS handling driven by host settings
//! - EOF and lifecycle behaviour of the byte-stream gateway

use bridge_traits::error::{BridgeError, Result};
use bridge_traits::{MemorySettingsStore, SettingsStore};
use bytes::Bytes;
use core_pvr::{
    BridgeConfig, CodecId, CodecType, DemuxPacket, NextStream, PvrClient, PvrError,
    PvrStreamSession, SeekWhence, StreamBridge, StreamProperties, StreamProperty, StreamSource,
    StreamTimes, StreamType, ENABLE_RADIO_RDS, STREAM_ID_STREAM_CHANGE,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// ============================================================================
// Scripted Backend
// ============================================================================

#[derive(Default)]
struct BackendState {
    properties: StreamProperties,
    packets: VecDeque<DemuxPacket>,
    reads: VecDeque<Vec<u8>>,
    opens: usize,
    closes: usize,
    property_queries: usize,
}

#[derive(Clone, Default)]
struct ScriptedBackend {
    state: Arc<Mutex<BackendState>>,
}

impl ScriptedBackend {
    fn new() -> Self {
        Self::default()
    }

    fn set_streams(&self, streams: Vec<StreamProperty>) {
        self.state.lock().unwrap().properties = StreamProperties::new(streams).unwrap();
    }

    fn push_packet(&self, packet: DemuxPacket) {
        self.state.lock().unwrap().packets.push_back(packet);
    }

    fn push_read(&self, data: &[u8]) {
        self.state.lock().unwrap().reads.push_back(data.to_vec());
    }

    fn opens(&self) -> usize {
        self.state.lock().unwrap().opens
    }

    fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }

    fn property_queries(&self) -> usize {
        self.state.lock().unwrap().property_queries
    }
}

struct ScriptedSession {
    state: Arc<Mutex<BackendState>>,
}

impl PvrStreamSession for ScriptedSession {
    fn read(&mut self, buf: &mut [u8]) -> i32 {
        match self.state.lock().unwrap().reads.pop_front() {
            Some(chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                n as i32
            }
            None => 0,
        }
    }

    fn seek(&mut self, offset: i64, _whence: SeekWhence) -> i64 {
        offset
    }

    fn length(&self) -> i64 {
        -1
    }

    fn read_chunk_size(&self) -> Option<i32> {
        None
    }

    fn can_pause(&self) -> bool {
        true
    }

    fn can_seek(&self) -> bool {
        true
    }

    fn pause(&mut self, _paused: bool) {}

    fn is_realtime(&self) -> bool {
        true
    }

    fn times(&self) -> Option<StreamTimes> {
        None
    }

    fn set_speed(&mut self, _speed: i32) {}

    fn fill_buffer(&mut self, _mode: bool) {}

    fn next_stream(&mut self) -> NextStream {
        NextStream::None
    }

    fn stream_properties(&mut self) -> Result<StreamProperties> {
        let mut state = self.state.lock().unwrap();
        state.property_queries += 1;
        Ok(state.properties.clone())
    }

    fn demux_read(&mut self) -> Option<DemuxPacket> {
        self.state.lock().unwrap().packets.pop_front()
    }

    fn demux_abort(&mut self) {}

    fn demux_flush(&mut self) {
        self.state.lock().unwrap().packets.clear();
    }

    fn seek_time(&mut self, _time_ms: f64, _backwards: bool) -> Result<f64> {
        Err(BridgeError::NotAvailable("time seek".into()))
    }

    fn close(&mut self) {
        self.state.lock().unwrap().closes += 1;
    }
}

impl PvrClient for ScriptedBackend {
    fn open_stream(&self, _source: &StreamSource) -> Result<Box<dyn PvrStreamSession>> {
        self.state.lock().unwrap().opens += 1;
        Ok(Box::new(ScriptedSession {
            state: Arc::clone(&self.state),
        }))
    }
}

fn bridge_for(backend: &ScriptedBackend, settings: Arc<dyn SettingsStore>) -> StreamBridge {
    StreamBridge::new(
        StreamSource::Channel {
            uid: 42,
            is_radio: false,
        },
        Some(Arc::new(backend.clone())),
        settings,
        BridgeConfig::default(),
    )
    .unwrap()
}

// ============================================================================
// Stream Map Scenarios
// ============================================================================

#[test]
fn test_layout_change_scenario() {
    let backend = ScriptedBackend::new();
    backend.set_streams(vec![
        StreamProperty::audio(100, CodecId::MP2, 2, 48000),
        StreamProperty::video(200, CodecId::H264, 1920, 1080),
    ]);

    let mut bridge = bridge_for(&backend, Arc::new(MemorySettingsStore::new()));
    assert!(bridge.open());
    assert!(bridge.open_demux());

    assert_eq!(bridge.get_stream_count(), 2);
    let audio = Arc::clone(bridge.get_stream(100).unwrap());
    {
        let audio = audio.read();
        assert_eq!(audio.stream_type(), StreamType::Audio);
        assert_eq!(audio.audio().unwrap().channels, 2);
    }
    {
        let video = bridge.get_stream(200).unwrap().read();
        assert_eq!(video.stream_type(), StreamType::Video);
        assert_eq!(video.video().unwrap().width, 1920);
    }

    backend.set_streams(vec![
        StreamProperty::audio(100, CodecId::MP2, 2, 48000),
        StreamProperty::subtitle(300, CodecId::DVB_SUBTITLE, 0),
    ]);
    backend.push_packet(DemuxPacket::marker(STREAM_ID_STREAM_CHANGE));

    let packet = bridge.read_demux().unwrap();
    assert_eq!(packet.stream_id, STREAM_ID_STREAM_CHANGE);

    assert!(bridge.get_stream(200).is_none());
    {
        let subtitle = bridge.get_stream(300).unwrap().read();
        assert_eq!(subtitle.stream_type(), StreamType::Subtitle);
        assert_eq!(subtitle.subtitle().unwrap().extra_data, None);
    }
    assert!(Arc::ptr_eq(&audio, bridge.get_stream(100).unwrap()));
    assert_eq!(bridge.get_streams().count(), 2);
}

#[test]
fn test_data_packets_have_no_side_effects() {
    let backend = ScriptedBackend::new();
    backend.set_streams(vec![StreamProperty::audio(100, CodecId::MP2, 2, 48000)]);

    let mut bridge = bridge_for(&backend, Arc::new(MemorySettingsStore::new()));
    assert!(bridge.open());
    assert!(bridge.open_demux());
    assert_eq!(backend.property_queries(), 1);

    let payload = Bytes::from_static(&[0xff, 0xfc, 0x00, 0x00]);
    backend.push_packet(
        DemuxPacket::new(100, payload.clone()).with_timestamps(Some(1000.0), Some(1000.0)),
    );

    let packet = bridge.read_demux().unwrap();
    assert_eq!(packet.stream_id, 100);
    assert_eq!(packet.data, payload);
    assert_eq!(packet.pts, Some(1000.0));
    assert_eq!(backend.property_queries(), 1);

    // Empty queue surfaces as no packet.
    assert!(bridge.read_demux().is_none());
}

#[test]
fn test_teletext_and_id3_streams() {
    let backend = ScriptedBackend::new();
    backend.set_streams(vec![
        StreamProperty::new(500, CodecType::Subtitle, CodecId::DVB_TELETEXT).with_language("eng"),
        StreamProperty::new(600, CodecType::Id3, CodecId::NONE),
        StreamProperty::new(700, CodecType::Data, CodecId::NONE),
    ]);

    let mut bridge = bridge_for(&backend, Arc::new(MemorySettingsStore::new()));
    assert!(bridge.open());
    assert!(bridge.open_demux());

    let teletext = bridge.get_stream(500).unwrap().read();
    assert_eq!(teletext.stream_type(), StreamType::Teletext);
    assert_eq!(teletext.language, "eng");
    assert_eq!(teletext.codec, CodecId::DVB_TELETEXT);
    assert_eq!(
        bridge.get_stream(600).unwrap().read().stream_type(),
        StreamType::AudioId3
    );
    assert_eq!(
        bridge.get_stream(700).unwrap().read().stream_type(),
        StreamType::Generic
    );
}

#[test]
fn test_rds_follows_settings() {
    let backend = ScriptedBackend::new();
    backend.set_streams(vec![StreamProperty::new(800, CodecType::Rds, CodecId::NONE)]);

    let settings = Arc::new(MemorySettingsStore::new());
    let mut bridge = bridge_for(&backend, settings.clone());
    assert!(bridge.open());
    assert!(bridge.open_demux());
    assert_eq!(
        bridge.get_stream(800).unwrap().read().stream_type(),
        StreamType::Generic
    );

    settings.set_bool(ENABLE_RADIO_RDS, true).unwrap();
    backend.push_packet(DemuxPacket::marker(STREAM_ID_STREAM_CHANGE));
    bridge.read_demux();
    assert_eq!(
        bridge.get_stream(800).unwrap().read().stream_type(),
        StreamType::RadioRds
    );
}

#[test]
fn test_rds_config_fallback() {
    let backend = ScriptedBackend::new();
    backend.set_streams(vec![StreamProperty::new(800, CodecType::Rds, CodecId::NONE)]);

    let config = BridgeConfig {
        enable_radio_rds: true,
        ..Default::default()
    };
    let mut bridge = StreamBridge::new(
        StreamSource::Channel {
            uid: 3,
            is_radio: true,
        },
        Some(Arc::new(backend.clone())),
        Arc::new(MemorySettingsStore::new()),
        config,
    )
    .unwrap();
    assert!(bridge.open());
    assert!(bridge.open_demux());
    assert_eq!(
        bridge.get_stream(800).unwrap().read().stream_type(),
        StreamType::RadioRds
    );
}

#[test]
fn test_reopen_resets_stream_count() {
    let backend = ScriptedBackend::new();
    backend.set_streams(vec![StreamProperty::audio(100, CodecId::MP2, 2, 48000)]);

    let mut bridge = bridge_for(&backend, Arc::new(MemorySettingsStore::new()));
    assert!(bridge.open());
    assert!(bridge.open_demux());
    assert_eq!(bridge.get_stream_count(), 1);

    bridge.close();
    assert!(bridge.open());
    assert_eq!(bridge.get_stream_count(), 0);
    assert_eq!(backend.opens(), 2);
}

// ============================================================================
// Gateway Scenarios
// ============================================================================

#[test]
fn test_read_until_eof() {
    let backend = ScriptedBackend::new();
    backend.push_read(&[0x47; 188]);
    backend.push_read(&[0x47; 100]);

    let mut bridge = bridge_for(&backend, Arc::new(MemorySettingsStore::new()));
    assert!(bridge.is_eof());
    assert!(bridge.open());
    assert!(!bridge.is_eof());

    let mut buf = [0u8; 188];
    assert_eq!(bridge.read(&mut buf), 188);
    assert!(!bridge.is_eof());
    assert_eq!(bridge.read(&mut buf), 100);
    assert!(!bridge.is_eof());
    assert_eq!(bridge.read(&mut buf), 0);
    assert!(bridge.is_eof());

    assert_eq!(bridge.seek(0, SeekWhence::Set), 0);
    assert!(!bridge.is_eof());
}

#[test]
fn test_block_size_without_preference() {
    let backend = ScriptedBackend::new();
    let mut bridge = bridge_for(&backend, Arc::new(MemorySettingsStore::new()));
    assert_eq!(bridge.get_block_size(), -1);

    assert!(bridge.open());
    assert_eq!(bridge.get_block_size(), -1);
}

#[test]
fn test_session_closed_exactly_once() {
    let backend = ScriptedBackend::new();
    {
        let mut bridge = bridge_for(&backend, Arc::new(MemorySettingsStore::new()));
        bridge.close();
        assert_eq!(backend.closes(), 0);

        assert!(bridge.open());
        bridge.close();
        bridge.close();
        assert_eq!(backend.closes(), 1);

        assert!(bridge.open());
    }
    // Dropping an open bridge releases its session.
    assert_eq!(backend.closes(), 2);
}

#[test]
fn test_queries_after_close_use_defaults() {
    let backend = ScriptedBackend::new();
    backend.set_streams(vec![StreamProperty::audio(100, CodecId::MP2, 2, 48000)]);

    let mut bridge = bridge_for(&backend, Arc::new(MemorySettingsStore::new()));
    assert!(bridge.open());
    assert!(bridge.can_seek());
    bridge.close();

    let mut buf = [0u8; 8];
    assert!(!bridge.can_seek());
    assert!(!bridge.can_pause());
    assert_eq!(bridge.read(&mut buf), -1);
    assert_eq!(bridge.seek(0, SeekWhence::Possible), 0);
    assert!(!bridge.open_demux());
    assert!(bridge.read_demux().is_none());
}

#[test]
fn test_close_discards_stream_map() {
    let backend = ScriptedBackend::new();
    backend.set_streams(vec![StreamProperty::audio(100, CodecId::MP2, 2, 48000)]);

    let mut bridge = bridge_for(&backend, Arc::new(MemorySettingsStore::new()));
    assert!(bridge.open());
    assert!(bridge.open_demux());
    assert_eq!(bridge.get_stream_count(), 1);
    assert!(bridge.get_stream(100).is_some());

    bridge.close();

    assert!(bridge.get_stream(100).is_none());
    assert_eq!(bridge.get_streams().count(), 0);
    assert_eq!(bridge.get_stream_count(), 0);
}

#[test]
fn test_empty_settings_key_is_rejected() {
    let backend = ScriptedBackend::new();
    let config = BridgeConfig {
        rds_setting_key: String::new(),
        ..Default::default()
    };

    let result = StreamBridge::new(
        StreamSource::Channel {
            uid: 1,
            is_radio: false,
        },
        Some(Arc::new(backend)),
        Arc::new(MemorySettingsStore::new()),
        config,
    );

    assert!(matches!(result, Err(PvrError::InvalidConfig(_))));
}

#[test]
fn test_recording_source() {
    let backend = ScriptedBackend::new();
    let bridge = StreamBridge::new(
        StreamSource::Recording {
            id: "rec-2024-01".into(),
        },
        Some(Arc::new(backend)),
        Arc::new(MemorySettingsStore::new()),
        BridgeConfig::default(),
    )
    .unwrap();

    assert!(!bridge.is_live());
    assert_eq!(
        bridge.source(),
        &StreamSource::Recording {
            id: "rec-2024-01".into()
        }
    );
}
