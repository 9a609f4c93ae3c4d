//! # PVR Stream Bridge
//!
//! Adapts a backend [`PvrStreamSession`] to the player's input stream and
//! demuxer contracts.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │           Player demux thread            │
//! └────────────┬─────────────────────────────┘
//!              │ open / read / seek / read_demux
//!              ▼
//! ┌──────────────────────────────────────────┐
//! │              StreamBridge                │
//! │                                          │
//! │  Gateway: lifecycle, EOF, return codes   │
//! │  Synchronizer: properties → StreamMap    │
//! └────────────┬─────────────────────────────┘
//!              │ PvrStreamSession
//!              ▼
//! ┌──────────────────────────────────────────┐
//! │          PVR backend provider            │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Contract
//!
//! No operation returns an error. Without an open session every query falls
//! back to a fixed default (`false`, `-1`, `None`) and every command is a
//! no-op.
//!
//! The bridge is not internally synchronized; drive it from one thread.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core_pvr::{BridgeConfig, PvrClient, StreamBridge, StreamSource};
//! use bridge_traits::MemorySettingsStore;
//! use std::sync::Arc;
//!
//! fn play(client: Arc<dyn PvrClient>) -> core_pvr::Result<()> {
//!     let mut bridge = StreamBridge::new(
//!         StreamSource::Channel { uid: 1, is_radio: false },
//!         Some(client),
//!         Arc::new(MemorySettingsStore::new()),
//!         BridgeConfig::default(),
//!     )?;
//!
//!     if bridge.open() && bridge.open_demux() {
//!         while let Some(packet) = bridge.read_demux() {
//!             if let Some(stream) = bridge.get_stream(packet.stream_id) {
//!                 println!("{:?}: {} bytes", stream.read().stream_type(), packet.data.len());
//!             }
//!         }
//!     }
//!     bridge.close();
//!     Ok(())
//! }
//! ```

use crate::config::BridgeConfig;
use crate::demux_stream::SharedStream;
use crate::error::Result;
use crate::stream_map::StreamMap;
use crate::traits::{
    DemuxPacket, NextStream, PvrClient, PvrStreamSession, SeekWhence, StreamProperties,
    StreamSource, StreamTimes, READ_ERROR, STREAM_ID_STREAM_CHANGE, STREAM_ID_STREAM_INFO,
};
use bridge_traits::settings::SettingsStore;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Input stream / demuxer adapter over a PVR backend session.
pub struct StreamBridge {
    source: StreamSource,
    client: Option<Arc<dyn PvrClient>>,
    session: Option<Box<dyn PvrStreamSession>>,
    settings: Arc<dyn SettingsStore>,
    config: BridgeConfig,
    properties: StreamProperties,
    streams: StreamMap,
    is_open: bool,
    eof: bool,
}

impl StreamBridge {
    /// Create a bridge for `source`.
    ///
    /// A missing `client` is tolerated: the bridge logs it and every
    /// operation takes its unavailable-backend default.
    ///
    /// # Errors
    ///
    /// Returns [`PvrError::InvalidConfig`](crate::error::PvrError::InvalidConfig)
    /// if `config` fails validation.
    pub fn new(
        source: StreamSource,
        client: Option<Arc<dyn PvrClient>>,
        settings: Arc<dyn SettingsStore>,
        config: BridgeConfig,
    ) -> Result<Self> {
        config.validate()?;

        if client.is_none() {
            error!(source = ?source, "Unable to obtain PVR client for stream source");
        }

        Ok(Self {
            source,
            client,
            session: None,
            settings,
            config,
            properties: StreamProperties::default(),
            streams: StreamMap::new(),
            is_open: false,
            eof: true,
        })
    }

    /// The source this bridge plays.
    pub fn source(&self) -> &StreamSource {
        &self.source
    }

    /// Returns `true` for live channels.
    pub fn is_live(&self) -> bool {
        self.source.is_live()
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }

    // ========================================================================
    // Gateway
    // ========================================================================

    /// Open the backend session.
    ///
    /// Returns `false` if already open, if no client is available, or if the
    /// backend refuses the stream.
    pub fn open(&mut self) -> bool {
        if self.is_open {
            return false;
        }

        let Some(client) = self.client.as_ref() else {
            return false;
        };

        match client.open_stream(&self.source) {
            Ok(session) => {
                self.session = Some(session);
                self.is_open = true;
                self.eof = false;
                self.properties.reset_count();
                debug!(source = ?self.source, "Opened PVR stream");
                true
            }
            Err(e) => {
                warn!(source = ?self.source, error = %e, "Failed to open PVR stream");
                false
            }
        }
    }

    /// Close the backend session. Safe to call repeatedly.
    ///
    /// The stream map and properties snapshot are discarded with the session.
    pub fn close(&mut self) {
        if !self.is_open {
            return;
        }

        if let Some(mut session) = self.session.take() {
            session.close();
        }
        self.streams.clear();
        self.properties = StreamProperties::default();
        self.eof = true;
        self.is_open = false;
        debug!(source = ?self.source, "Closed PVR stream");
    }

    /// Read into `buf`.
    ///
    /// Returns the byte count, `0` at end of stream (which also sets EOF), or
    /// [`READ_ERROR`]. Partial reads are not resumed; a zero return is always
    /// taken as the end.
    pub fn read(&mut self, buf: &mut [u8]) -> i32 {
        let Some(session) = self.session.as_mut() else {
            return READ_ERROR;
        };

        let ret = session.read(buf);
        if ret == 0 {
            self.eof = true;
            ret
        } else if ret < READ_ERROR {
            READ_ERROR
        } else {
            ret
        }
    }

    /// Seek the byte stream.
    ///
    /// [`SeekWhence::Possible`] only reports `1` if seeking is supported and
    /// `0` otherwise. A real seek that returns a non-negative position clears
    /// EOF.
    pub fn seek(&mut self, offset: i64, whence: SeekWhence) -> i64 {
        if whence == SeekWhence::Possible {
            return i64::from(self.can_seek());
        }

        let Some(session) = self.session.as_mut() else {
            return -1;
        };

        let ret = session.seek(offset, whence);
        if ret >= 0 {
            self.eof = false;
        }
        debug!(offset, ?whence, result = ret, "Seek");
        ret
    }

    /// Total length in bytes, or `-1` if unavailable.
    pub fn get_length(&self) -> i64 {
        self.session.as_ref().map_or(-1, |s| s.length())
    }

    /// Preferred read size, or `-1` for "no preference".
    pub fn get_block_size(&self) -> i32 {
        self.session
            .as_ref()
            .and_then(|s| s.read_chunk_size())
            .unwrap_or(-1)
    }

    pub fn get_times(&self) -> Option<StreamTimes> {
        self.session.as_ref().and_then(|s| s.times())
    }

    pub fn next_stream(&mut self) -> NextStream {
        self.session
            .as_mut()
            .map_or(NextStream::None, |s| s.next_stream())
    }

    pub fn can_pause(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.can_pause())
    }

    pub fn can_seek(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.can_seek())
    }

    pub fn pause(&mut self, paused: bool) {
        if let Some(session) = self.session.as_mut() {
            session.pause(paused);
        }
    }

    pub fn is_realtime(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_realtime())
    }

    /// Set playback speed (1000 = normal).
    pub fn set_speed(&mut self, speed: i32) {
        if let Some(session) = self.session.as_mut() {
            session.set_speed(speed);
        }
    }

    pub fn fill_buffer(&mut self, mode: bool) {
        if let Some(session) = self.session.as_mut() {
            session.fill_buffer(mode);
        }
    }

    // ========================================================================
    // Demux / Stream Map Synchronizer
    // ========================================================================

    /// Query the stream layout and build the initial stream map.
    ///
    /// Returns `false` if there is no backend session.
    pub fn open_demux(&mut self) -> bool {
        if self.session.is_none() {
            return false;
        }

        self.refresh_properties();
        self.rebuild_stream_map();
        true
    }

    /// Pull the next packet from the backend demuxer.
    ///
    /// Sentinel packets are returned as-is after their side effect: a stream
    /// info packet refreshes the properties snapshot, a stream change packet
    /// refreshes it and rebuilds the stream map.
    pub fn read_demux(&mut self) -> Option<DemuxPacket> {
        let packet = self.session.as_mut()?.demux_read()?;
        if !packet.is_sentinel() {
            return Some(packet);
        }

        match packet.stream_id {
            STREAM_ID_STREAM_INFO => {
                debug!("Backend signalled stream info update");
                self.refresh_properties();
            }
            STREAM_ID_STREAM_CHANGE => {
                let previous = self.streams.len();
                self.refresh_properties();
                self.rebuild_stream_map();
                info!(
                    previous,
                    current = self.streams.len(),
                    "Backend signalled stream layout change"
                );
            }
            _ => {}
        }

        Some(packet)
    }

    /// Look up a stream descriptor by id.
    pub fn get_stream(&self, id: i32) -> Option<&SharedStream> {
        self.streams.get(id)
    }

    /// All stream descriptors, in no particular order.
    ///
    /// The view borrows the bridge, so it cannot outlive the next rebuild.
    /// Clone individual handles to keep them longer.
    pub fn get_streams(&self) -> impl Iterator<Item = &SharedStream> {
        self.streams.iter()
    }

    /// Number of streams last reported by the backend.
    ///
    /// This is the snapshot's count, which may differ from the number of
    /// entries in the stream map.
    pub fn get_stream_count(&self) -> usize {
        self.properties.stream_count()
    }

    /// The properties snapshot last reported by the backend.
    pub fn stream_properties(&self) -> &StreamProperties {
        &self.properties
    }

    pub fn abort_demux(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.demux_abort();
        }
    }

    pub fn flush_demux(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.demux_flush();
        }
    }

    /// Seek the demuxer to `time_ms`.
    ///
    /// Returns the resulting start pts, or `None` if there is no session or
    /// the backend reported any error.
    pub fn seek_time(&mut self, time_ms: f64, backwards: bool) -> Option<f64> {
        let session = self.session.as_mut()?;
        match session.seek_time(time_ms, backwards) {
            Ok(start_pts) => Some(start_pts),
            Err(e) => {
                debug!(time_ms, backwards, error = %e, "Demux time seek failed");
                None
            }
        }
    }

    fn refresh_properties(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match session.stream_properties() {
            Ok(properties) => {
                debug!(
                    streams = properties.stream_count(),
                    "Refreshed stream properties"
                );
                self.properties = properties;
            }
            Err(e) => {
                warn!(error = %e, "Failed to query stream properties, keeping previous snapshot");
            }
        }
    }

    fn rebuild_stream_map(&mut self) {
        let rds_enabled = self.rds_enabled();
        self.streams.rebuild(&self.properties, rds_enabled);
    }

    fn rds_enabled(&self) -> bool {
        match self.settings.get_bool(&self.config.rds_setting_key) {
            Ok(Some(enabled)) => enabled,
            Ok(None) => self.config.enable_radio_rds,
            Err(e) => {
                warn!(
                    key = %self.config.rds_setting_key,
                    error = %e,
                    "Failed to read RDS setting, using configured default"
                );
                self.config.enable_radio_rds
            }
        }
    }
}

impl Drop for StreamBridge {
    fn drop(&mut self) {
        self.close();
        self.streams.clear();
    }
}
