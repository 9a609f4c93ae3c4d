//! # PVR Backend Traits
//!
//! This module defines the contract between the stream bridge and a PVR
//! backend (the live TV / recording provider). The bridge never talks to a
//! tuner or a recording server directly; it drives a [`PvrStreamSession`]
//! handed out by a [`PvrClient`].
//!
//! ## Architecture
//!
//! - **Client ([`PvrClient`])**: long-lived provider instance. Its only job
//!   here is to open a session for a channel or recording.
//! - **Session ([`PvrStreamSession`])**: the backend stream handle. Owned
//!   exclusively by one bridge from `open()` to `close()`. Exposes both the
//!   raw byte-stream interface and the demux interface.
//!
//! ## Threading Model
//!
//! All session calls are synchronous and may block on network or tuner I/O.
//! The bridge expects to be driven from a single demux thread; sessions only
//! need to be `Send` so they can be handed to that thread.
//!
//! ## Return Codes
//!
//! The byte-stream half of the session deliberately keeps the provider's
//! integer conventions (`read` byte counts, `seek` offsets) because the
//! player's input stream contract is expressed in those terms. The bridge
//! normalizes them; see [`StreamBridge`](crate::bridge::StreamBridge).

use crate::error::{PvrError, Result};
use bridge_traits::platform::{PlatformSend, PlatformSendSync};
use bytes::Bytes;

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of elementary streams a backend may report in one snapshot.
pub const MAX_STREAMS: usize = 20;

/// Packet stream id meaning "stream metadata was refreshed, layout unchanged".
pub const STREAM_ID_STREAM_INFO: i32 = -10;

/// Packet stream id meaning "the elementary stream layout changed".
pub const STREAM_ID_STREAM_CHANGE: i32 = -11;

/// Generic read failure. Every backend read code below this collapses to it.
pub const READ_ERROR: i32 = -1;

// ============================================================================
// Stream Source
// ============================================================================

/// What a bridge is playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSource {
    /// A live (possibly timeshifted) channel.
    Channel {
        /// Backend-unique channel id
        uid: i32,
        /// Whether this is a radio channel
        is_radio: bool,
    },
    /// A finished or in-progress recording.
    Recording {
        /// Backend recording id
        id: String,
    },
}

impl StreamSource {
    /// Returns `true` for live channels.
    pub fn is_live(&self) -> bool {
        matches!(self, StreamSource::Channel { .. })
    }
}

// ============================================================================
// Stream Properties
// ============================================================================

/// Codec category reported by the backend for an elementary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CodecType {
    #[default]
    Unknown,
    Video,
    Audio,
    Data,
    Subtitle,
    /// Radio data service
    Rds,
    /// Timed ID3 metadata
    Id3,
}

impl CodecType {
    /// Map a raw provider value onto a category.
    ///
    /// Unrecognized values become [`CodecType::Unknown`].
    pub fn from_raw(value: i32) -> Self {
        match value {
            0 => CodecType::Video,
            1 => CodecType::Audio,
            2 => CodecType::Data,
            3 => CodecType::Subtitle,
            4 => CodecType::Rds,
            5 => CodecType::Id3,
            _ => CodecType::Unknown,
        }
    }
}

/// Decoder codec identifier, as understood by the downstream decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CodecId(pub u32);

impl CodecId {
    pub const NONE: CodecId = CodecId(0);
    pub const MPEG2VIDEO: CodecId = CodecId(2);
    pub const H264: CodecId = CodecId(27);
    pub const MP2: CodecId = CodecId(0x15000);
    pub const AC3: CodecId = CodecId(0x15003);
    pub const DVB_SUBTITLE: CodecId = CodecId(0x17001);
    pub const DVB_TELETEXT: CodecId = CodecId(0x17007);
}

/// One backend-reported elementary stream.
///
/// Category-specific fields are meaningful only for their category and are
/// left at zero otherwise.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamProperty {
    /// Elementary stream id (PID)
    pub pid: i32,
    pub codec_type: CodecType,
    pub codec_id: CodecId,
    /// ISO 639-2 language code, empty if unknown
    pub language: String,
    /// Packed subtitle descriptor word (composition/ancillary page ids)
    pub subtitle_info: u32,
    pub fps_scale: i32,
    pub fps_rate: i32,
    pub height: i32,
    pub width: i32,
    pub aspect: f32,
    pub channels: i32,
    pub sample_rate: i32,
    pub block_align: i32,
    pub bit_rate: i32,
    pub bits_per_sample: i32,
}

impl StreamProperty {
    /// Create a stream entry with only identity fields set.
    pub fn new(pid: i32, codec_type: CodecType, codec_id: CodecId) -> Self {
        Self {
            pid,
            codec_type,
            codec_id,
            ..Default::default()
        }
    }

    /// Create an audio stream entry.
    pub fn audio(pid: i32, codec_id: CodecId, channels: i32, sample_rate: i32) -> Self {
        Self {
            channels,
            sample_rate,
            ..Self::new(pid, CodecType::Audio, codec_id)
        }
    }

    /// Create a video stream entry.
    pub fn video(pid: i32, codec_id: CodecId, width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            ..Self::new(pid, CodecType::Video, codec_id)
        }
    }

    /// Create a subtitle stream entry.
    pub fn subtitle(pid: i32, codec_id: CodecId, subtitle_info: u32) -> Self {
        Self {
            subtitle_info,
            ..Self::new(pid, CodecType::Subtitle, codec_id)
        }
    }

    /// Set the language code.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// Snapshot of the backend's elementary stream layout.
///
/// `stream_count` is tracked separately from the entry list: the bridge
/// resets it on open, and consumers read it as "streams last reported".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamProperties {
    streams: Vec<StreamProperty>,
    stream_count: usize,
}

impl StreamProperties {
    /// Build a snapshot from backend entries.
    ///
    /// # Errors
    ///
    /// Returns [`PvrError::TooManyStreams`] if more than [`MAX_STREAMS`]
    /// entries are supplied.
    pub fn new(streams: Vec<StreamProperty>) -> Result<Self> {
        if streams.len() > MAX_STREAMS {
            return Err(PvrError::TooManyStreams {
                count: streams.len(),
                max: MAX_STREAMS,
            });
        }

        let stream_count = streams.len();
        Ok(Self {
            streams,
            stream_count,
        })
    }

    /// Number of streams last reported by the backend.
    pub fn stream_count(&self) -> usize {
        self.stream_count
    }

    /// Forget the reported count without discarding entries.
    pub fn reset_count(&mut self) {
        self.stream_count = 0;
    }

    /// Iterate the reported entries, bounded by the reported count.
    pub fn iter(&self) -> impl Iterator<Item = &StreamProperty> {
        self.streams.iter().take(self.stream_count)
    }
}

// ============================================================================
// Byte Stream Types
// ============================================================================

/// Seek origin for byte-stream seeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekWhence {
    /// Absolute offset from the start
    Set,
    /// Relative to the current position
    Current,
    /// Relative to the end
    End,
    /// Do not seek; report whether seeking is possible
    Possible,
}

/// Outcome of asking the backend for a follow-up stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NextStream {
    /// Nothing further to play
    #[default]
    None,
    /// Try again later
    Retry,
    /// A new stream should be opened
    Open,
}

/// Time range currently covered by a (timeshifted) stream.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StreamTimes {
    /// Wall-clock time of the stream start, seconds since the Unix epoch
    pub start_time: i64,
    /// Presentation timestamp at `start_time`, in microseconds
    pub pts_start: f64,
    /// Earliest reachable presentation timestamp, in microseconds
    pub pts_begin: f64,
    /// Latest reachable presentation timestamp, in microseconds
    pub pts_end: f64,
}

// ============================================================================
// Demux Types
// ============================================================================

/// One multiplexed packet handed out by the backend demuxer.
#[derive(Debug, Clone, PartialEq)]
pub struct DemuxPacket {
    /// Elementary stream id, or one of the `STREAM_ID_*` sentinels
    pub stream_id: i32,
    pub data: Bytes,
    /// Presentation timestamp in microseconds, if known
    pub pts: Option<f64>,
    /// Decode timestamp in microseconds, if known
    pub dts: Option<f64>,
    /// Duration in microseconds, if known
    pub duration: Option<f64>,
}

impl DemuxPacket {
    /// Create a data packet for an elementary stream.
    pub fn new(stream_id: i32, data: Bytes) -> Self {
        Self {
            stream_id,
            data,
            pts: None,
            dts: None,
            duration: None,
        }
    }

    /// Create an empty packet carrying only a stream id, typically a sentinel.
    pub fn marker(stream_id: i32) -> Self {
        Self::new(stream_id, Bytes::new())
    }

    /// Set the presentation and decode timestamps.
    pub fn with_timestamps(mut self, pts: Option<f64>, dts: Option<f64>) -> Self {
        self.pts = pts;
        self.dts = dts;
        self
    }

    /// Returns `true` if this packet carries a layout sentinel instead of data.
    pub fn is_sentinel(&self) -> bool {
        matches!(
            self.stream_id,
            STREAM_ID_STREAM_INFO | STREAM_ID_STREAM_CHANGE
        )
    }
}

// ============================================================================
// Core Traits
// ============================================================================

/// An open backend stream (the stream handle).
///
/// Created by [`PvrClient::open_stream`] and closed exactly once via
/// [`PvrStreamSession::close`] before being dropped.
pub trait PvrStreamSession: PlatformSend {
    /// Blocking read into `buf`.
    ///
    /// Returns the number of bytes read, `0` at end of stream, or a negative
    /// provider error code.
    fn read(&mut self, buf: &mut [u8]) -> i32;

    /// Seek the byte stream.
    ///
    /// Never called with [`SeekWhence::Possible`]. Returns the new position or
    /// a negative provider error code.
    fn seek(&mut self, offset: i64, whence: SeekWhence) -> i64;

    /// Total stream length in bytes, or a negative value if unknown.
    fn length(&self) -> i64;

    /// Preferred read size in bytes, if the backend has one.
    fn read_chunk_size(&self) -> Option<i32>;

    fn can_pause(&self) -> bool;

    fn can_seek(&self) -> bool;

    fn pause(&mut self, paused: bool);

    /// Whether the stream is consumed in real time (live, not seekable ahead).
    fn is_realtime(&self) -> bool;

    /// Current timeshift range, if the backend reports one.
    fn times(&self) -> Option<StreamTimes>;

    /// Set the playback speed, in units of 1/1000 of normal speed.
    fn set_speed(&mut self, speed: i32);

    /// Enable or disable backend-side buffering.
    fn fill_buffer(&mut self, mode: bool);

    /// Ask whether a follow-up stream exists after the current one ends.
    fn next_stream(&mut self) -> NextStream;

    /// Report the current elementary stream layout.
    fn stream_properties(&mut self) -> bridge_traits::error::Result<StreamProperties>;

    /// Pull the next multiplexed packet. `None` means nothing is available.
    fn demux_read(&mut self) -> Option<DemuxPacket>;

    fn demux_abort(&mut self);

    fn demux_flush(&mut self);

    /// Seek the demuxer to `time_ms` and return the resulting start pts.
    fn seek_time(&mut self, time_ms: f64, backwards: bool) -> bridge_traits::error::Result<f64>;

    /// Release the backend connection.
    fn close(&mut self);
}

/// A PVR backend provider able to open stream sessions.
pub trait PvrClient: PlatformSendSync {
    /// Open a stream session for `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses or fails to open the stream.
    fn open_stream(
        &self,
        source: &StreamSource,
    ) -> bridge_traits::error::Result<Box<dyn PvrStreamSession>>;
}
