//! # Demux Stream Descriptors
//!
//! Typed per-stream descriptors handed to the downstream demuxing pipeline.
//!
//! Descriptors are shared: the pipeline may keep a [`SharedStream`] across
//! layout refreshes, so the stream map updates an existing descriptor in
//! place whenever its [`StreamType`] is unchanged and only allocates a new
//! one when the type changes.

use crate::traits::CodecId;
use bytes::Bytes;
use parking_lot::RwLock;
use std::sync::Arc;

/// Descriptor handle shared between the stream map and its consumers.
///
/// Consumers should not keep a guard across `read_demux`/`open_demux`. A
/// rebuild that finds a descriptor locked does not wait for it; it publishes
/// a fresh descriptor for that id, and the held one stops receiving updates.
pub type SharedStream = Arc<RwLock<DemuxStream>>;

/// Descriptor type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    Generic,
    Audio,
    Video,
    Subtitle,
    Teletext,
    RadioRds,
    AudioId3,
}

/// Audio-specific descriptor fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AudioDetails {
    pub channels: i32,
    pub sample_rate: i32,
    pub block_align: i32,
    pub bit_rate: i32,
    pub bits_per_sample: i32,
}

/// Video-specific descriptor fields.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VideoDetails {
    pub fps_scale: i32,
    pub fps_rate: i32,
    pub width: i32,
    pub height: i32,
    pub aspect: f64,
}

/// Subtitle-specific descriptor fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubtitleDetails {
    /// Codec extra data derived from the backend's packed subtitle word
    pub extra_data: Option<Bytes>,
}

/// Type-specific part of a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamDetails {
    Generic,
    Audio(AudioDetails),
    Video(VideoDetails),
    Subtitle(SubtitleDetails),
    Teletext,
    RadioRds,
    AudioId3,
}

impl StreamDetails {
    /// Empty details for a descriptor type.
    pub fn empty(stream_type: StreamType) -> Self {
        match stream_type {
            StreamType::Generic => StreamDetails::Generic,
            StreamType::Audio => StreamDetails::Audio(AudioDetails::default()),
            StreamType::Video => StreamDetails::Video(VideoDetails::default()),
            StreamType::Subtitle => StreamDetails::Subtitle(SubtitleDetails::default()),
            StreamType::Teletext => StreamDetails::Teletext,
            StreamType::RadioRds => StreamDetails::RadioRds,
            StreamType::AudioId3 => StreamDetails::AudioId3,
        }
    }

    pub fn stream_type(&self) -> StreamType {
        match self {
            StreamDetails::Generic => StreamType::Generic,
            StreamDetails::Audio(_) => StreamType::Audio,
            StreamDetails::Video(_) => StreamType::Video,
            StreamDetails::Subtitle(_) => StreamType::Subtitle,
            StreamDetails::Teletext => StreamType::Teletext,
            StreamDetails::RadioRds => StreamType::RadioRds,
            StreamDetails::AudioId3 => StreamType::AudioId3,
        }
    }
}

/// One elementary stream as seen by the demuxing pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct DemuxStream {
    /// Stable stream id (the PID)
    pub unique_id: i32,
    pub codec: CodecId,
    pub language: String,
    pub details: StreamDetails,
}

impl DemuxStream {
    /// Create an empty descriptor of the given type.
    pub fn new(stream_type: StreamType) -> Self {
        Self {
            unique_id: 0,
            codec: CodecId::NONE,
            language: String::new(),
            details: StreamDetails::empty(stream_type),
        }
    }

    /// Wrap into a shareable handle.
    pub fn into_shared(self) -> SharedStream {
        Arc::new(RwLock::new(self))
    }

    pub fn stream_type(&self) -> StreamType {
        self.details.stream_type()
    }

    pub fn audio(&self) -> Option<&AudioDetails> {
        match &self.details {
            StreamDetails::Audio(audio) => Some(audio),
            _ => None,
        }
    }

    pub fn video(&self) -> Option<&VideoDetails> {
        match &self.details {
            StreamDetails::Video(video) => Some(video),
            _ => None,
        }
    }

    pub fn subtitle(&self) -> Option<&SubtitleDetails> {
        match &self.details {
            StreamDetails::Subtitle(subtitle) => Some(subtitle),
            _ => None,
        }
    }
}

/// Unpack a backend subtitle word into decoder extra data.
///
/// The byte order is not a plain big- or little-endian dump: the low half
/// comes first (high byte, then low byte), followed by the high half in the
/// same order. DVB subtitle decoders expect exactly this layout.
pub fn subtitle_extra_data(subtitle_info: u32) -> [u8; 4] {
    [
        (subtitle_info >> 8) as u8,
        subtitle_info as u8,
        (subtitle_info >> 24) as u8,
        (subtitle_info >> 16) as u8,
    ]
}
