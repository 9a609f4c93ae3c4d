//! # PVR Stream Bridge
//!
//! Client-side adapter between a PVR backend (live TV and recordings) and a
//! player's demuxing pipeline.
//!
//! ## Overview
//!
//! This module handles:
//! - Opening, reading, seeking and closing a backend stream session with a
//!   stable EOF / return-code contract
//! - Mirroring the backend's elementary stream layout as typed demux stream
//!   descriptors that keep their identity across layout refreshes
//! - Reacting to in-band stream info / stream change packets

pub mod bridge;
pub mod config;
pub mod demux_stream;
pub mod error;
pub mod stream_map;
pub mod traits;

pub use bridge::StreamBridge;
pub use config::{BridgeConfig, ENABLE_RADIO_RDS};
pub use demux_stream::{
    subtitle_extra_data, AudioDetails, DemuxStream, SharedStream, StreamDetails, StreamType,
    SubtitleDetails, VideoDetails,
};
pub use error::{PvrError, Result};
pub use stream_map::StreamMap;
pub use traits::{
    CodecId, CodecType, DemuxPacket, NextStream, PvrClient, PvrStreamSession, SeekWhence,
    StreamProperties, StreamProperty, StreamSource, StreamTimes, MAX_STREAMS, READ_ERROR,
    STREAM_ID_STREAM_CHANGE, STREAM_ID_STREAM_INFO,
};
