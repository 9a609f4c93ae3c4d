//! # Stream Map
//!
//! Keyed collection of [`SharedStream`] descriptors mirroring the backend's
//! current elementary stream layout.
//!
//! ## Rebuild
//!
//! [`StreamMap::rebuild`] walks a [`StreamProperties`] snapshot and builds a
//! brand new map, then replaces the old one in a single assignment. For each
//! entry:
//!
//! 1. The target [`StreamType`] is resolved from the entry's category and
//!    codec (see [`target_type`]).
//! 2. If the current map holds a descriptor under the same PID with that
//!    type, the descriptor is reused and updated in place; otherwise a fresh
//!    one is allocated. A descriptor whose lock a consumer is holding is
//!    never waited on: it is left as is and replaced by a fresh one.
//! 3. Type-specific fields, then codec, unique id and language are written.
//!
//! Consumers holding a descriptor whose type did not change therefore keep
//! observing the live descriptor after a refresh.

use crate::demux_stream::{
    subtitle_extra_data, AudioDetails, DemuxStream, SharedStream, StreamDetails, StreamType,
    VideoDetails,
};
use crate::traits::{CodecId, CodecType, StreamProperties, StreamProperty};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Resolve the descriptor type for a backend entry.
///
/// Order matters: audio and video win on category, then the DVB teletext
/// codec wins over any category, and RDS only gets its own type when
/// `rds_enabled` is set.
pub fn target_type(property: &StreamProperty, rds_enabled: bool) -> StreamType {
    match property.codec_type {
        CodecType::Audio => StreamType::Audio,
        CodecType::Video => StreamType::Video,
        _ if property.codec_id == CodecId::DVB_TELETEXT => StreamType::Teletext,
        CodecType::Subtitle => StreamType::Subtitle,
        CodecType::Rds if rds_enabled => StreamType::RadioRds,
        CodecType::Id3 => StreamType::AudioId3,
        _ => StreamType::Generic,
    }
}

/// Stream id to descriptor mapping.
#[derive(Debug, Default)]
pub struct StreamMap {
    streams: HashMap<i32, SharedStream>,
}

impl StreamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a descriptor by stream id.
    pub fn get(&self, id: i32) -> Option<&SharedStream> {
        self.streams.get(&id)
    }

    /// Iterate all descriptors in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &SharedStream> {
        self.streams.values()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn clear(&mut self) {
        self.streams.clear();
    }

    /// Rebuild the map from a properties snapshot.
    pub fn rebuild(&mut self, properties: &StreamProperties, rds_enabled: bool) {
        let mut rebuilt = HashMap::with_capacity(properties.stream_count());

        for property in properties.iter() {
            let stream_type = target_type(property, rds_enabled);
            let mut stream = self.reuse_or_create(property.pid, stream_type);

            if !update_descriptor(&stream, property) {
                debug!(
                    pid = property.pid,
                    "Stream descriptor is locked by a consumer, replacing it"
                );
                stream = DemuxStream::new(stream_type).into_shared();
                update_descriptor(&stream, property);
            }

            rebuilt.insert(property.pid, stream);
        }

        self.streams = rebuilt;
    }

    fn reuse_or_create(&self, pid: i32, stream_type: StreamType) -> SharedStream {
        self.streams
            .get(&pid)
            .filter(|existing| {
                existing
                    .try_read()
                    .is_some_and(|d| d.stream_type() == stream_type)
            })
            .map(Arc::clone)
            .unwrap_or_else(|| DemuxStream::new(stream_type).into_shared())
    }
}

/// Write `property` into `stream` without blocking.
///
/// Returns `false` if the descriptor is currently locked.
fn update_descriptor(stream: &SharedStream, property: &StreamProperty) -> bool {
    let Some(mut descriptor) = stream.try_write() else {
        return false;
    };

    apply_details(&mut descriptor.details, property);
    descriptor.codec = property.codec_id;
    descriptor.unique_id = property.pid;
    descriptor.language = property.language.clone();
    true
}

fn apply_details(details: &mut StreamDetails, property: &StreamProperty) {
    match details {
        StreamDetails::Audio(audio) => {
            *audio = AudioDetails {
                channels: property.channels,
                sample_rate: property.sample_rate,
                block_align: property.block_align,
                bit_rate: property.bit_rate,
                bits_per_sample: property.bits_per_sample,
            };
        }
        StreamDetails::Video(video) => {
            *video = VideoDetails {
                fps_scale: property.fps_scale,
                fps_rate: property.fps_rate,
                width: property.width,
                height: property.height,
                aspect: f64::from(property.aspect),
            };
        }
        StreamDetails::Subtitle(subtitle) => {
            // A zero word leaves previously decoded extra data in place.
            if property.subtitle_info != 0 {
                let extra = subtitle_extra_data(property.subtitle_info);
                subtitle.extra_data = Some(Bytes::copy_from_slice(&extra));
            }
        }
        StreamDetails::Generic
        | StreamDetails::Teletext
        | StreamDetails::RadioRds
        | StreamDetails::AudioId3 => {}
    }
}
