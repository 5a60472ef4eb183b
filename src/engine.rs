//! The interface the parsing session expects from a decoding engine.
//!
//! [`crate::backend`] implements these on top of ffmpeg. Anything else that
//! can demux, split and decode (a hardware decoder, a scripted test engine)
//! can be plugged into a session through the same traits.

use bytes::Bytes;
use num_rational::Rational32;

use crate::{
    error::Result,
    frame::{AuxMetrics, FrameType},
    sequence::SequenceInfo,
};

/// The video stream a container session decodes.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDescription {
    pub stream_index: usize,
    pub time_base: Rational32,
    /// Provisional sequence values taken from the container and codec
    /// parameters.
    pub info: SequenceInfo,
}

/// A compressed data unit pulled from a container or reassembled from a raw
/// stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedUnit {
    pub stream_index: usize,
    pub data: Bytes,
    /// Timestamps in the stream time base.
    pub pts: Option<i64>,
    pub dts: Option<i64>,
}

impl CompressedUnit {
    #[must_use]
    pub fn new(stream_index: usize, data: Bytes) -> Self {
        Self {
            stream_index,
            data,
            pts: None,
            dts: None,
        }
    }

    #[must_use]
    pub fn with_timestamps(mut self, pts: Option<i64>, dts: Option<i64>) -> Self {
        self.pts = pts;
        self.dts = dts;
        self
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Picture properties the engine reports alongside a decoded frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
    pub pix_fmt: String,
    pub bit_depth: u32,
}

/// What the session needs to know about one decoded frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedFrame {
    pub pts: Option<i64>,
    /// The engine's best guess when `pts` is unset.
    pub best_effort_timestamp: Option<i64>,
    pub dts: Option<i64>,
    pub picture_type: FrameType,
    pub key_frame: bool,
    /// Size of the compressed unit the frame was decoded from.
    pub size: usize,
    pub geometry: Option<FrameGeometry>,
    /// The decoder's auxiliary-metrics side channel for this frame.
    pub aux: Option<AuxMetrics>,
}

/// Reads compressed units out of a container, across all of its streams.
pub trait PacketSource {
    /// Returns `Ok(None)` once the container is exhausted.
    fn read_unit(&mut self) -> Result<Option<CompressedUnit>>;
}

pub trait FrameDecoder {
    /// Queues a compressed unit for decoding. A unit the decoder rejects is
    /// reported as an error but does not poison the decoder.
    fn send_unit(&mut self, unit: &CompressedUnit) -> Result<()>;

    /// Tells the decoder no more units follow so that it releases delayed
    /// frames.
    fn send_eof(&mut self) -> Result<()>;

    /// Returns the next decoded frame, or `Ok(None)` when the decoder needs
    /// more input or has been fully drained.
    fn receive_frame(&mut self) -> Result<Option<DecodedFrame>>;
}

/// The outcome of one incremental parser call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Split {
    /// Bytes taken from the head of the input. Negative values mean the
    /// parser could not make sense of the stream.
    pub consumed: isize,
    pub access_unit: Option<Bytes>,
}

/// Reassembles access units from a headerless byte stream.
///
/// The splitter may keep consumed bytes internally until it can tell where
/// an access unit ends.
pub trait AccessUnitSplitter {
    fn split(&mut self, input: &[u8]) -> Result<Split>;

    /// Emits whatever access unit is still held back once the input is known
    /// to be complete.
    fn flush(&mut self) -> Result<Option<Bytes>>;
}
