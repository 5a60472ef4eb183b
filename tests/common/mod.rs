//! A scripted decoding engine for driving sessions without media files.

#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::{HashSet, VecDeque},
    rc::Rc,
};

use bytes::Bytes;
use num_rational::Rational32;
use videoparser::{
    AuxMetrics, FrameType, ParserOptions, ParsingSession, Result, SequenceInfo,
    engine::{
        AccessUnitSplitter, CompressedUnit, DecodedFrame, FrameDecoder, FrameGeometry,
        PacketSource, Split, StreamDescription,
    },
    frame::QpStats,
    raw::{
        StartCodeScanner,
        scanner::{AvcNalType, NalKind, NalSyntax},
    },
};

pub const VIDEO_STREAM: usize = 1;
pub const AUDIO_STREAM: usize = 0;

/// Milliseconds.
pub fn time_base() -> Rational32 {
    Rational32::new(1, 1000)
}

pub fn container_info() -> SequenceInfo {
    SequenceInfo {
        codec: "h264".to_owned(),
        bitrate: 4000.0,
        framerate: 25.0,
        width: 1920,
        height: 1080,
        profile: 100,
        level: 40,
        bit_depth: 8,
        pix_fmt: "yuv420p".to_owned(),
        duration: 0.0,
        frame_count: 0,
    }
}

pub fn video_unit(pts: i64, size: usize) -> CompressedUnit {
    CompressedUnit::new(VIDEO_STREAM, Bytes::from(vec![0u8; size]))
        .with_timestamps(Some(pts), Some(pts))
}

pub fn audio_unit(pts: i64) -> CompressedUnit {
    CompressedUnit::new(AUDIO_STREAM, Bytes::from_static(&[0xFF; 16]))
        .with_timestamps(Some(pts), Some(pts))
}

/// Builds a container session over scripted units.
pub fn container_session(
    info: SequenceInfo,
    units: Vec<CompressedUnit>,
    decoder: ScriptedDecoder,
    options: ParserOptions,
) -> ParsingSession {
    let stream = StreamDescription {
        stream_index: VIDEO_STREAM,
        time_base: time_base(),
        info,
    };
    ParsingSession::from_container(
        stream,
        Box::new(ScriptedSource::new(units)),
        Box::new(decoder),
        options,
    )
}

pub struct ScriptedSource {
    units: VecDeque<CompressedUnit>,
}

impl ScriptedSource {
    pub fn new(units: Vec<CompressedUnit>) -> Self {
        Self {
            units: units.into(),
        }
    }
}

impl PacketSource for ScriptedSource {
    fn read_unit(&mut self) -> Result<Option<CompressedUnit>> {
        Ok(self.units.pop_front())
    }
}

/// Which timestamps the scripted decoder puts on its frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameTimestamps {
    /// pts and dts of the unit the frame came from.
    #[default]
    FromUnit,
    /// No pts, only the engine's best-effort guess taken from the unit pts.
    BestEffortOnly,
    /// Nothing at all.
    Missing,
}

/// Decodes every unit into exactly one frame, optionally holding frames
/// back like a decoder with reordering delay, or handing them out in a
/// scripted display order.
#[derive(Default)]
pub struct ScriptedDecoder {
    /// Ordinals of the sent units whose frames come without metrics.
    without_metrics: HashSet<usize>,
    delay: usize,
    /// Ordinals in the order their frames are output.
    output_order: VecDeque<usize>,
    timestamps: FrameTimestamps,
    sent: usize,
    eof: bool,
    pending: VecDeque<(usize, DecodedFrame)>,
    received_units: Rc<RefCell<Vec<CompressedUnit>>>,
}

impl ScriptedDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn without_metrics(mut self, ordinals: impl IntoIterator<Item = usize>) -> Self {
        self.without_metrics.extend(ordinals);
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: usize) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn with_output_order(mut self, ordinals: impl IntoIterator<Item = usize>) -> Self {
        self.output_order.extend(ordinals);
        self
    }

    #[must_use]
    pub fn with_timestamps(mut self, timestamps: FrameTimestamps) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// A handle on every unit the decoder will be sent.
    pub fn received_units(&self) -> Rc<RefCell<Vec<CompressedUnit>>> {
        Rc::clone(&self.received_units)
    }
}

impl FrameDecoder for ScriptedDecoder {
    fn send_unit(&mut self, unit: &CompressedUnit) -> Result<()> {
        let ordinal = self.sent;
        self.sent += 1;
        self.received_units.borrow_mut().push(unit.clone());

        let aux = (!self.without_metrics.contains(&ordinal)).then(|| AuxMetrics {
            qp: QpStats {
                min: 20,
                max: 30,
                avg: 25.0,
                ..QpStats::default()
            },
            current_poc: ordinal as i32 * 2,
            ..AuxMetrics::default()
        });
        let (pts, best_effort_timestamp, dts) = match self.timestamps {
            FrameTimestamps::FromUnit => (unit.pts, unit.pts, unit.dts),
            FrameTimestamps::BestEffortOnly => (None, unit.pts, unit.dts),
            FrameTimestamps::Missing => (None, None, None),
        };
        let frame = DecodedFrame {
            pts,
            best_effort_timestamp,
            dts,
            picture_type: if ordinal == 0 { FrameType::I } else { FrameType::P },
            key_frame: ordinal == 0,
            size: unit.size(),
            geometry: Some(FrameGeometry {
                width: 1280,
                height: 720,
                pix_fmt: "yuv420p".to_owned(),
                bit_depth: 8,
            }),
            aux,
        };
        self.pending.push_back((ordinal, frame));
        Ok(())
    }

    fn send_eof(&mut self) -> Result<()> {
        self.eof = true;
        Ok(())
    }

    fn receive_frame(&mut self) -> Result<Option<DecodedFrame>> {
        if let Some(&next) = self.output_order.front() {
            let Some(position) = self.pending.iter().position(|&(o, _)| o == next) else {
                return Ok(None);
            };
            self.output_order.pop_front();
            return Ok(self.pending.remove(position).map(|(_, frame)| frame));
        }
        if self.eof || self.pending.len() > self.delay {
            return Ok(self.pending.pop_front().map(|(_, frame)| frame));
        }
        Ok(None)
    }
}

/// Annex B style splitter for scripted H.264 streams. It takes every byte
/// it is given and emits an access unit once a slice is complete; scripted
/// slices carry their payload length in the byte after the NAL header.
pub struct ScriptedSplitter {
    held: Vec<u8>,
    scanner: StartCodeScanner,
    inputs: Rc<RefCell<Vec<Vec<u8>>>>,
}

impl ScriptedSplitter {
    pub fn new() -> Self {
        Self {
            held: Vec::new(),
            scanner: StartCodeScanner::new(NalSyntax::Avc),
            inputs: Rc::default(),
        }
    }

    /// A handle on the input of every `split` call.
    pub fn inputs(&self) -> Rc<RefCell<Vec<Vec<u8>>>> {
        Rc::clone(&self.inputs)
    }

    fn take_complete(&mut self) -> Option<Bytes> {
        let slice = self.scanner.units(&self.held).find(|unit| {
            matches!(
                unit.kind,
                NalKind::Avc(AvcNalType::Slice | AvcNalType::IdrSlice)
            )
        })?;
        let len = usize::from(*self.held.get(slice.header + 1)?);
        let end = slice.header + 2 + len;
        if self.held.len() < end {
            return None;
        }
        Some(self.held.drain(..end).collect::<Vec<_>>().into())
    }
}

impl AccessUnitSplitter for ScriptedSplitter {
    fn split(&mut self, input: &[u8]) -> Result<Split> {
        self.inputs.borrow_mut().push(input.to_vec());
        self.held.extend_from_slice(input);
        Ok(Split {
            consumed: input.len() as isize,
            access_unit: self.take_complete(),
        })
    }

    fn flush(&mut self) -> Result<Option<Bytes>> {
        if let Some(access_unit) = self.take_complete() {
            return Ok(Some(access_unit));
        }
        Ok((!self.held.is_empty()).then(|| std::mem::take(&mut self.held).into()))
    }
}

/// A splitter that cannot make sense of anything.
pub struct RejectingSplitter;

impl AccessUnitSplitter for RejectingSplitter {
    fn split(&mut self, _input: &[u8]) -> Result<Split> {
        Ok(Split {
            consumed: -1,
            access_unit: None,
        })
    }

    fn flush(&mut self) -> Result<Option<Bytes>> {
        Ok(None)
    }
}

pub fn sps() -> Vec<u8> {
    vec![0, 0, 0, 1, 0x67, 0x64, 0x00, 0x28, 0xAC]
}

pub fn pps() -> Vec<u8> {
    vec![0, 0, 0, 1, 0x68, 0xEE, 0x3C, 0x80]
}

/// A scripted slice with `payload_len` bytes of payload.
pub fn slice(idr: bool, payload_len: u8) -> Vec<u8> {
    let header = if idr { 0x65 } else { 0x41 };
    let mut unit = vec![0, 0, 0, 1, header, payload_len];
    unit.extend(std::iter::repeat_n(0xAA, usize::from(payload_len)));
    unit
}
