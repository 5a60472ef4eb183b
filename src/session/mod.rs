//! The parsing session: pulls frames out of a container or a fed raw stream
//! and keeps the sequence statistics they add up to.

mod container;
mod raw;

use std::path::Path;

use log::{debug, warn};
use num_rational::Rational32;
use num_traits::{ToPrimitive, Zero};

use self::{container::ContainerInput, raw::RawInput};
use crate::{
    backend,
    codec::{Codec, CodecHooks},
    engine::{
        AccessUnitSplitter, DecodedFrame, FrameDecoder, FrameGeometry, PacketSource,
        StreamDescription,
    },
    error::{ParseError, Result},
    frame::FrameRecord,
    options::{MetricsPolicy, ParserOptions},
    sequence::{SequenceInfo, SequenceStats},
};

/// Stateful frame-by-frame extraction over one video stream.
///
/// A session is built either for a media file ([`ParsingSession::open`]) or
/// for a headerless elementary stream ([`ParsingSession::create_raw_parser`])
/// that the caller hands over piece by piece with [`ParsingSession::feed`].
/// Frames are pulled with [`ParsingSession::parse_frame`].
pub struct ParsingSession {
    frames: FrameExtractor,
    // `None` once closed. Dropping it releases every engine resource.
    input: Option<Input>,
}

struct Input {
    decoder: Box<dyn FrameDecoder>,
    mode: Mode,
}

enum Mode {
    Container(ContainerInput),
    Raw(RawInput),
}

impl ParsingSession {
    /// Opens a media file and prepares to decode its first video stream.
    pub fn open<P: AsRef<Path>>(path: P, options: ParserOptions) -> Result<Self> {
        backend::set_verbose(options.verbose);
        let (stream, reader, decoder) = backend::open_container(path.as_ref())?;
        Ok(Self::from_container(
            stream,
            Box::new(reader),
            Box::new(decoder),
            options,
        ))
    }

    /// Prepares a session for a raw elementary stream of the given codec,
    /// named by a codec tag such as `avc1` or `hev1` or by its short name.
    pub fn create_raw_parser(codec: &str, options: ParserOptions) -> Result<Self> {
        let family =
            Codec::from_tag(codec).ok_or_else(|| ParseError::UnsupportedCodec(codec.to_owned()))?;
        backend::set_verbose(options.verbose);
        let (splitter, decoder) = backend::open_raw(family)?;
        Ok(Self::from_raw(
            family,
            Box::new(splitter),
            Box::new(decoder),
            options,
        ))
    }

    /// Builds a container session on top of any engine.
    #[must_use]
    pub fn from_container(
        stream: StreamDescription,
        source: Box<dyn PacketSource>,
        decoder: Box<dyn FrameDecoder>,
        options: ParserOptions,
    ) -> Self {
        debug!(
            "Parsing {} stream {} ({}x{})",
            stream.info.codec, stream.stream_index, stream.info.width, stream.info.height
        );
        Self {
            frames: FrameExtractor::new(
                stream.info,
                stream.time_base,
                PresentationClock::Stream,
                options,
            ),
            input: Some(Input {
                decoder,
                mode: Mode::Container(ContainerInput::new(source, stream.stream_index)),
            }),
        }
    }

    /// Builds a raw-mode session on top of any engine.
    #[must_use]
    pub fn from_raw(
        codec: Codec,
        splitter: Box<dyn AccessUnitSplitter>,
        decoder: Box<dyn FrameDecoder>,
        options: ParserOptions,
    ) -> Self {
        let frame_rate = if options.raw_frame_rate > Rational32::zero() {
            options.raw_frame_rate
        } else {
            warn!(
                "Ignoring raw frame rate {}, using the default",
                options.raw_frame_rate
            );
            ParserOptions::default().raw_frame_rate
        };
        let info = SequenceInfo {
            codec: codec.short_name().to_owned(),
            framerate: frame_rate.to_f64().unwrap_or_default(),
            ..SequenceInfo::default()
        };
        Self {
            frames: FrameExtractor::new(
                info,
                frame_rate.recip(),
                PresentationClock::OutputOrder,
                options,
            ),
            input: Some(Input {
                decoder,
                mode: Mode::Raw(RawInput::new(splitter, codec.parameter_sets())),
            }),
        }
    }

    /// Returns the next frame, or `Ok(None)` at the end of the stream.
    ///
    /// In raw mode the end is only the end of what has been fed so far;
    /// feeding more bytes lets parsing resume.
    pub fn parse_frame(&mut self) -> Result<Option<FrameRecord>> {
        let input = self.input.as_mut().ok_or(ParseError::Closed)?;
        match input.mode {
            Mode::Container(ref mut container) => {
                container.next_frame(input.decoder.as_mut(), &mut self.frames)
            }
            Mode::Raw(ref mut raw) => raw.next_frame(input.decoder.as_mut(), &mut self.frames),
        }
    }

    /// Appends raw stream bytes. Nothing is parsed until the next
    /// [`ParsingSession::parse_frame`].
    pub fn feed(&mut self, bytes: &[u8]) -> Result<()> {
        self.raw_input()?.feed(bytes)
    }

    /// Declares that no more bytes will be fed, so that the access unit the
    /// parser is still holding back and the decoder's delayed frames come
    /// out.
    pub fn finish(&mut self) -> Result<()> {
        self.raw_input()?.finish();
        Ok(())
    }

    /// Throws away every fed byte that has not been parsed yet, e.g. to
    /// resynchronize after a malformed stream error. Returns the number of
    /// bytes dropped.
    pub fn discard_buffered(&mut self) -> Result<usize> {
        Ok(self.raw_input()?.discard())
    }

    /// Number of fed bytes not yet consumed by the parser.
    pub fn buffered_len(&mut self) -> Result<usize> {
        Ok(self.raw_input()?.buffered_len())
    }

    /// The sequence description, completed with what the parsed frames
    /// revealed. Can be called at any time, including after `close`.
    #[must_use]
    pub fn get_sequence_info(&self) -> SequenceInfo {
        self.frames.stats.finalize(self.frames.options.bitrate)
    }

    /// Number of frames returned so far.
    #[must_use]
    pub const fn frames_parsed(&self) -> u64 {
        self.frames.stats.frames_parsed()
    }

    /// Releases the decoder, the container and any buffered bytes. Calling
    /// it again does nothing.
    pub fn close(&mut self) {
        if self.input.take().is_some() {
            debug!(
                "Closed parsing session after {} frames",
                self.frames.stats.frames_parsed()
            );
        }
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.input.is_none()
    }

    fn raw_input(&mut self) -> Result<&mut RawInput> {
        let input = self.input.as_mut().ok_or(ParseError::Closed)?;
        match input.mode {
            Mode::Raw(ref mut raw) => Ok(raw),
            Mode::Container(_) => Err(ParseError::NotRawMode),
        }
    }
}

/// Where presentation times come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PresentationClock {
    /// The timestamps the container attached to each unit.
    Stream,
    /// The position in output order at the nominal frame rate, for streams
    /// that carry no timestamps and whose decode order is not display order.
    OutputOrder,
}

/// Turns decoded frames into records and accounts them.
struct FrameExtractor {
    stats: SequenceStats,
    hooks: CodecHooks,
    options: ParserOptions,
    clock: PresentationClock,
    seconds_per_tick: f64,
}

impl FrameExtractor {
    fn new(
        info: SequenceInfo,
        time_base: Rational32,
        clock: PresentationClock,
        options: ParserOptions,
    ) -> Self {
        Self {
            hooks: CodecHooks::for_codec(&info.codec),
            stats: SequenceStats::new(info),
            options,
            clock,
            seconds_per_tick: time_base.to_f64().unwrap_or_default(),
        }
    }

    /// Pulls decoded frames until one yields a record or the decoder has
    /// nothing more to give for now.
    fn drain(&mut self, decoder: &mut dyn FrameDecoder) -> Option<FrameRecord> {
        loop {
            let frame = match decoder.receive_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => return None,
                Err(e) => {
                    warn!("Failed to receive a decoded frame: {e}");
                    return None;
                }
            };
            if let Some(record) = self.extract(frame) {
                return Some(record);
            }
        }
    }

    fn extract(&mut self, frame: DecodedFrame) -> Option<FrameRecord> {
        if frame.aux.is_none() && self.options.metrics == MetricsPolicy::Required {
            debug!(
                "Skipping frame without decoder metrics (pts {:?}, {} bytes)",
                frame.pts, frame.size
            );
            return None;
        }

        let frame_idx = self.stats.frames_parsed();
        let pts = match self.clock {
            PresentationClock::Stream => frame
                .pts
                .or(frame.best_effort_timestamp)
                .map_or_else(|| self.index_time(frame_idx), |ts| self.seconds(ts)),
            PresentationClock::OutputOrder => self.index_time(frame_idx),
        };
        let dts = frame.dts.map_or(pts, |ts| self.seconds(ts));

        if let Some(ref geometry) = frame.geometry {
            self.fill_geometry(geometry);
        }

        let mut record = FrameRecord::new(frame_idx, frame.picture_type, frame.key_frame);
        record.pts = pts;
        record.dts = dts;
        record.size = frame.size;
        record.aux = frame.aux;
        self.stats.record_frame(pts, frame.size);
        self.hooks.on_frame(&mut record);
        Some(record)
    }

    fn seconds(&self, ts: i64) -> f64 {
        ts as f64 * self.seconds_per_tick
    }

    /// Fallback time for frames that carry no timestamp at all.
    fn index_time(&self, frame_idx: u64) -> f64 {
        let framerate = self.stats.provisional().framerate;
        if framerate > 0.0 {
            frame_idx as f64 / framerate
        } else {
            0.0
        }
    }

    // Raw streams only learn their geometry from decoded pictures.
    fn fill_geometry(&mut self, geometry: &FrameGeometry) {
        let info = self.stats.provisional_mut();
        if info.width == 0 {
            info.width = geometry.width;
        }
        if info.height == 0 {
            info.height = geometry.height;
        }
        if info.pix_fmt.is_empty() {
            info.pix_fmt.clone_from(&geometry.pix_fmt);
        }
        if info.bit_depth == 0 {
            info.bit_depth = geometry.bit_depth;
        }
    }
}
