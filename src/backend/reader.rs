use std::{
    ffi::{CStr, CString},
    path::{Path, PathBuf},
    ptr,
};

use bytes::Bytes;
use ffmpeg::{
    Packet,
    Stream,
    codec::{self, decoder},
    ffi,
    format::{self, context::Input},
    media,
};
use log::{debug, warn};
use num_rational::Rational32;

use super::{FfmpegDecoder, ratio};
use crate::{
    codec::canonical_name,
    engine::{CompressedUnit, PacketSource, StreamDescription},
    error::{ParseError, Result},
    sequence::SequenceInfo,
};

/// An opened and probed media container.
pub struct ContainerReader {
    input_ctx: Input,
    path: PathBuf,
}

impl ContainerReader {
    pub fn open<P: AsRef<Path>>(input: P) -> Result<Self> {
        let path = input.as_ref().to_owned();
        ffmpeg::init().map_err(|source| ParseError::Open {
            path: path.clone(),
            source,
        })?;

        let url = path
            .to_str()
            .and_then(|p| CString::new(p).ok())
            .ok_or_else(|| ParseError::Open {
                path: path.clone(),
                source: ffmpeg::Error::InvalidData,
            })?;

        let mut ctx = ptr::null_mut();
        // SAFETY: `ctx` is a valid out pointer and `url` outlives the call.
        let ret = unsafe {
            ffi::avformat_open_input(&mut ctx, url.as_ptr(), ptr::null(), ptr::null_mut())
        };
        if ret < 0 {
            return Err(ParseError::Open {
                path,
                source: ffmpeg::Error::from(ret),
            });
        }
        // SAFETY: `avformat_open_input` succeeded, so `ctx` is an open context
        // that nobody else owns. `Input` closes it when dropped, which also
        // covers the probe failing below.
        let mut input_ctx = unsafe { Input::wrap(ctx) };

        // SAFETY: the context is open and exclusively owned by `input_ctx`.
        let ret =
            unsafe { ffi::avformat_find_stream_info(input_ctx.as_mut_ptr(), ptr::null_mut()) };
        if ret < 0 {
            return Err(ParseError::StreamProbe {
                path,
                source: ffmpeg::Error::from(ret),
            });
        }

        debug!(
            "Opened {} ({} streams)",
            path.display(),
            input_ctx.nb_streams()
        );
        Ok(Self { input_ctx, path })
    }

    /// Index of the first video stream. Any further video streams are
    /// ignored.
    pub fn video_stream(&self) -> Result<usize> {
        let mut video = self
            .input_ctx
            .streams()
            .filter(|stream| stream.parameters().medium() == media::Type::Video)
            .map(|stream| stream.index());
        let first = video.next().ok_or(ParseError::NoVideoStream)?;
        if video.next().is_some() {
            warn!(
                "More than one video stream found in {}, only stream {first} is parsed",
                self.path.display()
            );
        }
        Ok(first)
    }

    /// Opens a decoder for the given stream and describes the stream from
    /// the container and codec parameters.
    pub fn open_decoder(&self, stream_index: usize) -> Result<(StreamDescription, FfmpegDecoder)> {
        let stream = self
            .input_ctx
            .stream(stream_index)
            .ok_or(ParseError::NoVideoStream)?;
        let parameters = stream.parameters();
        let codec_name = parameters.id().name().to_owned();
        let decoder_codec = decoder::find(parameters.id())
            .ok_or_else(|| ParseError::DecoderNotFound(codec_name.clone()))?;
        let decoder_name = decoder_codec.name().to_owned();

        let decoder = codec::context::Context::from_parameters(parameters)
            .and_then(|context| context.decoder().open_as(decoder_codec))
            .and_then(|opened| opened.video())
            .map_err(|source| ParseError::DecoderInit {
                codec: codec_name,
                source,
            })?;

        let info = self.sequence_info(&stream, &decoder, &decoder_name);
        let time_base = ratio(stream.time_base()).unwrap_or_else(|| Rational32::new(1, 90_000));
        debug!("Decoding stream {stream_index} with {decoder_name}, time base {time_base}");

        Ok((
            StreamDescription {
                stream_index,
                time_base,
                info,
            },
            FfmpegDecoder::new(decoder),
        ))
    }

    fn sequence_info(
        &self,
        stream: &Stream,
        decoder: &decoder::Video,
        decoder_name: &str,
    ) -> SequenceInfo {
        let (pix_fmt, bit_depth) = pixel_format_details(decoder.format());
        // SAFETY: the decoder context is open and outlives these reads.
        let (profile, level) = unsafe {
            let ctx = decoder.as_ptr();
            ((*ctx).profile, (*ctx).level)
        };

        let container_duration = self.input_ctx.duration();
        let duration = if container_duration > 0 {
            container_duration as f64 / f64::from(ffi::AV_TIME_BASE)
        } else if stream.duration() > 0 {
            ratio(stream.time_base()).map_or(0.0, |tb| {
                stream.duration() as f64 * f64::from(*tb.numer()) / f64::from(*tb.denom())
            })
        } else {
            0.0
        };

        SequenceInfo {
            codec: canonical_name(decoder_name),
            bitrate: (decoder.bit_rate() / 1000) as f64,
            framerate: ratio(stream.avg_frame_rate()).map_or(0.0, |rate| {
                f64::from(*rate.numer()) / f64::from(*rate.denom())
            }),
            width: decoder.width(),
            height: decoder.height(),
            profile,
            level,
            bit_depth,
            pix_fmt,
            duration,
            frame_count: u64::try_from(stream.frames()).unwrap_or(0),
        }
    }
}

impl PacketSource for ContainerReader {
    fn read_unit(&mut self) -> Result<Option<CompressedUnit>> {
        let mut packet = Packet::empty();
        match packet.read(&mut self.input_ctx) {
            Ok(()) => {}
            Err(ffmpeg::Error::Eof) => return Ok(None),
            Err(e) => {
                warn!("Stopped reading {} early: {e}", self.path.display());
                return Ok(None);
            }
        }

        let data = packet.data().map(Bytes::copy_from_slice).unwrap_or_default();
        Ok(Some(
            CompressedUnit::new(packet.stream(), data).with_timestamps(packet.pts(), packet.dts()),
        ))
    }
}

/// Name and luma bit depth of a pixel format, empty and zero when unknown.
pub(super) fn pixel_format_details(format: format::Pixel) -> (String, u32) {
    if format == format::Pixel::None {
        return (String::new(), 0);
    }
    // SAFETY: av_pix_fmt_desc_get returns null or a pointer to a static
    // descriptor whose name is a valid C string.
    unsafe {
        let desc = ffi::av_pix_fmt_desc_get(format.into());
        if desc.is_null() {
            return (String::new(), 0);
        }
        let name = CStr::from_ptr((*desc).name).to_string_lossy().into_owned();
        let depth = u32::try_from((*desc).comp[0].depth).unwrap_or(0);
        (name, depth)
    }
}
