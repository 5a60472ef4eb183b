//! ffmpeg implementation of the [`crate::engine`] traits.

mod decoder;
mod reader;
mod side_data;
mod splitter;

use std::path::Path;

use ffmpeg::{
    codec::{self, Id},
    util::log::{self as av_log, Level},
};
use num_rational::Rational32;

pub use self::{
    decoder::FfmpegDecoder,
    reader::ContainerReader,
    side_data::SharedFrameInfo,
    splitter::FfmpegSplitter,
};
use crate::{
    codec::Codec,
    engine::StreamDescription,
    error::{ParseError, Result},
};

/// Makes ffmpeg log everything it does, or nothing at all.
pub fn set_verbose(verbose: bool) {
    av_log::set_level(if verbose { Level::Debug } else { Level::Quiet });
}

/// Opens a media file and prepares a decoder for its first video stream.
pub fn open_container(path: &Path) -> Result<(StreamDescription, ContainerReader, FfmpegDecoder)> {
    let reader = ContainerReader::open(path)?;
    let stream_index = reader.video_stream()?;
    let (description, decoder) = reader.open_decoder(stream_index)?;
    Ok((description, reader, decoder))
}

/// Prepares the incremental parser and decoder for a raw elementary stream.
pub fn open_raw(codec: Codec) -> Result<(FfmpegSplitter, FfmpegDecoder)> {
    ffmpeg::init()?;
    let id = codec_id(codec);
    let decoder_codec = codec::decoder::find(id)
        .ok_or_else(|| ParseError::DecoderNotFound(codec.short_name().to_owned()))?;
    let decoder = codec::context::Context::new()
        .decoder()
        .open_as(decoder_codec)
        .and_then(|opened| opened.video())
        .map_err(|source| ParseError::DecoderInit {
            codec: codec.short_name().to_owned(),
            source,
        })?;
    let splitter = FfmpegSplitter::new(id)?;
    Ok((splitter, FfmpegDecoder::new(decoder)))
}

const fn codec_id(codec: Codec) -> Id {
    match codec {
        Codec::H264 => Id::H264,
        Codec::H265 => Id::HEVC,
        Codec::Vp9 => Id::VP9,
        Codec::Av1 => Id::AV1,
    }
}

fn ratio(rational: ffmpeg::Rational) -> Option<Rational32> {
    (rational.denominator() != 0)
        .then(|| Rational32::new(rational.numerator(), rational.denominator()))
}
