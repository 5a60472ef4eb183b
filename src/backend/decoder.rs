use std::collections::BTreeMap;

use ffmpeg::{Packet, codec::decoder, error::EAGAIN, ffi, frame, picture};

use super::{reader::pixel_format_details, side_data};
use crate::{
    engine::{CompressedUnit, DecodedFrame, FrameDecoder, FrameGeometry},
    error::Result,
    frame::FrameType,
};

/// Compressed sizes are remembered for at most this many units that have
/// not come out of the decoder yet.
const MAX_PENDING_SIZES: usize = 64;

pub struct FfmpegDecoder {
    decoder: decoder::Video,
    decoded: frame::Video,
    // Compressed unit sizes keyed by the timestamp they carried, so a
    // reordered frame can be matched back to the unit it came from.
    pending_sizes: BTreeMap<i64, usize>,
    last_size: usize,
}

impl FfmpegDecoder {
    #[must_use]
    pub fn new(decoder: decoder::Video) -> Self {
        Self {
            decoder,
            decoded: frame::Video::empty(),
            pending_sizes: BTreeMap::new(),
            last_size: 0,
        }
    }

    fn describe_decoded(&mut self) -> DecodedFrame {
        let pts = self.decoded.pts();
        let best_effort_timestamp = self.decoded.timestamp();
        // SAFETY: `decoded` holds a frame just returned by the decoder.
        let pkt_dts = unsafe { (*self.decoded.as_ptr()).pkt_dts };
        let dts = (pkt_dts != ffi::AV_NOPTS_VALUE).then_some(pkt_dts);

        let size = pts
            .or(best_effort_timestamp)
            .and_then(|ts| self.pending_sizes.remove(&ts))
            .unwrap_or(self.last_size);

        let (pix_fmt, bit_depth) = pixel_format_details(self.decoded.format());

        DecodedFrame {
            pts,
            best_effort_timestamp,
            dts,
            picture_type: frame_type(self.decoded.kind()),
            key_frame: self.decoded.is_key(),
            size,
            geometry: Some(FrameGeometry {
                width: self.decoded.width(),
                height: self.decoded.height(),
                pix_fmt,
                bit_depth,
            }),
            aux: side_data::read_aux(&self.decoded),
        }
    }
}

impl FrameDecoder for FfmpegDecoder {
    fn send_unit(&mut self, unit: &CompressedUnit) -> Result<()> {
        let mut packet = Packet::copy(&unit.data);
        packet.set_pts(unit.pts);
        packet.set_dts(unit.dts);
        self.decoder.send_packet(&packet)?;

        if let Some(ts) = unit.pts.or(unit.dts) {
            self.pending_sizes.insert(ts, unit.size());
            while self.pending_sizes.len() > MAX_PENDING_SIZES {
                self.pending_sizes.pop_first();
            }
        }
        self.last_size = unit.size();
        Ok(())
    }

    fn send_eof(&mut self) -> Result<()> {
        self.decoder.send_eof()?;
        Ok(())
    }

    fn receive_frame(&mut self) -> Result<Option<DecodedFrame>> {
        match self.decoder.receive_frame(&mut self.decoded) {
            Ok(()) => Ok(Some(self.describe_decoded())),
            Err(ffmpeg::Error::Eof) => Ok(None),
            Err(ffmpeg::Error::Other { errno }) if errno == EAGAIN => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

const fn frame_type(kind: picture::Type) -> FrameType {
    match kind {
        picture::Type::I | picture::Type::SI => FrameType::I,
        picture::Type::P | picture::Type::SP | picture::Type::S => FrameType::P,
        picture::Type::B | picture::Type::BI => FrameType::B,
        _ => FrameType::Unknown,
    }
}
