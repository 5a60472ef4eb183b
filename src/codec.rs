use log::warn;

use crate::{frame::FrameRecord, raw::scanner::NalSyntax};

/// Codec families the parser knows how to prime and report on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    H264,
    H265,
    Vp9,
    Av1,
}

impl Codec {
    /// Resolves a codec or decoder name as reported by the decoding engine.
    /// Decoder implementations (`libdav1d`, `h264_cuvid`, ...) resolve to the
    /// codec they decode.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        let base = name
            .split_once('_')
            .map_or(name.as_str(), |(base, _)| base);
        match base {
            "h264" | "avc" | "libopenh264" => Some(Self::H264),
            "hevc" | "h265" | "libde265" => Some(Self::H265),
            "vp9" | "libvpx-vp9" => Some(Self::Vp9),
            "av1" | "libdav1d" | "libaom-av1" | "libaom" => Some(Self::Av1),
            _ => None,
        }
    }

    /// Resolves the codec identifier given for a raw elementary stream. Both
    /// four-character codec tags and plain codec names are accepted.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "avc1" | "avc3" | "h264" | "x264" | "264" => Some(Self::H264),
            "hvc1" | "hev1" | "hevc" | "h265" | "x265" | "265" => Some(Self::H265),
            "vp09" | "vp90" | "vp9" => Some(Self::Vp9),
            "av01" | "av1" => Some(Self::Av1),
            _ => None,
        }
    }

    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::H265 => "hevc",
            Self::Vp9 => "vp9",
            Self::Av1 => "av1",
        }
    }

    /// The NAL unit syntax used to find parameter sets in a raw stream, for
    /// codecs that carry them in-band behind start codes.
    #[must_use]
    pub const fn parameter_sets(self) -> Option<NalSyntax> {
        match self {
            Self::H264 => Some(NalSyntax::Avc),
            Self::H265 => Some(NalSyntax::Hevc),
            Self::Vp9 | Self::Av1 => None,
        }
    }
}

/// Canonical short name for whatever codec name the engine reports.
#[must_use]
pub fn canonical_name(name: &str) -> String {
    Codec::from_name(name).map_or_else(|| name.to_ascii_lowercase(), |c| c.short_name().to_owned())
}

/// Per-codec hooks run on every extracted frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecHooks {
    H264,
    H265,
    Vp9,
    Av1,
    Unsupported { codec: String, advised: bool },
}

impl CodecHooks {
    #[must_use]
    pub fn for_codec(name: &str) -> Self {
        match Codec::from_name(name) {
            Some(Codec::H264) => Self::H264,
            Some(Codec::H265) => Self::H265,
            Some(Codec::Vp9) => Self::Vp9,
            Some(Codec::Av1) => Self::Av1,
            None => Self::Unsupported {
                codec: name.to_owned(),
                advised: false,
            },
        }
    }

    pub fn on_frame(&mut self, record: &mut FrameRecord) {
        match self {
            Self::H264 => h264_frame(record),
            Self::H265 => h265_frame(record),
            Self::Vp9 => vp9_frame(record),
            Self::Av1 => av1_frame(record),
            Self::Unsupported { codec, advised } => {
                if !*advised {
                    warn!("Extended metrics are not available for codec {codec}");
                    *advised = true;
                }
            }
        }
    }
}

// Nothing codec specific is extracted yet; these are where it goes.
const fn h264_frame(_record: &mut FrameRecord) {}

const fn h265_frame(_record: &mut FrameRecord) {}

const fn vp9_frame(_record: &mut FrameRecord) {}

const fn av1_frame(_record: &mut FrameRecord) {}
