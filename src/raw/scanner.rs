use std::ops::Range;

use nom::{
    IResult,
    Parser,
    bits::bits,
    bytes::complete::{tag, take_until},
    sequence::terminated,
};
use num_enum::FromPrimitive;

use crate::util::{take_u8, take_zero_bit};

const START_CODE: &[u8] = &[0, 0, 1];

/// Start-code delimited NAL unit flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalSyntax {
    /// H.264 / AVC, one byte NAL header.
    Avc,
    /// H.265 / HEVC, two byte NAL header.
    Hevc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum AvcNalType {
    Unspecified = 0,
    Slice = 1,
    SliceDataA = 2,
    SliceDataB = 3,
    SliceDataC = 4,
    IdrSlice = 5,
    Sei = 6,
    Sps = 7,
    Pps = 8,
    AccessUnitDelimiter = 9,
    EndOfSequence = 10,
    EndOfStream = 11,
    Filler = 12,
    SpsExtension = 13,
    Prefix = 14,
    SubsetSps = 15,
    #[num_enum(catch_all)]
    Other(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum HevcNalType {
    TrailN = 0,
    TrailR = 1,
    IdrWRadl = 19,
    IdrNLp = 20,
    Cra = 21,
    Vps = 32,
    Sps = 33,
    Pps = 34,
    AccessUnitDelimiter = 35,
    EndOfSequence = 36,
    EndOfBitstream = 37,
    Filler = 38,
    PrefixSei = 39,
    SuffixSei = 40,
    #[num_enum(catch_all)]
    Other(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalKind {
    Avc(AvcNalType),
    Hevc(HevcNalType),
    /// Header truncated or with the forbidden bit set.
    Invalid,
}

impl NalKind {
    #[must_use]
    pub const fn is_parameter_set(self) -> bool {
        matches!(
            self,
            Self::Avc(
                AvcNalType::Sps
                    | AvcNalType::Pps
                    | AvcNalType::SpsExtension
                    | AvcNalType::SubsetSps
            ) | Self::Hevc(HevcNalType::Vps | HevcNalType::Sps | HevcNalType::Pps)
        )
    }
}

/// One NAL unit located inside a byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NalUnit {
    /// Offset of the first start code byte.
    pub start: usize,
    /// Offset of the NAL header, right after the start code.
    pub header: usize,
    /// Offset of the next start code, `None` when the unit runs to the end
    /// of the buffer and may still be incomplete.
    pub end: Option<usize>,
    pub kind: NalKind,
}

impl NalUnit {
    /// Byte range of the whole unit including its start code, if complete.
    #[must_use]
    pub fn range(&self) -> Option<Range<usize>> {
        self.end.map(|end| self.start..end)
    }
}

/// Finds start codes and classifies the NAL units between them.
#[derive(Debug, Clone, Copy)]
pub struct StartCodeScanner {
    syntax: NalSyntax,
}

impl StartCodeScanner {
    #[must_use]
    pub const fn new(syntax: NalSyntax) -> Self {
        Self { syntax }
    }

    #[must_use]
    pub fn units<'a>(&self, data: &'a [u8]) -> NalUnits<'a> {
        NalUnits {
            syntax: self.syntax,
            data,
            next: find_start_code(data, 0),
        }
    }

    /// If `data` begins with a complete parameter set unit, returns the
    /// number of bytes it spans.
    #[must_use]
    pub fn leading_parameter_set(&self, data: &[u8]) -> Option<usize> {
        let unit = self.units(data).next()?;
        if unit.start != 0 || !unit.kind.is_parameter_set() {
            return None;
        }
        unit.end
    }
}

pub struct NalUnits<'a> {
    syntax: NalSyntax,
    data: &'a [u8],
    next: Option<(usize, usize)>,
}

impl Iterator for NalUnits<'_> {
    type Item = NalUnit;

    fn next(&mut self) -> Option<NalUnit> {
        let (start, header) = self.next.take()?;
        self.next = find_start_code(self.data, header);
        let end = self.next.map(|(next_start, _)| next_start);
        let header_bytes = &self.data[header..end.unwrap_or(self.data.len())];
        let kind = match self.syntax {
            NalSyntax::Avc => avc_header(header_bytes)
                .map_or(NalKind::Invalid, |(_, t)| NalKind::Avc(AvcNalType::from(t))),
            NalSyntax::Hevc => hevc_header(header_bytes)
                .map_or(NalKind::Invalid, |(_, t)| NalKind::Hevc(HevcNalType::from(t))),
        };
        Some(NalUnit {
            start,
            header,
            end,
            kind,
        })
    }
}

fn start_code(input: &[u8]) -> IResult<&[u8], &[u8]> {
    terminated(take_until(START_CODE), tag(START_CODE)).parse(input)
}

/// Searches `data[from..]` for a start code and returns the offsets of its
/// first byte and of the byte following it. A zero byte right in front of a
/// three byte start code is counted as part of a four byte one.
fn find_start_code(data: &[u8], from: usize) -> Option<(usize, usize)> {
    let input = data.get(from..)?;
    let (rest, skipped) = start_code(input).ok()?;
    let mut start = from + skipped.len();
    if skipped.last() == Some(&0) {
        start -= 1;
    }
    Some((start, data.len() - rest.len()))
}

fn avc_header(input: &[u8]) -> IResult<&[u8], u8> {
    bits(|input| {
        let (input, ()) = take_zero_bit(input)?;
        let (input, _nal_ref_idc) = take_u8(input, 2)?;
        take_u8(input, 5)
    })
    .parse(input)
}

fn hevc_header(input: &[u8]) -> IResult<&[u8], u8> {
    bits(|input| {
        let (input, ()) = take_zero_bit(input)?;
        let (input, nal_unit_type) = take_u8(input, 6)?;
        let (input, _nuh_layer_id) = take_u8(input, 6)?;
        let (input, _nuh_temporal_id_plus1) = take_u8(input, 3)?;
        Ok((input, nal_unit_type))
    })
    .parse(input)
}
