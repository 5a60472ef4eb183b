use nom::{IResult, Parser, bits::complete as bit_parsers, combinator::map};

pub type BitInput<'a> = (&'a [u8], usize);

/// Consumes a single bit that the bitstream requires to be zero, such as
/// `forbidden_zero_bit` at the start of every NAL unit header.
pub fn take_zero_bit(input: BitInput) -> IResult<BitInput, ()> {
    take_zero_bits(input, 1)
}

pub fn take_zero_bits(input: BitInput, bits: usize) -> IResult<BitInput, ()> {
    map(bit_parsers::tag(0u8, bits), |_| ()).parse(input)
}

pub fn take_u8(input: BitInput, bits: usize) -> IResult<BitInput, u8> {
    bit_parsers::take(bits).parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_bits_msb_first() {
        let data = [0b1010_0000u8];
        let (input, first) = take_u8((&data, 0), 1).unwrap();
        let (input, second) = take_u8(input, 1).unwrap();
        let (_, rest) = take_u8(input, 3).unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 0);
        assert_eq!(rest, 0b100);
    }

    #[test]
    fn zero_bit_rejects_set_bit() {
        let data = [0x80u8];
        assert!(take_zero_bit((&data, 0)).is_err());
        let data = [0x7fu8];
        assert!(take_zero_bit((&data, 0)).is_ok());
    }
}
