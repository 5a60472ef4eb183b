use std::{
    os::raw::c_int,
    ptr::{self, NonNull},
    slice,
};

use bytes::Bytes;
use ffmpeg::{
    codec::{self, Id},
    ffi,
};

use crate::{
    engine::{AccessUnitSplitter, Split},
    error::{ParseError, Result},
};

const PADDING: usize = ffi::AV_INPUT_BUFFER_PADDING_SIZE as usize;

/// ffmpeg's incremental bitstream parser (`av_parser_parse2`).
pub struct FfmpegSplitter {
    parser: NonNull<ffi::AVCodecParserContext>,
    // The parser records what it learns about the stream here. It is never
    // opened for decoding.
    context: codec::context::Context,
    // Copy of the current input followed by zeroed padding.
    scratch: Vec<u8>,
}

impl FfmpegSplitter {
    pub fn new(id: Id) -> Result<Self> {
        // SAFETY: av_parser_init only looks the codec id up in its parser
        // table and returns null when there is none.
        let parser = unsafe { ffi::av_parser_init(ffi::AVCodecID::from(id) as c_int) };
        let parser = NonNull::new(parser)
            .ok_or_else(|| ParseError::DecoderNotFound(format!("{} parser", id.name())))?;
        Ok(Self {
            parser,
            context: codec::context::Context::new(),
            scratch: Vec::new(),
        })
    }

    fn parse(&mut self, input: &[u8]) -> Split {
        let mut out_data: *mut u8 = ptr::null_mut();
        let mut out_size: c_int = 0;
        let len = c_int::try_from(input.len()).unwrap_or(c_int::MAX);
        let padded = fill_padded(&mut self.scratch, &input[..len as usize]);
        // SAFETY: `parser` and `context` are valid for the lifetime of self.
        // The parser may read up to AV_INPUT_BUFFER_PADDING_SIZE bytes past
        // `len`, and `padded` holds that many zeroed bytes after the input.
        let consumed = unsafe {
            ffi::av_parser_parse2(
                self.parser.as_ptr(),
                self.context.as_mut_ptr(),
                &mut out_data,
                &mut out_size,
                padded.as_ptr(),
                len,
                ffi::AV_NOPTS_VALUE,
                ffi::AV_NOPTS_VALUE,
                0,
            )
        };

        let access_unit = (out_size > 0 && !out_data.is_null()).then(|| {
            // SAFETY: the parser returned a buffer of `out_size` bytes that
            // stays valid until the next call.
            Bytes::copy_from_slice(unsafe { slice::from_raw_parts(out_data, out_size as usize) })
        });

        Split {
            consumed: consumed as isize,
            access_unit,
        }
    }
}

/// Copies `input` into `scratch` followed by the zeroed padding ffmpeg's
/// parsers are allowed to read, and returns the padded buffer.
fn fill_padded<'a>(scratch: &'a mut Vec<u8>, input: &[u8]) -> &'a [u8] {
    scratch.clear();
    scratch.reserve(input.len() + PADDING);
    scratch.extend_from_slice(input);
    scratch.resize(input.len() + PADDING, 0);
    scratch
}

impl AccessUnitSplitter for FfmpegSplitter {
    fn split(&mut self, input: &[u8]) -> Result<Split> {
        Ok(self.parse(input))
    }

    fn flush(&mut self) -> Result<Option<Bytes>> {
        // An empty buffer makes the parser return whatever it still holds.
        Ok(self.parse(&[]).access_unit)
    }
}

impl Drop for FfmpegSplitter {
    fn drop(&mut self) {
        // SAFETY: the parser came from av_parser_init and is closed only here.
        unsafe { ffi::av_parser_close(self.parser.as_ptr()) };
    }
}
