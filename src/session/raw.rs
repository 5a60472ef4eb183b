use bytes::Bytes;
use log::{debug, warn};

use super::FrameExtractor;
use crate::{
    engine::{AccessUnitSplitter, CompressedUnit, FrameDecoder},
    error::{ParseError, Result},
    frame::FrameRecord,
    raw::{NalSyntax, RawBuffer, StartCodeScanner},
};

/// Raw streams have a single stream; units are tagged with this index.
const RAW_STREAM_INDEX: usize = 0;

pub(super) struct RawInput {
    buffer: RawBuffer,
    splitter: Box<dyn AccessUnitSplitter>,
    // Only set for codecs that carry parameter sets behind start codes.
    scanner: Option<StartCodeScanner>,
    next_dts: i64,
    finished: bool,
    flushed: bool,
}

impl RawInput {
    pub(super) fn new(
        splitter: Box<dyn AccessUnitSplitter>,
        parameter_sets: Option<NalSyntax>,
    ) -> Self {
        Self {
            buffer: RawBuffer::new(),
            splitter,
            scanner: parameter_sets.map(StartCodeScanner::new),
            next_dts: 0,
            finished: false,
            flushed: false,
        }
    }

    pub(super) fn feed(&mut self, bytes: &[u8]) -> Result<()> {
        if self.finished {
            return Err(ParseError::InputFinished);
        }
        self.buffer.extend(bytes);
        Ok(())
    }

    pub(super) const fn finish(&mut self) {
        self.finished = true;
    }

    pub(super) fn discard(&mut self) -> usize {
        let dropped = self.buffer.clear();
        if dropped > 0 {
            debug!("Discarded {dropped} buffered bytes");
        }
        dropped
    }

    pub(super) fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub(super) fn next_frame(
        &mut self,
        decoder: &mut dyn FrameDecoder,
        frames: &mut FrameExtractor,
    ) -> Result<Option<FrameRecord>> {
        loop {
            if let Some(record) = frames.drain(decoder) {
                return Ok(Some(record));
            }

            if self.buffer.is_empty() {
                if !self.finished || self.flushed {
                    return Ok(None);
                }
                self.flushed = true;
                while let Some(access_unit) = self.splitter.flush()? {
                    self.decode(decoder, access_unit);
                }
                if let Err(e) = decoder.send_eof() {
                    debug!("Failed to flush the decoder: {e}");
                }
                continue;
            }

            let mut access_unit = self.prime()?;

            if access_unit.is_none() && !self.buffer.is_empty() {
                let split = self.splitter.split(self.buffer.as_slice())?;
                let consumed = self.consume(split.consumed)?;
                access_unit = split.access_unit;
                if access_unit.is_none() && consumed == 0 {
                    if !self.finished {
                        // The parser wants more bytes than there are.
                        return Ok(None);
                    }
                    warn!(
                        "Dropping {} trailing bytes the parser would not take",
                        self.buffer.len()
                    );
                    self.buffer.clear();
                }
            }

            if let Some(access_unit) = access_unit {
                self.decode(decoder, access_unit);
            }
        }
    }

    /// Hands complete parameter set units at the head of the buffer to the
    /// parser on their own, ahead of the frame data that follows them.
    /// Returns an access unit if the parser completed one along the way.
    fn prime(&mut self) -> Result<Option<Bytes>> {
        let Some(scanner) = self.scanner else {
            return Ok(None);
        };
        while let Some(len) = scanner.leading_parameter_set(self.buffer.as_slice()) {
            let split = self.splitter.split(&self.buffer.as_slice()[..len])?;
            let consumed = self.consume(split.consumed)?;
            debug!("Primed the parser with a {consumed} byte parameter set");
            if split.access_unit.is_some() {
                return Ok(split.access_unit);
            }
            if consumed == 0 {
                break;
            }
        }
        Ok(None)
    }

    fn consume(&mut self, consumed: isize) -> Result<usize> {
        let Ok(count) = usize::try_from(consumed) else {
            return Err(ParseError::MalformedStream {
                offset: self.buffer.position(),
                consumed,
            });
        };
        Ok(self.buffer.consume(count))
    }

    /// Sends an access unit stamped with its decode order. Raw streams
    /// carry no presentation times, so pts stays unset.
    fn decode(&mut self, decoder: &mut dyn FrameDecoder, access_unit: Bytes) {
        let dts = self.next_dts;
        self.next_dts += 1;
        let unit = CompressedUnit::new(RAW_STREAM_INDEX, access_unit)
            .with_timestamps(None, Some(dts));
        if let Err(e) = decoder.send_unit(&unit) {
            debug!("Decoder rejected a {} byte access unit: {e}", unit.size());
        }
    }
}
