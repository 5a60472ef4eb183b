use log::debug;

use super::FrameExtractor;
use crate::{
    engine::{FrameDecoder, PacketSource},
    error::Result,
    frame::FrameRecord,
};

pub(super) struct ContainerInput {
    source: Box<dyn PacketSource>,
    video_stream: usize,
    eof_sent: bool,
}

impl ContainerInput {
    pub(super) fn new(source: Box<dyn PacketSource>, video_stream: usize) -> Self {
        Self {
            source,
            video_stream,
            eof_sent: false,
        }
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
            if self.eof_sent {
                return Ok(None);
            }

            match self.source.read_unit()? {
                Some(unit) if unit.stream_index == self.video_stream => {
                    if let Err(e) = decoder.send_unit(&unit) {
                        debug!("Decoder rejected a {} byte packet: {e}", unit.size());
                    }
                }
                Some(_) => {}
                None => {
                    // Out of packets; let the decoder release what it is
                    // still holding before reporting the end.
                    self.eof_sent = true;
                    if let Err(e) = decoder.send_eof() {
                        debug!("Failed to flush the decoder: {e}");
                    }
                }
            }
        }
    }
}
