//! DMA chain and VIF stream walkers.
//!
//! The chain walker steps over a fixed run of DMA descriptors, following
//! `ref` tags into data windows. Each window is a VIF code stream: unpack
//! codes route payloads into the live [`UnpackState`], and a buffer-bank
//! switch or an MSCAL flushes the state into a [`Packet`]. The input is
//! untrusted; every read and slice is bounds-checked.

use tracing::trace;

use crate::bytes::read_u32_le;
use crate::error::{DecodeError, Result};
use crate::packet::Packet;
use crate::state::{buffer_bank, UnpackState};
use crate::tag::{DmaTag, TagId, DMA_TAG_SIZE};
use crate::trace::TraceSink;
use crate::vif::{VifCode, VIF_CMD_MSCAL, VIF_CMD_STROW};

/// STROW's payload: four row-register words, always present, never needed.
const STROW_PAYLOAD: usize = 16;

/// Walks one DMA descriptor chain and the VIF streams it references.
pub(crate) struct ChainDecoder<'a, 'sink> {
    data: &'a [u8],
    base_offset: u32,
    packets: Vec<Packet>,
    state: Option<UnpackState<'a>>,
    /// Absolute start of the most recent `ref` window, kept for packet
    /// diagnostics and error offsets.
    window_start: u32,
    sink: &'sink mut dyn TraceSink,
}

impl<'a, 'sink> ChainDecoder<'a, 'sink> {
    pub(crate) fn new(
        data: &'a [u8],
        base_offset: u32,
        sink: &'sink mut dyn TraceSink,
    ) -> ChainDecoder<'a, 'sink> {
        ChainDecoder {
            data,
            base_offset,
            packets: Vec::new(),
            state: None,
            window_start: 0,
            sink,
        }
    }

    pub(crate) fn decode(
        mut self,
        descriptor_start: u32,
        descriptor_count: u32,
    ) -> Result<Vec<Packet>> {
        for i in 0..descriptor_count {
            let tag_offset = descriptor_start as usize + i as usize * DMA_TAG_SIZE;
            let tag = DmaTag::read(self.data, tag_offset)?;
            self.sink
                .line(&format!("dma offset:{tag_offset:#010x} packet:{i} {tag}"));

            match tag.id() {
                TagId::Ref => {
                    let start = tag.addr().wrapping_add(self.base_offset) as usize;
                    let len = tag.qwc() as usize * 16;
                    let have = self.data.len().saturating_sub(start.min(self.data.len()));
                    if start > self.data.len() || len > have {
                        return Err(DecodeError::UnexpectedEof {
                            offset: start,
                            need: len,
                            have,
                        });
                    }
                    self.window_start = start as u32;
                    self.sink.line(&format!(
                        "vif window {:#08x}..{:#08x}",
                        start,
                        start + len
                    ));
                    self.walk_window(start, len)?;
                }
                TagId::Ret => {
                    if tag.qwc() != 0 {
                        return Err(DecodeError::ReturnWithData {
                            qwc: tag.qwc(),
                            offset: tag_offset,
                        });
                    }
                    if i != descriptor_count - 1 {
                        return Err(DecodeError::ReturnNotAtEnd {
                            index: i,
                            count: descriptor_count,
                            offset: tag_offset,
                        });
                    }
                    self.sink
                        .line(&format!("dma ret at {tag_offset:#010x}, chain ends"));
                }
                id => {
                    return Err(DecodeError::UnsupportedTag {
                        id,
                        offset: tag_offset,
                    });
                }
            }
        }

        // A chain may end without a trailing MSCAL; whatever accumulated
        // still belongs to the output.
        self.flush()?;
        Ok(self.packets)
    }

    /// Interprets the VIF code stream in `data[start..start + len]`.
    fn walk_window(&mut self, start: usize, len: usize) -> Result<()> {
        let window = &self.data[start..start + len];
        let mut pos = 0usize;
        loop {
            // Codes are word-aligned; unpack payloads are not padded.
            pos = (pos + 3) & !3;
            if pos >= window.len() {
                break;
            }
            let code_offset = start + pos;
            let code = VifCode(read_u32_le(window, pos)?);
            pos += 4;

            if let Some(unpack) = code.unpack() {
                let payload_len = unpack.payload_len();
                if payload_len > window.len() - pos {
                    return Err(DecodeError::TruncatedPayload {
                        offset: start + pos,
                        need: payload_len,
                        have: window.len() - pos,
                    });
                }
                let payload = &window[pos..pos + payload_len];
                pos += payload_len;

                let bank = buffer_bank(unpack.target);
                if let Some(bound) = self.state.as_ref().map(|state| state.buffer) {
                    if bound != bank {
                        trace!(from = bound, to = bank, "buffer bank switch");
                        self.flush()?;
                    }
                }
                let state = self.state.get_or_insert_with(|| UnpackState::new(bank));
                let channel = state.dispatch(&unpack, payload, code_offset)?;
                self.sink
                    .line(&format!("[{channel}] at {code_offset:#08x} {unpack}"));
            } else {
                match code.cmd() {
                    VIF_CMD_MSCAL => {
                        self.sink.line(&format!("mscal at {code_offset:#08x}"));
                        self.flush()?;
                    }
                    VIF_CMD_STROW => {
                        pos += STROW_PAYLOAD;
                    }
                    cmd => {
                        trace!(cmd, offset = code_offset, "ignoring control vif code");
                        self.sink
                            .line(&format!("unknown control {code} at {code_offset:#08x}"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Finalizes the live state, appending a packet if it produced one.
    fn flush(&mut self) -> Result<()> {
        if let Some(state) = self.state.take() {
            if let Some(packet) = state.into_packet(self.window_start)? {
                self.sink.line(&format!(
                    "flush: {} vertices from window {:#08x}",
                    packet.positions.len(),
                    packet.offset
                ));
                self.packets.push(packet);
            }
        }
        Ok(())
    }
}
