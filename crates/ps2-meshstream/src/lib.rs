//! A safe decoder for PS2-era DMA/VIF mesh streams.
//!
//! 3D models in this container format store vertex geometry as hardware DMA
//! transfer chains: a run of source-chain DMAtags whose `ref` entries point
//! at windows of VIF codes. Unpack codes in those windows carry tightly
//! packed, double-buffered attribute payloads (positions, UVs, normals,
//! colors, joint metadata, bounding data) destined for VU memory banks.
//! This crate walks the chain, interprets the code stream and reconstructs
//! typed per-vertex arrays ([`Packet`]s) from the payload bytes.
//!
//! The input is treated as **untrusted**: every read is bounds-checked, and
//! any layout this decoder does not positively recognize fails fast with a
//! [`DecodeError`] instead of guessing. Decoding a chain is all-or-nothing;
//! no partial packet list is returned on error.
//!
//! The caller owns offset computation: the surrounding container format
//! (parts/groups/objects, archive I/O, the flat non-DMA model format) is out
//! of scope here. Callers supply the file bytes, the data base offset of the
//! enclosing object, and where its descriptors start.
//!
//! ```
//! # fn chain_bytes() -> Vec<u8> {
//! #     let mut data = vec![0u8; 48];
//! #     data[0..8].copy_from_slice(&(1u64 | (3u64 << 28) | (0x20u64 << 32)).to_le_bytes());
//! #     data[16..24].copy_from_slice(&(6u64 << 28).to_le_bytes());
//! #     data[32..36].copy_from_slice(&0x6d01_0000u32.to_le_bytes());
//! #     data[36] = 16;
//! #     data[44..48].copy_from_slice(&0x1400_0000u32.to_le_bytes());
//! #     data
//! # }
//! let data = chain_bytes();
//! let packets = ps2_meshstream::decode_chain(&data, 0, 0, 2)?;
//! assert_eq!(packets[0].positions[0], [1.0, 0.0, 0.0]);
//! # Ok::<(), ps2_meshstream::DecodeError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod bytes;
mod chain;
mod error;
mod packet;
mod state;
mod tag;
mod trace;
mod vif;

pub use crate::error::{DecodeError, Result};
pub use crate::packet::{
    Packet, ALPHA_OPAQUE_MIN, BOUNDARY_FLOATS, NORMAL_SCALE, POSITION_SCALE, UV_SCALE,
};
pub use crate::state::{buffer_bank, Channel, BUFFER_BANK_BASES};
pub use crate::tag::{DmaTag, TagId, DMA_TAG_SIZE};
pub use crate::trace::{BufferSink, NullSink, TraceSink};
pub use crate::vif::{Unpack, VifCode, VIF_CMD_MSCAL, VIF_CMD_STROW, VIF_CMD_UNPACK_BASE};

/// Decodes one DMA descriptor chain into vertex packets.
///
/// `descriptor_start` is the absolute byte offset of the first 16-byte
/// descriptor; `descriptor_count` descriptors are read. `base_offset` is
/// added to every `ref` tag address to locate its data window in `data`
/// (the enclosing object's data base).
///
/// Returns all packets flushed while walking the chain, in stream order.
/// Any format violation aborts the whole chain.
pub fn decode_chain(
    data: &[u8],
    base_offset: u32,
    descriptor_start: u32,
    descriptor_count: u32,
) -> Result<Vec<Packet>> {
    decode_chain_traced(
        data,
        base_offset,
        descriptor_start,
        descriptor_count,
        &mut NullSink,
    )
}

/// As [`decode_chain`], narrating progress to `sink`.
///
/// The sink receives human-readable lines (descriptor windows, unpack
/// fields, flush summaries). It has no effect on decode results.
pub fn decode_chain_traced(
    data: &[u8],
    base_offset: u32,
    descriptor_start: u32,
    descriptor_count: u32,
    sink: &mut dyn TraceSink,
) -> Result<Vec<Packet>> {
    chain::ChainDecoder::new(data, base_offset, sink).decode(descriptor_start, descriptor_count)
}
