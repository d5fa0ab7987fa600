//! DMA transfer descriptors (source-chain DMAtags).
//!
//! Each descriptor occupies 16 bytes in the file. The low 8 bytes hold the
//! tag word; the upper 8 bytes are in-line transfer data slots this decoder
//! never uses.

use core::fmt;

use crate::bytes::read_u64_le;
use crate::error::Result;

/// Size of one descriptor in the file, in bytes.
pub const DMA_TAG_SIZE: usize = 16;

/// The 3-bit id field of a source-chain DMAtag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagId {
    /// Transfer qwc quadwords following the tag, then end.
    Refe,
    /// Transfer qwc quadwords following the tag, continue after them.
    Cnt,
    /// Transfer qwc quadwords following the tag, next tag at addr.
    Next,
    /// Transfer qwc quadwords from addr, continue with the next tag.
    Ref,
    /// As `Ref`, with stall control.
    Refs,
    /// As `Cnt`, pushing the return address.
    Call,
    /// Pop a return address and continue there.
    Ret,
    /// Transfer qwc quadwords following the tag, then end.
    End,
}

impl TagId {
    fn from_bits(bits: u8) -> TagId {
        match bits & 0x7 {
            0 => TagId::Refe,
            1 => TagId::Cnt,
            2 => TagId::Next,
            3 => TagId::Ref,
            4 => TagId::Refs,
            5 => TagId::Call,
            6 => TagId::Ret,
            _ => TagId::End,
        }
    }
}

/// A decoded source-chain DMAtag.
///
/// The raw word is kept so accessors stay bit-exact with the hardware layout:
/// qwc in bits 0..16, id in bits 28..31, addr in bits 32..63.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaTag(u64);

impl DmaTag {
    /// Wraps a raw 64-bit tag word.
    pub fn new(raw: u64) -> DmaTag {
        DmaTag(raw)
    }

    /// Reads the descriptor at `offset`; consumes the low 8 of its 16 bytes.
    pub fn read(buf: &[u8], offset: usize) -> Result<DmaTag> {
        read_u64_le(buf, offset).map(DmaTag)
    }

    /// Quadword count. Each quadword is 16 bytes of transfer data.
    pub fn qwc(self) -> u32 {
        (self.0 & 0xffff) as u32
    }

    /// The tag id, selecting how the transfer chains.
    pub fn id(self) -> TagId {
        TagId::from_bits((self.0 >> 28) as u8)
    }

    /// Transfer address, a byte offset relative to the chain's data base.
    pub fn addr(self) -> u32 {
        ((self.0 >> 32) & 0x7fff_ffff) as u32
    }
}

impl fmt::Display for DmaTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dmatag {:?} qwc:{:#06x} addr:{:#08x}",
            self.id(),
            self.qwc(),
            self.addr()
        )
    }
}
