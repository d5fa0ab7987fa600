use thiserror::Error;

use crate::state::Channel;

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Unified error type for DMA/VIF mesh stream decoding.
///
/// Every variant is fatal to the chain being decoded: the input is a fixed
/// byte buffer, so retrying cannot change the outcome, and no partial packet
/// list is ever returned. Variants carry the absolute byte offset of the
/// offending bytes so callers can locate them in the source file.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A fixed-size read ran past the end of the buffer.
    #[error("unexpected end of data at offset {offset:#x}: need {need} bytes, have {have}")]
    UnexpectedEof {
        /// Absolute byte offset of the read.
        offset: usize,
        /// Bytes the read required.
        need: usize,
        /// Bytes actually available.
        have: usize,
    },

    /// A DMA tag id other than `ref`/`ret` appeared in the chain.
    #[error("unsupported DMA tag id {id:?} at offset {offset:#x}")]
    UnsupportedTag {
        /// The raw 3-bit tag id.
        id: crate::tag::TagId,
        /// Absolute byte offset of the descriptor.
        offset: usize,
    },

    /// A `ret` tag declared a nonzero quadword count.
    #[error("DMA ret tag with qwc {qwc} (expected 0) at offset {offset:#x}")]
    ReturnWithData {
        /// The declared quadword count.
        qwc: u32,
        /// Absolute byte offset of the descriptor.
        offset: usize,
    },

    /// A `ret` tag appeared before the final descriptor of the chain.
    #[error("DMA ret tag at descriptor {index} of {count} (must be last) at offset {offset:#x}")]
    ReturnNotAtEnd {
        /// Zero-based descriptor index of the `ret` tag.
        index: u32,
        /// Total descriptor count of the chain.
        count: u32,
        /// Absolute byte offset of the descriptor.
        offset: usize,
    },

    /// An unpack's (width, components, signedness) combination has no
    /// attribute slot in this format.
    #[error(
        "unhandled unpack at offset {offset:#x}: width {width} components {components} \
         signed {signed} target {target:#x}"
    )]
    UnhandledUnpack {
        /// Element width in bits (32/16/8/4).
        width: u8,
        /// Component count per element (1..=4).
        components: u8,
        /// Whether the unpack declared signed elements.
        signed: bool,
        /// VU memory target address (10-bit).
        target: u16,
        /// Absolute byte offset of the instruction word.
        offset: usize,
    },

    /// An attribute channel received a second payload before a flush.
    #[error("{channel} channel already present, second payload at offset {offset:#x}")]
    ChannelAlreadyPresent {
        /// The channel that was already populated.
        channel: Channel,
        /// Absolute byte offset of the offending instruction word.
        offset: usize,
    },

    /// A flush found attribute channels populated but no positions.
    #[error("attribute data without positions in window starting at offset {offset:#x}")]
    MissingPositions {
        /// Absolute byte offset of the data window being flushed.
        offset: usize,
    },

    /// A vertex-metadata block carried the last-block marker before the
    /// actual last block.
    #[error("metadata last-block marker on block {block} of {blocks}")]
    MetadataBlockCountMismatch {
        /// Zero-based index of the marked block.
        block: usize,
        /// Total block count.
        blocks: usize,
    },

    /// Summed vertex-metadata block counts do not match the position count.
    #[error("metadata covers {covered} vertices but packet has {vertices}")]
    VertexCountMismatch {
        /// Vertices covered by the metadata blocks.
        covered: usize,
        /// Vertices implied by the position array.
        vertices: usize,
    },

    /// An unpack declared more payload bytes than remain in its data window.
    #[error("truncated unpack payload at offset {offset:#x}: need {need} bytes, have {have}")]
    TruncatedPayload {
        /// Absolute byte offset of the payload start.
        offset: usize,
        /// Bytes the unpack declared.
        need: usize,
        /// Bytes remaining in the window.
        have: usize,
    },
}
