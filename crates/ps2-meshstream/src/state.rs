//! The attribute accumulator.
//!
//! Unpack payloads for one double-buffer bank are collected here, one slot
//! per attribute channel, until a flush turns the collected slices into a
//! [`Packet`](crate::Packet). Slots are write-once: a second payload for an
//! occupied channel before a flush means the stream layout does not match
//! this format, and decoding fails rather than guessing.

use core::fmt;

use crate::error::{DecodeError, Result};
use crate::vif::Unpack;

/// Start addresses (in VU quadwords) of the three double-buffer banks.
pub const BUFFER_BANK_BASES: [u16; 3] = [0, 0x155, 0x2ab];

/// Selects the 1-based bank index for an unpack target address.
pub fn buffer_bank(target: u16) -> u8 {
    BUFFER_BANK_BASES
        .iter()
        .take_while(|&&base| target >= base)
        .count() as u8
}

/// An attribute channel of the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Vertex positions (plus the per-vertex skip flag).
    Positions,
    /// Texture coordinates.
    Uv,
    /// Vertex normals.
    Normals,
    /// Vertex colors.
    Colors,
    /// Bounding-volume scalars.
    Boundaries,
    /// Per-vertex joint metadata blocks.
    VertexMeta,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Positions => "positions",
            Channel::Uv => "uv",
            Channel::Normals => "normals",
            Channel::Colors => "colors",
            Channel::Boundaries => "boundaries",
            Channel::VertexMeta => "vertex-meta",
        };
        f.write_str(name)
    }
}

/// Raw per-channel payloads for the bank currently being filled.
///
/// Payloads are borrowed from the data window; nothing is copied until the
/// assembler builds the output packet.
#[derive(Debug)]
pub struct UnpackState<'a> {
    /// 1-based bank index this state is bound to.
    pub buffer: u8,
    pub(crate) xyzw: Option<&'a [u8]>,
    pub(crate) rgba: Option<&'a [u8]>,
    pub(crate) uv: Option<&'a [u8]>,
    /// Element byte width of the uv payload: 2 or 4.
    pub(crate) uv_width: u8,
    pub(crate) norm: Option<&'a [u8]>,
    pub(crate) boundaries: Option<&'a [u8]>,
    pub(crate) vertex_meta: Option<&'a [u8]>,
}

impl<'a> UnpackState<'a> {
    /// Creates an empty state bound to `buffer`.
    pub fn new(buffer: u8) -> UnpackState<'a> {
        UnpackState {
            buffer,
            xyzw: None,
            rgba: None,
            uv: None,
            uv_width: 0,
            norm: None,
            boundaries: None,
            vertex_meta: None,
        }
    }

    /// True when no channel has received a payload yet.
    pub fn is_empty(&self) -> bool {
        self.xyzw.is_none()
            && self.rgba.is_none()
            && self.uv.is_none()
            && self.norm.is_none()
            && self.boundaries.is_none()
            && self.vertex_meta.is_none()
    }

    /// Routes an unpack payload into its attribute slot.
    ///
    /// `offset` is the absolute byte offset of the instruction word, used
    /// only for error reporting. Returns the channel that took the payload.
    pub fn dispatch(
        &mut self,
        unpack: &Unpack,
        payload: &'a [u8],
        offset: usize,
    ) -> Result<Channel> {
        let channel = match (unpack.width, unpack.signed, unpack.components) {
            (32, true, 4) => {
                // Joint metadata always lands at a bank base; anything else
                // at this shape is the bounding volume.
                if BUFFER_BANK_BASES.contains(&unpack.target) {
                    store(&mut self.vertex_meta, payload, Channel::VertexMeta, offset)?
                } else {
                    store(&mut self.boundaries, payload, Channel::Boundaries, offset)?
                }
            }
            (32, true, 2) => {
                let channel = store(&mut self.uv, payload, Channel::Uv, offset)?;
                self.uv_width = 4;
                channel
            }
            (16, true, 4) => store(&mut self.xyzw, payload, Channel::Positions, offset)?,
            (16, true, 2) => {
                let channel = store(&mut self.uv, payload, Channel::Uv, offset)?;
                self.uv_width = 2;
                channel
            }
            (8, true, 3) => store(&mut self.norm, payload, Channel::Normals, offset)?,
            (8, false, 4) => store(&mut self.rgba, payload, Channel::Colors, offset)?,
            _ => {
                return Err(DecodeError::UnhandledUnpack {
                    width: unpack.width,
                    components: unpack.components,
                    signed: unpack.signed,
                    target: unpack.target,
                    offset,
                })
            }
        };
        Ok(channel)
    }
}

fn store<'a>(
    slot: &mut Option<&'a [u8]>,
    payload: &'a [u8],
    channel: Channel,
    offset: usize,
) -> Result<Channel> {
    if slot.is_some() {
        return Err(DecodeError::ChannelAlreadyPresent { channel, offset });
    }
    *slot = Some(payload);
    Ok(channel)
}
