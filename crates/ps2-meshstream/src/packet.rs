//! Output packets and the accumulator-to-packet assembler.

use crate::bytes::read_f32_le;
use crate::error::{DecodeError, Result};
use crate::state::UnpackState;

/// Divisor for 12.4 fixed-point position components.
pub const POSITION_SCALE: f32 = 16.0;

/// Divisor for fixed-point texture coordinates (both uv element widths).
pub const UV_SCALE: f32 = 4096.0;

/// Divisor for fixed-point normal components.
pub const NORMAL_SCALE: f32 = 100.0;

/// Alpha values strictly below this render semi-transparent on the GS.
pub const ALPHA_OPAQUE_MIN: u8 = 0x80;

/// Number of bounding-volume scalars carried per packet.
pub const BOUNDARY_FLOATS: usize = 4;

/// Byte size of one vertex-metadata block.
const META_BLOCK_SIZE: usize = 16;

/// One decoded unit of vertex geometry.
///
/// All arrays are indexed by vertex. Optional channels are `None` when the
/// stream carried no payload for them; when present, `uvs`, `normals` and
/// `colors` have whatever length their own payload implied, while `joints`
/// always matches `positions`.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    /// Vertex positions.
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex strip-skip flag (degenerate vertices in tristrips).
    pub skip: Vec<bool>,
    /// Texture coordinates.
    pub uvs: Option<Vec<[f32; 2]>>,
    /// Unit-ish normals (fixed-point, not renormalized).
    pub normals: Option<Vec<[f32; 3]>>,
    /// RGBA vertex colors, 0..=255 per component.
    pub colors: Option<Vec<[u8; 4]>>,
    /// True iff any decoded alpha is below [`ALPHA_OPAQUE_MIN`].
    pub has_transparency: bool,
    /// Primary joint index per vertex.
    pub joints: Option<Vec<u16>>,
    /// Secondary joint index per vertex (second weight set), when the
    /// metadata declares one.
    pub joints2: Option<Vec<u16>>,
    /// Bounding-volume scalars.
    pub boundaries: Option<[f32; BOUNDARY_FLOATS]>,
    /// Raw vertex-metadata bytes, retained verbatim for downstream tooling.
    pub vertex_meta: Option<Vec<u8>>,
    /// Absolute byte offset of the data window this packet came from.
    pub offset: u32,
}

impl<'a> UnpackState<'a> {
    /// Consumes the accumulator, producing a packet.
    ///
    /// An entirely empty state yields `Ok(None)`: flushing nothing is normal
    /// (for example at the first buffer switch of a window). A state with
    /// attribute payloads but no positions is corrupt input.
    pub fn into_packet(self, window_offset: u32) -> Result<Option<Packet>> {
        let Some(xyzw) = self.xyzw else {
            if self.is_empty() {
                return Ok(None);
            }
            return Err(DecodeError::MissingPositions {
                offset: window_offset as usize,
            });
        };

        let vertices = xyzw.len() / 8;
        let mut positions = Vec::with_capacity(vertices);
        let mut skip = Vec::with_capacity(vertices);
        for rec in xyzw.chunks_exact(8) {
            positions.push([
                i16::from_le_bytes([rec[0], rec[1]]) as f32 / POSITION_SCALE,
                i16::from_le_bytes([rec[2], rec[3]]) as f32 / POSITION_SCALE,
                i16::from_le_bytes([rec[4], rec[5]]) as f32 / POSITION_SCALE,
            ]);
            skip.push(rec[7] & 0x80 != 0);
        }

        let uvs = self.uv.map(|uv| decode_uvs(uv, self.uv_width));

        let normals = self.norm.map(|norm| {
            norm.chunks_exact(3)
                .map(|rec| {
                    [
                        rec[0] as i8 as f32 / NORMAL_SCALE,
                        rec[1] as i8 as f32 / NORMAL_SCALE,
                        rec[2] as i8 as f32 / NORMAL_SCALE,
                    ]
                })
                .collect::<Vec<_>>()
        });

        let colors = self.rgba.map(|rgba| {
            rgba.chunks_exact(4)
                .map(|rec| [rec[0], rec[1], rec[2], rec[3]])
                .collect::<Vec<_>>()
        });
        let has_transparency = colors
            .as_deref()
            .is_some_and(|colors| colors.iter().any(|c| c[3] < ALPHA_OPAQUE_MIN));

        let boundaries = match self.boundaries {
            Some(raw) => {
                let mut out = [0f32; BOUNDARY_FLOATS];
                for (i, slot) in out.iter_mut().enumerate() {
                    *slot = read_f32_le(raw, i * 4)?;
                }
                Some(out)
            }
            None => None,
        };

        let (joints, joints2) = match self.vertex_meta {
            Some(meta) => decode_joints(meta, vertices)?,
            None => (None, None),
        };

        Ok(Some(Packet {
            positions,
            skip,
            uvs,
            normals,
            colors,
            has_transparency,
            joints,
            joints2,
            boundaries,
            vertex_meta: self.vertex_meta.map(<[u8]>::to_vec),
            offset: window_offset,
        }))
    }
}

fn decode_uvs(uv: &[u8], uv_width: u8) -> Vec<[f32; 2]> {
    match uv_width {
        4 => uv
            .chunks_exact(8)
            .map(|rec| {
                [
                    i32::from_le_bytes([rec[0], rec[1], rec[2], rec[3]]) as f32 / UV_SCALE,
                    i32::from_le_bytes([rec[4], rec[5], rec[6], rec[7]]) as f32 / UV_SCALE,
                ]
            })
            .collect(),
        _ => uv
            .chunks_exact(4)
            .map(|rec| {
                [
                    i16::from_le_bytes([rec[0], rec[1]]) as f32 / UV_SCALE,
                    i16::from_le_bytes([rec[2], rec[3]]) as f32 / UV_SCALE,
                ]
            })
            .collect(),
    }
}

/// Decodes per-vertex joint indices from the 16-byte metadata blocks.
///
/// Block layout (observed, not documented): byte 0 is the number of vertices
/// the block covers, byte 13's upper 4 bits are the primary joint index,
/// byte 12's upper 6 bits the secondary one. Byte 1 bit 0x80 marks the last
/// block. A secondary joint set exists only when the first block's byte 4
/// equals 4; this is empirical and deliberately not generalized.
fn decode_joints(
    meta: &[u8],
    vertices: usize,
) -> Result<(Option<Vec<u16>>, Option<Vec<u16>>)> {
    let blocks = meta.len() / META_BLOCK_SIZE;
    let mut joints = vec![0u16; vertices];
    let mut joints2: Option<Vec<u16>> = None;

    let mut cursor = 0usize;
    for (i, block) in meta.chunks_exact(META_BLOCK_SIZE).enumerate() {
        if i == 0 && block[4] == 4 {
            joints2 = Some(vec![0u16; vertices]);
        }

        let covered = block[0] as usize;
        if cursor + covered > vertices {
            return Err(DecodeError::VertexCountMismatch {
                covered: cursor + covered,
                vertices,
            });
        }

        for slot in &mut joints[cursor..cursor + covered] {
            *slot = (block[13] >> 4) as u16;
        }
        if let Some(joints2) = joints2.as_mut() {
            for slot in &mut joints2[cursor..cursor + covered] {
                *slot = (block[12] >> 2) as u16;
            }
        }

        cursor += covered;

        if block[1] & 0x80 != 0 && i != blocks - 1 {
            return Err(DecodeError::MetadataBlockCountMismatch { block: i, blocks });
        }
    }

    if cursor != vertices {
        return Err(DecodeError::VertexCountMismatch {
            covered: cursor,
            vertices,
        });
    }

    Ok((Some(joints), joints2))
}
