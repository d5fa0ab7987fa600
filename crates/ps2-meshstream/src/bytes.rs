//! Checked little-endian reads over a byte buffer.
//!
//! All multi-byte access in this crate goes through these helpers so that
//! malformed input surfaces as [`DecodeError::UnexpectedEof`] instead of a
//! panic or an out-of-bounds slice.

use crate::error::{DecodeError, Result};

fn take<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N]> {
    let have = buf.len().saturating_sub(offset);
    if have < N {
        return Err(DecodeError::UnexpectedEof {
            offset,
            need: N,
            have,
        });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[offset..offset + N]);
    Ok(out)
}

pub(crate) fn read_u16_le(buf: &[u8], offset: usize) -> Result<u16> {
    take::<2>(buf, offset).map(u16::from_le_bytes)
}

pub(crate) fn read_u32_le(buf: &[u8], offset: usize) -> Result<u32> {
    take::<4>(buf, offset).map(u32::from_le_bytes)
}

pub(crate) fn read_u64_le(buf: &[u8], offset: usize) -> Result<u64> {
    take::<8>(buf, offset).map(u64::from_le_bytes)
}

pub(crate) fn read_f32_le(buf: &[u8], offset: usize) -> Result<f32> {
    read_u32_le(buf, offset).map(f32::from_bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian() {
        let buf = [0x10, 0x32, 0x54, 0x76, 0x98, 0xba, 0xdc, 0xfe];
        assert_eq!(read_u16_le(&buf, 0).unwrap(), 0x3210);
        assert_eq!(read_u32_le(&buf, 2).unwrap(), 0xba987654);
        assert_eq!(read_u64_le(&buf, 0).unwrap(), 0xfedc_ba98_7654_3210);
    }

    #[test]
    fn short_read_is_an_error() {
        let buf = [0u8; 3];
        let err = read_u32_le(&buf, 1).unwrap_err();
        match err {
            DecodeError::UnexpectedEof { offset, need, have } => {
                assert_eq!((offset, need, have), (1, 4, 2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn offset_past_end_is_an_error() {
        let buf = [0u8; 4];
        assert!(read_u16_le(&buf, 100).is_err());
    }
}
