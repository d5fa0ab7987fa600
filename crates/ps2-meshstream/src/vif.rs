//! VIF code words.
//!
//! A VIF code is a packed 32-bit instruction: a 16-bit immediate, an 8-bit
//! element count and an 8-bit command. Commands above [`VIF_CMD_UNPACK_BASE`]
//! are unpacks that carry a typed payload destined for one of the
//! double-buffered VU memory banks; everything else is a control command.

use core::fmt;

/// Commands strictly above this value are unpacks.
pub const VIF_CMD_UNPACK_BASE: u8 = 0x60;

/// MSCAL: start the loaded microprogram. The decoder treats it as the
/// end-of-buffer flush point.
pub const VIF_CMD_MSCAL: u8 = 0x14;

/// STROW: load the row register from the following 16 payload bytes. The
/// register contents do not matter to this decoder; only the payload size does.
pub const VIF_CMD_STROW: u8 = 0x30;

/// Element widths in bits, indexed by the low 2 command bits.
const UNPACK_WIDTHS: [u8; 4] = [32, 16, 8, 4];

/// A packed 32-bit VIF code word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VifCode(pub u32);

impl VifCode {
    /// The command byte.
    pub fn cmd(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// The element count (`num`).
    pub fn num(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// The 16-bit immediate.
    pub fn imm(self) -> u16 {
        self.0 as u16
    }

    /// Whether this code is a data unpack rather than a control command.
    pub fn is_unpack(self) -> bool {
        self.cmd() > VIF_CMD_UNPACK_BASE
    }

    /// Decodes the unpack view of this code, or `None` for control commands.
    pub fn unpack(self) -> Option<Unpack> {
        if !self.is_unpack() {
            return None;
        }
        let cmd = self.cmd();
        let imm = self.imm();
        Some(Unpack {
            components: ((cmd >> 2) & 0x3) + 1,
            width: UNPACK_WIDTHS[(cmd & 0x3) as usize],
            signed: (imm >> 14) & 1 == 0,
            use_tops: (imm >> 15) & 1 != 0,
            target: imm & 0x3ff,
            num: self.num(),
        })
    }
}

impl fmt::Display for VifCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vifcode cmd:{:#04x} num:{:#04x} imm:{:#06x}",
            self.cmd(),
            self.num(),
            self.imm()
        )
    }
}

/// A decoded unpack command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unpack {
    /// Components per element, 1..=4.
    pub components: u8,
    /// Element width in bits: 32, 16, 8 or 4.
    pub width: u8,
    /// Whether elements are sign-extended.
    pub signed: bool,
    /// Whether the target is relative to the double-buffer base (TOPS).
    /// Recorded for diagnostics; bank selection uses `target` directly.
    pub use_tops: bool,
    /// 10-bit VU memory target address, in quadwords.
    pub target: u16,
    /// Element count.
    pub num: u8,
}

impl Unpack {
    /// Payload size in bytes following the code word.
    pub fn payload_len(&self) -> usize {
        self.components as usize * (self.width as usize * self.num as usize / 8)
    }
}

impl fmt::Display for Unpack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unpack v{}-{} num:{:#04x} target:{:#05x} signed:{} tops:{} size:{:#x}",
            self.components,
            self.width,
            self.num,
            self.target,
            self.signed,
            self.use_tops,
            self.payload_len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(cmd: u8, num: u8, imm: u16) -> VifCode {
        VifCode(((cmd as u32) << 24) | ((num as u32) << 16) | imm as u32)
    }

    #[test]
    fn field_extraction() {
        let c = code(0x6d, 0x21, 0x1234);
        assert_eq!(c.cmd(), 0x6d);
        assert_eq!(c.num(), 0x21);
        assert_eq!(c.imm(), 0x1234);
    }

    #[test]
    fn classification() {
        assert!(code(0x6c, 1, 0).is_unpack());
        assert!(!code(VIF_CMD_UNPACK_BASE, 1, 0).is_unpack());
        assert!(!code(VIF_CMD_MSCAL, 0, 0).is_unpack());
        assert!(code(VIF_CMD_MSCAL, 0, 0).unpack().is_none());
    }

    #[test]
    fn unpack_v4_16() {
        // cmd 0x6d: components 4, width 16.
        let u = code(0x6d, 3, 0x0042).unpack().unwrap();
        assert_eq!(u.components, 4);
        assert_eq!(u.width, 16);
        assert!(u.signed);
        assert!(!u.use_tops);
        assert_eq!(u.target, 0x42);
        assert_eq!(u.payload_len(), 4 * 2 * 3);
    }

    #[test]
    fn unpack_unsigned_tops() {
        // Bit 14 set => unsigned; bit 15 set => TOPS-relative.
        let u = code(0x6e, 1, 0xc000 | 0x155).unpack().unwrap();
        assert_eq!(u.components, 4);
        assert_eq!(u.width, 8);
        assert!(!u.signed);
        assert!(u.use_tops);
        assert_eq!(u.target, 0x155);
    }

    #[test]
    fn unpack_widths() {
        assert_eq!(code(0x6c, 1, 0).unpack().unwrap().width, 32);
        assert_eq!(code(0x6d, 1, 0).unpack().unwrap().width, 16);
        assert_eq!(code(0x6e, 1, 0).unpack().unwrap().width, 8);
        assert_eq!(code(0x6f, 1, 0).unpack().unwrap().width, 4);
    }
}
