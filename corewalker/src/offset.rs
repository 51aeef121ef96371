//! A pointer-sized unsigned integer, tagged at run time with the target
//! process's pointer width instead of being chosen at compile time (see
//! `spec.md` §9, "Template specialization over `Offset`"). All addresses,
//! sizes, and signatures in the rest of the crate are `Offset`.

use std::fmt;
use std::ops::{Add, Sub};

/// Byte order recorded in the core dump header. The dump's own endianness
/// drives signature/word reads, never the host's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

/// The pointer width of the analyzed process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Bits32,
    Bits64,
}

impl Width {
    pub fn byte_len(self) -> usize {
        match self {
            Width::Bits32 => 4,
            Width::Bits64 => 8,
        }
    }
}

/// A pointer-sized unsigned integer, runtime-tagged 32- or 64-bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Offset {
    U32(u32),
    U64(u64),
}

impl Offset {
    pub fn width(self) -> Width {
        match self {
            Offset::U32(_) => Width::Bits32,
            Offset::U64(_) => Width::Bits64,
        }
    }

    pub fn zero(width: Width) -> Self {
        match width {
            Width::Bits32 => Offset::U32(0),
            Width::Bits64 => Offset::U64(0),
        }
    }

    pub fn as_u64(self) -> u64 {
        match self {
            Offset::U32(v) => v as u64,
            Offset::U64(v) => v,
        }
    }

    pub fn as_usize(self) -> usize {
        self.as_u64() as usize
    }

    /// Reads a pointer-sized word out of `bytes` at offset 0, honoring
    /// `width` and `order`. Returns `None` if `bytes` is too short (a
    /// transient read failure per `spec.md` §7, never fatal).
    pub fn read_at(bytes: &[u8], width: Width, order: ByteOrder) -> Option<Offset> {
        let len = width.byte_len();
        if bytes.len() < len {
            return None;
        }
        match (width, order) {
            (Width::Bits32, ByteOrder::Little) => {
                let arr: [u8; 4] = bytes[..4].try_into().ok()?;
                Some(Offset::U32(u32::from_le_bytes(arr)))
            }
            (Width::Bits32, ByteOrder::Big) => {
                let arr: [u8; 4] = bytes[..4].try_into().ok()?;
                Some(Offset::U32(u32::from_be_bytes(arr)))
            }
            (Width::Bits64, ByteOrder::Little) => {
                let arr: [u8; 8] = bytes[..8].try_into().ok()?;
                Some(Offset::U64(u64::from_le_bytes(arr)))
            }
            (Width::Bits64, ByteOrder::Big) => {
                let arr: [u8; 8] = bytes[..8].try_into().ok()?;
                Some(Offset::U64(u64::from_be_bytes(arr)))
            }
        }
    }

    /// Parses a hex token as produced/consumed by the CLI surface (`spec.md`
    /// §6), with or without a leading `0x`.
    pub fn parse_hex(token: &str, width: Width) -> Option<Offset> {
        let trimmed = token.strip_prefix("0x").unwrap_or(token);
        match width {
            Width::Bits32 => u32::from_str_radix(trimmed, 16).ok().map(Offset::U32),
            Width::Bits64 => u64::from_str_radix(trimmed, 16).ok().map(Offset::U64),
        }
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.as_u64())
    }
}

impl Add<u64> for Offset {
    type Output = Offset;

    fn add(self, rhs: u64) -> Offset {
        match self {
            Offset::U32(v) => Offset::U32(v.wrapping_add(rhs as u32)),
            Offset::U64(v) => Offset::U64(v.wrapping_add(rhs)),
        }
    }
}

impl Sub for Offset {
    type Output = u64;

    fn sub(self, rhs: Offset) -> u64 {
        self.as_u64().wrapping_sub(rhs.as_u64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_word() {
        let bytes = [0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let word = Offset::read_at(&bytes, Width::Bits64, ByteOrder::Little).unwrap();
        assert_eq!(word, Offset::U64(0x10));
    }

    #[test]
    fn reads_big_endian_word() {
        let bytes = [0x00, 0x00, 0x10, 0x00];
        let word = Offset::read_at(&bytes, Width::Bits32, ByteOrder::Big).unwrap();
        assert_eq!(word, Offset::U32(0x10_00));
    }

    #[test]
    fn too_short_is_none() {
        let bytes = [0x01, 0x02];
        assert!(Offset::read_at(&bytes, Width::Bits64, ByteOrder::Little).is_none());
    }

    #[test]
    fn parses_hex_with_and_without_prefix() {
        assert_eq!(
            Offset::parse_hex("0x1000", Width::Bits64),
            Some(Offset::U64(0x1000))
        );
        assert_eq!(
            Offset::parse_hex("1000", Width::Bits64),
            Some(Offset::U64(0x1000))
        );
        assert_eq!(Offset::parse_hex("zz", Width::Bits64), None);
    }
}
