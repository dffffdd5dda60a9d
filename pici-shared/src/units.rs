//! Exact byte counts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::sectors::SECTOR_SIZE;
use crate::constants::units::{GIB, KIB, MIB, TIB};
use crate::errors::PiciError;

/// A non-negative byte count.
///
/// All arithmetic is integer arithmetic; there is no rounding except where
/// a method says so.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ByteSize(u64);

impl ByteSize {
    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    pub const fn from_mib(mib: u64) -> Self {
        Self(mib * MIB)
    }

    pub const fn from_gib(gib: u64) -> Self {
        Self(gib * GIB)
    }

    pub const fn from_sectors(sectors: u64) -> Self {
        Self(sectors * SECTOR_SIZE)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Number of whole sectors (truncating).
    pub const fn sectors(self) -> u64 {
        self.0 / SECTOR_SIZE
    }

    /// Number of sectors needed to hold this many bytes.
    pub const fn sectors_ceil(self) -> u64 {
        self.0.div_ceil(SECTOR_SIZE)
    }

    /// Round down to a whole number of sectors.
    pub const fn align_down_to_sector(self) -> Self {
        Self(self.sectors() * SECTOR_SIZE)
    }

    pub fn checked_add(self, other: ByteSize) -> Option<ByteSize> {
        self.0.checked_add(other.0).map(ByteSize)
    }

    pub fn checked_mul(self, factor: u64) -> Option<ByteSize> {
        self.0.checked_mul(factor).map(ByteSize)
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0;
        let (unit, name) = match bytes {
            b if b >= TIB => (TIB, "TiB"),
            b if b >= GIB => (GIB, "GiB"),
            b if b >= MIB => (MIB, "MiB"),
            b if b >= KIB => (KIB, "KiB"),
            _ => return write!(f, "{} bytes", bytes),
        };
        // Two decimals without going through floating point.
        let hundredths = (bytes as u128 * 100 / unit as u128) as u64;
        write!(
            f,
            "{}.{:02} {} ({} bytes)",
            hundredths / 100,
            hundredths % 100,
            name,
            bytes
        )
    }
}

/// Parses size literals: `4294967296`, `512M`, `8G`, `8GiB`, `16gb`, `2048s`.
///
/// Suffixes are binary multiples. `s` counts 512-byte sectors.
impl FromStr for ByteSize {
    type Err = PiciError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let literal = s.trim();
        let digits_end = literal
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(literal.len());
        let (digits, suffix) = literal.split_at(digits_end);

        if digits.is_empty() {
            return Err(PiciError::InvalidSize(s.to_string()));
        }
        let value: u64 = digits
            .parse()
            .map_err(|_| PiciError::InvalidSize(s.to_string()))?;

        let multiplier = match suffix.to_ascii_lowercase().as_str() {
            "" | "b" => 1,
            "s" => SECTOR_SIZE,
            "k" | "kb" | "kib" => KIB,
            "m" | "mb" | "mib" => MIB,
            "g" | "gb" | "gib" => GIB,
            "t" | "tb" | "tib" => TIB,
            _ => return Err(PiciError::InvalidSize(s.to_string())),
        };

        value
            .checked_mul(multiplier)
            .map(ByteSize)
            .ok_or_else(|| PiciError::InvalidSize(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_bytes() {
        assert_eq!("4096".parse::<ByteSize>().unwrap().as_u64(), 4096);
    }

    #[test]
    fn test_parse_suffixes() {
        assert_eq!("512M".parse::<ByteSize>().unwrap(), ByteSize::from_mib(512));
        assert_eq!("8G".parse::<ByteSize>().unwrap(), ByteSize::from_gib(8));
        assert_eq!("8gib".parse::<ByteSize>().unwrap(), ByteSize::from_gib(8));
        assert_eq!("16GB".parse::<ByteSize>().unwrap(), ByteSize::from_gib(16));
        assert_eq!("2048s".parse::<ByteSize>().unwrap(), ByteSize::from_mib(1));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "G", "8X", "-1G", "1.5G", "/dev/sda"] {
            assert!(
                matches!(bad.parse::<ByteSize>(), Err(PiciError::InvalidSize(_))),
                "{:?} should not parse",
                bad
            );
        }
    }

    #[test]
    fn test_parse_overflow() {
        assert!("99999999999999999T".parse::<ByteSize>().is_err());
    }

    #[test]
    fn test_sector_helpers() {
        let size = ByteSize::from_bytes(1025);
        assert_eq!(size.sectors(), 2);
        assert_eq!(size.sectors_ceil(), 3);
        assert_eq!(size.align_down_to_sector().as_u64(), 1024);
    }

    #[test]
    fn test_display() {
        assert_eq!(ByteSize::from_bytes(100).to_string(), "100 bytes");
        assert_eq!(
            ByteSize::from_gib(8).to_string(),
            "8.00 GiB (8589934592 bytes)"
        );
        assert_eq!(
            ByteSize::from_mib(1536).to_string(),
            "1.50 GiB (1610612736 bytes)"
        );
    }

    #[test]
    fn test_deserialize_transparent() {
        let size: ByteSize = serde_json::from_str("4294967296").unwrap();
        assert_eq!(size, ByteSize::from_gib(4));
    }
}
