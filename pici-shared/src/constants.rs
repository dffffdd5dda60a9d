//! Unit and capacity constants.
//!
//! Centralized location for every fixed size the planner and the size
//! oracle agree on.

/// Binary byte units.
pub mod units {
    /// 1 KiB
    pub const KIB: u64 = 1024;

    /// 1 MiB
    pub const MIB: u64 = 1024 * KIB;

    /// 1 GiB
    pub const GIB: u64 = 1024 * MIB;

    /// 1 TiB
    pub const TIB: u64 = 1024 * GIB;
}

/// Partition table geometry.
pub mod sectors {
    /// Logical sector size used by the partition table (512 bytes)
    pub const SECTOR_SIZE: u64 = 512;

    /// Added to the inclusive `part_end` byte offset reported by guestfish
    /// to obtain the occupied extent.
    ///
    /// `occupied = part_end + 1`, the exact number of bytes from the start
    /// of the disk through the last byte of the last partition. A partition
    /// ending just before sector boundary `n` reports `n * SECTOR_SIZE`.
    pub const PART_END_TO_EXTENT: u64 = 1;
}

/// Virtual disk container capacities.
pub mod tiers {
    use super::units::GIB;

    /// Canonical container capacities, ascending.
    pub const DISK_TIERS: [u64; 7] = [
        4 * GIB,
        8 * GIB,
        16 * GIB,
        32 * GIB,
        64 * GIB,
        128 * GIB,
        256 * GIB,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers_sorted_ascending() {
        assert!(tiers::DISK_TIERS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_extent_of_partition_ending_on_boundary() {
        // Last partition occupies sectors up to and including 16777215.
        let part_end = 16_777_216 * sectors::SECTOR_SIZE - 1;
        assert_eq!(part_end + sectors::PART_END_TO_EXTENT, 8 * units::GIB);
    }
}
