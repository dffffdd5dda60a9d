//! Disk tooling constants.
//!
//! Centralized location for device names and tool parameters.

/// Guest-side layout as seen by guestfish.
pub mod guest {
    /// Whole-disk device of the single attached image
    pub const DISK_DEVICE: &str = "/dev/sda";

    /// Root partition number (`root=/dev/vda2` inside the emulator)
    pub const ROOT_PARTITION: u32 = 2;

    /// Root partition device
    pub const ROOT_DEVICE: &str = "/dev/sda2";
}

/// Raw transfer parameters.
pub mod transfer {
    /// dd block size
    pub const DD_BLOCK_SIZE: &str = "4M";
}

/// Scratch file names inside a per-operation temp directory.
pub mod scratch {
    /// Prefix for scratch directories
    pub const DIR_PREFIX: &str = "pici-";

    /// Minimized qcow2 copy used for flashing
    pub const MINIMIZED_IMAGE: &str = "minimized.qcow2";

    /// Raw stream written to a device
    pub const FLASH_RAW: &str = "flash.img";

    /// Raw stream read from a device
    pub const BACKUP_RAW: &str = "backup.img";
}
