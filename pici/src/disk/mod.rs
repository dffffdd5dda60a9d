//! Disk image tooling.
//!
//! This module wraps the external tools that see inside images:
//! - `DiskFormat` / `ImageDescriptor` - which file, which container format
//! - `qemu_img` - container info, resize and format conversion
//! - `guestfish` - partition table and ext4 inspection and resizing
//! - `dd` / `blockdev` - raw device transfer and capacity

pub mod constants;
pub mod guestfish;
mod image;
pub mod qemu_img;
pub mod raw;

pub use image::{DiskFormat, ImageDescriptor};
