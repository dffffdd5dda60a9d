//! Commands for the `qemu-img` tool.
//!
//! Container-level operations only: the partition table and filesystem
//! inside the image are handled by [`super::guestfish`].

use serde::Deserialize;

use pici_shared::ByteSize;
use pici_shared::errors::{PiciError, PiciResult};

use super::ImageDescriptor;
use crate::runner::ToolCommand;

const QEMU_IMG: &str = "qemu-img";

/// Subset of `qemu-img info --output=json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImageInfo {
    pub virtual_size: ByteSize,
    pub format: String,
}

/// Equivalent to: `qemu-img info --output=json <image>`
pub fn info(image: &ImageDescriptor) -> ToolCommand {
    ToolCommand::introspect(QEMU_IMG)
        .args(["info", "--output=json"])
        .arg(image.arg())
}

pub fn parse_info(command: &ToolCommand, output: &str) -> PiciResult<ImageInfo> {
    serde_json::from_str(output).map_err(|e| {
        PiciError::unparseable(
            command.command_line(),
            format!("unexpected qemu-img info output: {}", e),
        )
    })
}

/// Grow the container.
///
/// Equivalent to: `qemu-img resize -f qcow2 <image> <bytes>`
pub fn resize(image: &ImageDescriptor, size: ByteSize) -> ToolCommand {
    ToolCommand::mutate(QEMU_IMG)
        .args(["resize", "-f", image.format().as_str()])
        .arg(image.arg())
        .arg(size.as_u64().to_string())
}

/// Shrink the container, discarding everything past `size`.
///
/// Equivalent to: `qemu-img resize --shrink -f qcow2 <image> <bytes>`
pub fn shrink(image: &ImageDescriptor, size: ByteSize) -> ToolCommand {
    ToolCommand::mutate(QEMU_IMG)
        .args(["resize", "--shrink", "-f", image.format().as_str()])
        .arg(image.arg())
        .arg(size.as_u64().to_string())
}

/// Convert between container formats.
///
/// Equivalent to: `qemu-img convert -p -f <src fmt> -O <dst fmt> <src> <dst>`
pub fn convert(src: &ImageDescriptor, dst: &ImageDescriptor) -> ToolCommand {
    ToolCommand::mutate(QEMU_IMG)
        .args(["convert", "-p", "-f", src.format().as_str()])
        .args(["-O", dst.format().as_str()])
        .arg(src.arg())
        .arg(dst.arg())
        .streaming()
}
