//! Block device capacity and raw transfers (`blockdev`, `dd`).

use std::path::Path;

use pici_shared::ByteSize;
use pici_shared::errors::{PiciError, PiciResult};

use super::ImageDescriptor;
use super::constants::transfer::DD_BLOCK_SIZE;
use crate::runner::ToolCommand;

/// Equivalent to: `blockdev --getsize64 <device>`
pub fn device_size(device: &Path) -> ToolCommand {
    ToolCommand::introspect("blockdev")
        .arg("--getsize64")
        .arg(device.to_string_lossy())
}

pub fn parse_device_size(command: &ToolCommand, output: &str) -> PiciResult<ByteSize> {
    output
        .trim()
        .parse::<u64>()
        .map(ByteSize::from_bytes)
        .map_err(|_| {
            PiciError::unparseable(
                command.command_line(),
                format!("expected a byte count, got '{}'", output.trim()),
            )
        })
}

/// Write a raw image onto a device, flushing before exit.
///
/// Equivalent to: `dd bs=4M conv=fsync status=progress if=<raw> of=<device>`
pub fn write_to_device(raw: &ImageDescriptor, device: &Path) -> ToolCommand {
    ToolCommand::mutate("dd")
        .arg(format!("bs={}", DD_BLOCK_SIZE))
        .args(["conv=fsync", "status=progress"])
        .arg(format!("if={}", raw.arg()))
        .arg(format!("of={}", device.to_string_lossy()))
        .streaming()
}

/// Read a whole device into a sparse raw file.
///
/// Equivalent to: `dd conv=sparse bs=4M status=progress if=<device> of=<raw>`
pub fn read_from_device(device: &Path, raw: &ImageDescriptor) -> ToolCommand {
    ToolCommand::mutate("dd")
        .arg("conv=sparse")
        .arg(format!("bs={}", DD_BLOCK_SIZE))
        .arg("status=progress")
        .arg(format!("if={}", device.to_string_lossy()))
        .arg(format!("of={}", raw.arg()))
        .streaming()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device_size() {
        let cmd = device_size(Path::new("/dev/mmcblk0"));
        assert_eq!(
            parse_device_size(&cmd, "31914983424\n").unwrap(),
            ByteSize::from_bytes(31914983424)
        );
        assert!(parse_device_size(&cmd, "").is_err());
        assert!(parse_device_size(&cmd, "blockdev: cannot open").is_err());
    }

    #[test]
    fn test_write_to_device() {
        let cmd = write_to_device(
            &ImageDescriptor::raw("/tmp/pici-x/flash.img"),
            Path::new("/dev/mmcblk0"),
        );
        assert_eq!(
            cmd.command_line(),
            "dd bs=4M conv=fsync status=progress if=/tmp/pici-x/flash.img of=/dev/mmcblk0"
        );
        assert!(cmd.is_streaming());
    }
}
