//! Commands for `guestfish` (libguestfs).
//!
//! guestfish boots a small appliance around the image, so the partition
//! table and the ext4 filesystem can be read and resized without mounting
//! anything on the host. Several guestfish commands are chained in one
//! session with `:` to pay for the appliance boot once.

use pici_shared::ByteSize;
use pici_shared::constants::sectors::PART_END_TO_EXTENT;
use pici_shared::errors::{PiciError, PiciResult};

use super::ImageDescriptor;
use super::constants::guest::{DISK_DEVICE, ROOT_DEVICE, ROOT_PARTITION};
use crate::runner::ToolCommand;

const GUESTFISH: &str = "guestfish";

/// One row of `part-list`. Offsets are in bytes; `end` is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionEntry {
    pub number: u32,
    pub start: u64,
    pub end: u64,
    pub size: u64,
}

impl PartitionEntry {
    /// Bytes from the start of the disk through the end of this partition.
    pub fn extent(&self) -> ByteSize {
        ByteSize::from_bytes(self.end + PART_END_TO_EXTENT)
    }
}

fn session(image: &ImageDescriptor, read_only: bool) -> ToolCommand {
    let cmd = if read_only {
        ToolCommand::introspect(GUESTFISH).arg("--ro")
    } else {
        ToolCommand::mutate(GUESTFISH)
    };
    cmd.arg(format!("--format={}", image.format().as_str()))
        .arg("-a")
        .arg(image.arg())
        .arg("run")
}

/// Equivalent to: `guestfish --ro -a <image> run : part-list /dev/sda`
pub fn part_list(image: &ImageDescriptor) -> ToolCommand {
    session(image, true).args([":", "part-list", DISK_DEVICE])
}

/// Equivalent to: `guestfish --ro -a <image> run : tune2fs-l /dev/sda2`
pub fn tune2fs_l(image: &ImageDescriptor) -> ToolCommand {
    session(image, true).args([":", "tune2fs-l", ROOT_DEVICE])
}

/// Move the root partition end to `last_sector` (inclusive), then check
/// and grow the filesystem to fill it.
pub fn grow_root(image: &ImageDescriptor, last_sector: u64) -> ToolCommand {
    session(image, false)
        .args([":", "part-resize", DISK_DEVICE])
        .arg(ROOT_PARTITION.to_string())
        .arg(last_sector.to_string())
        .args([":", "e2fsck-f", ROOT_DEVICE])
        .args([":", "resize2fs", ROOT_DEVICE])
}

/// Check the root filesystem and shrink it to its minimum size.
pub fn shrink_root_filesystem(image: &ImageDescriptor) -> ToolCommand {
    session(image, false)
        .args([":", "e2fsck-f", ROOT_DEVICE])
        .args([":", "resize2fs-M", ROOT_DEVICE])
}

/// Move the root partition end to `last_sector` (inclusive).
pub fn resize_root_partition(image: &ImageDescriptor, last_sector: u64) -> ToolCommand {
    session(image, false)
        .args([":", "part-resize", DISK_DEVICE])
        .arg(ROOT_PARTITION.to_string())
        .arg(last_sector.to_string())
}

/// Parse `part-list` output:
///
/// ```text
/// [0] = {
///   part_num: 1
///   part_start: 4194304
///   part_end: 272629759
///   part_size: 268435456
/// }
/// ```
pub fn parse_part_list(command: &ToolCommand, output: &str) -> PiciResult<Vec<PartitionEntry>> {
    #[derive(Default)]
    struct Partial {
        number: Option<u32>,
        start: Option<u64>,
        end: Option<u64>,
        size: Option<u64>,
    }

    let bad = |detail: String| PiciError::unparseable(command.command_line(), detail);
    let finish = |p: Partial| -> PiciResult<PartitionEntry> {
        match (p.number, p.start, p.end, p.size) {
            (Some(number), Some(start), Some(end), Some(size)) => Ok(PartitionEntry {
                number,
                start,
                end,
                size,
            }),
            _ => Err(bad("incomplete part-list entry".to_string())),
        }
    };

    let mut entries = Vec::new();
    let mut current: Option<Partial> = None;

    for line in output.lines() {
        let Some((key, value)) = line.trim().split_once(':') else {
            continue;
        };
        let value = value.trim();
        let number = |v: &str| {
            v.parse::<u64>()
                .map_err(|_| bad(format!("invalid {} value '{}'", key.trim(), v)))
        };

        match key.trim() {
            "part_num" => {
                if let Some(done) = current.take() {
                    entries.push(finish(done)?);
                }
                let n = number(value)?;
                current = Some(Partial {
                    number: Some(n as u32),
                    ..Default::default()
                });
            }
            "part_start" => current.get_or_insert_with(Partial::default).start = Some(number(value)?),
            "part_end" => current.get_or_insert_with(Partial::default).end = Some(number(value)?),
            "part_size" => current.get_or_insert_with(Partial::default).size = Some(number(value)?),
            _ => {}
        }
    }
    if let Some(done) = current.take() {
        entries.push(finish(done)?);
    }

    if entries.is_empty() {
        return Err(bad("no partitions found".to_string()));
    }
    Ok(entries)
}

/// Parse `tune2fs-l` output into `Block count * Block size`.
pub fn parse_block_extent(command: &ToolCommand, output: &str) -> PiciResult<ByteSize> {
    let mut block_count = None;
    let mut block_size = None;

    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim() {
            "Block count" => block_count = value.trim().parse::<u64>().ok(),
            "Block size" => block_size = value.trim().parse::<u64>().ok(),
            _ => {}
        }
    }

    match (block_count, block_size) {
        (Some(count), Some(size)) => ByteSize::from_bytes(count)
            .checked_mul(size)
            .ok_or_else(|| PiciError::unparseable(command.command_line(), "block extent overflows")),
        _ => Err(PiciError::unparseable(
            command.command_line(),
            "missing 'Block count' or 'Block size'",
        )),
    }
}
