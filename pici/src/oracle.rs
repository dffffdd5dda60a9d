//! Size introspection.
//!
//! Every size the planner and the transfer pipelines compare comes from
//! here. All queries are read-only tool invocations whose text output is
//! parsed into exact byte counts.

use std::path::Path;

use pici_shared::ByteSize;
use pici_shared::errors::{PiciError, PiciResult};

use crate::disk::constants::guest::ROOT_PARTITION;
use crate::disk::guestfish::{self, PartitionEntry};
use crate::disk::{ImageDescriptor, qemu_img, raw};
use crate::planner::ImageSizes;
use crate::runner::CommandRunner;

/// Reads sizes through a [`CommandRunner`].
pub struct SizeOracle<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> SizeOracle<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Capacity of a block device.
    pub fn device_size(&self, device: &Path) -> PiciResult<ByteSize> {
        let cmd = raw::device_size(device);
        let output = self.runner.run(&cmd)?;
        let size = raw::parse_device_size(&cmd, &output)?;
        tracing::debug!("device size of {}: {}", device.display(), size);
        Ok(size)
    }

    /// Declared capacity of the virtual disk container.
    pub fn virtual_image_size(&self, image: &ImageDescriptor) -> PiciResult<ByteSize> {
        let cmd = qemu_img::info(image);
        let output = self.runner.run(&cmd)?;
        let info = qemu_img::parse_info(&cmd, &output)?;
        tracing::debug!("virtual size of {}: {}", image.path().display(), info.virtual_size);
        Ok(info.virtual_size)
    }

    /// Partition table of the image.
    pub fn partitions(&self, image: &ImageDescriptor) -> PiciResult<Vec<PartitionEntry>> {
        let cmd = guestfish::part_list(image);
        let output = self.runner.run(&cmd)?;
        guestfish::parse_part_list(&cmd, &output)
    }

    /// Bytes consumed by the partition layout: the extent of the last
    /// partition, not the container size.
    pub fn filesystem_occupied_size(&self, image: &ImageDescriptor) -> PiciResult<ByteSize> {
        let partitions = self.partitions(image)?;
        let last = partitions
            .iter()
            .max_by_key(|p| p.end)
            .ok_or_else(|| no_root(image))?;
        let size = last.extent();
        tracing::debug!("filesystem size of {}: {}", image.path().display(), size);
        Ok(size)
    }

    /// Block count times block size of the root ext4 filesystem.
    pub fn filesystem_block_extent(&self, image: &ImageDescriptor) -> PiciResult<ByteSize> {
        let cmd = guestfish::tune2fs_l(image);
        let output = self.runner.run(&cmd)?;
        let extent = guestfish::parse_block_extent(&cmd, &output)?;
        tracing::debug!("filesystem block extent of {}: {}", image.path().display(), extent);
        Ok(extent)
    }

    /// Byte offset where the root partition starts.
    pub fn partition_start(&self, image: &ImageDescriptor) -> PiciResult<ByteSize> {
        self.partitions(image)?
            .iter()
            .find(|p| p.number == ROOT_PARTITION)
            .map(|p| ByteSize::from_bytes(p.start))
            .ok_or_else(|| no_root(image))
    }

    /// Both sizes the planner needs.
    pub fn image_sizes(&self, image: &ImageDescriptor) -> PiciResult<ImageSizes> {
        Ok(ImageSizes {
            filesystem: self.filesystem_occupied_size(image)?,
            virtual_size: self.virtual_image_size(image)?,
        })
    }
}

fn no_root(image: &ImageDescriptor) -> PiciError {
    PiciError::unparseable(
        guestfish::part_list(image).command_line(),
        format!("partition {} not found", ROOT_PARTITION),
    )
}
