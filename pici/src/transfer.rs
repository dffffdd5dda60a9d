//! Flash, export and backup pipelines.
//!
//! All intermediate files live in a scratch directory that is removed when
//! the pipeline returns, whether it succeeded or not.

use std::fs;
use std::path::Path;

use pici_shared::ByteSize;
use pici_shared::errors::{PiciError, PiciResult};
use tempfile::TempDir;

use crate::confirm::{self, Confirm};
use crate::disk::constants::scratch::{BACKUP_RAW, DIR_PREFIX, FLASH_RAW, MINIMIZED_IMAGE};
use crate::disk::{ImageDescriptor, guestfish, qemu_img, raw};
use crate::oracle::SizeOracle;
use crate::runner::CommandRunner;

const FLASH_PROMPT: &str = "Flashing will override any data on the storage device. Continue?";
const SHRINK_PROMPT: &str = "Shrinking can damage the image, make sure to make a backup. Continue?";

/// Moves images between the dist volume, raw files and block devices.
pub struct ImageTransfer<'a> {
    runner: &'a dyn CommandRunner,
    confirm: &'a dyn Confirm,
}

impl<'a> ImageTransfer<'a> {
    pub fn new(runner: &'a dyn CommandRunner, confirm: &'a dyn Confirm) -> Self {
        Self { runner, confirm }
    }

    fn oracle(&self) -> SizeOracle<'a> {
        SizeOracle::new(self.runner)
    }

    /// Write `image` onto `device`.
    ///
    /// A minimized copy is flashed, so a large container fits any device
    /// that holds the data actually in use. The image itself is not touched.
    pub fn flash(&self, image: &ImageDescriptor, device: &Path) -> PiciResult<()> {
        require_image(image)?;
        confirm::require(self.confirm, FLASH_PROMPT, None)?;

        let scratch = scratch_dir()?;
        let copy = ImageDescriptor::qcow2(scratch.path().join(MINIMIZED_IMAGE));
        tracing::info!("Copying {} to scratch space", image.path().display());
        self.runner.run(&qemu_img::convert(image, &copy))?;

        let occupied = self.minimize(&copy)?;
        let capacity = self.oracle().device_size(device)?;
        if occupied > capacity {
            return Err(PiciError::ImageTooLarge {
                occupied,
                device: capacity,
            });
        }
        tracing::info!(
            "Image needs {}, {} holds {}",
            occupied,
            device.display(),
            capacity
        );

        let flat = ImageDescriptor::raw(scratch.path().join(FLASH_RAW));
        self.runner.run(&qemu_img::convert(&copy, &flat))?;
        tracing::info!("Flashing {}", device.display());
        self.runner.run(&raw::write_to_device(&flat, device))?;
        tracing::info!("Flashed image to {}", device.display());
        Ok(())
    }

    /// Convert `image` to a raw file at `output`, optionally minimizing the
    /// image in place first.
    pub fn export(
        &self,
        image: &ImageDescriptor,
        output: &Path,
        shrink_first: bool,
    ) -> PiciResult<()> {
        require_image(image)?;
        if shrink_first {
            confirm::require(self.confirm, SHRINK_PROMPT, None)?;
            self.minimize(image)?;
        }

        tracing::info!("Exporting {} to {}", image.path().display(), output.display());
        self.runner
            .run(&qemu_img::convert(image, &ImageDescriptor::raw(output)))?;
        tracing::info!("Exported image to {}", output.display());
        Ok(())
    }

    /// Read `device` back into a qcow2 image at `dest`.
    ///
    /// An existing `dest` is only removed after the overwrite is confirmed.
    /// It stays removed if the copy fails afterwards.
    pub fn backup(&self, device: &Path, dest: &ImageDescriptor) -> PiciResult<()> {
        if dest.exists() {
            let prompt = format!(
                "An image already exists at {}. Overwrite it?",
                dest.path().display()
            );
            confirm::require(self.confirm, &prompt, Some(false))?;
            tracing::debug!("Removing {}", dest.path().display());
            fs::remove_file(dest.path())?;
        }

        let scratch = scratch_dir()?;
        let flat = ImageDescriptor::raw(scratch.path().join(BACKUP_RAW));
        tracing::info!("Reading {}", device.display());
        self.runner.run(&raw::read_from_device(device, &flat))?;
        self.runner.run(&qemu_img::convert(&flat, dest))?;
        tracing::info!("Backed up {} to {}", device.display(), dest.path().display());
        Ok(())
    }

    /// Shrink the root filesystem, its partition and the container to the
    /// smallest size that holds the data. Returns the new occupied extent.
    pub fn minimize(&self, image: &ImageDescriptor) -> PiciResult<ByteSize> {
        let oracle = self.oracle();

        tracing::info!("Shrinking filesystem of {}", image.path().display());
        self.runner.run(&guestfish::shrink_root_filesystem(image))?;

        let extent = oracle.filesystem_block_extent(image)?;
        let start = oracle.partition_start(image)?;
        let end = start.checked_add(extent).ok_or_else(|| {
            PiciError::unparseable(
                guestfish::tune2fs_l(image).command_line(),
                format!("filesystem extent {} overflows at offset {}", extent, start),
            )
        })?;
        // Exclusive end sector; part-resize wants the last one.
        let end_sector = end.sectors_ceil();
        self.runner
            .run(&guestfish::resize_root_partition(image, end_sector.saturating_sub(1)))?;

        let occupied = oracle.filesystem_occupied_size(image)?;
        self.runner.run(&qemu_img::shrink(image, occupied))?;
        tracing::info!("Minimized {} to {}", image.path().display(), occupied);
        Ok(occupied)
    }
}

fn require_image(image: &ImageDescriptor) -> PiciResult<()> {
    if image.exists() {
        Ok(())
    } else {
        Err(PiciError::MissingImage(image.path().to_path_buf()))
    }
}

fn scratch_dir() -> PiciResult<TempDir> {
    let dir = tempfile::Builder::new().prefix(DIR_PREFIX).tempdir()?;
    tracing::debug!("Scratch directory: {}", dir.path().display());
    Ok(dir)
}
