//! Capacity planning.
//!
//! Pure decision logic: given the occupied filesystem size, the container
//! size and a target, decide which growth steps are needed. No tool is run
//! here.

use std::fmt;

use pici_shared::ByteSize;
use pici_shared::constants::tiers::DISK_TIERS;
use pici_shared::errors::{PiciError, PiciResult};

/// A canonical virtual disk capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DiskTier(ByteSize);

impl DiskTier {
    /// Smallest tier strictly greater than `target`.
    pub fn for_target(target: ByteSize) -> Option<DiskTier> {
        DISK_TIERS
            .iter()
            .map(|&bytes| ByteSize::from_bytes(bytes))
            .find(|&size| size > target)
            .map(DiskTier)
    }

    pub fn largest() -> DiskTier {
        DiskTier(ByteSize::from_bytes(DISK_TIERS[DISK_TIERS.len() - 1]))
    }

    pub fn all() -> impl Iterator<Item = DiskTier> {
        DISK_TIERS
            .iter()
            .map(|&bytes| DiskTier(ByteSize::from_bytes(bytes)))
    }

    pub fn size(&self) -> ByteSize {
        self.0
    }
}

impl fmt::Display for DiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Sizes observed on an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSizes {
    /// Occupied extent of the partition layout.
    pub filesystem: ByteSize,
    /// Container capacity.
    pub virtual_size: ByteSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthStep {
    /// Grow the qcow2 container to the tier capacity.
    GrowVirtualDisk { tier: DiskTier },
    /// Move the root partition end to the exclusive sector boundary
    /// `end_sector` and grow the filesystem into it.
    GrowPartitionAndFilesystem { end_sector: u64 },
}

impl GrowthStep {
    /// Stable name used in logs and in [`PiciError::Step`].
    pub fn name(&self) -> &'static str {
        match self {
            GrowthStep::GrowVirtualDisk { .. } => "grow-virtual-disk",
            GrowthStep::GrowPartitionAndFilesystem { .. } => "grow-partition-and-filesystem",
        }
    }
}

impl fmt::Display for GrowthStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrowthStep::GrowVirtualDisk { tier } => {
                write!(f, "{} to {}", self.name(), tier)
            }
            GrowthStep::GrowPartitionAndFilesystem { end_sector } => {
                write!(
                    f,
                    "{} to {}",
                    self.name(),
                    ByteSize::from_sectors(*end_sector)
                )
            }
        }
    }
}

/// Ordered growth steps. Empty means nothing to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrowthPlan {
    steps: Vec<GrowthStep>,
}

impl GrowthPlan {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[GrowthStep] {
        &self.steps
    }

    /// Sizes the image should report once every step has succeeded.
    pub fn projected(&self, current: ImageSizes) -> ImageSizes {
        self.steps
            .iter()
            .fold(current, |mut sizes, step| {
                match step {
                    GrowthStep::GrowVirtualDisk { tier } => sizes.virtual_size = tier.size(),
                    GrowthStep::GrowPartitionAndFilesystem { end_sector } => {
                        sizes.filesystem = ByteSize::from_sectors(*end_sector)
                    }
                }
                sizes
            })
    }
}

/// Decide how to reach `target` from the current sizes.
///
/// Shrinking is never planned: a target below the occupied filesystem size
/// is rejected.
pub fn plan(
    current_filesystem: ByteSize,
    current_virtual: ByteSize,
    target: ByteSize,
) -> PiciResult<GrowthPlan> {
    if current_filesystem == target {
        tracing::debug!("Filesystem already at {}, nothing to do", target);
        return Ok(GrowthPlan::empty());
    }
    if current_filesystem > target {
        return Err(PiciError::TargetTooSmall {
            current: current_filesystem,
            target,
        });
    }

    let tier = DiskTier::for_target(target).ok_or(PiciError::UnsupportedTarget {
        target,
        largest: DiskTier::largest().size(),
    })?;

    if current_virtual > tier.size() {
        return Err(PiciError::InconsistentState {
            virtual_size: current_virtual,
            tier: tier.size(),
        });
    }

    let mut steps = Vec::with_capacity(2);
    if current_virtual < tier.size() {
        steps.push(GrowthStep::GrowVirtualDisk { tier });
    }
    steps.push(GrowthStep::GrowPartitionAndFilesystem {
        end_sector: target.sectors(),
    });

    tracing::debug!(
        "Planned {} step(s) for target {} (tier {})",
        steps.len(),
        target,
        tier
    );
    Ok(GrowthPlan { steps })
}
