//! Growth plan execution.

use pici_shared::ByteSize;
use pici_shared::errors::{PiciError, PiciResult};

use crate::confirm::{self, Confirm};
use crate::disk::{ImageDescriptor, guestfish, qemu_img};
use crate::oracle::SizeOracle;
use crate::planner::{self, GrowthPlan, GrowthStep};
use crate::runner::{CommandRunner, ToolCommand};
use crate::target::TargetSpec;

const RESIZE_PROMPT: &str = "Resizing can damage the image, make sure to make a backup. Continue?";

/// Runs the steps of a [`GrowthPlan`] against one image.
pub struct ResizeOrchestrator<'a> {
    runner: &'a dyn CommandRunner,
    confirm: &'a dyn Confirm,
}

impl<'a> ResizeOrchestrator<'a> {
    pub fn new(runner: &'a dyn CommandRunner, confirm: &'a dyn Confirm) -> Self {
        Self { runner, confirm }
    }

    /// Execute `plan` in order, stopping at the first failing step.
    ///
    /// Nothing is rolled back. A partially applied plan leaves the image in
    /// a state the planner can pick up again.
    pub fn execute(&self, plan: &GrowthPlan, image: &ImageDescriptor) -> PiciResult<()> {
        if plan.is_empty() {
            tracing::info!("Image is already the requested size");
            return Ok(());
        }

        confirm::require(self.confirm, RESIZE_PROMPT, None)?;

        for step in plan.steps() {
            tracing::info!("Running {}", step);
            self.runner
                .run(&step_command(step, image))
                .map_err(|source| PiciError::Step {
                    step: step.name(),
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }
}

fn step_command(step: &GrowthStep, image: &ImageDescriptor) -> ToolCommand {
    match step {
        GrowthStep::GrowVirtualDisk { tier } => qemu_img::resize(image, tier.size()),
        // part-resize takes the last sector inclusive.
        GrowthStep::GrowPartitionAndFilesystem { end_sector } => {
            guestfish::grow_root(image, end_sector.saturating_sub(1))
        }
    }
}

/// Grow `image` to `target`: read sizes, plan, confirm, execute, verify.
///
/// Returns the executed plan.
pub fn resize_image(
    runner: &dyn CommandRunner,
    confirm: &dyn Confirm,
    image: &ImageDescriptor,
    target: &TargetSpec,
) -> PiciResult<GrowthPlan> {
    if !image.exists() {
        return Err(PiciError::MissingImage(image.path().to_path_buf()));
    }

    let oracle = SizeOracle::new(runner);
    let target = target.resolve(&oracle)?;
    let current = oracle.image_sizes(image)?;
    tracing::info!(
        "Current filesystem size: {}, virtual disk size: {}",
        current.filesystem,
        current.virtual_size
    );

    let plan = planner::plan(current.filesystem, current.virtual_size, target)?;
    ResizeOrchestrator::new(runner, confirm).execute(&plan, image)?;

    if !plan.is_empty() && !runner.is_dry_run() {
        verify(&oracle, image, plan.projected(current).filesystem)?;
    }
    Ok(plan)
}

/// Re-read the occupied size after a resize. A mismatch is only reported.
fn verify(oracle: &SizeOracle<'_>, image: &ImageDescriptor, expected: ByteSize) -> PiciResult<()> {
    let actual = oracle.filesystem_occupied_size(image)?;
    if actual == expected {
        tracing::info!("Image resized, filesystem now {}", actual);
    } else {
        tracing::warn!(
            "Filesystem reports {} after resize, expected {}",
            actual,
            expected
        );
    }
    Ok(())
}
