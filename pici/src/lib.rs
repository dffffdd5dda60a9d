//! PI-CI: virtual disk image management for an emulated Raspberry Pi.
//!
//! The library decides how a qcow2 image, its root partition and the ext4
//! filesystem inside it must grow to reach a target capacity, and runs the
//! external tools (`qemu-img`, `guestfish`, `blockdev`, `dd`) that carry
//! the plan out:
//! - [`SizeOracle`] - reads sizes from devices, images and filesystems
//! - [`planner`] - pure capacity planning ([`GrowthPlan`])
//! - [`ResizeOrchestrator`] - runs a plan step by step
//! - [`ImageTransfer`] - flash, export and backup pipelines
//!
//! Every tool invocation goes through a [`CommandRunner`], so each piece can
//! run against a scripted runner in tests or in dry-run mode.

pub mod confirm;
pub mod disk;
pub mod emulator;
pub mod layout;
pub mod oracle;
pub mod orchestrator;
pub mod planner;
pub mod runner;
pub mod target;
pub mod transfer;

pub use confirm::{AssumeYes, Confirm};
pub use disk::{DiskFormat, ImageDescriptor};
pub use emulator::EmulatorConfig;
pub use layout::DistLayout;
pub use oracle::SizeOracle;
pub use orchestrator::{ResizeOrchestrator, resize_image};
pub use planner::{DiskTier, GrowthPlan, GrowthStep, ImageSizes};
pub use runner::{CommandRunner, Purpose, SystemRunner, ToolCommand};
pub use target::TargetSpec;
pub use transfer::ImageTransfer;

pub use pici_shared::{ByteSize, PiciError, PiciResult};
