//! Error taxonomy for image operations.
//!
//! Every error is raised where it is detected and propagated with `?` to the
//! command-line boundary. Nothing in the library retries.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::units::ByteSize;

pub type PiciResult<T> = Result<T, PiciError>;

#[derive(Debug, Error)]
pub enum PiciError {
    /// The persistent volume (dist directory) is not mounted.
    #[error("no volume mounted at '{}'", .0.display())]
    MissingVolume(PathBuf),

    /// The operation needs an image that does not exist.
    #[error("no image found at '{}'", .0.display())]
    MissingImage(PathBuf),

    /// Requested capacity is below what the filesystem already occupies.
    #[error("target {target} is smaller than the current filesystem size {current}")]
    TargetTooSmall { current: ByteSize, target: ByteSize },

    /// Requested capacity exceeds the largest virtual disk tier.
    #[error("target {target} exceeds the largest supported disk size {largest}")]
    UnsupportedTarget { target: ByteSize, largest: ByteSize },

    /// Observed sizes violate the expected ordering.
    #[error(
        "virtual disk size {virtual_size} is already larger than the {tier} tier chosen for this target"
    )]
    InconsistentState {
        virtual_size: ByteSize,
        tier: ByteSize,
    },

    /// The image's occupied extent does not fit on the target device.
    #[error("image needs {occupied} but the device only holds {device}")]
    ImageTooLarge { occupied: ByteSize, device: ByteSize },

    /// An external tool exited non-zero or produced unusable output.
    #[error("`{command}` failed{}: {diagnostic}", exit_suffix(.status))]
    ExternalTool {
        command: String,
        status: Option<i32>,
        diagnostic: String,
    },

    /// A resize step failed; no further steps were run.
    #[error("step '{step}' failed: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: Box<PiciError>,
    },

    /// The user answered a confirmation prompt negatively.
    #[error("aborted by user")]
    UserDeclined,

    /// A size literal could not be parsed.
    #[error("invalid size '{0}' (expected e.g. 4096, 512M, 8G or 2048s)")]
    InvalidSize(String),

    /// SIGINT arrived during or before an external tool run.
    #[error("interrupted by SIGINT")]
    Interrupted,

    /// Local filesystem error.
    #[error("io: {0}")]
    Io(#[from] io::Error),
}

fn exit_suffix(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!(" with exit code {}", code),
        None => String::new(),
    }
}

impl PiciError {
    /// Build an [`PiciError::ExternalTool`] for output that could not be parsed.
    pub fn unparseable(command: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ExternalTool {
            command: command.into(),
            status: None,
            diagnostic: detail.into(),
        }
    }

    /// True for the negative-confirmation outcome, which is a clean exit.
    pub fn is_user_declined(&self) -> bool {
        matches!(self, PiciError::UserDeclined)
    }
}
