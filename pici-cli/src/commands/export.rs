use std::path::PathBuf;

use clap::Args;
use pici::confirm::require;
use pici::{ImageDescriptor, ImageTransfer, SystemRunner};

/// Default output file name in the distribution folder.
const EXPORT_FILE_NAME: &str = "export.img";

const UNMOUNTED_PROMPT: &str =
    "The shared volume has not been mounted, do you want to continue exporting?";

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Minimize the image before exporting
    #[arg(short, long)]
    pub shrink: bool,

    /// Image to export (default: the image in the distribution folder)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Raw output file (default: export.img in the distribution folder)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn execute(args: ExportArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let layout = global.layout();
    let confirm = super::confirmer(args.yes);
    // An explicit input and output may live outside the volume.
    if let Err(e) = layout.require_volume() {
        tracing::warn!("{}", e);
        require(confirm, UNMOUNTED_PROMPT, Some(true))?;
    }

    let input = args.input.unwrap_or_else(|| layout.image_path());
    let output = args
        .output
        .unwrap_or_else(|| layout.dist_dir().join(EXPORT_FILE_NAME));

    let runner = SystemRunner::new();
    ImageTransfer::new(&runner, confirm).export(
        &ImageDescriptor::qcow2(input),
        &output,
        args.shrink,
    )?;
    println!("{}", output.display());
    Ok(())
}
