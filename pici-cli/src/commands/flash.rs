use std::path::PathBuf;

use clap::Args;
use pici::{ImageTransfer, SystemRunner};

#[derive(Args, Debug)]
pub struct FlashArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Storage device to write to
    #[arg(short, long, env = "STORAGE_PATH", default_value = "/dev/mmcblk0")]
    pub storage: PathBuf,
}

pub fn execute(args: FlashArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let layout = global.layout();
    layout.require_volume()?;

    let runner = SystemRunner::new();
    ImageTransfer::new(&runner, super::confirmer(args.yes))
        .flash(&layout.image(), &args.storage)?;
    Ok(())
}
