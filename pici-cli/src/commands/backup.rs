use std::path::PathBuf;

use clap::Args;
use pici::{ImageTransfer, SystemRunner};

#[derive(Args, Debug)]
pub struct BackupArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Storage device to read from
    #[arg(short, long, env = "STORAGE_PATH", default_value = "/dev/mmcblk0")]
    pub storage: PathBuf,
}

pub fn execute(args: BackupArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let layout = global.layout();
    layout.require_volume()?;

    let runner = SystemRunner::new();
    ImageTransfer::new(&runner, super::confirmer(args.yes))
        .backup(&args.storage, &layout.image())?;
    Ok(())
}
