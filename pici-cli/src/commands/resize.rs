use clap::Args;
use pici::{SystemRunner, TargetSpec};

#[derive(Args, Debug)]
pub struct ResizeArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Print the mutating commands instead of running them
    #[arg(long)]
    pub dry_run: bool,

    /// Target size (e.g. 8G, 16GiB, 4096M) or storage device path
    pub target: String,
}

pub fn execute(args: ResizeArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let target: TargetSpec = args.target.parse()?;
    let layout = global.layout();
    layout.require_volume()?;

    let runner = if args.dry_run {
        SystemRunner::dry_run()
    } else {
        SystemRunner::new()
    };
    let confirm = super::confirmer(args.yes);

    tracing::info!("Resizing {} to {}", layout.image_path().display(), target);
    let plan = pici::resize_image(&runner, confirm, &layout.image(), &target)?;
    for step in plan.steps() {
        println!("{}", step);
    }
    Ok(())
}
