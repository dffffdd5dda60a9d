use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pici::DistLayout;

use crate::commands::{backup, export, flash, init, resize, start};

#[derive(Parser, Debug)]
#[command(name = "pici", version, about = "Run and manage a Raspberry Pi emulator image")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalFlags,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provide the base files in the distribution folder
    Init,

    /// Start the emulator
    Start(start::StartArgs),

    /// Grow the image to a size or to the size of a storage device
    Resize(resize::ResizeArgs),

    /// Write the image to a storage device
    Flash(flash::FlashArgs),

    /// Convert the image to a raw file
    Export(export::ExportArgs),

    /// Read a storage device back into the image
    Backup(backup::BackupArgs),
}

/// Flags and environment shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalFlags {
    /// Show debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Distribution folder (persistent volume)
    #[arg(short = 'd', long = "dist", env = "DIST_DIR", default_value = "/dist", global = true)]
    pub dist_dir: PathBuf,

    /// Folder with the default files
    #[arg(long, env = "BASE_DIR", default_value = "/base", global = true, hide = true)]
    pub base_dir: PathBuf,

    #[arg(
        long,
        env = "IMAGE_FILE_NAME",
        default_value = "distro.qcow2",
        global = true,
        hide = true
    )]
    pub image_file_name: String,

    #[arg(
        long,
        env = "KERNEL_FILE_NAME",
        default_value = "kernel.img",
        global = true,
        hide = true
    )]
    pub kernel_file_name: String,

    #[arg(long, env = "DTB_FILE_NAME", global = true, hide = true)]
    pub dtb_file_name: Option<String>,
}

impl GlobalFlags {
    pub fn layout(&self) -> DistLayout {
        self.layout_with_image(&self.image_file_name)
    }

    pub fn layout_with_image(&self, image_file_name: &str) -> DistLayout {
        let layout = DistLayout::new(
            &self.dist_dir,
            &self.base_dir,
            image_file_name,
            &self.kernel_file_name,
        );
        match &self.dtb_file_name {
            Some(dtb) => layout.with_dtb(dtb),
            None => layout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resize() {
        let cli = Cli::try_parse_from(["pici", "resize", "-y", "-d", "/tmp/d", "16G"]).unwrap();
        assert_eq!(cli.global.dist_dir, PathBuf::from("/tmp/d"));
        match cli.command {
            Commands::Resize(args) => {
                assert!(args.yes);
                assert!(!args.dry_run);
                assert_eq!(args.target, "16G");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_export_short_flags() {
        let cli = Cli::try_parse_from(["pici", "export", "-s", "-o", "/tmp/out.img"]).unwrap();
        match cli.command {
            Commands::Export(args) => {
                assert!(args.shrink);
                assert_eq!(args.output, Some(PathBuf::from("/tmp/out.img")));
                assert_eq!(args.input, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_layout_paths() {
        let cli = Cli::try_parse_from([
            "pici",
            "--dist",
            "/vol",
            "--image-file-name",
            "pi.qcow2",
            "init",
        ])
        .unwrap();
        assert_eq!(
            cli.global.layout().image_path(),
            PathBuf::from("/vol/pi.qcow2")
        );
    }
}
