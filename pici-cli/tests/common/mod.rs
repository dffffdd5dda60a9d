#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use assert_cmd::Command;
use tempfile::TempDir;

/// Isolated dist and base folders for one test.
pub struct TestContext {
    pub cmd: Command,
    pub dist: PathBuf,
    pub base: PathBuf,
    _temp_dir: TempDir,
}

impl TestContext {
    /// A new command against the same folders.
    pub fn new_cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_pici"));
        cmd.timeout(Duration::from_secs(30));
        // Keep the host configuration out of the tests.
        for var in [
            "RUST_LOG",
            "DIST_DIR",
            "BASE_DIR",
            "IMAGE_FILE_NAME",
            "KERNEL_FILE_NAME",
            "DTB_FILE_NAME",
            "STORAGE_PATH",
        ] {
            cmd.env_remove(var);
        }
        cmd.env("DIST_DIR", &self.dist);
        cmd.env("BASE_DIR", &self.base);
        cmd
    }

    /// Put a placeholder image at the default location.
    pub fn with_image(self) -> Self {
        fs::write(self.dist.join("distro.qcow2"), b"QFI\xfb").expect("write image");
        self
    }
}

pub fn pici() -> TestContext {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let dist = temp_dir.path().join("dist");
    let base = temp_dir.path().join("base");
    fs::create_dir_all(&dist).expect("create dist dir");
    fs::create_dir_all(&base).expect("create base dir");

    let mut ctx = TestContext {
        cmd: Command::new(env!("CARGO_BIN_EXE_pici")),
        dist,
        base,
        _temp_dir: temp_dir,
    };
    ctx.cmd = ctx.new_cmd();
    ctx
}
