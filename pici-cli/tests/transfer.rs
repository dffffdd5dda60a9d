use std::fs;

use predicates::prelude::*;

mod common;

#[test]
fn test_flash_missing_image() {
    let mut ctx = common::pici();

    ctx.cmd
        .args(["flash", "-y", "-s", "/dev/null"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no image found"));
}

#[test]
fn test_export_missing_input() {
    let mut ctx = common::pici();
    let input = ctx.dist.join("other.qcow2");

    ctx.cmd
        .args(["export", "-i"])
        .arg(&input)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no image found"));
}

#[test]
fn test_backup_overwrite_declined() {
    let mut ctx = common::pici().with_image();

    ctx.cmd
        .args(["backup", "-s", "/dev/null"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Overwrite it? [y/N]"));

    assert!(ctx.dist.join("distro.qcow2").exists());
}

#[test]
fn test_backup_overwrite_default_is_no() {
    let mut ctx = common::pici().with_image();

    ctx.cmd
        .args(["backup", "-s", "/dev/null"])
        .write_stdin("\n")
        .assert()
        .success();

    assert!(ctx.dist.join("distro.qcow2").exists());
}

#[test]
fn test_flash_prompt_repeats_until_answered() {
    let mut ctx = common::pici().with_image();

    // No default: an empty line asks again, end of input declines.
    ctx.cmd
        .args(["flash", "-s", "/dev/null"])
        .write_stdin("\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("[y/n]").count(2));
}

#[test]
fn test_export_without_volume_declined() {
    let mut ctx = common::pici();
    fs::remove_dir(&ctx.dist).unwrap();

    ctx.cmd
        .arg("export")
        .write_stdin("n\n")
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "The shared volume has not been mounted, do you want to continue exporting? [Y/n]",
        ));
}

#[test]
fn test_export_without_volume_defaults_to_continue() {
    let mut ctx = common::pici();
    fs::remove_dir(&ctx.dist).unwrap();

    // Continuing reaches the image lookup, which fails in the missing folder.
    ctx.cmd
        .arg("export")
        .write_stdin("\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no image found"));
}
