//! Test doubles for the `pici` library.
//!
//! [`ScriptedRunner`] stands in for the external tools and records every
//! command it is handed. [`ScriptedConfirm`] answers prompts with a fixed
//! answer.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use pici::{CommandRunner, Confirm, PiciError, PiciResult, ToolCommand};

enum Reply {
    Output(String),
    Failure { status: i32, diagnostic: String },
}

struct Rule {
    program: String,
    needle: String,
    reply: Reply,
    once: bool,
}

impl Rule {
    fn matches(&self, command: &ToolCommand) -> bool {
        command.program() == self.program && command.command_line().contains(&self.needle)
    }
}

/// A [`CommandRunner`] that answers from a script.
///
/// Rules are tried in the order they were added; the first rule whose
/// program matches and whose needle occurs in the command line wins.
/// Commands no rule matches succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: RefCell<Vec<Rule>>,
    calls: RefCell<Vec<ToolCommand>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, program: &str, needle: &str, reply: Reply, once: bool) {
        self.rules.borrow_mut().push(Rule {
            program: program.to_string(),
            needle: needle.to_string(),
            reply,
            once,
        });
    }

    /// Answer every matching command with `output`.
    pub fn reply(self, program: &str, needle: &str, output: impl Into<String>) -> Self {
        self.push(program, needle, Reply::Output(output.into()), false);
        self
    }

    /// Answer the next matching command with `output`, then drop the rule.
    pub fn reply_once(self, program: &str, needle: &str, output: impl Into<String>) -> Self {
        self.push(program, needle, Reply::Output(output.into()), true);
        self
    }

    /// Fail every matching command with exit `status`.
    pub fn fail(self, program: &str, needle: &str, status: i32, diagnostic: &str) -> Self {
        self.push(
            program,
            needle,
            Reply::Failure {
                status,
                diagnostic: diagnostic.to_string(),
            },
            false,
        );
        self
    }

    /// Every command run so far, in order.
    pub fn calls(&self) -> Vec<ToolCommand> {
        self.calls.borrow().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.command_line()).collect()
    }

    /// True if any command line run so far contains `needle`.
    pub fn ran(&self, needle: &str) -> bool {
        self.calls
            .borrow()
            .iter()
            .any(|c| c.command_line().contains(needle))
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &ToolCommand) -> PiciResult<String> {
        self.calls.borrow_mut().push(command.clone());

        let mut rules = self.rules.borrow_mut();
        let Some(index) = rules.iter().position(|r| r.matches(command)) else {
            return Ok(String::new());
        };

        let result = match &rules[index].reply {
            Reply::Output(out) => Ok(out.clone()),
            Reply::Failure { status, diagnostic } => Err(PiciError::ExternalTool {
                command: command.command_line(),
                status: Some(*status),
                diagnostic: diagnostic.clone(),
            }),
        };
        if rules[index].once {
            rules.remove(index);
        }
        result
    }
}

/// A [`Confirm`] with a fixed answer that records the prompts it saw.
pub struct ScriptedConfirm {
    answer: bool,
    prompts: RefCell<Vec<(String, Option<bool>)>>,
}

impl ScriptedConfirm {
    pub fn yes() -> Self {
        Self::answering(true)
    }

    pub fn no() -> Self {
        Self::answering(false)
    }

    fn answering(answer: bool) -> Self {
        Self {
            answer,
            prompts: RefCell::new(Vec::new()),
        }
    }

    /// Prompts asked so far, with the default each was asked with.
    pub fn prompts(&self) -> Vec<(String, Option<bool>)> {
        self.prompts.borrow().clone()
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&self, prompt: &str, default: Option<bool>) -> PiciResult<bool> {
        self.prompts.borrow_mut().push((prompt.to_string(), default));
        Ok(self.answer)
    }
}

/// `guestfish part-list` output for a two-partition disk whose last
/// partition ends right before byte `extent`.
pub fn part_list_output(extent: u64) -> String {
    format!(
        "[0] = {{\n  part_num: 1\n  part_start: 4194304\n  part_end: 272629759\n  part_size: 268435456\n}}\n\
         [1] = {{\n  part_num: 2\n  part_start: 272629760\n  part_end: {}\n  part_size: {}\n}}\n",
        extent - 1,
        extent - 272629760
    )
}

/// `qemu-img info --output=json` output for a qcow2 image.
pub fn image_info_output(virtual_size: u64) -> String {
    format!(r#"{{"virtual-size": {virtual_size}, "format": "qcow2", "actual-size": 1048576}}"#)
}

/// `guestfish tune2fs-l` output with the given block count and 4 KiB blocks.
pub fn tune2fs_output(block_count: u64) -> String {
    format!(
        "Filesystem volume name: rootfs\nBlock count: {block_count}\nBlock size: 4096\nFree blocks: 0\n"
    )
}

/// A placeholder image file under `dir`; enough for existence checks.
pub fn fake_image(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"QFI\xfb").expect("write placeholder image");
    path
}

/// A scratch directory for one test.
pub fn temp_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("pici-test-")
        .tempdir()
        .expect("create temp dir")
}
