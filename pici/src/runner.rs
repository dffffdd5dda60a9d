//! External tool invocation.
//!
//! Every shell-out is described by a [`ToolCommand`] value that declares
//! whether it only inspects state or mutates it. A [`CommandRunner`]
//! executes the value. [`SystemRunner`] spawns real processes; tests plug in
//! a scripted runner instead.

use std::fmt;
use std::process::{Command, Stdio};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use pici_shared::errors::{PiciError, PiciResult};
use signal_hook::consts::SIGINT;

/// What a command does to the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    /// Read-only query (sizes, partition tables).
    Introspect,
    /// Changes an image, a device or a file.
    Mutate,
}

/// One external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    purpose: Purpose,
    streaming: bool,
}

impl ToolCommand {
    /// A read-only command whose stdout is captured.
    pub fn introspect(program: impl Into<String>) -> Self {
        Self::new(program, Purpose::Introspect)
    }

    /// A command that changes state.
    pub fn mutate(program: impl Into<String>) -> Self {
        Self::new(program, Purpose::Mutate)
    }

    fn new(program: impl Into<String>, purpose: Purpose) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            purpose,
            streaming: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Inherit stdout/stderr so progress reaches the terminal.
    ///
    /// Nothing is captured; the runner returns an empty string.
    pub fn streaming(mut self) -> Self {
        self.streaming = true;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn purpose(&self) -> Purpose {
        self.purpose
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Program and arguments joined by spaces, for logs and errors.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Executes [`ToolCommand`]s.
///
/// Implementations return captured stdout on success and
/// [`PiciError::ExternalTool`] when the process exits non-zero.
pub trait CommandRunner {
    fn run(&self, command: &ToolCommand) -> PiciResult<String>;

    /// True when [`Purpose::Mutate`] commands are skipped, so results of
    /// mutations must not be checked.
    fn is_dry_run(&self) -> bool {
        false
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, command: &ToolCommand) -> PiciResult<String> {
        (**self).run(command)
    }

    fn is_dry_run(&self) -> bool {
        (**self).is_dry_run()
    }
}

/// Runs commands as blocking child processes.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    dry_run: bool,
}

impl SystemRunner {
    pub fn new() -> Self {
        arm_interrupt();
        Self { dry_run: false }
    }

    /// Log [`Purpose::Mutate`] commands instead of running them.
    ///
    /// Introspection still runs so plans are computed from real sizes.
    pub fn dry_run() -> Self {
        arm_interrupt();
        Self { dry_run: true }
    }
}

impl CommandRunner for SystemRunner {
    fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn run(&self, command: &ToolCommand) -> PiciResult<String> {
        let interrupt = interrupt_flag()?;
        if interrupt.swap(false, Ordering::SeqCst) {
            tracing::warn!("Interrupt pending, not running \"{}\"", command);
            return Err(PiciError::Interrupted);
        }

        if self.dry_run && command.purpose() == Purpose::Mutate {
            tracing::info!("[dry-run] would run: {}", command);
            return Ok(String::new());
        }

        tracing::debug!("Running command: \"{}\"", command);

        let mut cmd = Command::new(command.program());
        cmd.args(command.arguments());
        if command.is_streaming() {
            cmd.stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
        } else {
            cmd.stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
        }

        let result = cmd.output();

        if interrupt.swap(false, Ordering::SeqCst) {
            tracing::warn!("Got interrupt, stopping process ...");
            return Err(PiciError::Interrupted);
        }

        let output = result.map_err(|e| PiciError::ExternalTool {
            command: command.command_line(),
            status: None,
            diagnostic: format!("failed to start {}: {}", command.program(), e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(PiciError::ExternalTool {
                command: command.command_line(),
                status: output.status.code(),
                diagnostic: if stderr.is_empty() {
                    "see output above".to_string()
                } else {
                    stderr
                },
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !stdout.is_empty() {
            tracing::trace!("Output: {}", stdout);
        }
        Ok(stdout)
    }
}

/// Process-wide SIGINT flag.
///
/// Children share our process group and receive the signal themselves; the
/// flag only records it so the current wait, or the next command, ends in
/// [`PiciError::Interrupted`]. A second SIGINT while the flag is still set
/// takes the default action and terminates the process.
static INTERRUPT: OnceLock<Result<Arc<AtomicBool>, (io::ErrorKind, String)>> = OnceLock::new();

fn interrupt_flag() -> PiciResult<&'static Arc<AtomicBool>> {
    INTERRUPT
        .get_or_init(|| {
            let flag = Arc::new(AtomicBool::new(false));
            signal_hook::flag::register_conditional_default(SIGINT, Arc::clone(&flag))
                .and_then(|_| signal_hook::flag::register(SIGINT, Arc::clone(&flag)))
                .map(|_| flag)
                .map_err(|e| (e.kind(), e.to_string()))
        })
        .as_ref()
        .map_err(|(kind, msg)| PiciError::Io(io::Error::new(*kind, msg.clone())))
}

fn arm_interrupt() {
    if let Err(e) = interrupt_flag() {
        tracing::warn!("Cannot catch SIGINT: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        let cmd = ToolCommand::introspect("qemu-img")
            .args(["info", "--output=json"])
            .arg("/dist/distro.qcow2");
        assert_eq!(
            cmd.command_line(),
            "qemu-img info --output=json /dist/distro.qcow2"
        );
        assert_eq!(cmd.purpose(), Purpose::Introspect);
        assert!(!cmd.is_streaming());
    }

    #[test]
    fn test_run_captures_stdout() {
        let runner = SystemRunner::new();
        let out = runner
            .run(&ToolCommand::introspect("echo").arg("hello"))
            .unwrap();
        assert_eq!(out, "hello\n");
    }

    #[test]
    fn test_run_nonzero_exit_carries_stderr() {
        let runner = SystemRunner::new();
        let err = runner
            .run(&ToolCommand::introspect("sh").args(["-c", "echo broken >&2; exit 3"]))
            .unwrap_err();
        match err {
            PiciError::ExternalTool {
                status, diagnostic, ..
            } => {
                assert_eq!(status, Some(3));
                assert_eq!(diagnostic, "broken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_run_missing_program() {
        let runner = SystemRunner::new();
        let err = runner
            .run(&ToolCommand::introspect("pici-no-such-tool-7f3a"))
            .unwrap_err();
        assert!(matches!(err, PiciError::ExternalTool { status: None, .. }));
    }

    #[test]
    fn test_dry_run_skips_mutations_only() {
        let runner = SystemRunner::dry_run();
        // Would fail if it actually ran.
        let out = runner
            .run(&ToolCommand::mutate("sh").args(["-c", "exit 1"]))
            .unwrap();
        assert!(out.is_empty());

        let out = runner
            .run(&ToolCommand::introspect("echo").arg("still runs"))
            .unwrap();
        assert_eq!(out.trim(), "still runs");
    }
}
