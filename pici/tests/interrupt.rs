//! SIGINT handling of the system runner.
//!
//! Lives in its own test binary: the signal is delivered to the whole test
//! process, so it holds a single test.

use pici::{CommandRunner, PiciError, SystemRunner, ToolCommand};
use signal_hook::consts::SIGINT;

fn succeeds(runner: &SystemRunner) -> bool {
    runner.run(&ToolCommand::introspect("true")).is_ok()
}

#[test]
fn sigint_stops_the_wait_and_the_next_command() {
    let runner = SystemRunner::new();
    assert!(succeeds(&runner));

    // Signal arrives while the child is still running.
    let err = runner
        .run(&ToolCommand::mutate("sh").args(["-c", "kill -INT $PPID; sleep 0.2"]))
        .unwrap_err();
    assert!(matches!(err, PiciError::Interrupted), "got {err:?}");

    // Cleared once reported.
    assert!(succeeds(&runner));

    // Signal arrives between two commands: the process survives and the
    // next command is refused instead of silently running.
    signal_hook::low_level::raise(SIGINT).unwrap();
    let err = runner.run(&ToolCommand::mutate("true")).unwrap_err();
    assert!(matches!(err, PiciError::Interrupted), "got {err:?}");

    assert!(succeeds(&runner));
}
