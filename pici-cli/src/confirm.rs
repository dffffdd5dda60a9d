use std::io::{self, BufRead, Write};

use pici::confirm::{choices, parse_answer};
use pici::{Confirm, PiciResult};

/// Asks on stderr and reads the answer from stdin.
///
/// End of input counts as "no".
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str, default: Option<bool>) -> PiciResult<bool> {
        let stdin = io::stdin();
        let mut stderr = io::stderr();
        loop {
            write!(stderr, "{} {} ", prompt, choices(default))?;
            stderr.flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                writeln!(stderr)?;
                return Ok(false);
            }
            if let Some(answer) = parse_answer(&line, default) {
                return Ok(answer);
            }
        }
    }
}
