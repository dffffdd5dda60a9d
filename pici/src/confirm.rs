//! Confirmation before destructive steps.

use pici_shared::errors::{PiciError, PiciResult};

/// Asks the operator whether to continue.
///
/// `default` is the answer for an empty reply. `None` forces an explicit
/// yes or no.
pub trait Confirm {
    fn confirm(&self, prompt: &str, default: Option<bool>) -> PiciResult<bool>;
}

impl<C: Confirm + ?Sized> Confirm for &C {
    fn confirm(&self, prompt: &str, default: Option<bool>) -> PiciResult<bool> {
        (**self).confirm(prompt, default)
    }
}

/// Answers yes to everything (`-y`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, prompt: &str, _default: Option<bool>) -> PiciResult<bool> {
        tracing::debug!("Confirmation skipped: {}", prompt);
        Ok(true)
    }
}

/// Ask and turn a negative answer into [`PiciError::UserDeclined`].
pub fn require(confirm: &dyn Confirm, prompt: &str, default: Option<bool>) -> PiciResult<()> {
    if confirm.confirm(prompt, default)? {
        Ok(())
    } else {
        Err(PiciError::UserDeclined)
    }
}

/// Interpret one line of user input.
///
/// Returns `None` when the line is not an answer and the prompt should be
/// repeated.
pub fn parse_answer(line: &str, default: Option<bool>) -> Option<bool> {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        "" => default,
        _ => None,
    }
}

/// Suffix shown after a prompt, e.g. `[y/N]`.
pub fn choices(default: Option<bool>) -> &'static str {
    match default {
        Some(true) => "[Y/n]",
        Some(false) => "[y/N]",
        None => "[y/n]",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Never;

    impl Confirm for Never {
        fn confirm(&self, _prompt: &str, _default: Option<bool>) -> PiciResult<bool> {
            Ok(false)
        }
    }

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("y\n", None), Some(true));
        assert_eq!(parse_answer(" YES ", None), Some(true));
        assert_eq!(parse_answer("n", Some(true)), Some(false));
        assert_eq!(parse_answer("", Some(false)), Some(false));
        assert_eq!(parse_answer("\n", None), None);
        assert_eq!(parse_answer("maybe", Some(true)), None);
    }

    #[test]
    fn test_require() {
        assert!(require(&AssumeYes, "go?", None).is_ok());
        assert!(matches!(
            require(&Never, "go?", None),
            Err(PiciError::UserDeclined)
        ));
    }

    #[test]
    fn test_choices() {
        assert_eq!(choices(None), "[y/n]");
        assert_eq!(choices(Some(false)), "[y/N]");
    }
}
