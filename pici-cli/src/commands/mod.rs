pub mod backup;
pub mod export;
pub mod flash;
pub mod init;
pub mod resize;
pub mod start;

use pici::{AssumeYes, Confirm};

use crate::confirm::StdinConfirm;

/// `-y` answers every prompt; otherwise ask on the terminal.
pub(crate) fn confirmer(yes: bool) -> &'static dyn Confirm {
    if yes {
        &AssumeYes as &dyn Confirm
    } else {
        &StdinConfirm
    }
}
