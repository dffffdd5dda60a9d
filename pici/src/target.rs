//! Resize targets.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use pici_shared::ByteSize;
use pici_shared::errors::{PiciError, PiciResult};

use crate::oracle::SizeOracle;

/// What the root volume should grow to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// An explicit capacity.
    Bytes(ByteSize),
    /// The capacity of a physical storage device.
    Device(PathBuf),
}

impl TargetSpec {
    /// Turn the target into a sector-aligned byte count.
    pub fn resolve(&self, oracle: &SizeOracle<'_>) -> PiciResult<ByteSize> {
        let size = match self {
            TargetSpec::Bytes(size) => *size,
            TargetSpec::Device(path) => oracle.device_size(path)?,
        };
        let aligned = size.align_down_to_sector();
        if aligned != size {
            tracing::info!("Target {} aligned down to {}", size, aligned);
        }
        Ok(aligned)
    }
}

/// Anything with a `/` is a device path, everything else a size literal.
impl FromStr for TargetSpec {
    type Err = PiciError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains('/') {
            Ok(TargetSpec::Device(PathBuf::from(s)))
        } else {
            s.parse().map(TargetSpec::Bytes)
        }
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSpec::Bytes(size) => fmt::Display::fmt(size, f),
            TargetSpec::Device(path) => write!(f, "device {}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::runner::{CommandRunner, ToolCommand};

    struct Blockdev {
        reply: &'static str,
        calls: Cell<usize>,
    }

    impl CommandRunner for Blockdev {
        fn run(&self, command: &ToolCommand) -> PiciResult<String> {
            assert_eq!(command.program(), "blockdev");
            self.calls.set(self.calls.get() + 1);
            Ok(self.reply.to_string())
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "8G".parse::<TargetSpec>().unwrap(),
            TargetSpec::Bytes(ByteSize::from_gib(8))
        );
        assert_eq!(
            "/dev/mmcblk0".parse::<TargetSpec>().unwrap(),
            TargetSpec::Device(PathBuf::from("/dev/mmcblk0"))
        );
        assert!(matches!(
            "mmcblk0".parse::<TargetSpec>(),
            Err(PiciError::InvalidSize(_))
        ));
    }

    #[test]
    fn test_resolve_bytes_skips_tools() {
        let runner = Blockdev {
            reply: "",
            calls: Cell::new(0),
        };
        let oracle = SizeOracle::new(&runner);
        let size = TargetSpec::Bytes(ByteSize::from_bytes(4096 + 100))
            .resolve(&oracle)
            .unwrap();
        assert_eq!(size.as_u64(), 4096);
        assert_eq!(runner.calls.get(), 0);
    }

    #[test]
    fn test_resolve_device() {
        let runner = Blockdev {
            reply: "31914983424\n",
            calls: Cell::new(0),
        };
        let oracle = SizeOracle::new(&runner);
        let size = TargetSpec::Device(PathBuf::from("/dev/mmcblk0"))
            .resolve(&oracle)
            .unwrap();
        assert_eq!(size.as_u64(), 31914983424);
        assert_eq!(runner.calls.get(), 1);
    }
}
