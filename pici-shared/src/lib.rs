//! PI-CI shared types.
//!
//! Error taxonomy, byte sizes and the fixed unit/tier constants used by
//! both the `pici` library and the `pici` command-line tool.

pub mod constants;
pub mod errors;
pub mod units;

pub use errors::{PiciError, PiciResult};
pub use units::ByteSize;
