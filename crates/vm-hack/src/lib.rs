#![allow(
    clippy::missing_errors_doc, // error conditions are documented on the error enums
    clippy::missing_panics_doc  // panics only in the test harness, on malformed test programs
)]

pub mod error;
pub mod hack;
pub mod translate;
pub mod vm;

/// Test harness module for writing unit and integration tests.
///
/// Only available when running tests or when the `test-harness` feature
/// is enabled.
#[cfg(any(test, feature = "test-harness"))]
pub mod test_harness;

pub use error::{Error, Result};
pub use hack::{Instruction, Program};
pub use translate::{Options, SourceUnit, translate, translate_with_options};
