//! Shared utilities for neunorm-cli
//!
//! Argument parsing helpers and input expansion, kept out of main so
//! they stay unit-testable.

pub mod parsers;
pub mod processing;

pub use parsers::{parse_export_format, parse_roi};
pub use processing::{expand_inputs, SUPPORTED_EXTENSIONS};
