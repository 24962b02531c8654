//! E2E tests for the workbook writer: build workbooks, commit them to a
//! container and walk the resulting BIFF records.

mod common;
mod writing;

// Re-export common utilities for use in submodules
pub use common::*;
