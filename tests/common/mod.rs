//! Shared test utilities for runlog integration harnesses.
//!
//! Import everything you need via `mod common; use common::*;` at the top of
//! each harness file. Every helper roots its run directory in a fresh
//! `tempfile::TempDir`, so harnesses never share a registry or a run log.

pub mod assertions;
pub mod builders;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use builders::*;
#[allow(unused_imports)]
pub use fixtures::*;
