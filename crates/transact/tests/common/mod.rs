//! Test infrastructure for the transaction engine.
//!
//! This module provides reusable test utilities:
//!
//! - [`fixtures`] - Resource definitions and bundle entry builders
//! - [`harness`] - In-memory store, session, and executor fakes

#![allow(dead_code)]

pub mod fixtures;
pub mod harness;

// Re-export commonly used items
pub use fixtures::*;
pub use harness::*;
