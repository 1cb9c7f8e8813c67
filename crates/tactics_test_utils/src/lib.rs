//! # Tactics Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Grid and battlefield fixtures built from ASCII layouts
//! - Determinism harness for whole matches
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
