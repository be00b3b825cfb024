//! Shared utilities for the realign dependency alignment tool.
//!
//! This crate provides cross-cutting concerns used by all other realign
//! crates: the unified error type and Cargo-style terminal status lines.

pub mod errors;
pub mod progress;
