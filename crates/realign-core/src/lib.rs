//! Core data types for the realign dependency alignment tool.
//!
//! This crate defines the types the alignment engine works on: module and
//! artifact coordinates, wildcard-aware override maps, the project model
//! (dependencies, managed dependencies, profiles, properties), property
//! reference helpers, the strict version compatibility policy, and the
//! alignment configuration bundle.
//!
//! This crate is intentionally free of network I/O.

/// Token that matches any group or artifact in a coordinate.
pub const WILDCARD: &str = "*";

pub mod config;
pub mod coordinate;
pub mod model;
pub mod project;
pub mod properties;
pub mod version;
pub mod wildcard;
