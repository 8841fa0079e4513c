//! Deterministic JSON serialization for the credential and settings files.
//!
//! Keys sorted (via `BTreeMap`), 2-space indentation, trailing newline.

mod json;

pub use json::*;
