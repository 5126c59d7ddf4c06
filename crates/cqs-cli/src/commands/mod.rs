//! CLI command implementations.

pub mod backends;
pub mod common;
pub mod cond;
pub mod solve;
pub mod version;
