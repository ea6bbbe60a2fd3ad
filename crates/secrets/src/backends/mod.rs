//! Secret store implementations.

pub mod aws;
pub mod local;
