//! Grab bag of small utilities shared by the `omnibus` crates.

pub mod assert;
pub mod env;
