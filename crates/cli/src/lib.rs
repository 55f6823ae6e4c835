//! Command-line driver for the Cascadia family build.

pub mod bridge;
pub mod cli;
