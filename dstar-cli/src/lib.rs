//! Command-line front end for dstar-rs

pub mod args;

pub use args::{Cli, Commands, StarveArgs};
