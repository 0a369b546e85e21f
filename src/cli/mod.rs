//! Command-line interface module.

mod args;
pub mod check;
pub mod resolve;
pub mod urls;

pub use args::{Cli, Commands};
