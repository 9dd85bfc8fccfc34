//! Command line interface for the DOI registrar

pub mod args;
pub mod runner;

pub use args::{Cli, Commands};
pub use runner::run;
