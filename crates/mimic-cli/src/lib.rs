//! # mimic-cli
//!
//! Command surface of the `mimic` binary: run a simulation, inspect and
//! validate configuration, print build info.

pub mod commands;

pub use commands::Cli;
