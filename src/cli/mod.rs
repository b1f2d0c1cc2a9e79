//! Command-line interface
//!
//! Argument parsing for the `ledger-chain` binary.

pub mod commands;

pub use commands::{Command, Opt};
