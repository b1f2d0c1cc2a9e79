//! Configuration management
//!
//! Where the ledger lives, how hard blocks are to mine and how much gets logged.
//! Values come from an optional TOML file, then `LEDGER_*` environment variables,
//! then command-line flags.

pub mod settings;

pub use settings::Config;
