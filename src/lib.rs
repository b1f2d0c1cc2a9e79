//! # Ledger Chain - My Single-Node Proof-of-Work Ledger
//!
//! This is a small UTXO ledger: coins are minted once in a genesis block and
//! then move between addresses through transactions mined into blocks.
//! When I come back to this code, here's what I need to remember:
//!
//! ## What I Built
//! - **Chain**: append-only blocks linked by hash, stored in Sled
//! - **Proof-of-Work**: SHA-256 nonce search against a 256-bit target
//! - **UTXO Model**: balances are derived by scanning the chain backwards
//! - **Authorization seam**: outputs are locked with a `Credential`, and an
//!   `Authorizer` decides who may unlock them (plain address match for now)
//!
//! ## How I Organized My Code
//! - `core/`: blocks, transactions, mining and the persistent chain
//! - `storage/`: the unspent output resolver
//! - `config/`: settings from TOML, environment and flags
//! - `utils/`: hashing, timestamps and the storage codec
//! - `cli/`: command-line parsing
//!
//! ## Key Design Decisions I Made
//! - Sled holds every block under its own hash plus one tip record
//! - Every block read is checked: the key, the stored hash and the
//!   recomputed proof-of-work hash must all agree
//! - Only the genesis block mints coins; later blocks carry transfers only
//! - The library never exits or prints; `main.rs` maps errors to exit codes

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::Config;
pub use core::{
    AddressMatch, Authorizer, Block, Blockchain, BlockchainIterator, Credential, ProofOfWork,
    TXInput, TXOutput, Transaction, DEFAULT_DIFFICULTY, SUBSIDY,
};
pub use error::{BlockchainError, Result};
pub use storage::UTXOSet;
pub use utils::{current_timestamp, sha256_digest};
