//! Ledger queries over stored blocks
//!
//! The unspent output view is rebuilt from the chain on every query; nothing
//! here is persisted beyond the blocks themselves.

pub mod utxo_set;

pub use utxo_set::UTXOSet;
