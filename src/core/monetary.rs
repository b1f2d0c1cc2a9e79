//! Ledger monetary and consensus constants
//!
//! Values are whole coins; there is no sub-unit and no fee.

/// Coins minted by a coinbase transaction
pub const SUBSIDY: u64 = 10;

/// Leading zero bits a block hash needs unless configured otherwise
pub const DEFAULT_DIFFICULTY: u32 = 16;

/// Memo carried by the genesis coinbase input
pub const GENESIS_COINBASE_DATA: &str = "Genesis coinbase: the first coins minted on this ledger";
