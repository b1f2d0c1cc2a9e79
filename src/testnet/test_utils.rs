//! Test utilities for ledger testing

use crate::core::{Block, Blockchain, Transaction};
use crate::error::Result;
use crate::storage::UTXOSet;
use tempfile::TempDir;

/// Difficulty used by tests so mining stays fast
pub const TEST_DIFFICULTY: u32 = 8;

/// Create a ledger in a temporary directory with its genesis subsidy paid to `address`
pub fn create_test_blockchain(address: &str) -> (Blockchain, TempDir) {
    let temp_dir = tempfile::tempdir().expect("temporary directory");
    let db_path = temp_dir.path().join("test_ledger");
    let blockchain = Blockchain::create_with_address(&db_path, address, TEST_DIFFICULTY)
        .expect("test ledger creation");
    (blockchain, temp_dir)
}

/// Build a transfer and mine it into a new block
pub fn send_and_mine(blockchain: &Blockchain, from: &str, to: &str, amount: u64) -> Result<Block> {
    let utxo_set = UTXOSet::new(blockchain.clone());
    let tx = Transaction::new_utxo_transaction(from, to, amount, &utxo_set)?;
    blockchain.mine_block(&[tx])
}

/// Current balance of `address`
pub fn balance_of(blockchain: &Blockchain, address: &str) -> u64 {
    UTXOSet::new(blockchain.clone())
        .get_balance(address)
        .expect("balance query")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_blockchain() {
        let (blockchain, _temp_dir) = create_test_blockchain("alice");
        assert_eq!(blockchain.get_best_height().unwrap(), 0);
        assert_eq!(blockchain.get_difficulty(), TEST_DIFFICULTY);
    }

    #[test]
    fn test_send_and_mine_moves_coins() {
        let (blockchain, _temp_dir) = create_test_blockchain("alice");
        let block = send_and_mine(&blockchain, "alice", "bob", 3).unwrap();
        assert_eq!(block.get_index(), 1);
        assert_eq!(balance_of(&blockchain, "bob"), 3);
        assert_eq!(blockchain.verify_chain().unwrap(), 2);
    }
}
