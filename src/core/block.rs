// This file defines what a block is on my ledger and how one gets mined
// A block bundles finalized transactions, points at its predecessor by hash,
// and carries the nonce and difficulty that prove the work behind it

use crate::core::proof_of_work::{check_difficulty, MAX_NONCE};
use crate::core::{ProofOfWork, Transaction};
use crate::error::{BlockchainError, Result};
use crate::utils::{current_timestamp, deserialize, serialize, sha256_digest};
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};

/// A mined block. There are no setters: once `mine` returns, the block is final.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Block {
    index: i64,
    timestamp: i64,
    transactions: Vec<Transaction>,
    pre_block_hash: Vec<u8>, // empty for genesis
    hash: Vec<u8>,
    nonce: i64,
    difficulty: u32, // leading zero bits this block was mined under
}

impl Block {
    /// Mine a block on top of `predecessor`.
    pub fn new_block(
        transactions: &[Transaction],
        predecessor: &Block,
        difficulty: u32,
    ) -> Result<Block> {
        Self::new_block_within(transactions, predecessor, difficulty, MAX_NONCE)
    }

    pub(crate) fn new_block_within(
        transactions: &[Transaction],
        predecessor: &Block,
        difficulty: u32,
        max_nonce: i64,
    ) -> Result<Block> {
        let index = predecessor.index.checked_add(1).ok_or_else(|| {
            BlockchainError::InvalidBlock("Block index overflow".to_string())
        })?;
        Self::mine(
            index,
            predecessor.hash.clone(),
            transactions,
            difficulty,
            max_nonce,
        )
    }

    /// Mine the first block of a ledger around its coinbase.
    pub fn generate_genesis_block(coinbase: &Transaction, difficulty: u32) -> Result<Block> {
        Self::generate_genesis_block_within(coinbase, difficulty, MAX_NONCE)
    }

    pub(crate) fn generate_genesis_block_within(
        coinbase: &Transaction,
        difficulty: u32,
        max_nonce: i64,
    ) -> Result<Block> {
        if !coinbase.is_coinbase() {
            return Err(BlockchainError::InvalidBlock(
                "Genesis block must hold a coinbase transaction".to_string(),
            ));
        }
        Self::mine(
            0,
            vec![],
            std::slice::from_ref(coinbase),
            difficulty,
            max_nonce,
        )
    }

    fn mine(
        index: i64,
        pre_block_hash: Vec<u8>,
        transactions: &[Transaction],
        difficulty: u32,
        max_nonce: i64,
    ) -> Result<Block> {
        if transactions.is_empty() {
            return Err(BlockchainError::InvalidBlock(
                "Block must contain at least one transaction".to_string(),
            ));
        }
        if let Some(tx) = transactions.iter().find(|tx| tx.get_id().is_empty()) {
            return Err(BlockchainError::InvalidBlock(format!(
                "Transaction with {} inputs has not been finalized",
                tx.get_vin().len()
            )));
        }
        check_difficulty(difficulty)?;

        let mut block = Block {
            index,
            timestamp: current_timestamp()?,
            transactions: transactions.to_vec(),
            pre_block_hash,
            hash: vec![],
            nonce: 0,
            difficulty,
        };

        let (nonce, hash) = ProofOfWork::new_proof_of_work(&block)?
            .with_max_nonce(max_nonce)
            .run()?;
        block.nonce = nonce;
        block.hash = hash;
        Ok(block)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Block> {
        deserialize::<Block>(bytes)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    pub fn get_index(&self) -> i64 {
        self.index
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_pre_block_hash(&self) -> &[u8] {
        self.pre_block_hash.as_slice()
    }

    pub fn get_hash(&self) -> &[u8] {
        self.hash.as_slice()
    }

    pub fn get_hash_hex(&self) -> String {
        HEXLOWER.encode(self.hash.as_slice())
    }

    pub fn get_nonce(&self) -> i64 {
        self.nonce
    }

    pub fn get_difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn is_genesis(&self) -> bool {
        self.pre_block_hash.is_empty()
    }

    /// One hash over every transaction ID in block order.
    pub fn hash_transactions(&self) -> Vec<u8> {
        let mut txhashs = vec![];
        for transaction in &self.transactions {
            txhashs.extend(transaction.get_id());
        }

        sha256_digest(txhashs.as_slice())
    }

    /// Create an unmined block (for testing only)
    #[cfg(test)]
    pub fn new_test_block(
        transactions: Vec<Transaction>,
        pre_block_hash: Vec<u8>,
        index: i64,
        difficulty: u32,
    ) -> Block {
        Block {
            index,
            timestamp: 0,
            transactions,
            pre_block_hash,
            hash: vec![],
            nonce: 0,
            difficulty,
        }
    }
}
