// This is my mining engine - find a nonce that pushes the block hash under the target
// The target is 2^(256 - difficulty), so every extra bit of difficulty halves it

use crate::core::Block;
use crate::error::{BlockchainError, Result};
use crate::utils::{int_to_bytes, sha256_digest};
use data_encoding::HEXLOWER;
use log::{debug, info};
use num_bigint::{BigInt, Sign};
use std::ops::ShlAssign;

pub struct ProofOfWork<'a> {
    block: &'a Block,
    target: BigInt,
    difficulty: u32,
    max_nonce: i64, // nonces tried are 0..max_nonce
}

pub(crate) const MAX_NONCE: i64 = i64::MAX;

/// Difficulty is a count of leading zero bits out of 256.
pub fn check_difficulty(difficulty: u32) -> Result<()> {
    if difficulty == 0 || difficulty > 255 {
        return Err(BlockchainError::Config(format!(
            "Difficulty must be between 1 and 255 bits, got {difficulty}"
        )));
    }
    Ok(())
}

impl<'a> ProofOfWork<'a> {
    pub fn new_proof_of_work(block: &'a Block) -> Result<ProofOfWork<'a>> {
        let difficulty = block.get_difficulty();
        check_difficulty(difficulty)?;
        let mut target = BigInt::from(1);
        target.shl_assign(256 - difficulty);
        Ok(ProofOfWork {
            block,
            target,
            difficulty,
            max_nonce: MAX_NONCE,
        })
    }

    /// Validate proof-of-work for a block using its stored nonce
    pub fn validate(block: &Block) -> bool {
        let Ok(pow) = ProofOfWork::new_proof_of_work(block) else {
            return false;
        };
        let hash = pow.compute_hash(block.get_nonce());
        pow.meets_target(&hash)
    }

    fn prepare_data(&self, nonce: i64) -> Vec<u8> {
        let pre_block_hash = self.block.get_pre_block_hash();
        let tx_hash = self.block.hash_transactions();
        let mut data_bytes = Vec::with_capacity(pre_block_hash.len() + tx_hash.len() + 16);
        data_bytes.extend(pre_block_hash);
        data_bytes.extend(tx_hash);
        data_bytes.extend(int_to_bytes(self.difficulty as i64));
        data_bytes.extend(int_to_bytes(nonce));
        data_bytes
    }

    /// The block hash this nonce would produce
    pub fn compute_hash(&self, nonce: i64) -> Vec<u8> {
        sha256_digest(self.prepare_data(nonce).as_slice())
    }

    fn meets_target(&self, hash: &[u8]) -> bool {
        BigInt::from_bytes_be(Sign::Plus, hash) < self.target
    }

    /// Stop the search after `max_nonce` attempts instead of the whole `i64` range
    pub fn with_max_nonce(mut self, max_nonce: i64) -> ProofOfWork<'a> {
        self.max_nonce = max_nonce;
        self
    }

    pub fn run(&self) -> Result<(i64, Vec<u8>)> {
        info!(
            "Mining block {} at difficulty {}",
            self.block.get_index(),
            self.difficulty
        );
        // Everything but the nonce is fixed, so build the prefix once
        let mut data = self.prepare_data(0);
        let nonce_at = data.len() - 8;

        let mut nonce = 0;
        while nonce < self.max_nonce {
            data[nonce_at..].copy_from_slice(&int_to_bytes(nonce));
            let hash = sha256_digest(data.as_slice());
            if self.meets_target(&hash) {
                debug!("Nonce {nonce} solves block {}", self.block.get_index());
                info!("Mined block hash {}", HEXLOWER.encode(hash.as_slice()));
                return Ok((nonce, hash));
            }
            nonce += 1;
        }
        Err(BlockchainError::DifficultyUnreachable {
            difficulty: self.difficulty,
        })
    }
}
