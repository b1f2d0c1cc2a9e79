// This is the ledger store - an append-only chain of blocks kept in Sled
// Every block is stored under its own hash, and one extra key points at the tip
// Reading goes backward only: tip -> predecessor -> ... -> genesis

use crate::core::proof_of_work::{check_difficulty, MAX_NONCE};
use crate::core::{
    AddressMatch, Authorizer, Block, ProofOfWork, TXOutput, Transaction, GENESIS_COINBASE_DATA,
};
use crate::error::{BlockchainError, Result};
use data_encoding::HEXLOWER;
use log::{debug, info};
use sled::{Db, Tree};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

// I use these constants to organize my database storage
const TIP_BLOCK_HASH_KEY: &str = "tip_block_hash"; // Key to store the hash of the latest block
const BLOCKS_TREE: &str = "blocks"; // Tree name for storing all blocks

// This is my handle on one ledger database
#[derive(Clone)]
pub struct Blockchain {
    tip_hash: Arc<RwLock<Vec<u8>>>, // Cached hash of the most recent block
    db: Db,                         // Keeps the database open for as long as any handle lives
    blocks: Tree,                   // hash -> block, plus the tip pointer
    db_path: PathBuf,
    difficulty: u32,                 // Difficulty new blocks are mined at
    authorizer: Arc<dyn Authorizer>, // Decides whether an input may spend an output
    max_nonce: i64,
}

impl Blockchain {
    // When I want a brand new ledger whose genesis block holds this coinbase
    pub fn create(
        db_path: impl AsRef<Path>,
        genesis_tx: Transaction,
        difficulty: u32,
    ) -> Result<Blockchain> {
        Self::create_within(db_path, genesis_tx, difficulty, MAX_NONCE)
    }

    fn create_within(
        db_path: impl AsRef<Path>,
        genesis_tx: Transaction,
        difficulty: u32,
        max_nonce: i64,
    ) -> Result<Blockchain> {
        check_difficulty(difficulty)?;
        let path = db_path.as_ref().to_path_buf();
        let (db, blocks) = Self::open_db(&path)?;

        // I refuse to overwrite a ledger that is already there
        if Self::read_tip(&blocks)?.is_some() {
            return Err(BlockchainError::AlreadyExists(path.display().to_string()));
        }

        let mut genesis_tx = genesis_tx;
        if genesis_tx.get_id().is_empty() {
            genesis_tx.finalize()?;
        }

        info!("Creating genesis block at {}", path.display());
        let genesis = Block::generate_genesis_block_within(&genesis_tx, difficulty, max_nonce)?;
        Self::update_blocks_tree(&db, &blocks, &genesis)?;
        info!("Genesis block {} written", genesis.get_hash_hex());

        Ok(Blockchain {
            tip_hash: Arc::new(RwLock::new(genesis.get_hash().to_vec())),
            db,
            blocks,
            db_path: path,
            difficulty,
            authorizer: Arc::new(AddressMatch),
            max_nonce,
        })
    }

    // When I want a new ledger that pays the genesis subsidy to an address
    pub fn create_with_address(
        db_path: impl AsRef<Path>,
        genesis_address: &str,
        difficulty: u32,
    ) -> Result<Blockchain> {
        let coinbase_tx = Transaction::new_coinbase_tx(genesis_address, GENESIS_COINBASE_DATA)?;
        Self::create(db_path, coinbase_tx, difficulty)
    }

    // When I want to open a ledger that was created earlier
    pub fn open(db_path: impl AsRef<Path>, difficulty: u32) -> Result<Blockchain> {
        check_difficulty(difficulty)?;
        let path = db_path.as_ref().to_path_buf();
        // Opening Sled would create the directory, so a missing path is checked first
        if !path.exists() {
            return Err(BlockchainError::NotFound(path.display().to_string()));
        }

        let (db, blocks) = Self::open_db(&path)?;
        let tip_hash = Self::read_tip(&blocks)?
            .ok_or_else(|| BlockchainError::NotFound(path.display().to_string()))?;

        // The tip pointer has to lead somewhere readable
        if Self::read_block(&blocks, &tip_hash)?.is_none() {
            return Err(BlockchainError::Corrupt(format!(
                "Tip points at missing block {}",
                HEXLOWER.encode(&tip_hash)
            )));
        }
        debug!("Opened ledger at {} (tip {})", path.display(), HEXLOWER.encode(&tip_hash));

        Ok(Blockchain {
            tip_hash: Arc::new(RwLock::new(tip_hash)),
            db,
            blocks,
            db_path: path,
            difficulty,
            authorizer: Arc::new(AddressMatch),
            max_nonce: MAX_NONCE,
        })
    }

    /// Replace the strategy that decides who may spend an output.
    ///
    /// Appends are checked with it, and `UTXOSet::new` resolves balances with it.
    pub fn with_authorizer(mut self, authorizer: impl Authorizer + 'static) -> Blockchain {
        self.authorizer = Arc::new(authorizer);
        self
    }

    /// Give up mining after `max_nonce` attempts (for testing only)
    #[cfg(test)]
    pub(crate) fn with_max_nonce(mut self, max_nonce: i64) -> Blockchain {
        self.max_nonce = max_nonce;
        self
    }

    fn open_db(path: &Path) -> Result<(Db, Tree)> {
        let db = sled::open(path)
            .map_err(|e| BlockchainError::Database(format!("Failed to open database: {e}")))?;
        let blocks = db
            .open_tree(BLOCKS_TREE)
            .map_err(|e| BlockchainError::Database(format!("Failed to open blocks tree: {e}")))?;
        Ok((db, blocks))
    }

    fn read_tip(blocks: &Tree) -> Result<Option<Vec<u8>>> {
        let tip = blocks
            .get(TIP_BLOCK_HASH_KEY)
            .map_err(|e| BlockchainError::Database(format!("Failed to get tip hash: {e}")))?;
        Ok(tip.map(|bytes| bytes.to_vec()))
    }

    // A stored block must sit under its own hash, and that hash must be the
    // one its contents produce
    fn read_block(blocks: &Tree, block_hash: &[u8]) -> Result<Option<Block>> {
        let Some(bytes) = blocks
            .get(block_hash)
            .map_err(|e| BlockchainError::Database(format!("Failed to get block: {e}")))?
        else {
            return Ok(None);
        };

        let block = Block::deserialize(bytes.as_ref())?;
        if block.get_hash() != block_hash {
            return Err(BlockchainError::Corrupt(format!(
                "Block stored under {} carries hash {}",
                HEXLOWER.encode(block_hash),
                block.get_hash_hex()
            )));
        }

        let pow = ProofOfWork::new_proof_of_work(&block).map_err(|e| {
            BlockchainError::Corrupt(format!("Block {}: {e}", block.get_hash_hex()))
        })?;
        if pow.compute_hash(block.get_nonce()) != block.get_hash() {
            return Err(BlockchainError::Corrupt(format!(
                "Block {} does not hash to its stored hash",
                block.get_hash_hex()
            )));
        }
        Ok(Some(block))
    }

    // Both keys go in one Sled transaction so they become visible together
    fn update_blocks_tree(db: &Db, blocks: &Tree, block: &Block) -> Result<()> {
        let block_hash = block.get_hash();
        let block_data = block.serialize()?;

        blocks
            .transaction(|tx_db| {
                tx_db.insert(block_hash, block_data.as_slice())?;
                tx_db.insert(TIP_BLOCK_HASH_KEY, block_hash)?;
                Ok(())
            })
            .map_err(|e: sled::transaction::TransactionError| {
                BlockchainError::Database(format!("Failed to update blocks tree: {e}"))
            })?;

        db.flush()
            .map_err(|e| BlockchainError::Database(format!("Failed to flush database: {e}")))?;
        Ok(())
    }

    pub fn get_db_path(&self) -> &PathBuf {
        &self.db_path
    }

    pub fn get_difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn get_authorizer(&self) -> Arc<dyn Authorizer> {
        Arc::clone(&self.authorizer)
    }

    pub fn get_tip_hash(&self) -> Vec<u8> {
        self.tip_hash
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_tip_hash(&self, new_tip_hash: &[u8]) {
        let mut tip_hash = self
            .tip_hash
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *tip_hash = new_tip_hash.to_vec();
    }

    // This is the append path: check the transactions, mine on top of the tip, persist
    pub fn mine_block(&self, transactions: &[Transaction]) -> Result<Block> {
        self.validate_transactions(transactions)?;

        // The stored pointer is the source of truth, not my cached copy
        let tip_hash = Self::read_tip(&self.blocks)?.ok_or_else(|| {
            BlockchainError::Corrupt("Tip pointer disappeared from the ledger".to_string())
        })?;
        let tip_block = Self::read_block(&self.blocks, &tip_hash)?.ok_or_else(|| {
            BlockchainError::Corrupt(format!(
                "Tip points at missing block {}",
                HEXLOWER.encode(&tip_hash)
            ))
        })?;

        info!(
            "Mining block {} with {} transactions (difficulty: {})",
            tip_block.get_index() + 1,
            transactions.len(),
            self.difficulty
        );
        let block =
            Block::new_block_within(transactions, &tip_block, self.difficulty, self.max_nonce)?;

        Self::update_blocks_tree(&self.db, &self.blocks, &block)?;
        self.set_tip_hash(block.get_hash());
        info!("Successfully mined block: {}", block.get_hash_hex());

        Ok(block)
    }

    pub fn iterator(&self) -> BlockchainIterator {
        BlockchainIterator::new(self.get_tip_hash(), self.blocks.clone())
    }

    pub fn get_block(&self, block_hash: &[u8]) -> Result<Option<Block>> {
        Self::read_block(&self.blocks, block_hash)
    }

    pub fn get_best_height(&self) -> Result<i64> {
        let tip_hash = self.get_tip_hash();
        let tip_block = self.get_block(&tip_hash)?.ok_or_else(|| {
            BlockchainError::Corrupt(format!(
                "Tip points at missing block {}",
                HEXLOWER.encode(&tip_hash)
            ))
        })?;
        Ok(tip_block.get_index())
    }

    // Before I mine anything I make sure every transaction can actually be appended:
    // finalized IDs, no duplicates, no new coinbase, inputs that exist, are unlocked
    // by their spender and are still unspent, and inputs that add up to exactly the
    // outputs (there are no fees)
    pub fn validate_transactions(&self, transactions: &[Transaction]) -> Result<()> {
        let batch_ids: HashSet<&[u8]> = transactions.iter().map(|tx| tx.get_id()).collect();
        let referenced: HashSet<&[u8]> = transactions
            .iter()
            .filter(|tx| !tx.is_coinbase())
            .flat_map(|tx| tx.get_vin().iter().map(|input| input.get_txid()))
            .collect();

        // One backward pass collects what the batch refers to
        let mut known_outputs: HashMap<Vec<u8>, Vec<TXOutput>> = HashMap::new();
        let mut spent: HashSet<(Vec<u8>, usize)> = HashSet::new();
        for block in self.iterator() {
            let block = block?;
            for tx in block.get_transactions() {
                if batch_ids.contains(tx.get_id()) {
                    return Err(BlockchainError::Transaction(format!(
                        "Transaction {} is already on the ledger",
                        tx.get_id_hex()
                    )));
                }
                if referenced.contains(tx.get_id()) {
                    known_outputs.insert(tx.get_id().to_vec(), tx.get_vout().to_vec());
                }
                if tx.is_coinbase() {
                    continue;
                }
                for input in tx.get_vin() {
                    if let Some(idx) = input.output_index() {
                        if referenced.contains(input.get_txid()) {
                            spent.insert((input.get_txid().to_vec(), idx));
                        }
                    }
                }
            }
        }

        for tx in transactions {
            if tx.get_id().is_empty() || tx.compute_id()? != tx.get_id() {
                return Err(BlockchainError::Transaction(format!(
                    "Transaction {} is not finalized over its contents",
                    tx.get_id_hex()
                )));
            }
            if known_outputs.contains_key(tx.get_id()) {
                return Err(BlockchainError::Transaction(format!(
                    "Transaction {} appears twice",
                    tx.get_id_hex()
                )));
            }
            // Coins are minted once, in the genesis block
            if tx.is_coinbase() {
                return Err(BlockchainError::Transaction(format!(
                    "Coinbase transaction {} is only allowed in the genesis block",
                    tx.get_id_hex()
                )));
            }
            if tx.get_vin().is_empty() {
                return Err(BlockchainError::Transaction(format!(
                    "Transaction {} has no inputs",
                    tx.get_id_hex()
                )));
            }

            let mut input_value = 0u64;
            for input in tx.get_vin() {
                let txid_hex = HEXLOWER.encode(input.get_txid());
                let idx = input.output_index().ok_or_else(|| {
                    BlockchainError::Transaction(format!(
                        "Negative output index {} in input spending {txid_hex}",
                        input.get_vout()
                    ))
                })?;
                let output = known_outputs
                    .get(input.get_txid())
                    .ok_or_else(|| {
                        BlockchainError::Transaction(format!(
                            "Referenced transaction not found: {txid_hex}"
                        ))
                    })?
                    .get(idx)
                    .ok_or_else(|| {
                        BlockchainError::Transaction(format!(
                            "Invalid output index {idx} for transaction {txid_hex}"
                        ))
                    })?;
                if !input.unlocks(output, self.authorizer.as_ref()) {
                    return Err(BlockchainError::Transaction(format!(
                        "Input spending {txid_hex}:{idx} is not unlocked by '{}'",
                        input.get_script_sig()
                    )));
                }
                if !spent.insert((input.get_txid().to_vec(), idx)) {
                    return Err(BlockchainError::Transaction(format!(
                        "Output {txid_hex}:{idx} is already spent"
                    )));
                }
                input_value = input_value.checked_add(output.get_value()).ok_or_else(|| {
                    BlockchainError::Transaction("Input value overflow".to_string())
                })?;
            }

            let output_value = tx.get_output_value()?;
            if input_value != output_value {
                return Err(BlockchainError::Transaction(format!(
                    "Transaction {} spends {input_value} but creates {output_value}",
                    tx.get_id_hex()
                )));
            }

            // Later transactions in the same batch may spend this one
            known_outputs.insert(tx.get_id().to_vec(), tx.get_vout().to_vec());
        }
        Ok(())
    }

    /// Walk the whole chain and check proof-of-work, linkage and indices.
    /// Returns the number of blocks.
    pub fn verify_chain(&self) -> Result<usize> {
        let mut count = 0;
        let mut expected_index: Option<i64> = None;
        let mut last_block: Option<Block> = None;

        for block in self.iterator() {
            let block = block?;
            if !ProofOfWork::validate(&block) {
                return Err(BlockchainError::Corrupt(format!(
                    "Block {} fails proof-of-work",
                    block.get_hash_hex()
                )));
            }
            if let Some(expected) = expected_index {
                if block.get_index() != expected {
                    return Err(BlockchainError::Corrupt(format!(
                        "Block {} has index {}, expected {expected}",
                        block.get_hash_hex(),
                        block.get_index()
                    )));
                }
            }
            expected_index = Some(block.get_index() - 1);
            count += 1;
            last_block = Some(block);
        }

        match last_block {
            Some(genesis) if genesis.is_genesis() && genesis.get_index() == 0 => Ok(count),
            _ => Err(BlockchainError::Corrupt(
                "Chain does not end at a genesis block".to_string(),
            )),
        }
    }
}

/// Cursor walking from a fixed starting hash back to genesis.
///
/// The starting hash is captured when the cursor is made, so blocks appended
/// afterwards never show up in a scan that is already running.
pub struct BlockchainIterator {
    blocks: Tree,
    current_hash: Option<Vec<u8>>,
}

impl BlockchainIterator {
    fn new(tip_hash: Vec<u8>, blocks: Tree) -> BlockchainIterator {
        BlockchainIterator {
            blocks,
            current_hash: Some(tip_hash),
        }
    }
}

impl Iterator for BlockchainIterator {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        let hash = self.current_hash.take()?;
        match Blockchain::read_block(&self.blocks, &hash) {
            Ok(Some(block)) => {
                if !block.is_genesis() {
                    self.current_hash = Some(block.get_pre_block_hash().to_vec());
                }
                Some(Ok(block))
            }
            Ok(None) => Some(Err(BlockchainError::Corrupt(format!(
                "Block {} is referenced but missing",
                HEXLOWER.encode(&hash)
            )))),
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Credential, TXInput, SUBSIDY};
    use crate::testnet::{balance_of, create_test_blockchain, TEST_DIFFICULTY};

    fn genesis_coinbase(chain: &Blockchain) -> Transaction {
        chain
            .iterator()
            .last()
            .unwrap()
            .unwrap()
            .get_transactions()[0]
            .clone()
    }

    fn transfer(from: &Transaction, vout: usize, outputs: Vec<TXOutput>) -> Transaction {
        let owner = from.get_vout()[vout].get_script_pub_key().to_string();
        let mut tx =
            Transaction::new_test_transaction(vec![TXInput::new(from.get_id(), vout, &owner)], outputs);
        tx.finalize().unwrap();
        tx
    }

    #[test]
    fn test_create_writes_genesis_as_tip() {
        let (chain, _dir) = create_test_blockchain("alice");
        let tip = chain.get_block(&chain.get_tip_hash()).unwrap().unwrap();

        assert_eq!(tip.get_index(), 0);
        assert!(tip.is_genesis());
        assert_eq!(chain.get_best_height().unwrap(), 0);
        assert!(tip.get_transactions()[0].is_coinbase());
        assert_eq!(tip.get_transactions()[0].get_vout()[0].get_value(), SUBSIDY);
        assert!(!tip.get_transactions()[0].get_id().is_empty());
    }

    #[test]
    fn test_create_over_existing_ledger_fails() {
        let (chain, dir) = create_test_blockchain("alice");
        let path = chain.get_db_path().clone();
        drop(chain);

        let result = Blockchain::create_with_address(&path, "bob", TEST_DIFFICULTY);
        assert!(matches!(result, Err(BlockchainError::AlreadyExists(_))));
        drop(dir);
    }

    #[test]
    fn test_open_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nothing_here");
        let result = Blockchain::open(&path, TEST_DIFFICULTY);
        assert!(matches!(result, Err(BlockchainError::NotFound(_))));
        assert!(!path.exists(), "open must not create the ledger directory");
    }

    #[test]
    fn test_open_empty_database_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        drop(sled::open(&path).unwrap());
        let result = Blockchain::open(&path, TEST_DIFFICULTY);
        assert!(matches!(result, Err(BlockchainError::NotFound(_))));
    }

    #[test]
    fn test_reopen_sees_same_tip() {
        let (chain, _dir) = create_test_blockchain("alice");
        let path = chain.get_db_path().clone();
        let tip = chain.get_tip_hash();
        drop(chain);

        let reopened = Blockchain::open(&path, TEST_DIFFICULTY).unwrap();
        assert_eq!(reopened.get_tip_hash(), tip);
    }

    #[test]
    fn test_mine_block_advances_tip_and_links() {
        let (chain, _dir) = create_test_blockchain("alice");
        let genesis_hash = chain.get_tip_hash();
        let coinbase = genesis_coinbase(&chain);

        let tx = transfer(
            &coinbase,
            0,
            vec![TXOutput::new(4, "bob"), TXOutput::new(6, "alice")],
        );
        let block = chain.mine_block(&[tx]).unwrap();

        assert_eq!(block.get_index(), 1);
        assert_eq!(block.get_pre_block_hash(), genesis_hash.as_slice());
        assert_eq!(chain.get_tip_hash(), block.get_hash());
        assert_eq!(chain.get_best_height().unwrap(), 1);
    }

    #[test]
    fn test_iteration_runs_tip_to_genesis() {
        let (chain, _dir) = create_test_blockchain("alice");
        let coinbase = genesis_coinbase(&chain);
        let first = transfer(
            &coinbase,
            0,
            vec![TXOutput::new(4, "bob"), TXOutput::new(6, "alice")],
        );
        chain.mine_block(std::slice::from_ref(&first)).unwrap();
        let second = transfer(&first, 0, vec![TXOutput::new(4, "carol")]);
        chain.mine_block(&[second]).unwrap();

        let blocks: Vec<Block> = chain.iterator().map(|b| b.unwrap()).collect();
        let indices: Vec<i64> = blocks.iter().map(|b| b.get_index()).collect();
        assert_eq!(indices, vec![2, 1, 0]);
        assert!(blocks.last().unwrap().is_genesis());
        assert_eq!(
            blocks.iter().filter(|b| b.get_pre_block_hash().is_empty()).count(),
            1
        );
        assert_eq!(chain.verify_chain().unwrap(), 3);
    }

    #[test]
    fn test_iterator_keeps_its_starting_point() {
        let (chain, _dir) = create_test_blockchain("alice");
        let mut iterator = chain.iterator();

        let coinbase = genesis_coinbase(&chain);
        let tx = transfer(&coinbase, 0, vec![TXOutput::new(10, "bob")]);
        chain.mine_block(&[tx]).unwrap();

        let first = iterator.next().unwrap().unwrap();
        assert!(first.is_genesis());
        assert!(iterator.next().is_none());
    }

    #[test]
    fn test_double_spend_is_rejected_and_tip_kept() {
        let (chain, _dir) = create_test_blockchain("alice");
        let coinbase = genesis_coinbase(&chain);
        let tip = chain.get_tip_hash();

        let to_bob = transfer(&coinbase, 0, vec![TXOutput::new(10, "bob")]);
        let to_carol = transfer(&coinbase, 0, vec![TXOutput::new(10, "carol")]);
        let result = chain.mine_block(&[to_bob.clone(), to_carol]);
        assert!(matches!(result, Err(BlockchainError::Transaction(_))));
        assert_eq!(chain.get_tip_hash(), tip);

        chain.mine_block(std::slice::from_ref(&to_bob)).unwrap();
        let again = transfer(&coinbase, 0, vec![TXOutput::new(10, "dave")]);
        assert!(chain.mine_block(&[again]).is_err());
        assert!(chain.mine_block(&[to_bob]).is_err(), "duplicate transaction");
    }

    #[test]
    fn test_spend_within_same_batch() {
        let (chain, _dir) = create_test_blockchain("alice");
        let coinbase = genesis_coinbase(&chain);
        let first = transfer(
            &coinbase,
            0,
            vec![TXOutput::new(4, "bob"), TXOutput::new(6, "alice")],
        );
        let second = transfer(&first, 0, vec![TXOutput::new(4, "carol")]);
        chain.mine_block(&[first, second]).unwrap();
        assert_eq!(chain.get_best_height().unwrap(), 1);
    }

    #[test]
    fn test_unbalanced_transaction_is_rejected() {
        let (chain, _dir) = create_test_blockchain("alice");
        let coinbase = genesis_coinbase(&chain);
        let inflating = transfer(&coinbase, 0, vec![TXOutput::new(11, "bob")]);
        assert!(matches!(
            chain.mine_block(&[inflating]),
            Err(BlockchainError::Transaction(_))
        ));
    }

    #[test]
    fn test_unknown_input_is_rejected() {
        let (chain, _dir) = create_test_blockchain("alice");
        let mut tx = Transaction::new_test_transaction(
            vec![TXInput::new(&[9; 32], 0, "alice")],
            vec![TXOutput::new(1, "bob")],
        );
        tx.finalize().unwrap();
        assert!(chain.mine_block(&[tx]).is_err());
    }

    #[test]
    fn test_spending_someone_elses_output_is_rejected() {
        let (chain, _dir) = create_test_blockchain("alice");
        let coinbase = genesis_coinbase(&chain);
        let tip = chain.get_tip_hash();

        let mut theft = Transaction::new_test_transaction(
            vec![TXInput::new(coinbase.get_id(), 0, "mallory")],
            vec![TXOutput::new(SUBSIDY, "mallory")],
        );
        theft.finalize().unwrap();
        assert!(matches!(
            chain.mine_block(&[theft]),
            Err(BlockchainError::Transaction(_))
        ));

        assert_eq!(chain.get_tip_hash(), tip);
        assert_eq!(balance_of(&chain, "alice"), SUBSIDY);
        assert_eq!(balance_of(&chain, "mallory"), 0);
    }

    #[test]
    fn test_new_coinbase_after_genesis_is_rejected() {
        let (chain, _dir) = create_test_blockchain("alice");
        let mut minted = Transaction::new_coinbase_tx("mallory", "free money").unwrap();
        minted.finalize().unwrap();

        assert!(matches!(
            chain.mine_block(&[minted]),
            Err(BlockchainError::Transaction(_))
        ));
        assert_eq!(chain.get_best_height().unwrap(), 0);
        assert_eq!(balance_of(&chain, "mallory"), 0);
    }

    struct Frozen;

    impl Authorizer for Frozen {
        fn can_unlock(&self, _lock: &Credential, _key: &Credential) -> bool {
            false
        }
    }

    #[test]
    fn test_appends_use_the_ledger_authorizer() {
        let (chain, _dir) = create_test_blockchain("alice");
        let coinbase = genesis_coinbase(&chain);
        let frozen = chain.clone().with_authorizer(Frozen);

        let honest = transfer(&coinbase, 0, vec![TXOutput::new(SUBSIDY, "bob")]);
        assert!(matches!(
            frozen.mine_block(std::slice::from_ref(&honest)),
            Err(BlockchainError::Transaction(_))
        ));
        chain.mine_block(&[honest]).unwrap();
        assert_eq!(balance_of(&chain, "bob"), SUBSIDY);
    }

    #[test]
    fn test_failed_genesis_mining_leaves_no_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger");
        let mut coinbase = Transaction::new_coinbase_tx("alice", "").unwrap();
        coinbase.finalize().unwrap();

        let result = Blockchain::create_within(&path, coinbase, 255, 64);
        assert!(matches!(
            result,
            Err(BlockchainError::DifficultyUnreachable { difficulty: 255 })
        ));
        assert!(matches!(
            Blockchain::open(&path, TEST_DIFFICULTY),
            Err(BlockchainError::NotFound(_))
        ));
    }

    #[test]
    fn test_failed_block_mining_keeps_tip() {
        let (chain, _dir) = create_test_blockchain("alice");
        let path = chain.get_db_path().clone();
        let tip = chain.get_tip_hash();
        let coinbase = genesis_coinbase(&chain);
        drop(chain);

        let hard = Blockchain::open(&path, 255).unwrap().with_max_nonce(64);
        let tx = transfer(&coinbase, 0, vec![TXOutput::new(SUBSIDY, "bob")]);
        assert_eq!(
            hard.mine_block(&[tx]),
            Err(BlockchainError::DifficultyUnreachable { difficulty: 255 })
        );
        assert_eq!(hard.get_tip_hash(), tip);
        assert_eq!(hard.get_best_height().unwrap(), 0);
        assert_eq!(balance_of(&hard, "alice"), SUBSIDY);
    }

    #[test]
    fn test_tampered_block_is_corrupt() {
        let (chain, _dir) = create_test_blockchain("alice");
        let tip = chain.get_tip_hash();
        let block = chain.get_block(&tip).unwrap().unwrap();

        // Same record stored under a different key
        chain
            .blocks
            .insert(&[7u8; 32][..], block.serialize().unwrap())
            .unwrap();
        assert!(matches!(
            chain.get_block(&[7u8; 32]),
            Err(BlockchainError::Corrupt(_))
        ));

        // Garbage under the tip key
        chain.blocks.insert(tip.as_slice(), &[1u8, 2, 3][..]).unwrap();
        let mut iterator = chain.iterator();
        assert!(matches!(
            iterator.next(),
            Some(Err(BlockchainError::Corrupt(_)))
        ));
        assert!(iterator.next().is_none());
        assert!(chain.verify_chain().is_err());
    }

    #[test]
    fn test_missing_predecessor_is_corrupt() {
        let (chain, _dir) = create_test_blockchain("alice");
        let genesis_hash = chain.get_tip_hash();
        let coinbase = genesis_coinbase(&chain);
        let tx = transfer(&coinbase, 0, vec![TXOutput::new(10, "bob")]);
        chain.mine_block(&[tx]).unwrap();

        chain.blocks.remove(genesis_hash.as_slice()).unwrap();
        let results: Vec<Result<Block>> = chain.iterator().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(BlockchainError::Corrupt(_))));
    }

    #[test]
    fn test_invalid_difficulty_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Blockchain::create_with_address(dir.path().join("ledger"), "alice", 0);
        assert!(matches!(result, Err(BlockchainError::Config(_))));
    }
}
