//! Core ledger functionality
//!
//! Blocks, transactions, the proof-of-work engine and the persistent chain.

pub mod block;
pub mod blockchain;
pub mod credential;
pub mod monetary;
pub mod proof_of_work;
pub mod transaction;

pub use block::Block;
pub use blockchain::{Blockchain, BlockchainIterator};
pub use credential::{AddressMatch, Authorizer, Credential};
pub use monetary::{DEFAULT_DIFFICULTY, GENESIS_COINBASE_DATA, SUBSIDY};
pub use proof_of_work::ProofOfWork;
pub use transaction::{TXInput, TXOutput, Transaction};
