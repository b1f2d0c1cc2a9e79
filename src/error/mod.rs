//! Error handling for the ledger
//!
//! Every fault the library can hit is surfaced as a `BlockchainError`.
//! Nothing in the library terminates the process; mapping errors to exit
//! codes is left to the binary.

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Error types for ledger operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockchainError {
    /// A ledger already exists at the given path
    AlreadyExists(String),
    /// No ledger exists at the given path
    NotFound(String),
    /// Spend exceeds the resolvable balance
    InsufficientFunds { required: u64, available: u64 },
    /// Persisted data failed an integrity check
    Corrupt(String),
    /// Mining exhausted the nonce space
    DifficultyUnreachable { difficulty: u32 },
    /// Database-related errors
    Database(String),
    /// Serialization errors (encode side)
    Serialization(String),
    /// Transaction construction or validation errors
    Transaction(String),
    /// Block construction errors
    InvalidBlock(String),
    /// Configuration errors
    Config(String),
    /// File I/O errors
    Io(String),
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::AlreadyExists(path) => {
                write!(f, "Ledger already exists at {path}")
            }
            BlockchainError::NotFound(path) => {
                write!(f, "No ledger found at {path}. Create one first.")
            }
            BlockchainError::InsufficientFunds {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient funds: required {required}, available {available}"
                )
            }
            BlockchainError::Corrupt(msg) => write!(f, "Corrupt ledger: {msg}"),
            BlockchainError::DifficultyUnreachable { difficulty } => write!(
                f,
                "Nonce space exhausted: difficulty {difficulty} is unreachable"
            ),
            BlockchainError::Database(msg) => write!(f, "Database error: {msg}"),
            BlockchainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            BlockchainError::Transaction(msg) => write!(f, "Transaction error: {msg}"),
            BlockchainError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
            BlockchainError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BlockchainError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<sled::Error> for BlockchainError {
    fn from(err: sled::Error) -> Self {
        BlockchainError::Database(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for BlockchainError {
    fn from(err: bincode::error::EncodeError) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

// Decoding only ever happens on bytes read back from the store
impl From<bincode::error::DecodeError> for BlockchainError {
    fn from(err: bincode::error::DecodeError) -> Self {
        BlockchainError::Corrupt(err.to_string())
    }
}

impl From<toml::de::Error> for BlockchainError {
    fn from(err: toml::de::Error) -> Self {
        BlockchainError::Config(err.to_string())
    }
}
