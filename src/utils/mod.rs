//! Utility functions and helpers
//!
//! Hashing, integer encoding, the storage codec and the wall clock.

pub mod crypto;
pub mod encoding;
pub mod serialization;

pub use crypto::{current_timestamp, sha256_digest};
pub use encoding::int_to_bytes;
pub use serialization::{deserialize, serialize};
