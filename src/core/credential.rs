//! Lock and unlock tokens for transaction outputs and inputs
//!
//! Ownership is modelled with a plain address string: an output is locked
//! to an address and an input presents the address that unlocks it. The
//! decision "does this credential unlock that output" is behind the
//! [`Authorizer`] trait so a signature-checking strategy can replace
//! [`AddressMatch`] without touching transaction or UTXO code.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque authorization token carried by inputs and outputs.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: &str) -> Credential {
        Credential(token.to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Credential {
    fn from(token: &str) -> Self {
        Credential::new(token)
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strategy deciding whether a presented credential unlocks a lock.
pub trait Authorizer: Send + Sync {
    fn can_unlock(&self, lock: &Credential, key: &Credential) -> bool;
}

/// Plain equality: the address that locked an output is the one that spends it.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressMatch;

impl Authorizer for AddressMatch {
    fn can_unlock(&self, lock: &Credential, key: &Credential) -> bool {
        lock == key
    }
}
