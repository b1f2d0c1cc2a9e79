//! Test helpers for ledger tests
//!
//! Throwaway ledgers in temporary directories, mined at a low difficulty.

pub mod test_utils;

pub use test_utils::*;
