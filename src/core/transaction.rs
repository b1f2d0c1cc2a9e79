// This file implements the transaction model - how value moves on my ledger
// I follow the UTXO model: a transaction consumes earlier outputs and creates new ones
// Ownership is an address string for now (see core/credential.rs)

use crate::core::{Authorizer, Credential, SUBSIDY};
use crate::error::{BlockchainError, Result};
use crate::storage::UTXOSet;
use crate::utils::{deserialize, serialize, sha256_digest};
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};

// Output index carried by the single coinbase input
const COINBASE_VOUT: i64 = -1;

// This represents a transaction input - it references a previous transaction output
// Think of it as "I want to spend output #2 from transaction ABC123"
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct TXInput {
    txid: Vec<u8>,          // The ID of the transaction containing the output I want to spend
    vout: i64,              // The index of the output in that transaction (-1 for coinbase)
    script_sig: Credential, // Who is spending it (the memo for coinbase inputs)
}

impl TXInput {
    pub fn new(txid: &[u8], vout: usize, from: &str) -> TXInput {
        TXInput {
            txid: txid.to_vec(),
            vout: vout as i64,
            script_sig: Credential::new(from),
        }
    }

    pub fn get_txid(&self) -> &[u8] {
        self.txid.as_slice()
    }

    pub fn get_vout(&self) -> i64 {
        self.vout
    }

    pub fn get_script_sig(&self) -> &Credential {
        &self.script_sig
    }

    // I use this to check if this input presents a key the output accepts
    pub fn unlocks(&self, output: &TXOutput, authorizer: &dyn Authorizer) -> bool {
        output.is_locked_with(&self.script_sig, authorizer)
    }

    // The referenced output as a position, None for the coinbase sentinel
    pub fn output_index(&self) -> Option<usize> {
        usize::try_from(self.vout).ok()
    }
}

// This represents a transaction output - it's like a "check" that can be cashed later
// Think of it as "Pay 4 coins to whoever can present address XYZ"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct TXOutput {
    value: u64,                 // How many coins this output is worth
    script_pub_key: Credential, // The address that can spend this output
}

impl TXOutput {
    pub fn new(value: u64, address: &str) -> TXOutput {
        TXOutput {
            value,
            script_pub_key: Credential::new(address),
        }
    }

    pub fn get_value(&self) -> u64 {
        self.value
    }

    pub fn get_script_pub_key(&self) -> &Credential {
        &self.script_pub_key
    }

    pub fn is_locked_with(&self, key: &Credential, authorizer: &dyn Authorizer) -> bool {
        authorizer.can_unlock(&self.script_pub_key, key)
    }
}

// This is the main transaction structure - it represents a transfer of value
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct Transaction {
    id: Vec<u8>,         // Hash of the inputs and outputs, empty until finalized
    vin: Vec<TXInput>,   // List of inputs (what I'm spending)
    vout: Vec<TXOutput>, // List of outputs (where the coins are going)
}

impl Transaction {
    // When I mint coins. The caller finalizes the ID once it is done with the transaction
    pub fn new_coinbase_tx(to: &str, memo: &str) -> Result<Transaction> {
        if to.is_empty() {
            return Err(BlockchainError::Transaction(
                "Coinbase recipient must not be empty".to_string(),
            ));
        }

        let memo = if memo.is_empty() {
            format!("Reward to '{to}'")
        } else {
            memo.to_string()
        };

        // Coinbase transactions have a special input with no previous transaction
        let tx_input = TXInput {
            txid: vec![],
            vout: COINBASE_VOUT,
            script_sig: Credential::new(&memo),
        };

        Ok(Transaction {
            id: vec![],
            vin: vec![tx_input],
            vout: vec![TXOutput::new(SUBSIDY, to)],
        })
    }

    // When I move coins from one address to another
    pub fn new_utxo_transaction(
        from: &str,
        to: &str,
        amount: u64,
        utxo_set: &UTXOSet,
    ) -> Result<Transaction> {
        if amount == 0 {
            return Err(BlockchainError::Transaction(
                "Amount must be positive".to_string(),
            ));
        }
        if from.is_empty() || to.is_empty() {
            return Err(BlockchainError::Transaction(
                "Sender and recipient addresses must not be empty".to_string(),
            ));
        }

        let (accumulated, valid_outputs) = utxo_set.find_spendable_outputs(from, amount)?;
        if accumulated < amount {
            return Err(BlockchainError::InsufficientFunds {
                required: amount,
                available: accumulated,
            });
        }

        // One input per selected output, all unlocked by the sender
        let mut inputs = vec![];
        for (txid_hex, outs) in valid_outputs {
            let txid = HEXLOWER.decode(txid_hex.as_bytes()).map_err(|e| {
                BlockchainError::Transaction(format!("Invalid transaction ID: {e}"))
            })?;
            for out in outs {
                inputs.push(TXInput::new(&txid, out, from));
            }
        }

        let mut outputs = vec![TXOutput::new(amount, to)];
        // Whatever the selection overshoots comes back to me as change
        if accumulated > amount {
            outputs.push(TXOutput::new(accumulated - amount, from));
        }

        let mut tx = Transaction {
            id: vec![],
            vin: inputs,
            vout: outputs,
        };
        tx.finalize()?;
        Ok(tx)
    }

    /// Assign the content hash as this transaction's ID.
    ///
    /// Call once, after inputs and outputs are fixed.
    pub fn finalize(&mut self) -> Result<()> {
        self.id = self.compute_id()?;
        Ok(())
    }

    /// Hash of the serialized inputs and outputs; the ID field is left out.
    pub fn compute_id(&self) -> Result<Vec<u8>> {
        let tx_copy = Transaction {
            id: vec![],
            vin: self.vin.clone(),
            vout: self.vout.clone(),
        };
        Ok(sha256_digest(tx_copy.serialize()?.as_slice()))
    }

    pub fn is_coinbase(&self) -> bool {
        self.vin.len() == 1 && self.vin[0].txid.is_empty() && self.vin[0].vout == COINBASE_VOUT
    }

    pub fn get_id(&self) -> &[u8] {
        self.id.as_slice()
    }

    pub fn get_id_hex(&self) -> String {
        HEXLOWER.encode(self.id.as_slice())
    }

    pub fn get_vin(&self) -> &[TXInput] {
        self.vin.as_slice()
    }

    pub fn get_vout(&self) -> &[TXOutput] {
        self.vout.as_slice()
    }

    // I want to be able to get the total output value easily
    pub fn get_output_value(&self) -> Result<u64> {
        let mut total = 0u64;
        for vout in &self.vout {
            total = total
                .checked_add(vout.get_value())
                .ok_or_else(|| BlockchainError::Transaction("Output value overflow".to_string()))?;
        }
        Ok(total)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Transaction> {
        deserialize(bytes)
    }

    /// Create an unfinalized transaction of any shape (for testing only)
    #[cfg(test)]
    pub fn new_test_transaction(vin: Vec<TXInput>, vout: Vec<TXOutput>) -> Transaction {
        Transaction {
            id: vec![],
            vin,
            vout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spend_tx(txid: &[u8], vout: usize, from: &str, outputs: Vec<TXOutput>) -> Transaction {
        Transaction {
            id: vec![],
            vin: vec![TXInput::new(txid, vout, from)],
            vout: outputs,
        }
    }

    #[test]
    fn test_coinbase_structure() {
        let tx = Transaction::new_coinbase_tx("alice", "hello").unwrap();
        assert!(tx.is_coinbase());
        assert!(tx.get_id().is_empty(), "coinbase is not finalized on construction");
        assert_eq!(tx.get_vin()[0].get_vout(), -1);
        assert!(tx.get_vin()[0].get_txid().is_empty());
        assert_eq!(tx.get_vin()[0].get_script_sig().as_str(), "hello");
        assert_eq!(tx.get_vout().len(), 1);
        assert_eq!(tx.get_vout()[0].get_value(), SUBSIDY);
        assert_eq!(tx.get_vout()[0].get_script_pub_key().as_str(), "alice");
    }

    #[test]
    fn test_coinbase_default_memo_mentions_recipient() {
        let tx = Transaction::new_coinbase_tx("alice", "").unwrap();
        assert_eq!(tx.get_vin()[0].get_script_sig().as_str(), "Reward to 'alice'");
    }

    #[test]
    fn test_coinbase_rejects_empty_recipient() {
        assert!(Transaction::new_coinbase_tx("", "memo").is_err());
    }

    #[test]
    fn test_finalize_is_deterministic() {
        let mut tx = Transaction::new_coinbase_tx("alice", "memo").unwrap();
        let first = tx.compute_id().unwrap();
        let second = tx.compute_id().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 32);

        tx.finalize().unwrap();
        assert_eq!(tx.get_id(), first.as_slice());
        // The assigned ID is excluded from the hash
        assert_eq!(tx.compute_id().unwrap(), first);
    }

    #[test]
    fn test_changing_content_changes_id() {
        let base = spend_tx(&[1; 32], 0, "alice", vec![TXOutput::new(4, "bob")]);
        let other_value = spend_tx(&[1; 32], 0, "alice", vec![TXOutput::new(5, "bob")]);
        let other_input = spend_tx(&[1; 32], 1, "alice", vec![TXOutput::new(4, "bob")]);
        let other_owner = spend_tx(&[1; 32], 0, "alice", vec![TXOutput::new(4, "carol")]);

        let id = base.compute_id().unwrap();
        assert_ne!(id, other_value.compute_id().unwrap());
        assert_ne!(id, other_input.compute_id().unwrap());
        assert_ne!(id, other_owner.compute_id().unwrap());
    }

    #[test]
    fn test_spend_is_not_coinbase() {
        // Empty txid but a real output index is still a spend
        let tx = spend_tx(&[], 0, "alice", vec![TXOutput::new(1, "bob")]);
        assert!(!tx.is_coinbase());
    }

    #[test]
    fn test_output_value_sums_outputs() {
        let tx = spend_tx(
            &[2; 32],
            0,
            "alice",
            vec![TXOutput::new(4, "bob"), TXOutput::new(6, "alice")],
        );
        assert_eq!(tx.get_output_value().unwrap(), 10);

        let overflow = spend_tx(
            &[2; 32],
            0,
            "alice",
            vec![TXOutput::new(u64::MAX, "bob"), TXOutput::new(1, "alice")],
        );
        assert!(overflow.get_output_value().is_err());
    }

    #[test]
    fn test_transaction_round_trip() {
        let mut tx = Transaction::new_coinbase_tx("alice", "").unwrap();
        tx.finalize().unwrap();
        let decoded = Transaction::deserialize(&tx.serialize().unwrap()).unwrap();
        assert_eq!(decoded, tx);
        assert!(decoded.is_coinbase());
    }

    #[test]
    fn test_unlocking_goes_through_authorizer() {
        use crate::core::AddressMatch;

        struct Nobody;
        impl Authorizer for Nobody {
            fn can_unlock(&self, _: &Credential, _: &Credential) -> bool {
                false
            }
        }

        let output = TXOutput::new(4, "bob");
        assert!(output.is_locked_with(&Credential::new("bob"), &AddressMatch));
        assert!(!output.is_locked_with(&Credential::new("mallory"), &AddressMatch));
        assert!(TXInput::new(&[3; 32], 0, "bob").unlocks(&output, &AddressMatch));
        assert!(!TXInput::new(&[3; 32], 0, "mallory").unlocks(&output, &AddressMatch));
        assert!(!TXInput::new(&[3; 32], 0, "bob").unlocks(&output, &Nobody));
    }

    #[test]
    fn test_input_output_index() {
        let input = TXInput::new(&[3; 32], 2, "alice");
        assert_eq!(input.output_index(), Some(2));
        assert_eq!(input.get_script_sig().as_str(), "alice");
        let coinbase = Transaction::new_coinbase_tx("alice", "").unwrap();
        assert_eq!(coinbase.get_vin()[0].output_index(), None);
    }
}
