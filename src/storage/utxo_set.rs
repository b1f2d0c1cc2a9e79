// Unspent outputs are derived on demand: every query walks the chain from the tip
// back to genesis and works out which outputs no later input has consumed

use crate::core::{Authorizer, Blockchain, Credential, TXOutput, Transaction};
use crate::error::Result;
use data_encoding::HEXLOWER;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;
use std::sync::Arc;

pub struct UTXOSet {
    blockchain: Blockchain,
    authorizer: Arc<dyn Authorizer>,
}

impl UTXOSet {
    // Balances follow the same unlock rule the ledger enforces on append
    pub fn new(blockchain: Blockchain) -> UTXOSet {
        UTXOSet {
            authorizer: blockchain.get_authorizer(),
            blockchain,
        }
    }

    pub fn with_authorizer(
        blockchain: Blockchain,
        authorizer: impl Authorizer + 'static,
    ) -> UTXOSet {
        UTXOSet {
            blockchain,
            authorizer: Arc::new(authorizer),
        }
    }

    /// Transactions holding at least one unspent output `address` can unlock.
    /// Each transaction appears once, newest first.
    pub fn find_unspent_transactions(&self, address: &str) -> Result<Vec<Transaction>> {
        let mut unspent_txs: Vec<Transaction> = vec![];
        self.scan_unspent(address, |tx, _, _| {
            // Outputs of one transaction are visited back to back
            if unspent_txs.last().map(|last| last.get_id()) != Some(tx.get_id()) {
                unspent_txs.push(tx.clone());
            }
            ControlFlow::Continue(())
        })?;
        Ok(unspent_txs)
    }

    /// Every unspent output `address` can unlock.
    pub fn find_utxo(&self, address: &str) -> Result<Vec<TXOutput>> {
        let mut utxos = vec![];
        self.scan_unspent(address, |_, _, out| {
            utxos.push(out.clone());
            ControlFlow::Continue(())
        })?;
        Ok(utxos)
    }

    pub fn get_balance(&self, address: &str) -> Result<u64> {
        Ok(self.find_utxo(address)?.iter().map(TXOutput::get_value).sum())
    }

    /// Pick unspent outputs of `address` until their value reaches `amount`.
    ///
    /// Stops reading blocks as soon as enough is collected, so the selection is
    /// sufficient but not necessarily the smallest. When the address cannot
    /// cover `amount`, everything it owns is returned and the caller compares.
    pub fn find_spendable_outputs(
        &self,
        address: &str,
        amount: u64,
    ) -> Result<(u64, HashMap<String, Vec<usize>>)> {
        let mut unspent_outputs: HashMap<String, Vec<usize>> = HashMap::new();
        let mut accumulated = 0u64;

        self.scan_unspent(address, |tx, idx, out| {
            accumulated = accumulated.saturating_add(out.get_value());
            unspent_outputs.entry(tx.get_id_hex()).or_default().push(idx);
            if accumulated >= amount {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;
        Ok((accumulated, unspent_outputs))
    }

    // The one backward pass everything above is built on. Blocks come tip first, and
    // transactions inside a block are taken last to first, so the input spending an
    // output is always seen before the output itself
    fn scan_unspent<F>(&self, address: &str, mut visit: F) -> Result<()>
    where
        F: FnMut(&Transaction, usize, &TXOutput) -> ControlFlow<()>,
    {
        let key = Credential::new(address);
        let mut spent_txos: HashMap<String, HashSet<usize>> = HashMap::new();

        for block in self.blockchain.iterator() {
            let block = block?;
            debug!("Scanning block {} for {address}", block.get_index());

            for tx in block.get_transactions().iter().rev() {
                let txid_hex = tx.get_id_hex();
                let spent = spent_txos.get(txid_hex.as_str());
                for (idx, out) in tx.get_vout().iter().enumerate() {
                    if spent.is_some_and(|indices| indices.contains(&idx)) {
                        continue;
                    }
                    if !out.is_locked_with(&key, self.authorizer.as_ref()) {
                        continue;
                    }
                    if visit(tx, idx, out).is_break() {
                        return Ok(());
                    }
                }

                if tx.is_coinbase() {
                    continue;
                }
                for txin in tx.get_vin() {
                    if let Some(idx) = txin.output_index() {
                        spent_txos
                            .entry(HEXLOWER.encode(txin.get_txid()))
                            .or_default()
                            .insert(idx);
                    }
                }
            }
        }
        Ok(())
    }
}
