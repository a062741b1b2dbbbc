//! In-memory Forwarder + recipient token for tests
//!
//! Reproduces the contract's per-item rules: each request is checked for
//! signature, nonce and expiry on its own, a failing item is skipped, and the
//! nonce is consumed only when those checks pass.

use super::{BatchReceipt, ForwarderChain};
use crate::batch::Batch;
use crate::constants::BASE_TX_GAS;
use crate::contracts::ForwardRequest;
use crate::types::Operation;
use crate::verifier::{forwarder_domain, verify};
use alloy::primitives::{keccak256, Address, TxHash, U256};
use alloy::sol_types::Eip712Domain;
use eyre::Result;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;

pub(crate) const GAS_PER_ITEM: u64 = 60_000;

#[derive(Default)]
struct Ledger {
    block: u64,
    nonces: HashMap<Address, U256>,
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    failures_left: u32,
    hang: bool,
    drop_last_result: bool,
    submissions: usize,
    estimates: usize,
}

pub(crate) struct MockForwarder {
    chain_id: u64,
    domain: Eip712Domain,
    token: Address,
    ledger: Mutex<Ledger>,
    release: Notify,
}

impl MockForwarder {
    pub(crate) fn new(chain_id: u64, forwarder: Address, token: Address) -> Self {
        Self {
            chain_id,
            domain: forwarder_domain(chain_id, forwarder),
            token,
            ledger: Mutex::new(Ledger {
                block: 100,
                ..Default::default()
            }),
            release: Notify::new(),
        }
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap()
    }

    pub(crate) fn mint(&self, to: Address, amount: U256) {
        *self.ledger().balances.entry(to).or_default() += amount;
    }

    pub(crate) fn balance_of(&self, who: Address) -> U256 {
        self.ledger().balances.get(&who).copied().unwrap_or_default()
    }

    pub(crate) fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.ledger()
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    pub(crate) fn nonce(&self, who: Address) -> U256 {
        self.ledger().nonces.get(&who).copied().unwrap_or_default()
    }

    pub(crate) fn set_nonce(&self, who: Address, nonce: U256) {
        self.ledger().nonces.insert(who, nonce);
    }

    pub(crate) fn mine(&self, blocks: u64) {
        self.ledger().block += blocks;
    }

    /// Make the next `n` submissions fail before reaching the chain
    pub(crate) fn fail_next_submissions(&self, n: u32) {
        self.ledger().failures_left = n;
    }

    /// Make submissions wait for `release_hung` before confirming
    pub(crate) fn hang_submissions(&self, hang: bool) {
        self.ledger().hang = hang;
    }

    /// Report one result fewer than the batch had items
    pub(crate) fn drop_last_result(&self, drop: bool) {
        self.ledger().drop_last_result = drop;
    }

    /// Let one hung submission through
    pub(crate) fn release_hung(&self) {
        self.release.notify_one();
    }

    pub(crate) fn submissions(&self) -> usize {
        self.ledger().submissions
    }

    pub(crate) fn estimates(&self) -> usize {
        self.ledger().estimates
    }

    fn execute_one(&self, ledger: &mut Ledger, request: &ForwardRequest, signature: &[u8]) -> bool {
        if verify(&self.domain, request, signature).is_err() {
            return false;
        }
        let nonce = ledger.nonces.entry(request.from).or_default();
        if *nonce != request.nonce {
            return false;
        }
        if request.expiryBlock <= U256::from(ledger.block) {
            return false;
        }
        *nonce += U256::from(1);

        if request.to != self.token {
            return false;
        }
        match Operation::decode(request.from, &request.data) {
            Some(Operation::Transfer { to, amount }) => {
                debit(ledger, request.from, amount) && credit(ledger, to, amount)
            }
            Some(Operation::Approve { spender, amount }) => {
                ledger.allowances.insert((request.from, spender), amount);
                true
            }
            Some(Operation::TransferFrom {
                caller,
                owner,
                to,
                amount,
            }) => {
                let allowance = ledger.allowances.entry((owner, caller)).or_default();
                if *allowance < amount {
                    return false;
                }
                *allowance -= amount;
                debit(ledger, owner, amount) && credit(ledger, to, amount)
            }
            None => false,
        }
    }
}

fn debit(ledger: &mut Ledger, who: Address, amount: U256) -> bool {
    let balance = ledger.balances.entry(who).or_default();
    if *balance < amount {
        return false;
    }
    *balance -= amount;
    true
}

fn credit(ledger: &mut Ledger, who: Address, amount: U256) -> bool {
    *ledger.balances.entry(who).or_default() += amount;
    true
}

impl ForwarderChain for MockForwarder {
    async fn get_nonce(&self, from: Address) -> Result<U256> {
        Ok(self.nonce(from))
    }

    async fn block_number(&self) -> Result<u64> {
        Ok(self.ledger().block)
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    async fn estimate_execute(&self, batch: &Batch) -> Result<u64> {
        self.ledger().estimates += 1;
        Ok(BASE_TX_GAS + GAS_PER_ITEM * batch.len() as u64)
    }

    async fn execute(&self, batch: &Batch) -> Result<BatchReceipt> {
        let hang = {
            let mut ledger = self.ledger();
            if ledger.failures_left > 0 {
                ledger.failures_left -= 1;
                eyre::bail!("connection refused");
            }
            ledger.hang
        };
        if hang {
            self.release.notified().await;
        }

        let mut ledger = self.ledger();
        ledger.block += 1;
        ledger.submissions += 1;
        let tx_hash = TxHash::from(keccak256(ledger.submissions.to_be_bytes()));
        let mut results: Vec<bool> = batch
            .iter()
            .map(|(request, signature)| self.execute_one(&mut ledger, request, signature))
            .collect();
        if ledger.drop_last_result {
            results.pop();
        }
        Ok(BatchReceipt { tx_hash, results })
    }
}
