pub mod canonical;
pub mod constants;
pub mod error;
pub mod mine;

pub use error::LedgerError;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

/// Lowercase hex SHA-256 digest of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Seconds since the Unix epoch, with sub-second precision.
pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: i64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: i64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "sender": self.sender,
            "recipient": self.recipient,
            "amount": self.amount,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: f64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    /// A block stamped with the current time.
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: impl Into<String>,
    ) -> Self {
        Self {
            index,
            timestamp: unix_timestamp(),
            transactions,
            proof,
            previous_hash: previous_hash.into(),
        }
    }

    pub fn to_json(&self) -> Value {
        let transactions: Vec<Value> = self.transactions.iter().map(Transaction::to_json).collect();
        json!({
            "index": self.index,
            "timestamp": self.timestamp,
            "transactions": transactions,
            "proof": self.proof,
            "previous_hash": self.previous_hash,
        })
    }

    /// The exact text [`Block::hash`] digests. Proof validation and proof
    /// search use it as the block string for the last block.
    pub fn canonical_string(&self) -> String {
        canonical::to_canonical_string(&self.to_json())
    }

    /// SHA-256 of the canonical text, lowercase hex.
    pub fn hash(&self) -> String {
        sha256_hex(self.canonical_string().as_bytes())
    }
}

pub mod pow {
    use crate::constants::{HASH_HEX_SIZE, POW_TARGET_DIFFICULTY};
    use sha2::{Digest, Sha256};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Digest a proof candidate: SHA-256 of `block_string` immediately
    /// followed by the decimal form of `proof`.
    pub fn guess_hash(block_string: &str, proof: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(block_string.as_bytes());
        hasher.update(proof.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// `true` when the guess hash starts with [`POW_TARGET_DIFFICULTY`] zeros.
    pub fn valid_proof(block_string: &str, proof: u64) -> bool {
        valid_proof_with_difficulty(block_string, proof, POW_TARGET_DIFFICULTY)
    }

    /// `true` when the first `difficulty` hex characters of the guess hash
    /// are all `'0'`. A difficulty above 64 is never satisfied.
    pub fn valid_proof_with_difficulty(block_string: &str, proof: u64, difficulty: usize) -> bool {
        if difficulty > HASH_HEX_SIZE {
            return false;
        }
        count_leading_hex_zeros(&guess_hash(block_string, proof)) >= difficulty
    }

    pub fn count_leading_hex_zeros(digest: &str) -> usize {
        digest.bytes().take_while(|b| *b == b'0').count()
    }

    /// Count up from 0 until a proof satisfies `difficulty`.
    ///
    /// Returns `None` once `cancel` is raised, or if the proof space runs out.
    pub fn proof_of_work(block_string: &str, difficulty: usize, cancel: &AtomicBool) -> Option<u64> {
        if difficulty > HASH_HEX_SIZE {
            return None;
        }
        let mut proof = 0u64;
        loop {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            if valid_proof_with_difficulty(block_string, proof, difficulty) {
                return Some(proof);
            }
            proof = proof.checked_add(1)?;
        }
    }
}

pub mod chain {
    use super::*;
    use crate::constants::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
    use tracing::debug;

    /// The chain of sealed blocks plus the transactions waiting for the next one.
    ///
    /// A ledger always holds at least its genesis block. Mutators take
    /// `&mut self`; callers sharing a ledger across tasks wrap it in a lock.
    #[derive(Clone, Debug)]
    pub struct Ledger {
        chain: Vec<Block>,
        current_transactions: Vec<Transaction>,
    }

    impl Default for Ledger {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Ledger {
        /// A ledger holding only the genesis block.
        pub fn new() -> Self {
            let mut ledger = Self {
                chain: Vec::new(),
                current_transactions: Vec::new(),
            };
            ledger.seal_block(GENESIS_PROOF, Some(GENESIS_PREVIOUS_HASH.to_owned()));
            ledger
        }

        /// Queue a transaction for the next block. Returns that block's index.
        pub fn stage_transaction(
            &mut self,
            sender: impl Into<String>,
            recipient: impl Into<String>,
            amount: i64,
        ) -> u64 {
            let tx = Transaction::new(sender, recipient, amount);
            debug!(sender = %tx.sender, recipient = %tx.recipient, amount = tx.amount, "staged transaction");
            self.current_transactions.push(tx);
            self.last_block().index + 1
        }

        /// Seal every staged transaction into a new block and append it.
        ///
        /// Without `previous_hash` the block links to the hash of the current
        /// last block.
        pub fn seal_block(&mut self, proof: u64, previous_hash: Option<String>) -> &Block {
            let previous_hash = previous_hash.unwrap_or_else(|| {
                self.chain
                    .last()
                    .map(Block::hash)
                    .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_owned())
            });
            let transactions = std::mem::take(&mut self.current_transactions);
            let block = Block::new(self.chain.len() as u64 + 1, transactions, proof, previous_hash);
            debug!(
                index = block.index,
                proof,
                txs = block.transactions.len(),
                "sealed block"
            );
            self.chain.push(block);
            self.last_block()
        }

        pub fn last_block(&self) -> &Block {
            self.chain
                .last()
                .expect("a ledger always holds its genesis block")
        }

        pub fn chain(&self) -> &[Block] {
            &self.chain
        }

        pub fn pending(&self) -> &[Transaction] {
            &self.current_transactions
        }

        pub fn len(&self) -> usize {
            self.chain.len()
        }

        pub fn is_empty(&self) -> bool {
            self.chain.is_empty()
        }

        /// Walk the chain checking indices run 1..=n and every block links to
        /// the hash of its predecessor. Reports the first break found.
        pub fn verify(&self) -> Result<(), LedgerError> {
            verify_chain(&self.chain)
        }
    }

    /// Integrity check over any sequence of blocks.
    pub fn verify_chain(blocks: &[Block]) -> Result<(), LedgerError> {
        if blocks.is_empty() {
            return Err(LedgerError::EmptyChain);
        }
        for (position, block) in blocks.iter().enumerate() {
            let expected = position as u64 + 1;
            if block.index != expected {
                return Err(LedgerError::IndexMismatch {
                    position,
                    expected,
                    found: block.index,
                });
            }
        }
        for pair in blocks.windows(2) {
            let expected = pair[0].hash();
            if pair[1].previous_hash != expected {
                return Err(LedgerError::BrokenLink {
                    index: pair[1].index,
                    expected,
                    found: pair[1].previous_hash.clone(),
                });
            }
        }
        Ok(())
    }
}
