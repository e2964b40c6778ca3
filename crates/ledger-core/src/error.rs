use thiserror::Error;

/// Ways a chain can fail [`crate::chain::Ledger::verify`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("chain is empty")]
    EmptyChain,

    #[error("block at position {position} carries index {found}, expected {expected}")]
    IndexMismatch {
        position: usize,
        expected: u64,
        found: u64,
    },

    #[error("block {index} links to {found}, expected {expected}")]
    BrokenLink {
        index: u64,
        expected: String,
        found: String,
    },
}
