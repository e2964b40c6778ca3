pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;

/// Proof and `previous_hash` of the block every ledger starts with.
pub const GENESIS_PROOF: u64 = 100;
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// Leading hex zeros a proof digest needs.
pub const POW_TARGET_DIFFICULTY: usize = 3;

/// Sender of the transaction that rewards whoever mined a block.
pub const REWARD_SENDER: &str = "0";
pub const REWARD_AMOUNT: i64 = 1;
