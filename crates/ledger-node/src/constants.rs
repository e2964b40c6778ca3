pub const DEFAULT_LISTEN: &str = "0.0.0.0:5000";
pub const DEFAULT_DATA_DIR: &str = "./data";

pub(crate) const MSG_BLOCK_FORGED: &str = "New Block Forged";
pub(crate) const MSG_INVALID_REQUEST: &str = "Invalid request";
pub(crate) const MSG_INVALID_PROOF: &str = "Invalid proof";
