use crate::{constants::HASH_HEX_SIZE, pow::valid_proof_with_difficulty};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Searches proofs in parallel until one satisfies `difficulty` for
/// `block_string`. The proof returned is valid but not necessarily the smallest.
///
/// Returns `None` once `cancel` is raised.
pub fn search_proof_parallel(
    block_string: &str,
    difficulty: usize,
    cancel: &AtomicBool,
) -> Option<u64> {
    if difficulty > HASH_HEX_SIZE {
        return None;
    }

    // A raised flag ends the search through `find_any` as well; the check
    // below tells that apart from a real hit.
    let found = (0u64..u64::MAX).into_par_iter().find_any(|proof| {
        cancel.load(Ordering::Relaxed)
            || valid_proof_with_difficulty(block_string, *proof, difficulty)
    })?;

    if !valid_proof_with_difficulty(block_string, found, difficulty) {
        info!("proof search cancelled");
        return None;
    }

    info!("found proof {} at difficulty {}", found, difficulty);
    Some(found)
}
