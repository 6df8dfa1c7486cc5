//! Circuit selection.
//!
//! A circuit is `k` distinct relays drawn uniformly at random without
//! replacement. `rand::seq::index::sample` returns its indices fully
//! shuffled, so every relay is equally likely in every position.

use rand::seq::index;
use rand::Rng;

use super::DirectoryEntry;
use crate::error::{Error, Result};

/// Pick a circuit of `length` distinct entries, in forwarding order.
pub fn select_circuit(entries: &[DirectoryEntry], length: usize) -> Result<Vec<DirectoryEntry>> {
    select_circuit_with_rng(entries, length, &mut rand::thread_rng())
}

/// [`select_circuit`] with a caller-supplied RNG.
pub fn select_circuit_with_rng<R: Rng + ?Sized>(
    entries: &[DirectoryEntry],
    length: usize,
    rng: &mut R,
) -> Result<Vec<DirectoryEntry>> {
    if length == 0 {
        return Err(Error::OnionBuildFailed("Circuit length must be at least 1".into()));
    }

    if entries.len() < length {
        return Err(Error::InsufficientNodes {
            required: length,
            available: entries.len(),
        });
    }

    Ok(index::sample(rng, entries.len(), length)
        .into_iter()
        .map(|i| entries[i].clone())
        .collect())
}
