//! Session RNG construction.
//!
//! Each sort invocation owns exactly one ChaCha20 generator; routing keys
//! at initialization and permutation keys at extraction are all drawn from
//! it. Production sessions seed from the OS; setting `SORT_SEED` in the
//! environment pins the stream for reproducible runs.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

/// Environment variable honored for reproducible sessions.
pub const SEED_ENV: &str = "SORT_SEED";

/// RNG for one sort session: derived from `SORT_SEED` when set and
/// non-empty, OS entropy otherwise.
pub fn session_rng() -> ChaCha20Rng {
    match std::env::var(SEED_ENV) {
        Ok(raw) if !raw.is_empty() => seeded_rng(&raw),
        _ => ChaCha20Rng::from_entropy(),
    }
}

/// Deterministic session RNG derived from an arbitrary seed string.
pub fn seeded_rng(seed: &str) -> ChaCha20Rng {
    let digest = Sha256::digest(seed.as_bytes());
    let mut seed_bytes = [0u8; 32];
    seed_bytes.copy_from_slice(&digest);
    ChaCha20Rng::from_seed(seed_bytes)
}
