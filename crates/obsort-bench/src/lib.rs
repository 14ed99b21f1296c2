//! Shared input generation for the obsort benchmarks.

use rand::Rng;

use obsort_core::Item;
use obsort_core::rng::seeded_rng;

/// Deterministic pseudo-random integer records.
pub fn random_items(n: usize, seed: &str) -> Vec<Item> {
    let mut rng = seeded_rng(seed);
    (0..n)
        .map(|_| Item::new(rng.gen_range(i32::MIN..i32::MAX), Vec::new()))
        .collect()
}

/// Records with a fixed-size payload, for envelope throughput runs.
pub fn payload_items(n: usize, payload_len: usize, seed: &str) -> Vec<Item> {
    let mut rng = seeded_rng(seed);
    (0..n)
        .map(|_| {
            let mut payload = vec![0u8; payload_len];
            rng.fill(payload.as_mut_slice());
            Item::new(rng.gen_range(i32::MIN..i32::MAX), payload)
        })
        .collect()
}
