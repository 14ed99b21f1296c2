//! MergeSplit: the butterfly network's binary operator.
//!
//! Two Z-sized buckets come in from level ℓ; two Z-sized buckets go out to
//! level ℓ+1, partitioned on bit `L − 1 − ℓ` of each real record's routing
//! key and padded back to Z with dummies. Level 0 routes on the most
//! significant routing bit, level L−1 on the least significant.

pub mod bitonic;

use crate::error::OverflowSide;
use crate::record::{Bucket, Record};

pub use bitonic::{Tagged, bitonic_merge, bitonic_sort, streaming_bitonic_sort};

/// How the operator realizes the partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeSplitStrategy {
    /// Scatter reals into the two outputs in one pass, then pad. Simple and
    /// local, but the in-enclave access pattern depends on which slots hold
    /// real records; acceptable when the adversary sees only the store.
    PartitionPad,
    /// Relabel with composite keys and run one bitonic network over the
    /// combined 2Z array, so the in-enclave pattern is data-independent.
    Bitonic,
    /// Bitonic networks over `window`-sized runs plus streaming merges,
    /// keeping the in-enclave working set at O(window); bucket I/O moves
    /// through the store's block interface in `window`-slot blocks.
    BitonicStreaming { window: usize },
}

impl MergeSplitStrategy {
    /// Reference working-window size for the streaming realization.
    pub const DEFAULT_WINDOW: usize = 64;
}

impl Default for MergeSplitStrategy {
    fn default() -> Self {
        Self::Bitonic
    }
}

/// MergeSplit overflow: one output side would need more than Z reals.
/// The driver decorates it with the level and pair index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overflow {
    pub side: OverflowSide,
}

/// Combine `b1` and `b2` (each Z slots, decrypted) into the two outputs for
/// the next level, routed on bit `total_levels − 1 − level`.
pub fn merge_split(
    b1: &[Record],
    b2: &[Record],
    level: u32,
    total_levels: u32,
    z: usize,
    strategy: MergeSplitStrategy,
) -> Result<(Bucket, Bucket), Overflow> {
    let bit = total_levels - 1 - level;
    match strategy {
        MergeSplitStrategy::PartitionPad => partition_pad(b1, b2, bit, z),
        MergeSplitStrategy::Bitonic => bitonic_merge_split(b1, b2, bit, z, None),
        MergeSplitStrategy::BitonicStreaming { window } => {
            bitonic_merge_split(b1, b2, bit, z, Some(window))
        }
    }
}

fn routed_bit(rec: &Record, bit: u32) -> u32 {
    (rec.routing_key >> bit) & 1
}

/// Count real records destined for each output.
fn count_by_bit<'a>(records: impl Iterator<Item = &'a Record>, bit: u32) -> (usize, usize) {
    let mut count0 = 0;
    let mut count1 = 0;
    for rec in records.filter(|r| !r.is_dummy) {
        if routed_bit(rec, bit) == 0 {
            count0 += 1;
        } else {
            count1 += 1;
        }
    }
    (count0, count1)
}

fn check_overflow(count0: usize, count1: usize, z: usize) -> Result<(), Overflow> {
    if count0 > z {
        return Err(Overflow {
            side: OverflowSide::Output0,
        });
    }
    if count1 > z {
        return Err(Overflow {
            side: OverflowSide::Output1,
        });
    }
    Ok(())
}

fn partition_pad(
    b1: &[Record],
    b2: &[Record],
    bit: u32,
    z: usize,
) -> Result<(Bucket, Bucket), Overflow> {
    let mut out0: Bucket = Vec::with_capacity(z);
    let mut out1: Bucket = Vec::with_capacity(z);
    for rec in b1.iter().chain(b2).filter(|r| !r.is_dummy) {
        if routed_bit(rec, bit) == 0 {
            out0.push(rec.clone());
        } else {
            out1.push(rec.clone());
        }
    }
    check_overflow(out0.len(), out1.len(), z)?;
    out0.resize(z, Record::dummy());
    out1.resize(z, Record::dummy());
    Ok((out0, out1))
}

/// Composite-key realization. Reals are tagged `bit_val << 1` ∈ {0, 2};
/// the first `Z − count0` dummies in scan order are tagged 1 and the rest
/// 3, so after one ascending sort of the 2Z array the first Z slots are
/// exactly output 0 and the last Z slots output 1. Dummy tags depend only
/// on the two counts, never on where the reals sit.
fn bitonic_merge_split(
    b1: &[Record],
    b2: &[Record],
    bit: u32,
    z: usize,
    window: Option<usize>,
) -> Result<(Bucket, Bucket), Overflow> {
    let (count0, count1) = count_by_bit(b1.iter().chain(b2), bit);
    check_overflow(count0, count1, z)?;
    let need0 = z - count0;

    let mut tagged0 = 0;
    let mut combined: Vec<Tagged> = Vec::with_capacity(2 * z);
    for rec in b1.iter().chain(b2) {
        let tag = if rec.is_dummy {
            if tagged0 < need0 {
                tagged0 += 1;
                1
            } else {
                3
            }
        } else {
            routed_bit(rec, bit) << 1
        };
        combined.push(Tagged::new(tag, rec.clone()));
    }

    match window {
        Some(window) => streaming_bitonic_sort(&mut combined, window),
        None => {
            let cnt = combined.len();
            bitonic_sort(&mut combined, 0, cnt, true);
        }
    }

    let out1 = combined.split_off(z);
    Ok((
        combined.into_iter().map(|t| t.record).collect(),
        out1.into_iter().map(|t| t.record).collect(),
    ))
}
