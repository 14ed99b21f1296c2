//! Sort driver: parameter computation, initialization, butterfly
//! orchestration, oblivious permutation, and the final sort.
//!
//! A sort invocation is linear: Init → Level 0 … Level L → Permute →
//! FinalSort → Done. There is no retry; any overflow or decryption failure
//! aborts and surfaces to the caller, who typically retries with a larger
//! bucket capacity. The driver executes each level fully before the next
//! and processes bucket pairs sequentially, so the trace the store sees is
//! a fixed function of (N, Z) alone.

use log::{debug, trace};
use rand::{Rng, RngCore};
use rand_chacha::ChaCha20Rng;

use crate::envelope::Envelope;
use crate::error::{OverflowSide, SortError};
use crate::merge_split::{MergeSplitStrategy, Tagged, bitonic_sort, merge_split};
use crate::record::{Bucket, Item, Record};
use crate::rng::session_rng;
use crate::store::BucketStore;

/// Caller-tunable knobs for one sort invocation.
#[derive(Debug, Clone, Copy)]
pub struct SortConfig {
    /// Z: slots per bucket. Must be a power of two, at least 2.
    pub bucket_capacity: usize,
    /// Multiplier on the minimum bucket count before power-of-two rounding.
    /// 1 matches the reference; raising it lowers overflow probability at
    /// the cost of more buckets.
    pub safety_factor: usize,
    /// MergeSplit realization.
    pub strategy: MergeSplitStrategy,
}

impl SortConfig {
    pub fn new(bucket_capacity: usize) -> Self {
        Self {
            bucket_capacity,
            safety_factor: 1,
            strategy: MergeSplitStrategy::default(),
        }
    }

    fn validate(&self) -> Result<(), SortError> {
        let z = self.bucket_capacity;
        if z < 2 || !z.is_power_of_two() {
            return Err(SortError::Parameter {
                reason: format!("bucket capacity {z} must be a power of two, at least 2"),
            });
        }
        if self.safety_factor < 1 {
            return Err(SortError::Parameter {
                reason: "safety factor must be at least 1".into(),
            });
        }
        if let MergeSplitStrategy::BitonicStreaming { window } = self.strategy {
            if window < 2 || !window.is_power_of_two() || window > 2 * z {
                return Err(SortError::Parameter {
                    reason: format!(
                        "streaming window {window} must be a power of two in [2, 2Z]"
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Butterfly shape derived from (N, Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketParameters {
    /// B: buckets per level; a power of two.
    pub bucket_count: u32,
    /// L = log₂ B: number of MergeSplit rounds.
    pub levels: u32,
}

/// Compute (B, L) for `n` records at bucket capacity `z`.
///
/// B is the smallest power of two at least `⌈2n/z⌉ × safety_factor`; the
/// factor of two reserves half of every level-0 bucket for dummies, which
/// is what keeps overflow probability negligible at later levels. Rejects
/// when `n > B·⌊z/2⌋`.
pub fn compute_bucket_parameters(
    n: usize,
    z: usize,
    safety_factor: usize,
) -> Result<BucketParameters, SortError> {
    if z < 2 {
        return Err(SortError::Parameter {
            reason: format!("bucket capacity {z} is below the minimum of 2"),
        });
    }
    if safety_factor < 1 {
        return Err(SortError::Parameter {
            reason: "safety factor must be at least 1".into(),
        });
    }
    let b_min = (2 * n).div_ceil(z).max(1);
    let b = (b_min * safety_factor).next_power_of_two();
    if n > b * (z / 2) {
        return Err(SortError::Parameter {
            reason: "bucket size too small for input size".into(),
        });
    }
    Ok(BucketParameters {
        bucket_count: b as u32,
        levels: b.trailing_zeros(),
    })
}

/// The trusted side of one sort session: owns the session RNG and cipher
/// envelope, consumes an untrusted [`BucketStore`] capability.
pub struct ObliviousSorter<'s, S: BucketStore, E: Envelope> {
    store: &'s S,
    envelope: E,
    config: SortConfig,
    rng: ChaCha20Rng,
}

impl<'s, S: BucketStore, E: Envelope> ObliviousSorter<'s, S, E> {
    /// Session seeded from the OS (or `SORT_SEED` when set).
    pub fn new(store: &'s S, envelope: E, config: SortConfig) -> Self {
        Self::with_rng(store, envelope, config, session_rng())
    }

    /// Session with an explicit RNG, for reproducible runs.
    pub fn with_rng(store: &'s S, envelope: E, config: SortConfig, rng: ChaCha20Rng) -> Self {
        Self {
            store,
            envelope,
            config,
            rng,
        }
    }

    /// Sort `input` ascending by `sort_key`; equal keys keep input order.
    ///
    /// On any error the output is empty: no partial results.
    pub fn sort(&mut self, input: &[Item]) -> Result<Vec<Item>, SortError> {
        self.config.validate()?;
        let params = compute_bucket_parameters(
            input.len(),
            self.config.bucket_capacity,
            self.config.safety_factor,
        )?;
        debug!(
            "sorting {} records: B={}, L={}, Z={}",
            input.len(),
            params.bucket_count,
            params.levels,
            self.config.bucket_capacity
        );
        self.initialize_buckets(input, params)?;
        self.perform_butterfly_network(params)?;
        let survivors = self.extract_final_elements(params)?;
        debug!("final sort of {} extracted records", survivors.len());
        Ok(final_sort(survivors))
    }

    /// Assign i.i.d. uniform routing keys, partition the input into B
    /// contiguous groups, pad each to Z with dummies, seal, and write
    /// level 0.
    fn initialize_buckets(&mut self, input: &[Item], params: BucketParameters) -> Result<(), SortError> {
        let z = self.config.bucket_capacity;
        let b = params.bucket_count as usize;
        let n = input.len();

        let records: Vec<Record> = input
            .iter()
            .enumerate()
            .map(|(seq, item)| {
                let routing_key = self.rng.gen_range(0..params.bucket_count);
                Record::real(item.sort_key, item.payload.clone(), routing_key, seq as u32)
            })
            .collect();

        let group_size = n.div_ceil(b);
        for i in 0..b {
            let start = (i * group_size).min(n);
            let end = (start + group_size).min(n);
            let mut bucket: Bucket = records[start..end].to_vec();
            if bucket.len() > z / 2 {
                return Err(SortError::BucketOverflow {
                    level: 0,
                    pair_index: i as u32,
                    side: OverflowSide::Output0,
                });
            }
            bucket.resize(z, Record::dummy());
            let sealed = self.envelope.seal(&bucket);
            self.write_bucket(0, i as u32, sealed)?;
        }
        Ok(())
    }

    /// For ℓ = 0…L−1, MergeSplit every adjacent pair (2i, 2i+1) of level ℓ
    /// into level ℓ+1. Pairing is adjacent at every level; the routing-bit
    /// index L−1−ℓ compensates.
    fn perform_butterfly_network(&mut self, params: BucketParameters) -> Result<(), SortError> {
        let z = self.config.bucket_capacity;
        for level in 0..params.levels {
            trace!("butterfly level {level}");
            for i in (0..params.bucket_count).step_by(2) {
                let b1 = self.envelope.open(&self.read_bucket(level, i)?)?;
                let b2 = self.envelope.open(&self.read_bucket(level, i + 1)?)?;
                let (out0, out1) =
                    merge_split(&b1, &b2, level, params.levels, z, self.config.strategy)
                        .map_err(|overflow| SortError::BucketOverflow {
                            level,
                            pair_index: i / 2,
                            side: overflow.side,
                        })?;
                self.write_bucket(level + 1, i, self.envelope.seal(&out0))?;
                self.write_bucket(level + 1, i + 1, self.envelope.seal(&out1))?;
            }
        }
        Ok(())
    }

    /// Read each level-L bucket, obliviously permute its Z slots (fresh
    /// uniform key per slot, one bitonic pass), and strip dummies.
    fn extract_final_elements(&mut self, params: BucketParameters) -> Result<Vec<Record>, SortError> {
        let mut survivors = Vec::new();
        for i in 0..params.bucket_count {
            let bucket = self.envelope.open(&self.read_bucket(params.levels, i)?)?;
            let mut slots: Vec<Tagged> = bucket
                .into_iter()
                .map(|rec| Tagged::new(self.rng.next_u32(), rec))
                .collect();
            let cnt = slots.len();
            bitonic_sort(&mut slots, 0, cnt, true);
            survivors.extend(
                slots
                    .into_iter()
                    .map(|t| t.record)
                    .filter(|rec| !rec.is_dummy),
            );
        }
        Ok(survivors)
    }

    fn read_bucket(&self, level: u32, index: u32) -> Result<Bucket, SortError> {
        let z = self.config.bucket_capacity;
        match self.config.strategy {
            MergeSplitStrategy::BitonicStreaming { window } => {
                let mut bucket: Bucket = Vec::with_capacity(z);
                let mut offset = 0;
                while offset < z {
                    let len = window.min(z - offset);
                    bucket.extend(self.store.read_bucket_block(level, index, offset, len)?);
                    offset += len;
                }
                Ok(bucket)
            }
            _ => Ok(self.store.read_bucket(level, index)?),
        }
    }

    fn write_bucket(&self, level: u32, index: u32, bucket: Bucket) -> Result<(), SortError> {
        match self.config.strategy {
            MergeSplitStrategy::BitonicStreaming { window } => {
                let mut offset = 0;
                for block in bucket.chunks(window) {
                    self.store
                        .write_bucket_block(level, index, offset, block.to_vec())?;
                    offset += block.len();
                }
                Ok(())
            }
            _ => Ok(self.store.write_bucket(level, index, bucket)?),
        }
    }
}

/// Non-oblivious final sort: stable ascending by `sort_key`, ties broken
/// by input ordinal. Safe to run on plaintext because the record set is a
/// uniformly random permutation by this point; any comparison sort's
/// access pattern then reveals only the key multiset.
fn final_sort(mut records: Vec<Record>) -> Vec<Item> {
    records.sort_by(|a, b| a.sort_key.cmp(&b.sort_key).then_with(|| a.seq.cmp(&b.seq)));
    records
        .into_iter()
        .map(|rec| Item {
            sort_key: rec.sort_key,
            payload: rec.payload,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_for_ten_records_at_z4() {
        // B_min = ⌈20/4⌉ = 5 → B = 8, L = 3.
        let params = compute_bucket_parameters(10, 4, 1).unwrap();
        assert_eq!(
            params,
            BucketParameters {
                bucket_count: 8,
                levels: 3
            }
        );
    }

    #[test]
    fn empty_input_collapses_to_one_bucket() {
        let params = compute_bucket_parameters(0, 4, 1).unwrap();
        assert_eq!(params.bucket_count, 1);
        assert_eq!(params.levels, 0);
    }

    #[test]
    fn safety_factor_widens_the_level() {
        let base = compute_bucket_parameters(100, 16, 1).unwrap();
        let wide = compute_bucket_parameters(100, 16, 16).unwrap();
        assert_eq!(base.bucket_count, 16);
        assert_eq!(wide.bucket_count, 256);
        assert_eq!(wide.levels, 8);
    }

    #[test]
    fn rejects_when_half_capacity_cannot_hold_input() {
        // Z = 5: ⌊z/2⌋ = 2, B rounds to 4, and 10 > 4·2.
        let err = compute_bucket_parameters(10, 5, 1).unwrap_err();
        assert!(matches!(err, SortError::Parameter { .. }));
        assert!(err.to_string().contains("too small"));
    }

    #[test]
    fn accepts_when_rounding_rescues_capacity() {
        // The reference accepts (1000, 4): B rounds up to 512 and
        // 1000 ≤ 512·2 holds.
        let params = compute_bucket_parameters(1000, 4, 1).unwrap();
        assert_eq!(params.bucket_count, 512);
    }

    #[test]
    fn rejects_degenerate_capacity() {
        assert!(compute_bucket_parameters(4, 1, 1).is_err());
        assert!(compute_bucket_parameters(4, 8, 0).is_err());
    }

    #[test]
    fn config_rejects_non_power_of_two_capacity() {
        let config = SortConfig::new(6);
        assert!(config.validate().is_err());
        assert!(SortConfig::new(8).validate().is_ok());
    }

    #[test]
    fn config_rejects_bad_streaming_window() {
        let mut config = SortConfig::new(8);
        config.strategy = MergeSplitStrategy::BitonicStreaming { window: 3 };
        assert!(config.validate().is_err());
        config.strategy = MergeSplitStrategy::BitonicStreaming { window: 32 };
        assert!(config.validate().is_err());
        config.strategy = MergeSplitStrategy::BitonicStreaming { window: 16 };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn final_sort_breaks_ties_by_arrival() {
        let records = vec![
            Record::real(5, b"late".to_vec(), 0, 3),
            Record::real(1, b"one".to_vec(), 0, 2),
            Record::real(5, b"early".to_vec(), 0, 0),
        ];
        let sorted = final_sort(records);
        assert_eq!(sorted[0].payload, b"one");
        assert_eq!(sorted[1].payload, b"early");
        assert_eq!(sorted[2].payload, b"late");
    }
}
