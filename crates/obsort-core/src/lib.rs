//! # obsort-core
//!
//! Bucket oblivious sort: a sorting primitive whose access pattern on an
//! untrusted storage tier is statistically independent of the input values
//! (Asharov et al.). The trusted side assigns uniform routing keys, pushes
//! fixed-capacity encrypted buckets through a butterfly network of
//! MergeSplit operations, obliviously permutes the survivors, and finishes
//! with an ordinary stable sort on plaintext.
//!
//! The untrusted tier only ever sees sealed Z-slot buckets read and
//! written in a sequence that depends on (N, Z) alone.

#![deny(unsafe_code)]

pub mod driver;
pub mod envelope;
pub mod error;
pub mod merge_split;
pub mod record;
pub mod rng;
pub mod store;

pub use driver::{BucketParameters, ObliviousSorter, SortConfig, compute_bucket_parameters};
pub use envelope::{AesCtrEnvelope, Envelope, XorEnvelope};
pub use error::{OverflowSide, SortError, StoreError};
pub use merge_split::MergeSplitStrategy;
pub use record::{Bucket, Item, Record};
pub use store::{AccessKind, AccessRecord, BucketStore, MemoryStore};
