//! Untrusted bucket storage.
//!
//! The store is the memory tier the adversary can watch: every read and
//! write issued through [`BucketStore`] is assumed to leak its coordinate.
//! The store itself is passive. It performs no computation on records, must
//! return the most-recently-written content for a coordinate, and must not
//! reorder or coalesce writes.
//!
//! Slots hold sealed records (see [`crate::envelope`]); blocks are
//! contiguous slot ranges within a bucket, used by the streaming MergeSplit
//! realization.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::StoreError;
use crate::record::{Bucket, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

/// One observed store access, for test observation only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    pub level: u32,
    pub index: u32,
    pub kind: AccessKind,
    /// Slot range `(offset, len)` for block-granular calls.
    pub block: Option<(usize, usize)>,
}

/// Capability the driver consumes to reach the untrusted tier.
pub trait BucketStore {
    /// Return the bucket at `(level, index)`; empty if never written.
    fn read_bucket(&self, level: u32, index: u32) -> Result<Bucket, StoreError>;

    /// Replace the bucket at `(level, index)`.
    fn write_bucket(&self, level: u32, index: u32, bucket: Bucket) -> Result<(), StoreError>;

    /// Read up to `len` slots starting at `offset`; short reads past the
    /// current bucket end are clamped.
    fn read_bucket_block(
        &self,
        level: u32,
        index: u32,
        offset: usize,
        len: usize,
    ) -> Result<Vec<Record>, StoreError>;

    /// Write a block of slots at `offset`, extending the bucket if its
    /// prior size was less than `offset + block.len()`.
    fn write_bucket_block(
        &self,
        level: u32,
        index: u32,
        offset: usize,
        block: Vec<Record>,
    ) -> Result<(), StoreError>;
}

#[derive(Default)]
struct MemoryStoreInner {
    buckets: HashMap<(u32, u32), Bucket>,
    access_log: Vec<AccessRecord>,
}

/// In-memory reference store: `(level, index)` → bucket, plus an
/// append-only access log.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every access issued so far.
    pub fn access_log(&self) -> Vec<AccessRecord> {
        self.inner.lock().access_log.clone()
    }
}

impl BucketStore for MemoryStore {
    fn read_bucket(&self, level: u32, index: u32) -> Result<Bucket, StoreError> {
        let mut inner = self.inner.lock();
        inner.access_log.push(AccessRecord {
            level,
            index,
            kind: AccessKind::Read,
            block: None,
        });
        Ok(inner.buckets.get(&(level, index)).cloned().unwrap_or_default())
    }

    fn write_bucket(&self, level: u32, index: u32, bucket: Bucket) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.access_log.push(AccessRecord {
            level,
            index,
            kind: AccessKind::Write,
            block: None,
        });
        inner.buckets.insert((level, index), bucket);
        Ok(())
    }

    fn read_bucket_block(
        &self,
        level: u32,
        index: u32,
        offset: usize,
        len: usize,
    ) -> Result<Vec<Record>, StoreError> {
        let mut inner = self.inner.lock();
        inner.access_log.push(AccessRecord {
            level,
            index,
            kind: AccessKind::Read,
            block: Some((offset, len)),
        });
        let bucket = inner.buckets.get(&(level, index));
        Ok(match bucket {
            Some(bucket) => {
                let end = bucket.len().min(offset + len);
                bucket.get(offset..end).unwrap_or_default().to_vec()
            }
            None => Vec::new(),
        })
    }

    fn write_bucket_block(
        &self,
        level: u32,
        index: u32,
        offset: usize,
        block: Vec<Record>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.access_log.push(AccessRecord {
            level,
            index,
            kind: AccessKind::Write,
            block: Some((offset, block.len())),
        });
        let bucket = inner.buckets.entry((level, index)).or_default();
        if bucket.len() < offset + block.len() {
            bucket.resize(offset + block.len(), Record::dummy());
        }
        bucket[offset..offset + block.len()].clone_from_slice(&block);
        Ok(())
    }
}
