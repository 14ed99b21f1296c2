//! AES-128-CTR envelope with a per-sort session key.

use std::sync::atomic::{AtomicU64, Ordering};

use aes::Aes128;
use cipher::{KeyIvInit, StreamCipher};
use rand::RngCore;

use crate::envelope::Envelope;
use crate::error::SortError;
use crate::record::{Bucket, Record};

type Aes128Ctr = ctr::Ctr128BE<Aes128>;

pub const KEY_LEN: usize = 16;
pub const IV_LEN: usize = 16;

/// Production envelope: each record is serialized to the wire format,
/// encrypted under the session key, and stored entirely inside the payload
/// field of the on-disk record. The on-disk cleartext `sort_key`,
/// `routing_key`, `is_dummy`, and `seq` fields are zeroed, so the sealed
/// form reveals nothing about dummy status (P6).
///
/// The key and IV base live in this session object for the duration of one
/// sort; there is no process-global cipher state. Every seal derives a
/// fresh per-record IV from the base and a monotonic counter, so equal
/// plaintexts (every dummy serializes identically) never share a keystream.
pub struct AesCtrEnvelope {
    key: [u8; KEY_LEN],
    iv_base: [u8; IV_LEN],
    seal_count: AtomicU64,
}

impl AesCtrEnvelope {
    /// Draw a fresh session key and IV base.
    pub fn new(rng: &mut impl RngCore) -> Self {
        let mut key = [0u8; KEY_LEN];
        let mut iv_base = [0u8; IV_LEN];
        rng.fill_bytes(&mut key);
        rng.fill_bytes(&mut iv_base);
        Self::from_parts(key, iv_base)
    }

    pub fn from_parts(key: [u8; KEY_LEN], iv_base: [u8; IV_LEN]) -> Self {
        Self {
            key,
            iv_base,
            seal_count: AtomicU64::new(0),
        }
    }

    /// Per-record IV: the seal counter is folded into bytes 4..12 of the
    /// base and the low four bytes are zeroed. The low bytes are the CTR
    /// block counter's room, so keystreams of records sealed under
    /// different counter values cannot collide.
    fn record_iv(&self, count: u64) -> [u8; IV_LEN] {
        let mut iv = self.iv_base;
        for (b, c) in iv[4..12].iter_mut().zip(count.to_be_bytes()) {
            *b ^= c;
        }
        iv[12..].fill(0);
        iv
    }

    fn seal_record(&self, rec: &Record) -> Record {
        let count = self.seal_count.fetch_add(1, Ordering::Relaxed);
        let iv = self.record_iv(count);
        let mut blob = rec.encode();
        let mut cipher = Aes128Ctr::new(&self.key.into(), &iv.into());
        cipher.apply_keystream(&mut blob);

        let mut payload = Vec::with_capacity(IV_LEN + blob.len());
        payload.extend_from_slice(&iv);
        payload.extend_from_slice(&blob);
        Record {
            sort_key: 0,
            payload,
            routing_key: 0,
            is_dummy: false,
            seq: 0,
        }
    }

    fn open_record(&self, rec: &Record) -> Result<Record, SortError> {
        if rec.payload.len() < IV_LEN {
            return Err(SortError::Decryption {
                reason: format!("sealed slot of {} bytes is missing its IV", rec.payload.len()),
            });
        }
        let (iv, ciphertext) = rec.payload.split_at(IV_LEN);
        let iv: [u8; IV_LEN] = iv.try_into().unwrap();
        let mut blob = ciphertext.to_vec();
        let mut cipher = Aes128Ctr::new(&self.key.into(), &iv.into());
        cipher.apply_keystream(&mut blob);
        Record::decode(&blob).map_err(|err| SortError::Decryption {
            reason: err.to_string(),
        })
    }
}

impl Envelope for AesCtrEnvelope {
    fn seal(&self, bucket: &[Record]) -> Bucket {
        bucket.iter().map(|rec| self.seal_record(rec)).collect()
    }

    fn open(&self, bucket: &[Record]) -> Result<Bucket, SortError> {
        bucket.iter().map(|rec| self.open_record(rec)).collect()
    }
}
