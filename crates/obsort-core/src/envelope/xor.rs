//! Simulated encryption for algorithm verification.

use crate::envelope::Envelope;
use crate::error::SortError;
use crate::record::{Bucket, Record};

/// XOR-with-fixed-key envelope. Real records' integer fields are XORed
/// with a 32-bit key; the dummy flag and payload stay in clear.
///
/// Not secure against a ciphertext-analyzing adversary. Testing only.
#[derive(Debug, Clone, Copy)]
pub struct XorEnvelope {
    key: u32,
}

impl XorEnvelope {
    pub const DEFAULT_KEY: u32 = 0xdead_beef;

    pub fn new(key: u32) -> Self {
        Self { key }
    }

    fn mask(&self, bucket: &[Record]) -> Bucket {
        bucket
            .iter()
            .map(|rec| {
                let mut rec = rec.clone();
                if !rec.is_dummy {
                    rec.sort_key = (rec.sort_key as u32 ^ self.key) as i32;
                    rec.routing_key ^= self.key;
                    rec.seq ^= self.key;
                }
                rec
            })
            .collect()
    }
}

impl Default for XorEnvelope {
    fn default() -> Self {
        Self::new(Self::DEFAULT_KEY)
    }
}

impl Envelope for XorEnvelope {
    fn seal(&self, bucket: &[Record]) -> Bucket {
        self.mask(bucket)
    }

    fn open(&self, bucket: &[Record]) -> Result<Bucket, SortError> {
        Ok(self.mask(bucket))
    }
}
