//! Record and bucket model, plus the envelope-interior wire format.
//!
//! A [`Record`] is the unit the engine moves through the untrusted store.
//! Real records carry the caller's sort key and payload; dummies are
//! padding that keeps every bucket at exactly Z slots. The routing key is
//! assigned at ingestion, consumed bit-by-bit by the butterfly network, and
//! never crosses the public API: callers see only [`Item`].

use thiserror::Error;

/// Byte length of the fixed wire-format header
/// (`sort_key` + `routing_key` + `is_dummy` + `payload_len`).
pub const HEADER_LEN: usize = 13;

/// Byte length of the trailing sequence field.
pub const TRAILER_LEN: usize = 4;

/// A caller-facing record: what goes in and what comes out of a sort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub sort_key: i32,
    pub payload: Vec<u8>,
}

impl Item {
    pub fn new(sort_key: i32, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            sort_key,
            payload: payload.into(),
        }
    }
}

/// An engine-internal record occupying one bucket slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The comparator field the caller wants sorted.
    pub sort_key: i32,
    /// Opaque caller bytes; for sealed on-disk records this field holds the
    /// ciphertext blob instead.
    pub payload: Vec<u8>,
    /// Uniform random value in `[0, B)` drawn at ingestion. Bits of it
    /// select the MergeSplit output at each butterfly level.
    pub routing_key: u32,
    /// Padding marker. Invisible in the sealed form.
    pub is_dummy: bool,
    /// Input ordinal; the final sort breaks `sort_key` ties on it so equal
    /// keys come back in arrival order.
    pub seq: u32,
}

impl Record {
    pub fn real(sort_key: i32, payload: Vec<u8>, routing_key: u32, seq: u32) -> Self {
        Self {
            sort_key,
            payload,
            routing_key,
            is_dummy: false,
            seq,
        }
    }

    /// A padding record. Carries no real values (I5).
    pub fn dummy() -> Self {
        Self {
            sort_key: 0,
            payload: Vec::new(),
            routing_key: 0,
            is_dummy: true,
            seq: 0,
        }
    }

    /// Serialize to the envelope-interior wire format, little-endian:
    ///
    /// ```text
    /// offset 0  : i32  sort_key
    /// offset 4  : u32  routing_key
    /// offset 8  : u8   is_dummy
    /// offset 9  : u32  payload_len
    /// offset 13 : byte[payload_len] payload
    /// trailer   : u32  seq
    /// ```
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.payload.len() + TRAILER_LEN);
        out.extend_from_slice(&self.sort_key.to_le_bytes());
        out.extend_from_slice(&self.routing_key.to_le_bytes());
        out.push(u8::from(self.is_dummy));
        out.extend_from_slice(&(self.payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.payload);
        out.extend_from_slice(&self.seq.to_le_bytes());
        out
    }

    /// Decode a wire-format blob produced by [`Record::encode`].
    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        if data.len() < HEADER_LEN + TRAILER_LEN {
            return Err(WireError::TruncatedHeader { len: data.len() });
        }
        let sort_key = i32::from_le_bytes(data[0..4].try_into().unwrap());
        let routing_key = u32::from_le_bytes(data[4..8].try_into().unwrap());
        let is_dummy = data[8] != 0;
        let payload_len = u32::from_le_bytes(data[9..13].try_into().unwrap()) as usize;
        if HEADER_LEN + payload_len + TRAILER_LEN != data.len() {
            return Err(WireError::PayloadOutOfRange {
                payload_len,
                len: data.len(),
            });
        }
        let payload = data[HEADER_LEN..HEADER_LEN + payload_len].to_vec();
        let seq = u32::from_le_bytes(data[HEADER_LEN + payload_len..].try_into().unwrap());
        Ok(Self {
            sort_key,
            payload,
            routing_key,
            is_dummy,
            seq,
        })
    }
}

/// A fixed-capacity slot array holding real and dummy records
/// interchangeably. The engine never resizes a bucket once initialized.
pub type Bucket = Vec<Record>;

/// Wire-format decode failure. Surfaces to callers as a decryption error.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("blob of {len} bytes is shorter than the fixed header and trailer")]
    TruncatedHeader { len: usize },
    #[error("payload length {payload_len} does not match blob of {len} bytes")]
    PayloadOutOfRange { payload_len: usize, len: usize },
}
