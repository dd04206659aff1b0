use crate::constants::{DEFAULT_NONCE_LENGTH, MIN_NONCE_LENGTH, NONCE_BUFFER_POOL_SIZE};
use crate::error::CspError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64, Engine};
use getrandom::getrandom;
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::ops::Deref;

/// Draws fresh nonces from the OS CSPRNG, encoded base64url without padding.
///
/// Each call consumes independent entropy; concurrent use from any number of
/// request tasks needs no external synchronization. Scratch buffers are
/// pooled to keep the hot path allocation-free, and the lock around the pool
/// is never held across the RNG call.
#[derive(Debug)]
pub struct NonceGenerator {
    length: usize,
    buffer_pool: Mutex<SmallVec<[Vec<u8>; NONCE_BUFFER_POOL_SIZE]>>,
}

impl NonceGenerator {
    /// Creates a generator drawing `length` random bytes per nonce. Lengths
    /// below 16 bytes are clamped up to the floor.
    #[inline]
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(MIN_NONCE_LENGTH),
            buffer_pool: Mutex::new(SmallVec::new()),
        }
    }

    /// Produces one fresh nonce. Fails with [`CspError::EntropyUnavailable`]
    /// when the system RNG cannot be read; callers abort the response rather
    /// than fall back to a weaker source.
    pub fn generate(&self) -> Result<String, CspError> {
        let mut buffer = {
            let mut pool = self.buffer_pool.lock();
            match pool.pop() {
                Some(mut buf) => {
                    buf.clear();
                    buf.resize(self.length, 0);
                    buf
                }
                None => vec![0u8; self.length],
            }
        };

        getrandom(&mut buffer).map_err(|e| CspError::EntropyUnavailable(e.to_string()))?;
        let encoded = BASE64.encode(&buffer);

        let mut pool = self.buffer_pool.lock();
        if pool.len() < NONCE_BUFFER_POOL_SIZE {
            pool.push(buffer);
        }

        Ok(encoded)
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_NONCE_LENGTH)
    }
}

/// The request's nonce, inserted into the request extensions at scope open so
/// the rendering layer can stamp `nonce="…"` attributes with the exact value
/// the response header will commit to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestNonce(pub String);

impl Deref for RequestNonce {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
