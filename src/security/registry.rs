use crate::error::CspError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Per-request nonce store keyed by scope id.
///
/// The middleware is the single writer: it registers exactly one nonce when a
/// request scope opens and removes it when the scope closes. Everything else
/// (the rendering layer, the header rewrite) only reads, so the nonce stamped
/// onto inline elements and the one committed in the header are the same
/// value by construction, never two independent draws.
#[derive(Debug, Default)]
pub struct NonceRegistry {
    nonces: DashMap<String, String>,
}

impl NonceRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the scope's nonce. A second registration for the same scope
    /// is a double-injection bug and fails with
    /// [`CspError::DoubleNonceRegistration`] instead of overwriting.
    pub fn register(&self, scope_id: &str, nonce: String) -> Result<(), CspError> {
        match self.nonces.entry(scope_id.to_owned()) {
            Entry::Occupied(_) => Err(CspError::DoubleNonceRegistration(scope_id.to_owned())),
            Entry::Vacant(slot) => {
                slot.insert(nonce);
                Ok(())
            }
        }
    }

    /// The scope's nonce, or `None` before registration. Never a default: a
    /// consumer must not stamp an attribute that will not match the header.
    #[inline]
    pub fn get(&self, scope_id: &str) -> Option<String> {
        self.nonces.get(scope_id).map(|entry| entry.value().clone())
    }

    /// Removes and returns the scope's nonce; used at header finalize, after
    /// which the scope is done.
    #[inline]
    pub fn take(&self, scope_id: &str) -> Option<String> {
        self.nonces.remove(scope_id).map(|(_, nonce)| nonce)
    }

    /// Tears the scope down without reading it, for cancelled or failed
    /// requests that never reach the header rewrite.
    #[inline]
    pub fn discard(&self, scope_id: &str) {
        self.nonces.remove(scope_id);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nonces.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nonces.is_empty()
    }
}
