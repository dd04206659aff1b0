use crate::middleware::csp::ScopeId;
use crate::security::nonce::RequestNonce;
use actix_web::HttpMessage;

/// Read access to the per-request nonce material for handlers and renderers.
///
/// The rendering layer must use [`CspExtensions::nonce`] for its
/// `nonce="…"` attributes rather than generating its own value; only the
/// middleware-issued nonce matches what the response header will commit to.
pub trait CspExtensions {
    fn nonce(&self) -> Option<String>;
    fn scope_id(&self) -> Option<String>;
}

impl<T> CspExtensions for T
where
    T: HttpMessage,
{
    fn nonce(&self) -> Option<String> {
        self.extensions()
            .get::<RequestNonce>()
            .map(|nonce| nonce.0.clone())
    }

    fn scope_id(&self) -> Option<String> {
        self.extensions().get::<ScopeId>().map(|id| id.0.clone())
    }
}
