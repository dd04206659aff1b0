use actix_web::http::StatusCode;
use actix_web::ResponseError;
use thiserror::Error;

/// Fatal conditions in the nonce coordination cycle.
///
/// Every variant fails the request closed: the middleware aborts the response
/// instead of emitting a policy whose nonce commitment cannot be honored.
/// Malformed header segments are deliberately not represented here; they are
/// recovered by preserving the segment verbatim (see [`crate::core::CspPolicy::parse`]).
#[derive(Debug, Error)]
pub enum CspError {
    #[error("system entropy unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("nonce already registered for scope {0}")]
    DoubleNonceRegistration(String),

    #[error("no nonce registered for scope {0} at header finalize")]
    MissingNonce(String),

    #[error("header processing error: {0}")]
    HeaderError(String),

    #[error("config error: {0}")]
    ConfigError(String),
}

impl ResponseError for CspError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::EntropyUnavailable(_)
            | Self::DoubleNonceRegistration(_)
            | Self::MissingNonce(_)
            | Self::HeaderError(_)
            | Self::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
