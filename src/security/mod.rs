pub mod nonce;
pub mod registry;

pub use nonce::{NonceGenerator, RequestNonce};
pub use registry::NonceRegistry;
