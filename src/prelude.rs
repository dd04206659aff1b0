pub use crate::core::{CspConfig, CspConfigBuilder, CspPolicy, CspPolicyBuilder, CspSettings, Source};
pub use crate::error::CspError;
pub use crate::middleware::{csp_middleware, csp_middleware_with_settings, CspExtensions, CspMiddleware};
pub use crate::security::{NonceGenerator, NonceRegistry, RequestNonce};
