pub mod csp;
pub mod extensions;

pub use csp::{csp_middleware, csp_middleware_with_settings, CspMiddleware, CspMiddlewareService, ScopeId};
pub use extensions::CspExtensions;
