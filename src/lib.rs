//! Per-request Content-Security-Policy nonce coordination for Actix Web.
//!
//! For every request the middleware draws one cryptographically unpredictable
//! nonce, makes it available to the rendering layer through the request
//! extensions, and commits the same value into the nonce-bearing directives
//! of the outgoing `Content-Security-Policy` header. The browser's nonce
//! check then succeeds exactly once per cycle and never leaks across
//! unrelated requests.
//!
//! ```no_run
//! use actix_csp_nonce::prelude::*;
//! use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
//!
//! async fn page(req: HttpRequest) -> HttpResponse {
//!     let nonce = req.nonce().unwrap_or_default();
//!     HttpResponse::Ok()
//!         .content_type("text/html")
//!         .body(format!("<style nonce=\"{nonce}\">body {{ margin: 0 }}</style>"))
//! }
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     let template = CspPolicyBuilder::new()
//!         .default_src([Source::Self_])
//!         .style_src([Source::Self_])
//!         .build();
//!
//!     HttpServer::new(move || {
//!         App::new()
//!             .wrap(csp_middleware(template.clone()))
//!             .route("/", web::get().to(page))
//!     })
//!     .bind(("127.0.0.1", 8080))?
//!     .run()
//!     .await
//! }
//! ```

pub mod constants;
pub mod core;
pub mod error;
pub mod middleware;
pub mod prelude;
pub mod security;
pub mod utils;

// Re-export commonly used types for convenience
pub use crate::core::{
    CspConfig, CspConfigBuilder, CspPolicy, CspPolicyBuilder, CspSettings, Directive,
    PolicySegment, Source,
};
pub use error::CspError;
pub use middleware::{
    csp_middleware, csp_middleware_with_settings, CspExtensions, CspMiddleware, ScopeId,
};
pub use security::{NonceGenerator, NonceRegistry, RequestNonce};
