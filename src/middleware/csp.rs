use crate::constants::HEADER_CSP;
use crate::core::config::CspConfig;
use crate::core::policy::CspPolicy;
use crate::core::source::Source;
use crate::error::CspError;
use crate::security::nonce::RequestNonce;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::borrow::Cow;
use std::{ops::Deref, rc::Rc, sync::Arc};
use uuid::Uuid;

/// Identifies one request scope; inserted into the request extensions at
/// scope open and used as the [`crate::security::NonceRegistry`] key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeId(pub String);

impl Deref for ScopeId {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Tears the scope down when the request never reaches header finalize:
/// a downstream error, or the request future being dropped mid-flight
/// (client disconnect). Disarmed once the nonce is taken at finalize.
struct ScopeGuard {
    config: Arc<CspConfig>,
    scope_id: Option<String>,
}

impl ScopeGuard {
    fn new(config: Arc<CspConfig>, scope_id: String) -> Self {
        Self {
            config,
            scope_id: Some(scope_id),
        }
    }

    fn disarm(&mut self) {
        self.scope_id = None;
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if let Some(scope_id) = self.scope_id.take() {
            self.config.registry().discard(&scope_id);
        }
    }
}

/// Middleware driving the nonce cycle for every request it wraps.
///
/// On entry it generates and registers a fresh nonce and exposes it through
/// the request extensions; on exit it rewrites the outgoing
/// `Content-Security-Policy` header so the same nonce is committed in every
/// configured nonce-bearing directive. When the downstream handler fails or
/// the request is cancelled before the rewrite, the scope is torn down and no
/// header is touched.
#[derive(Clone)]
pub struct CspMiddleware {
    config: Arc<CspConfig>,
}

impl CspMiddleware {
    #[inline]
    pub fn new(config: CspConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    #[inline]
    pub fn config(&self) -> Arc<CspConfig> {
        self.config.clone()
    }
}

impl<S, B> Transform<S, ServiceRequest> for CspMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = CspMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CspMiddlewareService {
            service: Rc::new(service),
            config: self.config.clone(),
        }))
    }
}

pub struct CspMiddlewareService<S> {
    service: Rc<S>,
    config: Arc<CspConfig>,
}

impl<S, B> Service<ServiceRequest> for CspMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let config = self.config.clone();

        Box::pin(async move {
            let scope_id = Uuid::new_v4()
                .hyphenated()
                .encode_lower(&mut Uuid::encode_buffer())
                .to_owned();

            // Scope open: one nonce per request, registered before the
            // handler runs so every consumer reads the same value.
            let nonce = config.generator().generate()?;
            config.registry().register(&scope_id, nonce.clone())?;
            // Armed until finalize: a downstream error or a dropped request
            // future (client disconnect) must not strand the registry entry.
            let mut guard = ScopeGuard::new(config.clone(), scope_id.clone());

            req.extensions_mut().insert(ScopeId(scope_id.clone()));
            req.extensions_mut().insert(RequestNonce(nonce));

            let mut res = service.call(req).await?;

            let nonce = config
                .registry()
                .take(&scope_id)
                .ok_or_else(|| CspError::MissingNonce(scope_id.clone()))?;
            guard.disarm();

            let header_name = HeaderName::from_static(HEADER_CSP);
            let mut policy = match res.headers().get(&header_name) {
                Some(value) => {
                    let raw = value.to_str().map_err(|_| {
                        CspError::HeaderError(
                            "existing content-security-policy header is not valid UTF-8".into(),
                        )
                    })?;
                    CspPolicy::parse(raw)
                }
                None => {
                    log::debug!("no handler-set CSP header, starting from the configured template");
                    config.template()
                }
            };

            for directive in config.nonce_directives() {
                policy.upsert_source(directive, Source::Nonce(Cow::Owned(nonce.clone())));
            }

            let value = policy.header_value()?;
            // A single header instance only; browsers intersect repeated CSP
            // headers, which is rarely what operators intend.
            res.headers_mut().insert(header_name, value);

            if let Some(echo) = config.nonce_response_header() {
                let value = HeaderValue::from_str(&nonce).map_err(|_| {
                    CspError::HeaderError("nonce is not a valid header value".into())
                })?;
                res.headers_mut().insert(echo.clone(), value);
            }

            Ok(res)
        })
    }
}

/// Wraps `template` with a default configuration: a 16-byte nonce committed
/// to `style-src`.
#[inline]
pub fn csp_middleware(template: CspPolicy) -> CspMiddleware {
    CspMiddleware::new(CspConfig::new(template))
}

/// Builds the middleware from declarative [`CspSettings`].
///
/// [`CspSettings`]: crate::core::CspSettings
pub fn csp_middleware_with_settings(
    settings: crate::core::CspSettings,
) -> Result<CspMiddleware, CspError> {
    Ok(CspMiddleware::new(settings.into_config()?))
}
