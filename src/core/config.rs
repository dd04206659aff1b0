use crate::constants::{DEFAULT_NONCE_LENGTH, STYLE_SRC};
use crate::core::policy::CspPolicy;
use crate::error::CspError;
use crate::security::nonce::NonceGenerator;
use crate::security::registry::NonceRegistry;
use actix_web::http::header::HeaderName;
use parking_lot::RwLock;
use std::{borrow::Cow, str::FromStr, sync::Arc};

/// Shared middleware configuration: the static policy template, the nonce
/// generator, the per-request registry, and the set of directives the nonce
/// is committed to. Cloning is cheap; all clones observe the same state.
#[derive(Clone)]
pub struct CspConfig {
    template: Arc<RwLock<CspPolicy>>,
    nonce_generator: Arc<NonceGenerator>,
    registry: Arc<NonceRegistry>,
    nonce_directives: Arc<[Cow<'static, str>]>,
    nonce_response_header: Option<HeaderName>,
}

impl CspConfig {
    pub fn new(template: CspPolicy) -> Self {
        Self {
            template: Arc::new(RwLock::new(template)),
            nonce_generator: Arc::new(NonceGenerator::new(DEFAULT_NONCE_LENGTH)),
            registry: Arc::new(NonceRegistry::new()),
            nonce_directives: Arc::from([Cow::Borrowed(STYLE_SRC)]),
            nonce_response_header: None,
        }
    }

    /// Snapshot of the static template, used when a response carries no CSP
    /// header of its own.
    #[inline]
    pub fn template(&self) -> CspPolicy {
        self.template.read().clone()
    }

    /// Mutates the template in place for every subsequent request.
    pub fn update_template<F>(&self, f: F)
    where
        F: FnOnce(&mut CspPolicy),
    {
        let mut template = self.template.write();
        f(&mut template);
    }

    #[inline]
    pub fn generator(&self) -> &NonceGenerator {
        &self.nonce_generator
    }

    #[inline]
    pub fn registry(&self) -> &NonceRegistry {
        &self.registry
    }

    /// Directive names the per-request nonce is upserted into.
    #[inline]
    pub fn nonce_directives(&self) -> &[Cow<'static, str>] {
        &self.nonce_directives
    }

    /// Extra response header echoing the nonce, when configured.
    #[inline]
    pub fn nonce_response_header(&self) -> Option<&HeaderName> {
        self.nonce_response_header.as_ref()
    }
}

#[derive(Default)]
pub struct CspConfigBuilder {
    template: Option<CspPolicy>,
    nonce_length: Option<usize>,
    nonce_directives: Vec<Cow<'static, str>>,
    nonce_response_header: Option<HeaderName>,
}

impl CspConfigBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn template(mut self, template: CspPolicy) -> Self {
        self.template = Some(template);
        self
    }

    /// Random byte count per nonce. Values below the 16-byte floor are
    /// clamped up, never honored.
    #[inline]
    pub fn nonce_length(mut self, length: usize) -> Self {
        self.nonce_length = Some(length);
        self
    }

    /// Marks a directive as nonce-bearing. Repeatable; defaults to
    /// `style-src` when never called.
    pub fn nonce_directive(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        if !self.nonce_directives.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
            self.nonce_directives.push(name);
        }
        self
    }

    /// Also echo the nonce in the named response header, carrying the same
    /// value as the CSP directive.
    pub fn nonce_response_header(mut self, name: &str) -> Result<Self, CspError> {
        let header = HeaderName::from_str(name)
            .map_err(|_| CspError::ConfigError(format!("invalid nonce response header '{}'", name)))?;
        self.nonce_response_header = Some(header);
        Ok(self)
    }

    pub fn build(self) -> CspConfig {
        let mut config = CspConfig::new(self.template.unwrap_or_default());

        if let Some(length) = self.nonce_length {
            config.nonce_generator = Arc::new(NonceGenerator::new(length));
        }
        if !self.nonce_directives.is_empty() {
            config.nonce_directives = self.nonce_directives.into();
        }
        config.nonce_response_header = self.nonce_response_header;

        config
    }
}
