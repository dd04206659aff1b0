use crate::constants::{DEFAULT_NONCE_LENGTH, STYLE_SRC};
use crate::core::config::{CspConfig, CspConfigBuilder};
use crate::core::directive::Directive;
use crate::core::policy::{is_directive_name, CspPolicy};
use crate::core::source::Source;
use crate::error::CspError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Static, declarative form of the middleware configuration, suitable for a
/// config file: the directive table, which directives carry the per-request
/// nonce, the nonce length, and an optional response header echoing the
/// nonce.
///
/// The directive table is ordered; header output follows it directive by
/// directive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CspSettings {
    pub directives: IndexMap<String, Vec<String>>,

    #[serde(default = "default_nonce_directives")]
    pub nonce_directives: Vec<String>,

    #[serde(default = "default_nonce_length")]
    pub nonce_length: usize,

    #[serde(default)]
    pub nonce_response_header: Option<String>,
}

fn default_nonce_directives() -> Vec<String> {
    vec![STYLE_SRC.to_owned()]
}

fn default_nonce_length() -> usize {
    DEFAULT_NONCE_LENGTH
}

impl Default for CspSettings {
    fn default() -> Self {
        let mut directives = IndexMap::new();
        directives.insert("default-src".to_owned(), vec!["'self'".to_owned()]);
        directives.insert(
            "style-src".to_owned(),
            vec!["'self'".to_owned(), "'unsafe-inline'".to_owned()],
        );

        Self {
            directives,
            nonce_directives: default_nonce_directives(),
            nonce_length: default_nonce_length(),
            nonce_response_header: None,
        }
    }
}

impl CspSettings {
    /// Validates and lowers the settings into a runtime [`CspConfig`].
    pub fn into_config(self) -> Result<CspConfig, CspError> {
        let mut template = CspPolicy::new();
        for (name, tokens) in self.directives {
            if !is_directive_name(&name) {
                return Err(CspError::ConfigError(format!(
                    "invalid directive name '{}'",
                    name
                )));
            }
            let mut directive = Directive::new(name);
            for token in &tokens {
                directive.add_source(Source::parse(token));
            }
            template.add_directive(directive);
        }

        let mut builder = CspConfigBuilder::new()
            .template(template)
            .nonce_length(self.nonce_length);

        for name in self.nonce_directives {
            if !is_directive_name(&name) {
                return Err(CspError::ConfigError(format!(
                    "invalid nonce-bearing directive name '{}'",
                    name
                )));
            }
            builder = builder.nonce_directive(Cow::Owned(name));
        }

        if let Some(header) = &self.nonce_response_header {
            builder = builder.nonce_response_header(header)?;
        }

        Ok(builder.build())
    }
}
