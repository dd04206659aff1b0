use crate::constants::{
    BASE_URI, CONNECT_SRC, DEFAULT_BUFFER_CAPACITY, DEFAULT_SRC, FONT_SRC, FORM_ACTION,
    FRAME_ANCESTORS, IMG_SRC, OBJECT_SRC, SCRIPT_SRC, SEMICOLON_SPACE, STYLE_SRC,
};
use crate::core::directive::Directive;
use crate::core::source::Source;
use crate::error::CspError;
use crate::utils::BufferWriter;
use actix_web::http::header::HeaderValue;
use bytes::BytesMut;
use smallvec::SmallVec;
use std::{borrow::Cow, fmt};

/// One `;`-separated segment of a policy header.
///
/// Segments the parser cannot interpret as a directive are preserved
/// byte-for-byte as `Opaque`, so serializing a parsed header never drops
/// content the caller did not ask to change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicySegment {
    Directive(Directive),
    Opaque(String),
}

impl PolicySegment {
    #[inline]
    pub fn as_directive(&self) -> Option<&Directive> {
        match self {
            PolicySegment::Directive(directive) => Some(directive),
            PolicySegment::Opaque(_) => None,
        }
    }
}

/// An ordered Content-Security-Policy header value.
///
/// Directive order and token order are preserved across a parse/serialize
/// round trip, and a directive name never appears twice among the parsed
/// directives (CSP honors only the first occurrence; a repeat is kept as an
/// opaque segment).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CspPolicy {
    segments: SmallVec<[PolicySegment; 8]>,
}

impl CspPolicy {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw header value.
    ///
    /// Splits on `;`, trims each segment, and splits the segment on its first
    /// whitespace run into a directive name and a token list. Malformed
    /// segments fail softly: they are preserved verbatim as opaque segments
    /// and logged, never silently dropped.
    pub fn parse(raw: &str) -> Self {
        let mut policy = Self::new();
        for segment in raw.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }

            let (name, rest) = match segment.split_once(char::is_whitespace) {
                Some((name, rest)) => (name, rest),
                None => (segment, ""),
            };

            if !is_directive_name(name) {
                log::warn!("preserving unparsable CSP segment verbatim");
                policy.segments.push(PolicySegment::Opaque(segment.to_owned()));
                continue;
            }
            if policy.get_directive(name).is_some() {
                // Only the first occurrence of a directive name is honored.
                log::warn!("preserving repeated CSP directive '{}' verbatim", name);
                policy.segments.push(PolicySegment::Opaque(segment.to_owned()));
                continue;
            }

            let mut directive = Directive::new(name.to_owned());
            for token in rest.split_whitespace() {
                directive.push_source(Source::parse(token));
            }
            policy.segments.push(PolicySegment::Directive(directive));
        }
        policy
    }

    pub fn add_directive(&mut self, directive: Directive) -> &mut Self {
        if let Some(existing) = self.get_directive_mut(directive.name()) {
            *existing = directive;
        } else {
            self.segments.push(PolicySegment::Directive(directive));
        }
        self
    }

    /// Adds `source` to the named directive, appending a new directive when
    /// none exists. Idempotent: an exactly-equal token is not added twice,
    /// and a directive that already carries a `'nonce-…'` token is left
    /// untouched so a repeated rewrite cannot accumulate stale nonces.
    pub fn upsert_source(&mut self, name: &str, source: Source) -> &mut Self {
        match self.get_directive_mut(name) {
            Some(directive) => {
                if !directive.contains_nonce() {
                    directive.add_source(source);
                }
            }
            None => {
                let mut directive = Directive::new(name.to_owned());
                directive.add_source(source);
                self.segments.push(PolicySegment::Directive(directive));
            }
        }
        self
    }

    #[inline]
    pub fn get_directive(&self, name: &str) -> Option<&Directive> {
        self.directives().find(|d| d.name_matches(name))
    }

    #[inline]
    fn get_directive_mut(&mut self, name: &str) -> Option<&mut Directive> {
        self.segments.iter_mut().find_map(|segment| match segment {
            PolicySegment::Directive(d) if d.name_matches(name) => Some(d),
            _ => None,
        })
    }

    #[inline]
    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.segments.iter().filter_map(PolicySegment::as_directive)
    }

    #[inline]
    pub fn segments(&self) -> &[PolicySegment] {
        &self.segments
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[inline]
    pub fn contains_nonce(&self) -> bool {
        self.directives().any(Directive::contains_nonce)
    }

    fn estimated_size(&self) -> usize {
        self.segments
            .iter()
            .map(|segment| match segment {
                PolicySegment::Directive(d) => d.estimated_size(),
                PolicySegment::Opaque(raw) => raw.len(),
            })
            .sum::<usize>()
            + self.segments.len().saturating_sub(1) * SEMICOLON_SPACE.len()
    }

    /// Serializes into a single header value. The output re-parses to an
    /// equal policy.
    pub fn header_value(&self) -> Result<HeaderValue, CspError> {
        let mut buffer = BytesMut::with_capacity(self.estimated_size().max(DEFAULT_BUFFER_CAPACITY));

        let mut first = true;
        for segment in &self.segments {
            if !first {
                buffer.extend_from_slice(SEMICOLON_SPACE);
            }
            match segment {
                PolicySegment::Directive(directive) => directive.write_to_buffer(&mut buffer),
                PolicySegment::Opaque(raw) => buffer.extend_from_slice(raw.as_bytes()),
            }
            first = false;
        }

        HeaderValue::from_maybe_shared(buffer.freeze())
            .map_err(|_| CspError::HeaderError("policy serialized to an invalid header value".into()))
    }
}

impl fmt::Display for CspPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                f.write_str("; ")?;
            }
            match segment {
                PolicySegment::Directive(directive) => write!(f, "{}", directive)?,
                PolicySegment::Opaque(raw) => f.write_str(raw)?,
            }
            first = false;
        }
        Ok(())
    }
}

/// Directive names are `1*( ALPHA / DIGIT / "-" )` per the CSP grammar.
pub(crate) fn is_directive_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// Fluent constructor for a static policy template.
#[derive(Debug, Default)]
pub struct CspPolicyBuilder {
    policy: CspPolicy,
}

impl CspPolicyBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    fn directive(mut self, name: &'static str, sources: impl IntoIterator<Item = Source>) -> Self {
        let mut directive = Directive::new(Cow::Borrowed(name));
        directive.add_sources(sources);
        self.policy.add_directive(directive);
        self
    }

    pub fn default_src(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.directive(DEFAULT_SRC, sources)
    }

    pub fn script_src(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.directive(SCRIPT_SRC, sources)
    }

    pub fn style_src(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.directive(STYLE_SRC, sources)
    }

    pub fn img_src(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.directive(IMG_SRC, sources)
    }

    pub fn connect_src(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.directive(CONNECT_SRC, sources)
    }

    pub fn font_src(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.directive(FONT_SRC, sources)
    }

    pub fn object_src(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.directive(OBJECT_SRC, sources)
    }

    pub fn frame_ancestors(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.directive(FRAME_ANCESTORS, sources)
    }

    pub fn base_uri(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.directive(BASE_URI, sources)
    }

    pub fn form_action(self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.directive(FORM_ACTION, sources)
    }

    #[inline]
    pub fn with_directive(mut self, directive: Directive) -> Self {
        self.policy.add_directive(directive);
        self
    }

    #[inline]
    pub fn build(self) -> CspPolicy {
        self.policy
    }
}
