use crate::core::source::Source;
use crate::utils::BufferWriter;
use bytes::BytesMut;
use smallvec::SmallVec;
use std::{borrow::Cow, fmt};

/// One named clause of a CSP header: a directive name plus its ordered list
/// of source expressions.
///
/// The name keeps its original spelling; lookups compare case-insensitively
/// per CSP semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    name: Cow<'static, str>,
    sources: SmallVec<[Source; 4]>,
}

impl Directive {
    #[inline]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            sources: SmallVec::new(),
        }
    }

    /// Appends a source unless an equal one is already present. `'none'`
    /// displaces other sources and vice versa, since it is only meaningful
    /// alone.
    pub fn add_source(&mut self, source: Source) -> &mut Self {
        if source.is_none() {
            self.sources.clear();
            self.sources.push(source);
        } else if self.sources.first().is_some_and(Source::is_none) {
            self.sources.clear();
            self.sources.push(source);
        } else if !self.sources.iter().any(|s| s == &source) {
            self.sources.push(source);
        }
        self
    }

    pub fn add_sources<I>(&mut self, sources: I) -> &mut Self
    where
        I: IntoIterator<Item = Source>,
    {
        for source in sources {
            self.add_source(source);
        }
        self
    }

    /// Appends verbatim, without deduplication. Used by the parser so that
    /// round-tripping reproduces the input token list exactly.
    #[inline]
    pub(crate) fn push_source(&mut self, source: Source) {
        self.sources.push(source);
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    #[inline]
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    #[inline]
    pub fn contains_nonce(&self) -> bool {
        self.sources.iter().any(Source::is_nonce)
    }

    #[inline]
    pub fn estimated_size(&self) -> usize {
        let mut size = self.name.len();
        if !self.sources.is_empty() {
            size += self.sources.len();
            size += self
                .sources
                .iter()
                .map(Source::estimated_size)
                .sum::<usize>();
        }
        size
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for source in &self.sources {
            write!(f, " {}", source)?;
        }
        Ok(())
    }
}

impl BufferWriter for Directive {
    fn write_to_buffer(&self, buffer: &mut BytesMut) {
        buffer.extend_from_slice(self.name.as_bytes());
        for source in &self.sources {
            buffer.extend_from_slice(b" ");
            source.write_to_buffer(buffer);
        }
    }
}
