//! Ordered section builder for synthesized sources

use std::fmt;

/// Named sections of a synthesized service, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Prelude,
    RateLimit,
    Auth,
    Health,
    Usage,
    Handlers,
    Errors,
    Listen,
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Prelude => "prelude",
            SectionKind::RateLimit => "rate_limit",
            SectionKind::Auth => "auth",
            SectionKind::Health => "health",
            SectionKind::Usage => "usage",
            SectionKind::Handlers => "handlers",
            SectionKind::Errors => "errors",
            SectionKind::Listen => "listen",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A section and its fragments
#[derive(Debug, Clone)]
pub struct Section {
    kind: SectionKind,
    fragments: Vec<String>,
}

impl Section {
    /// Append a fragment, trimming surrounding blank lines
    pub fn fragment(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.fragments.push(text.as_ref().trim_matches('\n').to_string());
        self
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }
}

/// Source assembled from sections in insertion order
#[derive(Debug, Clone, Default)]
pub struct SourceBuilder {
    sections: Vec<Section>,
}

impl SourceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the section of the given kind, opening it at the end if absent
    pub fn section(&mut self, kind: SectionKind) -> &mut Section {
        let index = match self.sections.iter().position(|s| s.kind == kind) {
            Some(index) => index,
            None => {
                self.sections.push(Section {
                    kind,
                    fragments: Vec::new(),
                });
                self.sections.len() - 1
            }
        };
        &mut self.sections[index]
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Render the source; empty sections are skipped
    pub fn build(&self) -> String {
        let mut out = self
            .sections
            .iter()
            .filter(|section| !section.fragments.is_empty())
            .map(|section| section.fragments.join("\n\n"))
            .collect::<Vec<_>>()
            .join("\n\n");
        out.push('\n');
        out
    }
}
