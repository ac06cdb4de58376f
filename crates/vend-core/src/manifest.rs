//! Manifest classification and lifecycle

use regex::Regex;

use crate::error::Result;

/// Matches a line that declares at least one requirement.
const NOT_EMPTY_PATTERN: &str = r"^\s*require(?:\s+\S|\s*\()";

/// Decides whether a manifest is "empty" and whether it carries the edit
/// marker.
///
/// A manifest is empty when no line declares a requirement, even if it has a
/// `module` line or comments.
#[derive(Debug, Clone)]
pub struct ManifestMatcher {
    not_empty: Regex,
    marker: Regex,
    edit_message: String,
}

impl ManifestMatcher {
    pub fn new(edit_message: impl Into<String>) -> Result<Self> {
        let edit_message = edit_message.into();
        let not_empty = Regex::new(NOT_EMPTY_PATTERN)?;
        let marker = Regex::new(&format!(r"^\s*{}", regex::escape(edit_message.trim_end())))?;
        Ok(Self {
            not_empty,
            marker,
            edit_message,
        })
    }

    pub fn edit_message(&self) -> &str {
        &self.edit_message
    }

    /// True when the not-empty pattern matches on no line.
    pub fn is_empty(&self, content: &[u8]) -> bool {
        !any_line_matches(&self.not_empty, content)
    }

    /// True when some line starts with the edit marker.
    pub fn has_marker(&self, content: &[u8]) -> bool {
        !self.edit_message.trim().is_empty() && any_line_matches(&self.marker, content)
    }

    /// Prefix `content` with the edit message and a blank line unless it is
    /// already marked.
    pub fn with_marker(&self, content: &[u8]) -> Vec<u8> {
        if self.has_marker(content) {
            return content.to_vec();
        }
        let mut marked = Vec::with_capacity(self.edit_message.len() + 2 + content.len());
        marked.extend_from_slice(self.edit_message.as_bytes());
        marked.extend_from_slice(b"\n\n");
        marked.extend_from_slice(content);
        marked
    }
}

fn any_line_matches(regex: &Regex, content: &[u8]) -> bool {
    String::from_utf8_lossy(content)
        .lines()
        .any(|line| regex.is_match(line))
}

/// Where a package's manifest stands in the populate/publish cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ManifestState {
    /// Nothing has been decided yet.
    #[default]
    Draft,
    /// The manifest of record is the current content; no revert is needed.
    Populated,
    /// Tidy rewrote the workspace manifest to compute the graph. The manifest
    /// of record is `snapshot`, the content from before bootstrap.
    TidyGenerated { snapshot: Vec<u8> },
    /// The package is in the target repository; its manifest is final.
    Published,
}

impl ManifestState {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published)
    }

    pub fn needs_revert(&self) -> bool {
        matches!(self, Self::TidyGenerated { .. })
    }
}
