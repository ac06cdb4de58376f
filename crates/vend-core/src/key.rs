//! Parsed module identity and the uppercase escape convention
//!
//! Module paths are case-sensitive, but caches and repositories must work on
//! case-insensitive filesystems. Every ASCII uppercase letter is therefore
//! stored as `!` followed by its lowercase form (`github.com/Azure/sdk` becomes
//! `github.com/!azure/sdk`). A [`ModuleKey`] always holds the decoded,
//! real-case path and renders the escaped form only for on-disk layouts.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Separator of the ID form `path:version`.
pub const ID_SEPARATOR: char = ':';

/// Separator of the graph edge form `path@version`.
pub const EDGE_SEPARATOR: char = '@';

const ESCAPE: char = '!';

/// Encode every ASCII uppercase letter of `path` as `!` + lowercase.
///
/// # Errors
///
/// Fails if `path` already contains `!`, since the result could not be
/// decoded unambiguously.
pub fn escape_path(path: &str) -> Result<String> {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if c == ESCAPE {
            return Err(Error::InvalidModulePath {
                path: path.to_string(),
                reason: "contains reserved character '!'".into(),
            });
        }
        if c.is_ascii_uppercase() {
            escaped.push(ESCAPE);
            escaped.push(c.to_ascii_lowercase());
        } else {
            escaped.push(c);
        }
    }
    Ok(escaped)
}

/// Decode `!x` sequences back into uppercase letters.
///
/// Input that is already in real-case form passes through unchanged, so both
/// escaped cache paths and raw graph output can be normalized with this
/// function.
///
/// # Errors
///
/// Fails on a `!` that is not followed by an ASCII lowercase letter.
pub fn unescape_path(escaped: &str) -> Result<String> {
    let mut decoded = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != ESCAPE {
            decoded.push(c);
            continue;
        }
        match chars.next() {
            Some(next) if next.is_ascii_lowercase() => decoded.push(next.to_ascii_uppercase()),
            _ => {
                return Err(Error::InvalidModulePath {
                    path: escaped.to_string(),
                    reason: "'!' must be followed by a lowercase ASCII letter".into(),
                });
            }
        }
    }
    Ok(decoded)
}

/// Composite key identifying one module version.
///
/// Constructed once at the boundary (CLI input, graph output, cache layout)
/// and passed around fully validated from then on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleKey {
    path: String,
    version: String,
}

impl ModuleKey {
    /// Create a key from a real-case module path and a version.
    pub fn new(path: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let version = version.into();
        validate_path(&path)?;
        validate_version(&version)?;
        Ok(Self { path, version })
    }

    /// Parse a `path@version` graph edge.
    ///
    /// The path may be given in escaped or real-case form.
    pub fn parse_edge(edge: &str) -> Result<Self> {
        Self::parse_with(edge, EDGE_SEPARATOR)
    }

    /// Parse a `path:version` module ID.
    pub fn parse_id(id: &str) -> Result<Self> {
        Self::parse_with(id, ID_SEPARATOR)
    }

    fn parse_with(input: &str, separator: char) -> Result<Self> {
        let mut parts = input.split(separator);
        let (Some(path), Some(version), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(Error::MalformedEdge {
                input: input.to_string(),
                separator,
            });
        };
        Self::new(unescape_path(path)?, version)
    }

    /// The real-case module path.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The module path in escaped form, as used by on-disk layouts.
    pub fn escaped_path(&self) -> String {
        escape_segment(&self.path)
    }

    /// The version in escaped form, as used by on-disk layouts.
    pub fn escaped_version(&self) -> String {
        escape_segment(&self.version)
    }

    /// The `path@version` form.
    pub fn edge(&self) -> String {
        format!("{}{}{}", self.path, EDGE_SEPARATOR, self.version)
    }
}

// Validated keys never contain '!', so escaping cannot fail here.
fn escape_segment(value: &str) -> String {
    value
        .chars()
        .flat_map(|c| {
            if c.is_ascii_uppercase() {
                vec![ESCAPE, c.to_ascii_lowercase()]
            } else {
                vec![c]
            }
        })
        .collect()
}

fn validate_path(path: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(Error::InvalidModulePath {
            path: path.to_string(),
            reason: reason.to_string(),
        })
    };

    if path.is_empty() {
        return invalid("path is empty");
    }
    if path.starts_with('/') || path.ends_with('/') {
        return invalid("path must not begin or end with '/'");
    }
    if path.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..") {
        return invalid("path contains an empty or relative segment");
    }
    if let Some(c) = path
        .chars()
        .find(|c| c.is_whitespace() || matches!(*c, ESCAPE | EDGE_SEPARATOR | ID_SEPARATOR | '\\'))
    {
        return invalid(&format!("path contains reserved character {:?}", c));
    }
    Ok(())
}

fn validate_version(version: &str) -> Result<()> {
    let Some(semver_part) = version.strip_prefix('v') else {
        return Err(Error::InvalidVersion {
            version: version.to_string(),
            reason: "version must start with 'v'".into(),
        });
    };
    semver::Version::parse(semver_part).map_err(|e| Error::InvalidVersion {
        version: version.to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.path, ID_SEPARATOR, self.version)
    }
}

impl FromStr for ModuleKey {
    type Err = Error;

    /// Accepts both `path@version` and `path:version`.
    fn from_str(s: &str) -> Result<Self> {
        if s.contains(EDGE_SEPARATOR) {
            Self::parse_edge(s)
        } else {
            Self::parse_id(s)
        }
    }
}
