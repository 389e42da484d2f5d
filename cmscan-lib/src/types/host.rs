use std::fmt::Display;

use serde::Serialize;

/// Ignore lines starting with this marker in host list files
const HOST_COMMENT_MARKER: &str = "#";

/// A scan target, usually a domain or subdomain.
///
/// The value is opaque: apart from trimming surrounding whitespace no
/// structure is assumed, and it is handed to the lookup service verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Host(String);

impl Host {
    /// Create a new host from a raw input line.
    ///
    /// Returns `None` if the line is blank or a comment.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with(HOST_COMMENT_MARKER) {
            return None;
        }
        Some(Self(line.to_string()))
    }

    /// Collect all hosts from newline-delimited text, preserving input order.
    ///
    /// Duplicates are kept; every line is scanned as often as it appears.
    #[must_use]
    pub fn from_lines(text: &str) -> Vec<Self> {
        text.lines().filter_map(Self::parse).collect()
    }

    /// The host as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Host {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Display for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
