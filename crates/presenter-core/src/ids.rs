//! Manifest identifiers.
//!
//! A manifest id is an optional handler tag followed by the provider's native
//! id, percent-escaped so it can travel as a single path component group:
//! `gh:acct/repo/path%3Fraw%3Dtrue.jpg`. Ids without a tag belong to the
//! default handler and are kept verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Percent-escape a native id, keeping `/` literal.
///
/// `?` becomes `%3F` and `&` becomes `%26`, as do all other reserved characters.
pub fn escape_sourceid(sourceid: &str) -> String {
    urlencoding::encode(sourceid).replace("%2F", "/")
}

/// Reverse [`escape_sourceid`]. Invalid escapes are returned as-is.
pub fn unescape_sourceid(escaped: &str) -> String {
    urlencoding::decode(escaped)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| escaped.to_string())
}

/// A parsed manifest id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManifestId {
    /// Handler tag, absent for raw ids.
    pub tag: Option<String>,
    /// The provider's native id, unescaped.
    pub sourceid: String,
}

impl ManifestId {
    /// Build an id from a tag and an unescaped native id.
    pub fn new(tag: impl Into<String>, sourceid: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            sourceid: sourceid.into(),
        }
    }

    /// A tagless id, kept verbatim.
    pub fn raw(id: impl Into<String>) -> Self {
        Self {
            tag: None,
            sourceid: id.into(),
        }
    }

    /// Split on the first `:` into tag and native id.
    ///
    /// Whether the tag names a registered handler is decided by the caller;
    /// this only handles the grammar.
    pub fn parse(id: &str) -> Self {
        match id.split_once(':') {
            Some((tag, rest)) if !tag.is_empty() => Self::new(tag, unescape_sourceid(rest)),
            _ => Self::raw(unescape_sourceid(id)),
        }
    }

    /// The escaped form of the native id.
    pub fn escaped_sourceid(&self) -> String {
        escape_sourceid(&self.sourceid)
    }

    /// The manifest URL under `baseurl`.
    pub fn manifest_url(&self, baseurl: &str) -> String {
        format!("{}/{}/manifest.json", baseurl.trim_end_matches('/'), self)
    }
}

impl fmt::Display for ManifestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}:{}", tag, self.escaped_sourceid()),
            None => write!(f, "{}", self.sourceid),
        }
    }
}
