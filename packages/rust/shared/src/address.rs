//! Recipient address parsing and canonical formatting.
//!
//! Spreadsheet cells hold addresses separated by `;` or `,`. Mail transports
//! want them comma-joined, desktop mail clients want them semicolon-joined.

use std::sync::LazyLock;

use regex::Regex;

static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[;,]").expect("valid regex"));

/// An ordered list of recipient addresses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Recipients(Vec<String>);

impl Recipients {
    /// Parse a `;`/`,` separated list. Tokens without `@` are dropped.
    pub fn parse(raw: &str) -> Self {
        Self(
            SEPARATOR_RE
                .split(raw)
                .map(str::trim)
                .filter(|part| !part.is_empty() && part.contains('@'))
                .map(String::from)
                .collect(),
        )
    }

    /// Wrap already-validated addresses.
    pub fn from_vec(addresses: Vec<String>) -> Self {
        Self(addresses)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Comma-joined form used in MIME headers and SMTP.
    pub fn for_mime(&self) -> String {
        self.0.join(", ")
    }

    /// Semicolon-joined form used by desktop mail clients.
    pub fn for_desktop(&self) -> String {
        self.0.join("; ")
    }
}
