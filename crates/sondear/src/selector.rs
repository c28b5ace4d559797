//! Selector classification and text expectations.
//!
//! The resolver is intentionally literal: a selector is either a structural
//! (CSS) query or a `//`-prefixed path query, and anything the engine's
//! query languages cannot express is rejected by name up front. Failures
//! stay attributable to the planner's output, not to resolver rewriting.

use std::sync::LazyLock;

use regex::Regex;

use crate::result::ProbeFailure;

/// A classified, queryable selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Structural query, resolved via `querySelectorAll`
    Css(String),
    /// Path query, resolved via `document.evaluate`
    XPath(String),
}

impl Selector {
    /// Classify a raw selector string, rejecting unsupported dialects.
    ///
    /// # Errors
    ///
    /// [`ProbeFailure::UnsupportedSyntax`] for `:contains(...)`
    /// pseudo-functions (not valid in the structural query language), `N/A`
    /// placeholder markers, and embedded `javascript:` expressions — each an
    /// explicit named rejection, never a silent empty match.
    pub fn parse(raw: &str) -> Result<Self, ProbeFailure> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProbeFailure::UnsupportedSyntax("empty selector".to_string()));
        }
        let lowered = trimmed.to_ascii_lowercase();
        if lowered.starts_with("n/a") {
            return Err(ProbeFailure::UnsupportedSyntax(
                "placeholder selector, nothing to resolve".to_string(),
            ));
        }
        if lowered.contains("javascript:") {
            return Err(ProbeFailure::UnsupportedSyntax(
                "script expression instead of a locator".to_string(),
            ));
        }
        if trimmed.starts_with("//") {
            return Ok(Self::XPath(trimmed.to_string()));
        }
        if lowered.contains(":contains(") {
            return Err(ProbeFailure::UnsupportedSyntax(
                ":contains() pseudo-function is not valid CSS".to_string(),
            ));
        }
        Ok(Self::Css(trimmed.to_string()))
    }

    /// The underlying query string
    #[must_use]
    pub fn raw(&self) -> &str {
        match self {
            Self::Css(s) | Self::XPath(s) => s,
        }
    }

    /// True for path queries
    #[must_use]
    pub const fn is_xpath(&self) -> bool {
        matches!(self, Self::XPath(_))
    }

    /// JS expression yielding the first matching element or `null`
    #[must_use]
    pub fn js_first(&self) -> String {
        match self {
            Self::Css(s) => format!("document.querySelector({s:?})"),
            Self::XPath(s) => format!(
                "document.evaluate({s:?}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue"
            ),
        }
    }

    /// JS expression yielding the number of matching elements
    #[must_use]
    pub fn js_count(&self) -> String {
        match self {
            Self::Css(s) => format!("document.querySelectorAll({s:?}).length"),
            Self::XPath(s) => format!(
                "document.evaluate({s:?}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength"
            ),
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw())
    }
}

/// How an expected text fragment is compared against element text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextMatchMode {
    /// Exact equality
    Exact,
    /// Equality after whitespace normalization
    Normalized,
    /// Substring containment
    Contains,
}

/// A text expectation encoded in a path-query predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextExpectation {
    /// Expected text fragment
    pub expected: String,
    /// Comparison mode
    pub mode: TextMatchMode,
}

static CONTAINS_TEXT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"contains\(\s*text\(\)\s*,\s*['"]([^'"]*)['"]\s*\)"#).ok());
static NORMALIZED_TEXT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"normalize-space\(\s*(?:text\(\)|\.)\s*\)\s*=\s*['"]([^'"]*)['"]"#).ok()
});
static EXACT_TEXT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"text\(\)\s*=\s*['"]([^'"]*)['"]"#).ok());

impl TextExpectation {
    /// Extract a text expectation from a raw selector string.
    ///
    /// Three path-query predicate forms are recognized:
    /// `contains(text(),'x')`, `normalize-space(text())='x'` (or
    /// `normalize-space(.)='x'`), and `text()='x'`. Any other selector
    /// carries no expectation.
    #[must_use]
    pub fn from_selector(raw: &str) -> Option<Self> {
        let capture = |pattern: &Option<Regex>| {
            pattern
                .as_ref()
                .and_then(|re| re.captures(raw))
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        };

        if let Some(expected) = capture(&CONTAINS_TEXT) {
            return Some(Self {
                expected,
                mode: TextMatchMode::Contains,
            });
        }
        if let Some(expected) = capture(&NORMALIZED_TEXT) {
            return Some(Self {
                expected,
                mode: TextMatchMode::Normalized,
            });
        }
        capture(&EXACT_TEXT).map(|expected| Self {
            expected,
            mode: TextMatchMode::Exact,
        })
    }

    /// Compare against the element's text content.
    #[must_use]
    pub fn matches(&self, actual: &str) -> bool {
        match self.mode {
            TextMatchMode::Exact => actual == self.expected,
            TextMatchMode::Normalized => normalize_space(actual) == normalize_space(&self.expected),
            TextMatchMode::Contains => actual.contains(&self.expected),
        }
    }
}

fn normalize_space(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
