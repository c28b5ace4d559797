//! Result and error types for Sondear.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for Sondear operations
pub type SondearResult<T> = Result<T, SondearError>;

/// Fatal errors: any of these aborts an entire validation run.
///
/// Per-item probe failures are not errors in this sense. They are recorded
/// inline on each [`crate::ValidationResult`] as a [`ProbeFailure`] and the
/// run continues with the next item; only the aggregate verdict can turn
/// them into a [`SondearError::Validation`] at the very end.
#[derive(Debug, Error)]
pub enum SondearError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Initial page load failed (no response, bad status, or timeout)
    #[error("Failed to load {url}: {message}")]
    Load {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// The strategy document could not be parsed
    #[error("Malformed strategy document: {message}")]
    StrategyFormat {
        /// Parser error message
        message: String,
    },

    /// Browser transport failure outside any single probe
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// The run completed but the batch did not pass
    #[error("Selector validation failed ({failure_rate:.1}% unusable): {summary}")]
    Validation {
        /// Percentage of selectors that failed their probe
        failure_rate: f64,
        /// Bounded diagnostics: up to the first three failing items
        summary: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-item failure classification.
///
/// One of these on a result means the selector is unusable for its declared
/// action. The rest of the run is unaffected; callers see the
/// classification through the result record and the bundled report
/// diagnostics, never as a thrown error per item.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ProbeFailure {
    /// Selector dialect the engine cannot express
    #[error("unsupported selector syntax: {0}")]
    UnsupportedSyntax(String),

    /// No element matches the selector on the current page
    #[error("no element matches the selector")]
    NotFound,

    /// First matching element is not visible
    #[error("element is not visible")]
    NotVisible,

    /// Element is disabled and cannot receive a click
    #[error("element is not enabled")]
    NotEnabled,

    /// Element cannot take text input
    #[error("element is not editable")]
    NotEditable,

    /// Element rejected the interaction the probe attempted
    #[error("element is not interactable: {0}")]
    NotInteractable(String),

    /// A filled probe string did not show up on read-back
    #[error("element did not accept the probe input")]
    NotAcceptingInput,

    /// Element text does not satisfy the selector's text expectation
    #[error("text mismatch: expected {expected:?}, found {actual:?}")]
    TextMismatch {
        /// Expected text fragment from the selector
        expected: String,
        /// Text content actually read from the element
        actual: String,
    },

    /// Declared action outside the five-value set
    #[error("unrecognized action: {0:?}")]
    UnsupportedAction(String),

    /// The browser failed mid-probe; recorded against this item only
    #[error("probe failed in the browser: {0}")]
    Driver(String),
}
