//! Data model: proposed interactions and per-item outcomes.

use serde::{Deserialize, Serialize};

use crate::result::ProbeFailure;

/// The five actions a planner may declare for a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Element will be clicked
    Click,
    /// Element will be hovered
    Hover,
    /// Element will receive text input
    Type,
    /// Element content will be asserted on
    Verify,
    /// Element is expected to change the current page
    Navigate,
}

impl Action {
    /// Decode a planner-supplied action string.
    ///
    /// Returns `None` for anything outside the five known values; the
    /// caller records that as a per-item failure rather than refusing the
    /// whole document.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "click" => Some(Self::Click),
            "hover" => Some(Self::Hover),
            "type" => Some(Self::Type),
            "verify" => Some(Self::Verify),
            "navigate" => Some(Self::Navigate),
            _ => None,
        }
    }

    /// Canonical lowercase name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Hover => "hover",
            Self::Type => "type",
            Self::Verify => "verify",
            Self::Navigate => "navigate",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One proposed interaction to validate.
///
/// Planner output: the selector is the only field used for resolution.
/// `element_type` feeds the navigation-eligibility heuristic; `purpose`
/// and `reasoning` surface in diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSpec {
    /// Structural (CSS) query or `//`-prefixed path query
    #[serde(alias = "recommended_selector", alias = "recommendedSelector")]
    pub selector: String,
    /// Free-text classification, e.g. "navigation link" or "submit button"
    #[serde(default, alias = "elementType")]
    pub element_type: String,
    /// Human-readable rationale for proposing this element
    #[serde(default)]
    pub purpose: String,
    /// Declared action, kept raw so unrecognized values fail per-item
    /// instead of crashing document parsing
    #[serde(default)]
    pub action: String,
    /// Planner reasoning, diagnostics only
    #[serde(default)]
    pub reasoning: String,
}

impl SelectorSpec {
    /// Create a spec with a selector and declared action
    #[must_use]
    pub fn new(selector: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            element_type: String::new(),
            purpose: String::new(),
            action: action.into(),
            reasoning: String::new(),
        }
    }

    /// Set the element-type label
    #[must_use]
    pub fn with_element_type(mut self, element_type: impl Into<String>) -> Self {
        self.element_type = element_type.into();
        self
    }

    /// Set the purpose string
    #[must_use]
    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }

    /// Set the reasoning string
    #[must_use]
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    /// The declared action, if it is one of the five recognized values
    #[must_use]
    pub fn action(&self) -> Option<Action> {
        Action::parse(&self.action)
    }
}

/// Outcome of probing one [`SelectorSpec`] against the current page.
///
/// Created once per proposed interaction, immutable after construction,
/// never merged or retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True only if every applicable check passed
    pub success: bool,
    /// Resolver returned at least one matching element
    pub found: bool,
    /// First matching element is visible
    pub visible: bool,
    /// Set only when the selector encodes a text expectation
    pub text_matches: Option<bool>,
    /// Classified failure reason, if any
    pub error: Option<ProbeFailure>,
    /// Page URL at the moment of probing
    pub current_url: String,
}

impl ValidationResult {
    /// Start building a result for the page at `current_url`
    #[must_use]
    pub fn builder(current_url: impl Into<String>) -> ValidationResultBuilder {
        ValidationResultBuilder {
            found: false,
            visible: false,
            text_matches: None,
            current_url: current_url.into(),
        }
    }
}

/// Folds the probe pipeline into one immutable record.
///
/// Each probe step flips a flag as it passes; `fail` and `pass` are the
/// only terminals, so the success bit can never disagree with the recorded
/// error.
#[derive(Debug, Clone)]
pub struct ValidationResultBuilder {
    found: bool,
    visible: bool,
    text_matches: Option<bool>,
    current_url: String,
}

impl ValidationResultBuilder {
    /// Record that the selector resolved to at least one element
    #[must_use]
    pub fn found(mut self) -> Self {
        self.found = true;
        self
    }

    /// Record that the first matching element is visible
    #[must_use]
    pub fn visible(mut self) -> Self {
        self.visible = true;
        self
    }

    /// Record the text-expectation outcome
    #[must_use]
    pub fn text_matches(mut self, matched: bool) -> Self {
        self.text_matches = Some(matched);
        self
    }

    /// Terminal: record the failure that stopped this item
    #[must_use]
    pub fn fail(self, failure: ProbeFailure) -> ValidationResult {
        ValidationResult {
            success: false,
            found: self.found,
            visible: self.visible,
            text_matches: self.text_matches,
            error: Some(failure),
            current_url: self.current_url,
        }
    }

    /// Terminal: every applicable check passed
    #[must_use]
    pub fn pass(self) -> ValidationResult {
        ValidationResult {
            success: true,
            found: self.found,
            visible: self.visible,
            text_matches: self.text_matches,
            error: None,
            current_url: self.current_url,
        }
    }
}
