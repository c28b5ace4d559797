//! Navigation side-effect tracking.
//!
//! A successful click/navigate probe on a link-like element is expected to
//! move the page; later selectors must be validated against whatever page
//! that interaction produced. Advancement is optimistic: a click that goes
//! nowhere is information, not an error.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::driver::PageDriver;
use crate::schema::{Action, SelectorSpec, ValidationResult};
use crate::selector::Selector;

/// Default bound on the post-click settle wait.
pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Heuristic gate deciding which probed elements get a real click.
///
/// Keyword matching over the planner's free-text element type is fuzzy by
/// nature, so the policy is a named value that can be swapped or tested on
/// its own rather than a conditional buried in the runner.
#[derive(Debug, Clone)]
pub struct NavigationPolicy {
    keywords: Vec<String>,
}

impl Default for NavigationPolicy {
    fn default() -> Self {
        Self::new(["link", "button", "menu", "nav"])
    }
}

impl NavigationPolicy {
    /// Build a policy from a keyword set
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Case-insensitive substring match over the element-type label
    #[must_use]
    pub fn is_navigation_like(&self, element_type: &str) -> bool {
        let lowered = element_type.to_ascii_lowercase();
        self.keywords.iter().any(|keyword| lowered.contains(keyword))
    }
}

/// URL transition recorded around one real click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationRecord {
    /// Selector that was clicked
    pub selector: String,
    /// URL before the click
    pub from: String,
    /// URL after the settle wait
    pub to: String,
    /// Whether the URL actually changed
    pub changed: bool,
}

impl NavigationRecord {
    fn unchanged(selector: &str, url: String) -> Self {
        Self {
            selector: selector.to_string(),
            from: url.clone(),
            to: url,
            changed: false,
        }
    }
}

/// Performs and records optimistic navigation attempts.
#[derive(Debug, Clone)]
pub struct NavigationTracker {
    policy: NavigationPolicy,
    settle_timeout: Duration,
}

impl Default for NavigationTracker {
    fn default() -> Self {
        Self::new(NavigationPolicy::default(), DEFAULT_SETTLE_TIMEOUT)
    }
}

impl NavigationTracker {
    /// Create a tracker with a policy and settle bound
    #[must_use]
    pub fn new(policy: NavigationPolicy, settle_timeout: Duration) -> Self {
        Self {
            policy,
            settle_timeout,
        }
    }

    /// The eligibility gate: probe succeeded, action is click or navigate,
    /// and the element type reads as navigation-like.
    #[must_use]
    pub fn should_attempt(&self, result: &ValidationResult, spec: &SelectorSpec) -> bool {
        result.success
            && matches!(spec.action(), Some(Action::Click | Action::Navigate))
            && self.policy.is_navigation_like(&spec.element_type)
    }

    /// Really click the first match and wait for the page to settle.
    ///
    /// This is the one probe that intentionally mutates shared page state.
    /// Failure to settle, or no URL change, is logged and recorded, never
    /// raised: the attempt advances page state for later steps, it is not a
    /// correctness assertion in itself.
    pub async fn attempt(&self, driver: &dyn PageDriver, spec: &SelectorSpec) -> NavigationRecord {
        let from = driver.current_url().await.unwrap_or_default();

        let selector = match Selector::parse(&spec.selector) {
            Ok(selector) => selector,
            Err(failure) => {
                debug!(selector = %spec.selector, %failure, "navigation skipped, selector no longer parses");
                return NavigationRecord::unchanged(&spec.selector, from);
            }
        };

        if let Err(e) = driver.click(&selector).await {
            debug!(selector = %selector, error = %e, "navigation click failed");
            return NavigationRecord::unchanged(&spec.selector, from);
        }

        match driver.wait_for_settle(self.settle_timeout).await {
            Ok(true) => {}
            Ok(false) => debug!(selector = %selector, "page did not settle after navigation click"),
            Err(e) => debug!(selector = %selector, error = %e, "settle wait failed after navigation click"),
        }

        let to = driver.current_url().await.unwrap_or_else(|_| from.clone());
        let changed = to != from;
        if changed {
            info!(%from, %to, "navigation advanced page state");
        } else {
            debug!(url = %from, "no URL change after navigation click");
        }
        NavigationRecord {
            selector: spec.selector.clone(),
            from,
            to,
            changed,
        }
    }
}
