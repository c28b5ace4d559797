//! Sondear: selector feasibility validation for browser test pipelines.
//!
//! An upstream planner (an LLM, a human, any other generator) proposes an
//! ordered list of UI element selectors, each with a declared action.
//! Planner output is frequently wrong, stale, or syntactically incompatible
//! with the automation engine, and discovering that at test-run time wastes
//! the whole downstream generation pipeline. Sondear sits in between: it
//! drives a single browser session down the list in order and proves, per
//! element, that the declared action is actually feasible — the selector
//! resolves, the element is visible, a button really has a clickable area,
//! an input really accepts text, a link really carries a navigation cue.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌────────────────────┐    ┌──────────────────┐
//! │ Strategy doc │───►│ ValidationRunner   │───►│ ValidationReport │
//! │ (planner)    │    │ one page, declared │    │ verdict +        │
//! │              │    │ order, one session │    │ diagnostics      │
//! └──────────────┘    └────────────────────┘    └──────────────────┘
//! ```
//!
//! Probes are reversible except where navigation is the thing under test:
//! page state carries forward step to step, so later selectors are
//! validated against whatever page the earlier steps produced.
//!
//! The browser is reached through the [`driver::PageDriver`] trait. The
//! `browser` feature enables the real CDP implementation ([`cdp`]); the
//! [`mock`] module provides a scripted page model so the whole engine can
//! be tested with hand-authored specs and no browser at all.
//!
//! # Example
//!
//! ```
//! use sondear::mock::{MockElement, MockPage, MockPageDriver};
//! use sondear::{SelectorSpec, ValidationRunner};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> sondear::SondearResult<()> {
//! let driver = MockPageDriver::new().with_page(
//!     "https://shop.test/",
//!     MockPage::new().with_element("button#submit", MockElement::new()),
//! );
//! let specs = vec![SelectorSpec::new("button#submit", "click")];
//! let report = ValidationRunner::new(driver)
//!     .run("https://shop.test/", &specs)
//!     .await?;
//! assert!(report.passed);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod checker;
mod navigation;
mod report;
mod result;
mod runner;
mod schema;
mod selector;
mod strategy;

/// Browser engine boundary: the [`driver::PageDriver`] trait and its
/// supporting types.
pub mod driver;

/// Scripted in-memory page model for testing without a browser.
pub mod mock;

/// Real browser probing over CDP (requires the `browser` feature).
#[cfg(feature = "browser")]
pub mod cdp;

pub use checker::{FeasibilityChecker, DEFAULT_PROBE_TEXT};
pub use driver::{BoundingBox, BrowserSettings, PageDriver};
pub use navigation::{
    NavigationPolicy, NavigationRecord, NavigationTracker, DEFAULT_SETTLE_TIMEOUT,
};
pub use report::{aggregate, FailureDetail, ValidationReport};
pub use result::{ProbeFailure, SondearError, SondearResult};
pub use runner::{RunnerConfig, ValidationRunner, DEFAULT_PAGE_LOAD_TIMEOUT};
pub use schema::{Action, SelectorSpec, ValidationResult, ValidationResultBuilder};
pub use selector::{Selector, TextExpectation, TextMatchMode};
pub use strategy::{parse_strategy, StrategyDocument, StrategyValidator};
