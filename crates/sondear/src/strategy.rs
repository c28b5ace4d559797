//! Strategy document parsing and the validation façade.
//!
//! The planner is an external collaborator: it hands over a JSON document
//! with an ordered list of proposed interactions, and nothing here ever
//! generates or rewrites a selector. A document that does not parse fails
//! fast, before any browser is launched.

use serde::{Deserialize, Serialize};

use crate::driver::PageDriver;
use crate::report::ValidationReport;
use crate::result::{SondearError, SondearResult};
use crate::runner::{RunnerConfig, ValidationRunner};
use crate::schema::SelectorSpec;

/// How many failing items the final error message carries.
const DIAGNOSTIC_LIMIT: usize = 3;

/// The planner's proposed-interaction document.
///
/// Only the ordered element list matters here; planners decorate their
/// documents with extra sections, which are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyDocument {
    /// Ordered list of proposed interactions
    #[serde(alias = "proposedElements", alias = "elements")]
    pub proposed_elements: Vec<SelectorSpec>,
}

/// Parse a strategy document into its ordered spec list.
///
/// # Errors
///
/// [`SondearError::StrategyFormat`] when the document is not valid JSON or
/// does not carry the expected shape.
pub fn parse_strategy(json: &str) -> SondearResult<Vec<SelectorSpec>> {
    let document: StrategyDocument =
        serde_json::from_str(json).map_err(|e| SondearError::StrategyFormat {
            message: e.to_string(),
        })?;
    Ok(document.proposed_elements)
}

/// Thin façade: parse, run, and turn a failed batch into a typed error.
#[derive(Debug)]
pub struct StrategyValidator<D: PageDriver> {
    runner: ValidationRunner<D>,
}

impl<D: PageDriver> StrategyValidator<D> {
    /// Create a validator with default configuration
    #[must_use]
    pub fn new(driver: D) -> Self {
        Self {
            runner: ValidationRunner::new(driver),
        }
    }

    /// Create a validator with explicit configuration
    #[must_use]
    pub fn with_config(driver: D, config: RunnerConfig) -> Self {
        Self {
            runner: ValidationRunner::with_config(driver, config),
        }
    }

    /// Validate a strategy document against the target URL.
    ///
    /// A failed run yields an error whose message is self-contained (rate
    /// plus the top failing selectors); a successful run yields the report
    /// for programmatic use.
    ///
    /// # Errors
    ///
    /// [`SondearError::StrategyFormat`] before any browser work on a
    /// malformed document; [`SondearError::Load`] when the page cannot be
    /// loaded; [`SondearError::Validation`] when the run completes but the
    /// batch does not pass.
    pub async fn validate(self, url: &str, document: &str) -> SondearResult<ValidationReport> {
        let specs = parse_strategy(document)?;
        let report = self.runner.run(url, &specs).await?;
        if !report.passed {
            return Err(SondearError::Validation {
                failure_rate: report.failure_rate,
                summary: report.failure_summary(DIAGNOSTIC_LIMIT),
            });
        }
        Ok(report)
    }
}

#[cfg(feature = "browser")]
impl StrategyValidator<crate::cdp::CdpDriver> {
    /// Launch a real browser per the config and build a validator over it.
    ///
    /// # Errors
    ///
    /// [`SondearError::BrowserLaunch`] when chromium cannot be started.
    pub async fn launch(config: RunnerConfig) -> SondearResult<Self> {
        let runner = ValidationRunner::launch(config).await?;
        Ok(Self { runner })
    }
}
