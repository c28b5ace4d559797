//! Sequential validation over one browser session.
//!
//! One session, one page, strict input order: navigation side effects from
//! step *n* are visible to step *n+1* and never to earlier steps. The model
//! follows a single linear user journey rather than re-testing each
//! selector against a pristine page, because the planner's ordering is
//! assumed to represent one coherent flow. The session is closed on every
//! exit path, success or failure.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::checker::{FeasibilityChecker, DEFAULT_PROBE_TEXT};
use crate::driver::{BrowserSettings, PageDriver};
use crate::navigation::{NavigationPolicy, NavigationTracker, DEFAULT_SETTLE_TIMEOUT};
use crate::report::{aggregate, ValidationReport};
use crate::result::{SondearError, SondearResult};
use crate::schema::SelectorSpec;

/// Default bound on the initial page load.
pub const DEFAULT_PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a validation run.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Bound on the initial page load and its settle wait
    pub page_load_timeout: Duration,
    /// Bound on post-click settle waits during the run
    pub settle_timeout: Duration,
    /// Sentinel string for type probes
    pub probe_text: String,
    /// Maximum tolerated failure rate in percent; 0.0 = any failure fails
    pub max_failure_rate: f64,
    /// Eligibility gate for navigation attempts
    pub navigation_policy: NavigationPolicy,
    /// Launch settings for the real browser
    pub browser: BrowserSettings,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            page_load_timeout: DEFAULT_PAGE_LOAD_TIMEOUT,
            settle_timeout: DEFAULT_SETTLE_TIMEOUT,
            probe_text: DEFAULT_PROBE_TEXT.to_string(),
            max_failure_rate: 0.0,
            navigation_policy: NavigationPolicy::default(),
            browser: BrowserSettings::default(),
        }
    }
}

impl RunnerConfig {
    /// Create a config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page-load timeout
    #[must_use]
    pub const fn with_page_load_timeout(mut self, timeout: Duration) -> Self {
        self.page_load_timeout = timeout;
        self
    }

    /// Set the post-click settle timeout
    #[must_use]
    pub const fn with_settle_timeout(mut self, timeout: Duration) -> Self {
        self.settle_timeout = timeout;
        self
    }

    /// Set the type-probe sentinel
    #[must_use]
    pub fn with_probe_text(mut self, text: impl Into<String>) -> Self {
        self.probe_text = text.into();
        self
    }

    /// Set the tolerated failure rate in percent
    #[must_use]
    pub const fn with_max_failure_rate(mut self, rate: f64) -> Self {
        self.max_failure_rate = rate;
        self
    }

    /// Replace the navigation-eligibility policy
    #[must_use]
    pub fn with_navigation_policy(mut self, policy: NavigationPolicy) -> Self {
        self.navigation_policy = policy;
        self
    }

    /// Set browser launch settings
    #[must_use]
    pub fn with_browser(mut self, browser: BrowserSettings) -> Self {
        self.browser = browser;
        self
    }
}

/// Drives the ordered selector list against one live page.
#[derive(Debug)]
pub struct ValidationRunner<D: PageDriver> {
    driver: D,
    config: RunnerConfig,
    checker: FeasibilityChecker,
    tracker: NavigationTracker,
}

impl<D: PageDriver> ValidationRunner<D> {
    /// Create a runner with default configuration
    #[must_use]
    pub fn new(driver: D) -> Self {
        Self::with_config(driver, RunnerConfig::default())
    }

    /// Create a runner with explicit configuration
    #[must_use]
    pub fn with_config(driver: D, config: RunnerConfig) -> Self {
        let checker = FeasibilityChecker::new(config.probe_text.clone());
        let tracker =
            NavigationTracker::new(config.navigation_policy.clone(), config.settle_timeout);
        Self {
            driver,
            config,
            checker,
            tracker,
        }
    }

    /// Run the full ordered list and close the session whatever happens.
    ///
    /// # Errors
    ///
    /// [`SondearError::Load`] when the initial page load gets no response,
    /// a client/server error status, or fails to settle in time. Probe
    /// failures never surface here; they land in the report.
    pub async fn run(self, url: &str, specs: &[SelectorSpec]) -> SondearResult<ValidationReport> {
        let outcome = self.run_inner(url, specs).await;
        if let Err(e) = self.driver.close().await {
            warn!(error = %e, "failed to close browser session");
        }
        outcome
    }

    async fn run_inner(
        &self,
        url: &str,
        specs: &[SelectorSpec],
    ) -> SondearResult<ValidationReport> {
        self.load(url).await?;
        info!(url, selectors = specs.len(), "page loaded, starting validation");

        let mut results = Vec::with_capacity(specs.len());
        let mut navigations = Vec::new();
        for (index, spec) in specs.iter().enumerate() {
            debug!(index, selector = %spec.selector, action = %spec.action, "probing selector");
            let result = self.checker.probe(&self.driver, spec).await;
            if self.tracker.should_attempt(&result, spec) {
                let record = self.tracker.attempt(&self.driver, spec).await;
                navigations.push(record);
            }
            if let Some(ref failure) = result.error {
                debug!(index, selector = %spec.selector, %failure, "selector failed validation");
            }
            results.push(result);
        }

        let mut report = aggregate(specs, &results, self.config.max_failure_rate);
        report.navigations = navigations;
        info!(
            total = report.total_selectors,
            failed = report.failed_selectors,
            passed = report.passed,
            "validation run complete"
        );
        Ok(report)
    }

    async fn load(&self, url: &str) -> SondearResult<()> {
        let status = tokio::time::timeout(self.config.page_load_timeout, self.driver.goto(url))
            .await
            .map_err(|_| SondearError::Load {
                url: url.to_string(),
                message: format!(
                    "load timed out after {:?}",
                    self.config.page_load_timeout
                ),
            })??;

        match status {
            None => {
                return Err(SondearError::Load {
                    url: url.to_string(),
                    message: "no response for initial navigation".to_string(),
                })
            }
            Some(code) if code >= 400 => {
                return Err(SondearError::Load {
                    url: url.to_string(),
                    message: format!("HTTP status {code}"),
                })
            }
            Some(_) => {}
        }

        let settled = self
            .driver
            .wait_for_settle(self.config.page_load_timeout)
            .await?;
        if !settled {
            return Err(SondearError::Load {
                url: url.to_string(),
                message: "page did not reach network idle".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(feature = "browser")]
impl ValidationRunner<crate::cdp::CdpDriver> {
    /// Launch a real browser per the config and build a runner over it.
    ///
    /// # Errors
    ///
    /// [`SondearError::BrowserLaunch`] when chromium cannot be started.
    pub async fn launch(config: RunnerConfig) -> SondearResult<Self> {
        let driver = crate::cdp::CdpDriver::launch(&config.browser).await?;
        Ok(Self::with_config(driver, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockElement, MockPage, MockPageDriver};
    use crate::result::ProbeFailure;
    use std::sync::Arc;

    const URL: &str = "https://shop.test/";

    #[tokio::test]
    async fn empty_list_is_a_vacuous_pass_after_one_page_load() {
        let driver = Arc::new(MockPageDriver::new().with_page(URL, MockPage::new()));
        let runner = ValidationRunner::new(Arc::clone(&driver));
        let report = runner.run(URL, &[]).await.unwrap();
        assert_eq!(report.total_selectors, 0);
        assert!(report.passed);
        assert_eq!(driver.goto_count(), 1);
    }

    #[tokio::test]
    async fn error_status_aborts_the_run() {
        let driver = MockPageDriver::new().with_load_status(Some(503));
        let runner = ValidationRunner::new(driver);
        let err = runner.run(URL, &[]).await.unwrap_err();
        assert!(matches!(err, SondearError::Load { .. }));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn missing_response_aborts_the_run() {
        let driver = MockPageDriver::new().with_load_status(None);
        let runner = ValidationRunner::new(driver);
        assert!(matches!(
            runner.run(URL, &[]).await,
            Err(SondearError::Load { .. })
        ));
    }

    #[tokio::test]
    async fn failed_initial_settle_aborts_the_run() {
        let driver = MockPageDriver::new().with_settle(false);
        let runner = ValidationRunner::new(driver);
        let err = runner.run(URL, &[]).await.unwrap_err();
        assert!(err.to_string().contains("network idle"));
    }

    #[tokio::test]
    async fn session_is_closed_on_success_and_on_failure() {
        let ok_driver = Arc::new(MockPageDriver::new().with_page(URL, MockPage::new()));
        ValidationRunner::new(Arc::clone(&ok_driver))
            .run(URL, &[])
            .await
            .unwrap();
        assert!(ok_driver.is_closed());

        let bad_driver = Arc::new(MockPageDriver::new().with_load_status(Some(500)));
        let _ = ValidationRunner::new(Arc::clone(&bad_driver)).run(URL, &[]).await;
        assert!(bad_driver.is_closed());
    }

    #[tokio::test]
    async fn results_come_back_in_input_order() {
        let page = MockPage::new()
            .with_element("#a", MockElement::new())
            .with_element("#c", MockElement::new().hidden());
        let driver = MockPageDriver::new().with_page(URL, page);
        let specs = vec![
            SelectorSpec::new("#a", "click"),
            SelectorSpec::new("#b", "click"),
            SelectorSpec::new("#c", "click"),
        ];
        let report = ValidationRunner::new(driver).run(URL, &specs).await.unwrap();

        assert_eq!(report.total_selectors, 3);
        assert_eq!(report.successful_selectors, 1);
        assert_eq!(report.failed_details.len(), 2);
        assert_eq!(report.failed_details[0].index, 1);
        assert_eq!(report.failed_details[0].selector, "#b");
        assert_eq!(report.failed_details[1].index, 2);
    }

    #[tokio::test]
    async fn navigation_carries_page_state_to_later_steps() {
        // Step 1 clicks a link that moves the page; step 2's selector only
        // exists on the destination page.
        let landing = MockPage::new().with_element(
            "a.checkout",
            MockElement::new()
                .with_attribute("href", "/checkout")
                .navigates_to("https://shop.test/checkout"),
        );
        let checkout = MockPage::new().with_element("#pay", MockElement::new());
        let driver = MockPageDriver::new()
            .with_page(URL, landing)
            .with_page("https://shop.test/checkout", checkout);

        let specs = vec![
            SelectorSpec::new("a.checkout", "navigate").with_element_type("checkout link"),
            SelectorSpec::new("#pay", "click"),
        ];
        let report = ValidationRunner::new(driver).run(URL, &specs).await.unwrap();

        assert!(report.passed);
        assert_eq!(report.navigations.len(), 1);
        assert!(report.navigations[0].changed);
        assert_eq!(report.navigations[0].to, "https://shop.test/checkout");
    }

    #[tokio::test]
    async fn ineligible_elements_trigger_no_navigation() {
        let page = MockPage::new().with_element(
            "#hero",
            MockElement::new().navigates_to("https://shop.test/elsewhere"),
        );
        let driver = Arc::new(MockPageDriver::new().with_page(URL, page));
        let specs = vec![SelectorSpec::new("#hero", "click").with_element_type("banner image")];
        let report = ValidationRunner::new(Arc::clone(&driver))
            .run(URL, &specs)
            .await
            .unwrap();

        assert!(report.passed);
        assert!(report.navigations.is_empty());
    }

    #[tokio::test]
    async fn per_item_failures_do_not_abort_later_items() {
        let page = MockPage::new()
            .with_element("#second", MockElement::new().with_text("still probed"));
        let driver = MockPageDriver::new().with_page(URL, page);
        let specs = vec![
            SelectorSpec::new("div:contains('Sale')", "verify"),
            SelectorSpec::new("#second", "verify"),
        ];
        let report = ValidationRunner::new(driver).run(URL, &specs).await.unwrap();

        assert_eq!(report.failed_selectors, 1);
        assert_eq!(report.successful_selectors, 1);
        assert!(matches!(
            report.failed_details[0].error.as_str(),
            s if s.contains("unsupported selector syntax")
        ));
    }

    #[tokio::test]
    async fn scenario_click_then_navigate_passes_end_to_end() {
        let landing = MockPage::new()
            .with_element("button#submit", MockElement::new())
            .with_element(
                "//a[text()='Checkout']",
                MockElement::new()
                    .with_text("Checkout")
                    .with_attribute("href", "/checkout"),
            );
        let driver = MockPageDriver::new().with_page(URL, landing);
        let specs = vec![
            SelectorSpec::new("button#submit", "click").with_element_type("submit button"),
            SelectorSpec::new("//a[text()='Checkout']", "navigate").with_element_type("link"),
        ];
        let report = ValidationRunner::new(driver).run(URL, &specs).await.unwrap();

        assert_eq!(report.total_selectors, 2);
        assert_eq!(report.successful_selectors, 2);
        assert_eq!(report.failed_selectors, 0);
        assert!(report.passed);
        // Both items pass the eligibility gate, so both get an attempt
        // recorded, whether or not the URL moved.
        assert_eq!(report.navigations.len(), 2);
    }

    #[tokio::test]
    async fn unknown_probe_failure_is_classified_on_the_result() {
        let page = MockPage::new().with_element("#input", MockElement::new());
        let driver = MockPageDriver::new().with_page(URL, page);
        let specs = vec![SelectorSpec::new("#input", "type")];
        let report = ValidationRunner::new(driver).run(URL, &specs).await.unwrap();
        assert_eq!(
            report.failed_details[0].error,
            ProbeFailure::NotEditable.to_string()
        );
    }
}
