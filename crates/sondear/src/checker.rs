//! Per-action feasibility probes.
//!
//! Every probe leaves the page in the observable state it found it,
//! transient focus changes aside. The one intentional exception lives in
//! [`crate::navigation::NavigationTracker`], where the navigation side
//! effect is the thing under test.
//!
//! The pipeline for one spec: decode the action, classify the selector,
//! run the common pre-checks (match count, visibility), run the
//! action-specific check, then compare any text expectation the selector
//! encodes. Each step returns a tagged outcome and the whole sequence
//! folds into a single [`ValidationResult`]; nothing is thrown per item.

use tracing::warn;

use crate::driver::PageDriver;
use crate::result::{ProbeFailure, SondearError};
use crate::schema::{Action, SelectorSpec, ValidationResult};
use crate::selector::{Selector, TextExpectation};

/// Sentinel string typed into editable elements during a `type` probe.
pub const DEFAULT_PROBE_TEXT: &str = "sondear-probe";

/// Descriptive attributes that count as a verifiable signal.
const VERIFY_ATTRIBUTES: [&str; 4] = ["title", "alt", "data-value", "aria-label"];

/// Runs the feasibility checks for one spec at a time.
#[derive(Debug, Clone)]
pub struct FeasibilityChecker {
    probe_text: String,
}

impl Default for FeasibilityChecker {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TEXT)
    }
}

impl FeasibilityChecker {
    /// Create a checker with a custom type-probe sentinel
    #[must_use]
    pub fn new(probe_text: impl Into<String>) -> Self {
        Self {
            probe_text: probe_text.into(),
        }
    }

    /// Probe one spec against the current page.
    ///
    /// Never fails outright: every outcome, including browser hiccups
    /// mid-probe, is recorded on the returned result.
    pub async fn probe(&self, driver: &dyn PageDriver, spec: &SelectorSpec) -> ValidationResult {
        let current_url = driver.current_url().await.unwrap_or_default();
        let builder = ValidationResult::builder(current_url);

        let Some(action) = spec.action() else {
            return builder.fail(ProbeFailure::UnsupportedAction(spec.action.clone()));
        };

        let selector = match Selector::parse(&spec.selector) {
            Ok(selector) => selector,
            Err(failure) => return builder.fail(failure),
        };

        let count = match driver.count(&selector).await {
            Ok(count) => count,
            Err(e) => return builder.fail(ProbeFailure::Driver(e.to_string())),
        };
        if count == 0 {
            return builder.fail(ProbeFailure::NotFound);
        }
        let builder = builder.found();

        match driver.is_visible(&selector).await {
            Ok(true) => {}
            Ok(false) => return builder.fail(ProbeFailure::NotVisible),
            Err(e) => return builder.fail(ProbeFailure::Driver(e.to_string())),
        }
        let builder = builder.visible();

        if let Err(failure) = self.check_action(driver, &selector, action).await {
            return builder.fail(failure);
        }

        if let Some(expectation) = TextExpectation::from_selector(&spec.selector) {
            let actual = match driver.text_content(&selector).await {
                Ok(text) => text.unwrap_or_default(),
                Err(e) => return builder.fail(ProbeFailure::Driver(e.to_string())),
            };
            let matched = expectation.matches(&actual);
            let builder = builder.text_matches(matched);
            if !matched {
                return builder.fail(ProbeFailure::TextMismatch {
                    expected: expectation.expected,
                    actual,
                });
            }
            return builder.pass();
        }

        builder.pass()
    }

    async fn check_action(
        &self,
        driver: &dyn PageDriver,
        selector: &Selector,
        action: Action,
    ) -> Result<(), ProbeFailure> {
        match action {
            Action::Click => check_click(driver, selector).await,
            Action::Hover => check_hover(driver, selector).await,
            Action::Type => self.check_type(driver, selector).await,
            Action::Verify => check_verify(driver, selector).await,
            Action::Navigate => check_navigate(driver, selector).await,
        }
    }

    async fn check_type(
        &self,
        driver: &dyn PageDriver,
        selector: &Selector,
    ) -> Result<(), ProbeFailure> {
        driver
            .focus(selector)
            .await
            .map_err(|e| ProbeFailure::NotInteractable(e.to_string()))?;
        if !driver.is_editable(selector).await.map_err(driver_failure)? {
            return Err(ProbeFailure::NotEditable);
        }

        let original = readable_value(driver, selector).await?;
        let outcome = self.type_probe(driver, selector).await;
        // Restore runs even when the probe failed; the round trip must not
        // leave the page dirty.
        if let Err(e) = driver.fill(selector, &original).await {
            warn!(selector = %selector, error = %e, "failed to restore value after type probe");
        }
        outcome
    }

    async fn type_probe(
        &self,
        driver: &dyn PageDriver,
        selector: &Selector,
    ) -> Result<(), ProbeFailure> {
        driver
            .fill(selector, &self.probe_text)
            .await
            .map_err(driver_failure)?;
        let read_back = readable_value(driver, selector).await?;
        if read_back.contains(&self.probe_text) {
            Ok(())
        } else {
            Err(ProbeFailure::NotAcceptingInput)
        }
    }
}

async fn check_click(driver: &dyn PageDriver, selector: &Selector) -> Result<(), ProbeFailure> {
    if !driver.is_enabled(selector).await.map_err(driver_failure)? {
        return Err(ProbeFailure::NotEnabled);
    }
    // Feasibility only: the element must be able to receive a pointer
    // event, so the box must exist and have area. No click happens here.
    match driver.bounding_box(selector).await.map_err(driver_failure)? {
        Some(bbox) if bbox.has_area() => Ok(()),
        Some(_) => Err(ProbeFailure::NotInteractable(
            "zero-area bounding box".to_string(),
        )),
        None => Err(ProbeFailure::NotInteractable(
            "no bounding box".to_string(),
        )),
    }
}

async fn check_hover(driver: &dyn PageDriver, selector: &Selector) -> Result<(), ProbeFailure> {
    // Hover is inherently non-destructive, so the hover itself is the probe.
    driver
        .hover(selector)
        .await
        .map_err(|e| ProbeFailure::NotInteractable(e.to_string()))
}

async fn check_verify(driver: &dyn PageDriver, selector: &Selector) -> Result<(), ProbeFailure> {
    if let Some(text) = driver.text_content(selector).await.map_err(driver_failure)? {
        if !text.trim().is_empty() {
            return Ok(());
        }
    }
    if let Some(value) = driver.input_value(selector).await.map_err(driver_failure)? {
        if !value.is_empty() {
            return Ok(());
        }
    }
    for name in VERIFY_ATTRIBUTES {
        if let Some(value) = driver
            .attribute(selector, name)
            .await
            .map_err(driver_failure)?
        {
            if !value.is_empty() {
                return Ok(());
            }
        }
    }
    // Weak contract: nothing here is verifiable, but downstream consumers
    // may still find a use for the element.
    warn!(selector = %selector, "no verifiable content on element");
    Ok(())
}

async fn check_navigate(driver: &dyn PageDriver, selector: &Selector) -> Result<(), ProbeFailure> {
    if let Some(href) = driver
        .attribute(selector, "href")
        .await
        .map_err(driver_failure)?
    {
        let href = href.trim();
        if !href.is_empty() && href != "#" && !href.starts_with("javascript:void") {
            return Ok(());
        }
    }
    if driver
        .attribute(selector, "onclick")
        .await
        .map_err(driver_failure)?
        .is_some()
    {
        return Ok(());
    }
    if driver
        .computed_style(selector, "cursor")
        .await
        .map_err(driver_failure)?
        .as_deref()
        == Some("pointer")
    {
        return Ok(());
    }
    // Navigation cues are heuristic; their absence is advisory.
    warn!(selector = %selector, "no navigation cues on element");
    Ok(())
}

/// Input value where the element has one, text content otherwise, so
/// elements without a value concept survive the type round trip.
async fn readable_value(
    driver: &dyn PageDriver,
    selector: &Selector,
) -> Result<String, ProbeFailure> {
    match driver.input_value(selector).await.map_err(driver_failure)? {
        Some(value) => Ok(value),
        None => Ok(driver
            .text_content(selector)
            .await
            .map_err(driver_failure)?
            .unwrap_or_default()),
    }
}

fn driver_failure(e: SondearError) -> ProbeFailure {
    ProbeFailure::Driver(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::BoundingBox;
    use crate::mock::{MockElement, MockPage, MockPageDriver};

    const URL: &str = "https://shop.test/";

    async fn probe_on(page: MockPage, spec: &SelectorSpec) -> ValidationResult {
        let driver = MockPageDriver::new().with_page(URL, page);
        driver.goto(URL).await.unwrap();
        FeasibilityChecker::default().probe(&driver, spec).await
    }

    mod pre_check_tests {
        use super::*;

        #[tokio::test]
        async fn missing_element_is_not_found() {
            let result =
                probe_on(MockPage::new(), &SelectorSpec::new("#missing", "click")).await;
            assert!(!result.success);
            assert!(!result.found);
            assert_eq!(result.error, Some(ProbeFailure::NotFound));
            assert_eq!(result.current_url, URL);
        }

        #[tokio::test]
        async fn hidden_element_is_not_visible() {
            let page = MockPage::new().with_element("#ghost", MockElement::new().hidden());
            let result = probe_on(page, &SelectorSpec::new("#ghost", "click")).await;
            assert!(result.found);
            assert!(!result.visible);
            assert_eq!(result.error, Some(ProbeFailure::NotVisible));
        }

        #[tokio::test]
        async fn unsupported_syntax_short_circuits_before_dom_lookups() {
            let driver = MockPageDriver::new().with_page(URL, MockPage::new());
            driver.goto(URL).await.unwrap();
            let spec = SelectorSpec::new("div:contains('Sale')", "verify");
            let result = FeasibilityChecker::default().probe(&driver, &spec).await;
            assert!(matches!(
                result.error,
                Some(ProbeFailure::UnsupportedSyntax(_))
            ));
            assert!(!result.found);
            assert_eq!(driver.count_calls(), 0);
        }

        #[tokio::test]
        async fn unrecognized_action_touches_no_dom() {
            let driver = MockPageDriver::new().with_page(
                URL,
                MockPage::new().with_element("#submit", MockElement::new()),
            );
            driver.goto(URL).await.unwrap();
            let spec = SelectorSpec::new("#submit", "submit");
            let result = FeasibilityChecker::default().probe(&driver, &spec).await;
            assert_eq!(
                result.error,
                Some(ProbeFailure::UnsupportedAction("submit".to_string()))
            );
            assert!(!result.found);
            assert_eq!(driver.count_calls(), 0);
        }
    }

    mod click_tests {
        use super::*;

        #[tokio::test]
        async fn enabled_element_with_area_is_clickable() {
            let page = MockPage::new().with_element("button#submit", MockElement::new());
            let result = probe_on(page, &SelectorSpec::new("button#submit", "click")).await;
            assert!(result.success);
            assert_eq!(result.error, None);
        }

        #[tokio::test]
        async fn disabled_element_fails() {
            let page = MockPage::new().with_element("#buy", MockElement::new().disabled());
            let result = probe_on(page, &SelectorSpec::new("#buy", "click")).await;
            assert_eq!(result.error, Some(ProbeFailure::NotEnabled));
        }

        #[tokio::test]
        async fn zero_area_element_fails_despite_found_and_visible() {
            let page = MockPage::new().with_element("#pixel", MockElement::new().zero_area());
            let result = probe_on(page, &SelectorSpec::new("#pixel", "click")).await;
            assert!(!result.success);
            assert!(result.found);
            assert!(result.visible);
            assert!(matches!(
                result.error,
                Some(ProbeFailure::NotInteractable(_))
            ));
        }

        #[tokio::test]
        async fn missing_bounding_box_fails() {
            let page =
                MockPage::new().with_element("#detached", MockElement::new().without_bounding_box());
            let result = probe_on(page, &SelectorSpec::new("#detached", "click")).await;
            assert!(matches!(
                result.error,
                Some(ProbeFailure::NotInteractable(_))
            ));
        }
    }

    mod hover_tests {
        use super::*;

        #[tokio::test]
        async fn hover_succeeds_by_default() {
            let page = MockPage::new().with_element("#menu", MockElement::new());
            let result = probe_on(page, &SelectorSpec::new("#menu", "hover")).await;
            assert!(result.success);
        }

        #[tokio::test]
        async fn hover_engine_error_becomes_not_interactable() {
            let page = MockPage::new()
                .with_element("#menu", MockElement::new().failing_hover("covered by overlay"));
            let result = probe_on(page, &SelectorSpec::new("#menu", "hover")).await;
            match result.error {
                Some(ProbeFailure::NotInteractable(message)) => {
                    assert!(message.contains("covered by overlay"));
                }
                other => panic!("expected NotInteractable, got {other:?}"),
            }
        }
    }

    mod type_tests {
        use super::*;

        #[tokio::test]
        async fn editable_element_accepts_probe_and_is_restored() {
            let driver = MockPageDriver::new().with_page(
                URL,
                MockPage::new()
                    .with_element("#search", MockElement::new().editable().with_value("jeans")),
            );
            driver.goto(URL).await.unwrap();
            let spec = SelectorSpec::new("#search", "type");
            let result = FeasibilityChecker::default().probe(&driver, &spec).await;
            assert!(result.success);
            // Round-trip restoration invariant
            let restored = driver
                .input_value(&Selector::parse("#search").unwrap())
                .await
                .unwrap();
            assert_eq!(restored, Some("jeans".to_string()));
        }

        #[tokio::test]
        async fn value_is_restored_even_when_probe_fails() {
            let driver = MockPageDriver::new().with_page(
                URL,
                MockPage::new().with_element(
                    "#readonlyish",
                    MockElement::new()
                        .editable()
                        .with_value("original")
                        .rejecting_input(),
                ),
            );
            driver.goto(URL).await.unwrap();
            let spec = SelectorSpec::new("#readonlyish", "type");
            let result = FeasibilityChecker::default().probe(&driver, &spec).await;
            assert_eq!(result.error, Some(ProbeFailure::NotAcceptingInput));
            let restored = driver
                .input_value(&Selector::parse("#readonlyish").unwrap())
                .await
                .unwrap();
            assert_eq!(restored, Some("original".to_string()));
        }

        #[tokio::test]
        async fn non_editable_element_fails() {
            let page = MockPage::new().with_element("#label", MockElement::new());
            let result = probe_on(page, &SelectorSpec::new("#label", "type")).await;
            assert_eq!(result.error, Some(ProbeFailure::NotEditable));
        }

        #[tokio::test]
        async fn unfocusable_element_fails_before_editability() {
            let page = MockPage::new()
                .with_element("#span", MockElement::new().editable().unfocusable());
            let result = probe_on(page, &SelectorSpec::new("#span", "type")).await;
            assert!(matches!(
                result.error,
                Some(ProbeFailure::NotInteractable(_))
            ));
        }
    }

    mod verify_tests {
        use super::*;

        #[tokio::test]
        async fn text_content_is_a_verifiable_signal() {
            let page =
                MockPage::new().with_element("#total", MockElement::new().with_text("$42.00"));
            let result = probe_on(page, &SelectorSpec::new("#total", "verify")).await;
            assert!(result.success);
        }

        #[tokio::test]
        async fn descriptive_attribute_is_a_verifiable_signal() {
            let page = MockPage::new()
                .with_element("#logo", MockElement::new().with_attribute("alt", "Shop logo"));
            let result = probe_on(page, &SelectorSpec::new("#logo", "verify")).await;
            assert!(result.success);
        }

        #[tokio::test]
        async fn absence_of_signals_is_soft_not_fatal() {
            let page = MockPage::new().with_element("#void", MockElement::new());
            let result = probe_on(page, &SelectorSpec::new("#void", "verify")).await;
            assert!(result.success);
            assert_eq!(result.error, None);
        }
    }

    mod navigate_tests {
        use super::*;

        #[tokio::test]
        async fn real_href_is_a_navigation_cue() {
            let page = MockPage::new().with_element(
                "//a[text()='Checkout']",
                MockElement::new()
                    .with_text("Checkout")
                    .with_attribute("href", "/checkout"),
            );
            let result =
                probe_on(page, &SelectorSpec::new("//a[text()='Checkout']", "navigate")).await;
            assert!(result.success);
            assert_eq!(result.text_matches, Some(true));
        }

        #[tokio::test]
        async fn bare_fragment_href_is_not_a_cue_but_stays_soft() {
            let page = MockPage::new()
                .with_element("#anchor", MockElement::new().with_attribute("href", "#"));
            let result = probe_on(page, &SelectorSpec::new("#anchor", "navigate")).await;
            assert!(result.success);
        }

        #[tokio::test]
        async fn pointer_cursor_is_a_cue() {
            let page = MockPage::new()
                .with_element("#tile", MockElement::new().with_style("cursor", "pointer"));
            let result = probe_on(page, &SelectorSpec::new("#tile", "navigate")).await;
            assert!(result.success);
        }
    }

    mod text_expectation_tests {
        use super::*;

        #[tokio::test]
        async fn mismatch_is_terminal_for_the_item() {
            let page = MockPage::new().with_element(
                "//a[text()='Checkout']",
                MockElement::new()
                    .with_text("Basket")
                    .with_attribute("href", "/basket"),
            );
            let result =
                probe_on(page, &SelectorSpec::new("//a[text()='Checkout']", "navigate")).await;
            assert!(!result.success);
            assert_eq!(result.text_matches, Some(false));
            assert!(matches!(
                result.error,
                Some(ProbeFailure::TextMismatch { .. })
            ));
        }

        #[tokio::test]
        async fn expectation_applies_to_any_action() {
            let page = MockPage::new().with_element(
                "//button[contains(text(),'Add')]",
                MockElement::new()
                    .with_text("Add to cart")
                    .with_bounding_box(BoundingBox::new(0.0, 0.0, 80.0, 24.0)),
            );
            let result = probe_on(
                page,
                &SelectorSpec::new("//button[contains(text(),'Add')]", "click"),
            )
            .await;
            assert!(result.success);
            assert_eq!(result.text_matches, Some(true));
        }

        #[tokio::test]
        async fn plain_selector_leaves_flag_unset() {
            let page = MockPage::new().with_element("#ok", MockElement::new());
            let result = probe_on(page, &SelectorSpec::new("#ok", "click")).await;
            assert_eq!(result.text_matches, None);
        }
    }
}
