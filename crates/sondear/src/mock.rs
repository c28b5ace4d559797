//! Scripted in-memory page model for testing without a browser.
//!
//! The validation engine only sees [`crate::driver::PageDriver`], so a
//! hand-authored set of pages and elements is enough to exercise every
//! probe path: no chromium, no network, no generative planner.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::driver::{BoundingBox, PageDriver};
use crate::result::{SondearError, SondearResult};
use crate::selector::Selector;

/// One scripted element, addressed by the raw selector string that finds it.
#[derive(Debug, Clone)]
pub struct MockElement {
    /// Visible to the visibility pre-check
    pub visible: bool,
    /// Enabled for click feasibility
    pub enabled: bool,
    /// Editable for type feasibility
    pub editable: bool,
    /// Focusable; focus on a non-focusable element errors
    pub focusable: bool,
    /// Whether a fill is reflected on read-back
    pub accepts_input: bool,
    /// Text content
    pub text: String,
    /// Input value, `None` for elements without a value concept
    pub input_value: Option<String>,
    /// Bounding box, `None` for detached elements
    pub bounding_box: Option<BoundingBox>,
    /// Attribute map
    pub attributes: HashMap<String, String>,
    /// Computed-style map
    pub styles: HashMap<String, String>,
    /// Simulate a hover failure with this message
    pub hover_error: Option<String>,
    /// Clicking moves the page to this URL
    pub click_navigates_to: Option<String>,
}

impl Default for MockElement {
    fn default() -> Self {
        Self {
            visible: true,
            enabled: true,
            editable: false,
            focusable: true,
            accepts_input: true,
            text: String::new(),
            input_value: None,
            bounding_box: Some(BoundingBox::new(0.0, 0.0, 120.0, 32.0)),
            attributes: HashMap::new(),
            styles: HashMap::new(),
            hover_error: None,
            click_navigates_to: None,
        }
    }
}

impl MockElement {
    /// A visible, enabled element with a normal bounding box
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the element invisible
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Disable the element
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Make the element editable with an empty initial value
    #[must_use]
    pub fn editable(mut self) -> Self {
        self.editable = true;
        if self.input_value.is_none() {
            self.input_value = Some(String::new());
        }
        self
    }

    /// Set text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the input value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.input_value = Some(value.into());
        self
    }

    /// Set a bounding box
    #[must_use]
    pub fn with_bounding_box(mut self, bbox: BoundingBox) -> Self {
        self.bounding_box = Some(bbox);
        self
    }

    /// Collapse the bounding box to zero area
    #[must_use]
    pub fn zero_area(mut self) -> Self {
        self.bounding_box = Some(BoundingBox::new(0.0, 0.0, 0.0, 0.0));
        self
    }

    /// Remove the bounding box entirely
    #[must_use]
    pub fn without_bounding_box(mut self) -> Self {
        self.bounding_box = None;
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set a computed-style property
    #[must_use]
    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.insert(property.into(), value.into());
        self
    }

    /// Make hover fail with `message`
    #[must_use]
    pub fn failing_hover(mut self, message: impl Into<String>) -> Self {
        self.hover_error = Some(message.into());
        self
    }

    /// Make the element silently swallow filled input
    #[must_use]
    pub fn rejecting_input(mut self) -> Self {
        self.accepts_input = false;
        self
    }

    /// Make the element non-focusable
    #[must_use]
    pub fn unfocusable(mut self) -> Self {
        self.focusable = false;
        self
    }

    /// Clicking this element moves the page to `url`
    #[must_use]
    pub fn navigates_to(mut self, url: impl Into<String>) -> Self {
        self.click_navigates_to = Some(url.into());
        self
    }
}

/// A DOM state: raw selector string → matching elements, in match order.
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    elements: HashMap<String, Vec<MockElement>>,
}

impl MockPage {
    /// An empty page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element matched by `selector`
    #[must_use]
    pub fn with_element(mut self, selector: impl Into<String>, element: MockElement) -> Self {
        self.elements.entry(selector.into()).or_default().push(element);
        self
    }
}

#[derive(Debug)]
struct MockState {
    pages: HashMap<String, MockPage>,
    current_url: String,
    load_status: Option<u16>,
    settles: bool,
    goto_count: usize,
    count_calls: usize,
    closed: bool,
}

/// In-memory [`PageDriver`] over scripted [`MockPage`]s.
#[derive(Debug)]
pub struct MockPageDriver {
    state: Mutex<MockState>,
}

impl Default for MockPageDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPageDriver {
    /// A driver with no pages; every lookup misses
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                pages: HashMap::new(),
                current_url: "about:blank".to_string(),
                load_status: Some(200),
                settles: true,
                goto_count: 0,
                count_calls: 0,
                closed: false,
            }),
        }
    }

    /// Register the page served at `url`
    #[must_use]
    pub fn with_page(self, url: impl Into<String>, page: MockPage) -> Self {
        {
            let mut state = self.lock();
            state.pages.insert(url.into(), page);
        }
        self
    }

    /// Override the HTTP status reported for navigations
    #[must_use]
    pub fn with_load_status(self, status: Option<u16>) -> Self {
        {
            let mut state = self.lock();
            state.load_status = status;
        }
        self
    }

    /// Control whether settle waits succeed
    #[must_use]
    pub fn with_settle(self, settles: bool) -> Self {
        {
            let mut state = self.lock();
            state.settles = settles;
        }
        self
    }

    /// How many navigations have been requested
    #[must_use]
    pub fn goto_count(&self) -> usize {
        self.lock().goto_count
    }

    /// How many selector-count lookups have run
    #[must_use]
    pub fn count_calls(&self) -> usize {
        self.lock().count_calls
    }

    /// Whether the session has been closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_first<T>(&self, selector: &Selector, f: impl FnOnce(&MockElement) -> T) -> Option<T> {
        let state = self.lock();
        state
            .pages
            .get(&state.current_url)
            .and_then(|page| page.elements.get(selector.raw()))
            .and_then(|elements| elements.first())
            .map(f)
    }

    fn with_first_mut<T>(
        &self,
        selector: &Selector,
        f: impl FnOnce(&mut MockElement) -> T,
    ) -> Option<T> {
        let mut state = self.lock();
        let url = state.current_url.clone();
        state
            .pages
            .get_mut(&url)
            .and_then(|page| page.elements.get_mut(selector.raw()))
            .and_then(|elements| elements.first_mut())
            .map(f)
    }
}

#[async_trait]
impl PageDriver for MockPageDriver {
    async fn goto(&self, url: &str) -> SondearResult<Option<u16>> {
        let mut state = self.lock();
        state.current_url = url.to_string();
        state.goto_count += 1;
        Ok(state.load_status)
    }

    async fn wait_for_settle(&self, _timeout: Duration) -> SondearResult<bool> {
        Ok(self.lock().settles)
    }

    async fn current_url(&self) -> SondearResult<String> {
        Ok(self.lock().current_url.clone())
    }

    async fn count(&self, selector: &Selector) -> SondearResult<usize> {
        let mut state = self.lock();
        state.count_calls += 1;
        let count = state
            .pages
            .get(&state.current_url)
            .and_then(|page| page.elements.get(selector.raw()))
            .map_or(0, Vec::len);
        Ok(count)
    }

    async fn is_visible(&self, selector: &Selector) -> SondearResult<bool> {
        Ok(self.with_first(selector, |el| el.visible).unwrap_or(false))
    }

    async fn is_enabled(&self, selector: &Selector) -> SondearResult<bool> {
        Ok(self.with_first(selector, |el| el.enabled).unwrap_or(false))
    }

    async fn is_editable(&self, selector: &Selector) -> SondearResult<bool> {
        Ok(self.with_first(selector, |el| el.editable).unwrap_or(false))
    }

    async fn bounding_box(&self, selector: &Selector) -> SondearResult<Option<BoundingBox>> {
        Ok(self.with_first(selector, |el| el.bounding_box).flatten())
    }

    async fn input_value(&self, selector: &Selector) -> SondearResult<Option<String>> {
        Ok(self
            .with_first(selector, |el| el.input_value.clone())
            .flatten())
    }

    async fn text_content(&self, selector: &Selector) -> SondearResult<Option<String>> {
        Ok(self.with_first(selector, |el| el.text.clone()))
    }

    async fn attribute(&self, selector: &Selector, name: &str) -> SondearResult<Option<String>> {
        Ok(self
            .with_first(selector, |el| el.attributes.get(name).cloned())
            .flatten())
    }

    async fn computed_style(
        &self,
        selector: &Selector,
        property: &str,
    ) -> SondearResult<Option<String>> {
        Ok(self
            .with_first(selector, |el| el.styles.get(property).cloned())
            .flatten())
    }

    async fn fill(&self, selector: &Selector, text: &str) -> SondearResult<()> {
        self.with_first_mut(selector, |el| {
            if el.accepts_input {
                el.input_value = Some(text.to_string());
            }
        });
        Ok(())
    }

    async fn click(&self, selector: &Selector) -> SondearResult<()> {
        let mut state = self.lock();
        let target = state
            .pages
            .get(&state.current_url)
            .and_then(|page| page.elements.get(selector.raw()))
            .and_then(|elements| elements.first())
            .and_then(|el| el.click_navigates_to.clone());
        if let Some(target) = target {
            state.current_url = target;
        }
        Ok(())
    }

    async fn hover(&self, selector: &Selector) -> SondearResult<()> {
        match self.with_first(selector, |el| el.hover_error.clone()).flatten() {
            Some(message) => Err(SondearError::Driver { message }),
            None => Ok(()),
        }
    }

    async fn focus(&self, selector: &Selector) -> SondearResult<()> {
        match self.with_first(selector, |el| el.focusable) {
            Some(false) => Err(SondearError::Driver {
                message: "element is not focusable".to_string(),
            }),
            _ => Ok(()),
        }
    }

    async fn close(&self) -> SondearResult<()> {
        self.lock().closed = true;
        Ok(())
    }
}
