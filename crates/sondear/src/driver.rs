//! Abstract browser engine boundary.
//!
//! The validation engine talks to the page exclusively through
//! [`PageDriver`], so the whole pipeline can be exercised with a
//! hand-authored page model ([`crate::mock::MockPageDriver`]) and run for
//! real over CDP (`CdpDriver`, behind the `browser` feature).
//!
//! Driver methods address the first element matching a selector; `count`
//! reports how many match. Every call is a bounded request/response against
//! the live page and no two calls are ever in flight at once.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::SondearResult;
use crate::selector::Selector;

/// Element bounding box in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f64,
    /// Y position
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A zero-area element cannot receive a pointer event even when it is
    /// nominally visible.
    #[must_use]
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Launch settings for the real browser.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// Run in headless mode
    pub headless: bool,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Path to a chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: true,
            chromium_path: None,
            viewport_width: 1280,
            viewport_height: 800,
        }
    }
}

impl BrowserSettings {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Disable the sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Set the chromium binary path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }
}

/// Browser automation boundary used by the validation engine.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate and report the HTTP status of the main document, if known.
    async fn goto(&self, url: &str) -> SondearResult<Option<u16>>;

    /// Wait for the page to settle. `Ok(false)` means the wait timed out.
    async fn wait_for_settle(&self, timeout: Duration) -> SondearResult<bool>;

    /// Current page URL
    async fn current_url(&self) -> SondearResult<String>;

    /// Number of elements matching the selector
    async fn count(&self, selector: &Selector) -> SondearResult<usize>;

    /// Whether the first match is visible
    async fn is_visible(&self, selector: &Selector) -> SondearResult<bool>;

    /// Whether the first match is enabled
    async fn is_enabled(&self, selector: &Selector) -> SondearResult<bool>;

    /// Whether the first match can take text input
    async fn is_editable(&self, selector: &Selector) -> SondearResult<bool>;

    /// Bounding box of the first match, if it has one
    async fn bounding_box(&self, selector: &Selector) -> SondearResult<Option<BoundingBox>>;

    /// Input value of the first match; `None` where the element has no
    /// value concept
    async fn input_value(&self, selector: &Selector) -> SondearResult<Option<String>>;

    /// Text content of the first match
    async fn text_content(&self, selector: &Selector) -> SondearResult<Option<String>>;

    /// Attribute value on the first match
    async fn attribute(&self, selector: &Selector, name: &str) -> SondearResult<Option<String>>;

    /// Computed style property on the first match
    async fn computed_style(
        &self,
        selector: &Selector,
        property: &str,
    ) -> SondearResult<Option<String>>;

    /// Replace the first match's value with `text`
    async fn fill(&self, selector: &Selector, text: &str) -> SondearResult<()>;

    /// Click the first match
    async fn click(&self, selector: &Selector) -> SondearResult<()>;

    /// Hover the first match
    async fn hover(&self, selector: &Selector) -> SondearResult<()>;

    /// Focus the first match
    async fn focus(&self, selector: &Selector) -> SondearResult<()>;

    /// Tear down the underlying browser session
    async fn close(&self) -> SondearResult<()>;
}

// Shared drivers validate like their inner driver; lets callers keep a
// handle on the session while the runner owns its copy.
#[async_trait]
impl<D: PageDriver + ?Sized> PageDriver for Arc<D> {
    async fn goto(&self, url: &str) -> SondearResult<Option<u16>> {
        self.as_ref().goto(url).await
    }

    async fn wait_for_settle(&self, timeout: Duration) -> SondearResult<bool> {
        self.as_ref().wait_for_settle(timeout).await
    }

    async fn current_url(&self) -> SondearResult<String> {
        self.as_ref().current_url().await
    }

    async fn count(&self, selector: &Selector) -> SondearResult<usize> {
        self.as_ref().count(selector).await
    }

    async fn is_visible(&self, selector: &Selector) -> SondearResult<bool> {
        self.as_ref().is_visible(selector).await
    }

    async fn is_enabled(&self, selector: &Selector) -> SondearResult<bool> {
        self.as_ref().is_enabled(selector).await
    }

    async fn is_editable(&self, selector: &Selector) -> SondearResult<bool> {
        self.as_ref().is_editable(selector).await
    }

    async fn bounding_box(&self, selector: &Selector) -> SondearResult<Option<BoundingBox>> {
        self.as_ref().bounding_box(selector).await
    }

    async fn input_value(&self, selector: &Selector) -> SondearResult<Option<String>> {
        self.as_ref().input_value(selector).await
    }

    async fn text_content(&self, selector: &Selector) -> SondearResult<Option<String>> {
        self.as_ref().text_content(selector).await
    }

    async fn attribute(&self, selector: &Selector, name: &str) -> SondearResult<Option<String>> {
        self.as_ref().attribute(selector, name).await
    }

    async fn computed_style(
        &self,
        selector: &Selector,
        property: &str,
    ) -> SondearResult<Option<String>> {
        self.as_ref().computed_style(selector, property).await
    }

    async fn fill(&self, selector: &Selector, text: &str) -> SondearResult<()> {
        self.as_ref().fill(selector, text).await
    }

    async fn click(&self, selector: &Selector) -> SondearResult<()> {
        self.as_ref().click(selector).await
    }

    async fn hover(&self, selector: &Selector) -> SondearResult<()> {
        self.as_ref().hover(selector).await
    }

    async fn focus(&self, selector: &Selector) -> SondearResult<()> {
        self.as_ref().focus(selector).await
    }

    async fn close(&self) -> SondearResult<()> {
        self.as_ref().close().await
    }
}
