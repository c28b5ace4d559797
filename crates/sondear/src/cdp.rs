//! Real browser probing over the Chrome `DevTools` Protocol.
//!
//! Compiled behind the `browser` feature. The driver launches a chromium
//! instance via chromiumoxide and implements every [`PageDriver`] method by
//! evaluating JS built from the classified selector, so CSS and path
//! queries share one resolution mechanism.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::driver::{BoundingBox, BrowserSettings, PageDriver};
use crate::result::{SondearError, SondearResult};
use crate::selector::Selector;

/// How often the settle wait re-polls the document state.
const SETTLE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// [`PageDriver`] backed by a headless chromium instance.
#[derive(Debug)]
pub struct CdpDriver {
    browser: Arc<Mutex<Browser>>,
    page: Page,
    #[allow(dead_code)]
    handle: JoinHandle<()>,
}

impl CdpDriver {
    /// Launch chromium and open a blank page.
    ///
    /// # Errors
    ///
    /// [`SondearError::BrowserLaunch`] when the browser cannot be started
    /// or the initial page cannot be created.
    pub async fn launch(settings: &BrowserSettings) -> SondearResult<Self> {
        let mut builder = BrowserConfig::builder();
        if !settings.headless {
            builder = builder.with_head();
        }
        if !settings.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = settings.chromium_path {
            builder = builder.chrome_executable(path);
        }
        builder = builder.window_size(settings.viewport_width, settings.viewport_height);

        let config = builder
            .build()
            .map_err(|e| SondearError::BrowserLaunch {
                message: e.to_string(),
            })?;

        let (browser, mut handler) =
            Browser::launch(config)
                .await
                .map_err(|e| SondearError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        // Drive the CDP event loop for the lifetime of the session.
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SondearError::BrowserLaunch {
                message: e.to_string(),
            })?;

        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            page,
            handle,
        })
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, expr: String) -> SondearResult<T> {
        let result = self
            .page
            .evaluate(expr)
            .await
            .map_err(|e| SondearError::Driver {
                message: e.to_string(),
            })?;
        result.into_value().map_err(|e| SondearError::Driver {
            message: e.to_string(),
        })
    }

    /// Wrap per-element JS in a guard so an element that vanished since the
    /// count pre-check reads as `fallback` instead of a script error.
    fn on_first(selector: &Selector, body: &str, fallback: &str) -> String {
        format!(
            "(() => {{ const el = {}; if (!el) return {fallback}; {body} }})()",
            selector.js_first()
        )
    }

    async fn eval_on_first<T: serde::de::DeserializeOwned>(
        &self,
        selector: &Selector,
        body: &str,
        fallback: &str,
    ) -> SondearResult<T> {
        self.eval(Self::on_first(selector, body, fallback)).await
    }

    /// Run an element interaction; a `false` return means the element was
    /// gone by the time the script ran.
    async fn interact(&self, selector: &Selector, body: &str) -> SondearResult<()> {
        let done: bool = self.eval_on_first(selector, body, "false").await?;
        if done {
            Ok(())
        } else {
            Err(SondearError::Driver {
                message: format!("element vanished before interaction: {selector}"),
            })
        }
    }
}

#[async_trait]
impl PageDriver for CdpDriver {
    async fn goto(&self, url: &str) -> SondearResult<Option<u16>> {
        self.page
            .goto(url)
            .await
            .map_err(|e| SondearError::Load {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        // chromiumoxide's goto does not expose the response object; the
        // Navigation Timing entry carries the main document's status.
        let status: Option<f64> = self
            .eval(
                "(() => { const e = performance.getEntriesByType('navigation')[0]; \
                 return e && e.responseStatus ? e.responseStatus : null; })()"
                    .to_string(),
            )
            .await?;
        Ok(status.map(|s| s as u16))
    }

    async fn wait_for_settle(&self, timeout: Duration) -> SondearResult<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            let ready: bool = self
                .eval("document.readyState === 'complete'".to_string())
                .await
                .unwrap_or(false);
            if ready {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(SETTLE_POLL_INTERVAL).await;
        }
    }

    async fn current_url(&self) -> SondearResult<String> {
        self.eval("window.location.href".to_string()).await
    }

    async fn count(&self, selector: &Selector) -> SondearResult<usize> {
        let count: u64 = self.eval(selector.js_count()).await?;
        Ok(count as usize)
    }

    async fn is_visible(&self, selector: &Selector) -> SondearResult<bool> {
        self.eval_on_first(
            selector,
            "const r = el.getBoundingClientRect(); \
             const s = window.getComputedStyle(el); \
             return r.width > 0 && r.height > 0 && \
                    s.visibility !== 'hidden' && s.display !== 'none';",
            "false",
        )
        .await
    }

    async fn is_enabled(&self, selector: &Selector) -> SondearResult<bool> {
        self.eval_on_first(selector, "return !el.disabled;", "false")
            .await
    }

    async fn is_editable(&self, selector: &Selector) -> SondearResult<bool> {
        self.eval_on_first(
            selector,
            "if (el.isContentEditable) return true; \
             const tag = el.tagName; \
             if (tag !== 'INPUT' && tag !== 'TEXTAREA' && tag !== 'SELECT') return false; \
             return !el.disabled && !el.readOnly;",
            "false",
        )
        .await
    }

    async fn bounding_box(&self, selector: &Selector) -> SondearResult<Option<BoundingBox>> {
        self.eval_on_first(
            selector,
            "const r = el.getBoundingClientRect(); \
             return { x: r.x, y: r.y, width: r.width, height: r.height };",
            "null",
        )
        .await
    }

    async fn input_value(&self, selector: &Selector) -> SondearResult<Option<String>> {
        self.eval_on_first(
            selector,
            "return ('value' in el) ? String(el.value) : null;",
            "null",
        )
        .await
    }

    async fn text_content(&self, selector: &Selector) -> SondearResult<Option<String>> {
        self.eval_on_first(selector, "return el.textContent;", "null")
            .await
    }

    async fn attribute(&self, selector: &Selector, name: &str) -> SondearResult<Option<String>> {
        let body = format!("return el.getAttribute({name:?});");
        self.eval_on_first(selector, &body, "null").await
    }

    async fn computed_style(
        &self,
        selector: &Selector,
        property: &str,
    ) -> SondearResult<Option<String>> {
        let body = format!(
            "return window.getComputedStyle(el).getPropertyValue({property:?}) || null;"
        );
        self.eval_on_first(selector, &body, "null").await
    }

    async fn fill(&self, selector: &Selector, text: &str) -> SondearResult<()> {
        let body = format!(
            "if (el.isContentEditable) {{ el.textContent = {text:?}; }} \
             else {{ el.value = {text:?}; }} \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return true;"
        );
        self.interact(selector, &body).await
    }

    async fn click(&self, selector: &Selector) -> SondearResult<()> {
        self.interact(selector, "el.click(); return true;").await
    }

    async fn hover(&self, selector: &Selector) -> SondearResult<()> {
        self.interact(
            selector,
            "el.dispatchEvent(new MouseEvent('mouseover', { bubbles: true })); \
             el.dispatchEvent(new MouseEvent('mouseenter')); \
             return true;",
        )
        .await
    }

    async fn focus(&self, selector: &Selector) -> SondearResult<()> {
        self.interact(
            selector,
            "if (typeof el.focus !== 'function') return false; el.focus(); return true;",
        )
        .await
    }

    async fn close(&self) -> SondearResult<()> {
        let mut browser = self.browser.lock().await;
        browser.close().await.map_err(|e| SondearError::Driver {
            message: e.to_string(),
        })?;
        Ok(())
    }
}
