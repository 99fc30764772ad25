//! Chromium surface over the DevTools protocol.
//!
//! Element operations evaluate the locator's query in the page and act on
//! the first match. Pointer and keyboard input go through the `Input`
//! domain so page handlers see trusted events.

use crate::config::BrowserConfig;
use crate::geometry::Point;
use crate::locator::{BoundingBox, Locator};
use crate::matcher::js_string;
use crate::result::{WaypointError, WaypointResult};
use crate::surface::{BrowserSurface, ClickOptions, Key};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, InsertTextParams, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

// ============================================================================
// BROWSER
// ============================================================================

/// Launched chromium process
#[derive(Debug)]
pub struct CdpBrowser {
    config: BrowserConfig,
    inner: Arc<Mutex<Browser>>,
    handle: tokio::task::JoinHandle<()>,
}

impl CdpBrowser {
    /// Launch chromium with `config`
    ///
    /// # Errors
    ///
    /// Returns error if browser cannot be launched
    pub async fn launch(config: &BrowserConfig) -> WaypointResult<Self> {
        let mut builder = CdpConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .viewport(Viewport {
                width: config.viewport_width,
                height: config.viewport_height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: false,
                has_touch: false,
            });

        if !config.headless {
            builder = builder.with_head();
        }

        if !config.sandbox {
            builder = builder.no_sandbox();
        }

        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }

        if let Some(ref dir) = config.user_data_dir {
            builder = builder.user_data_dir(dir);
        }

        let cdp_config = builder
            .build()
            .map_err(|message| WaypointError::BrowserLaunch { message })?;

        let (browser, mut handler) =
            Browser::launch(cdp_config)
                .await
                .map_err(|e| WaypointError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "cdp handler stopped");
                    break;
                }
            }
        });

        Ok(Self {
            config: config.clone(),
            inner: Arc::new(Mutex::new(browser)),
            handle,
        })
    }

    /// Open a blank page
    ///
    /// # Errors
    ///
    /// Returns error if page cannot be created
    pub async fn new_page(&self) -> WaypointResult<CdpSurface> {
        let browser = self.inner.lock().await;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| WaypointError::BrowserLaunch {
                message: e.to_string(),
            })?;
        Ok(CdpSurface {
            page,
            pointer: Mutex::new(Point::default()),
        })
    }

    /// Browser configuration
    #[must_use]
    pub const fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Close the browser and stop the handler task
    ///
    /// # Errors
    ///
    /// Returns error if chromium does not shut down cleanly
    pub async fn close(self) -> WaypointResult<()> {
        {
            let mut browser = self.inner.lock().await;
            browser
                .close()
                .await
                .map_err(|e| WaypointError::BrowserLaunch {
                    message: e.to_string(),
                })?;
            if let Err(e) = browser.wait().await {
                warn!(error = %e, "chromium exit status unavailable");
            }
        }
        self.handle.abort();
        Ok(())
    }
}

// ============================================================================
// SURFACE
// ============================================================================

/// One chromium tab implementing [`BrowserSurface`]
#[derive(Debug)]
pub struct CdpSurface {
    page: Page,
    pointer: Mutex<Point>,
}

/// Wrap `body` so it runs against the first match as `el`
///
/// The script yields `{ missing: true }` when nothing matches and
/// `{ value }` otherwise.
fn on_first(locator: &Locator, body: &str) -> String {
    format!(
        "(() => {{ const el = {}[0]; if (!el) return {{ missing: true }}; \
         return {{ value: (() => {{ {body} }})() }}; }})()",
        locator.to_query()
    )
}

const ACTIONABILITY: &str = "el.scrollIntoView({ block: 'center', inline: 'center' }); \
     const r = el.getBoundingClientRect(); \
     const style = getComputedStyle(el); \
     return { \
       visible: el.getClientRects().length > 0 && style.visibility !== 'hidden', \
       enabled: !el.disabled && el.getAttribute('aria-disabled') !== 'true', \
       box: { x: r.x, y: r.y, width: r.width, height: r.height } \
     };";

impl CdpSurface {
    /// Underlying chromiumoxide page
    #[must_use]
    pub const fn page(&self) -> &Page {
        &self.page
    }

    async fn eval(&self, script: &str) -> WaypointResult<Value> {
        let params = EvaluateParams::builder()
            .expression(script)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(WaypointError::script)?;
        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|e| WaypointError::script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn eval_on(&self, locator: &Locator, body: &str) -> WaypointResult<Value> {
        let mut result = self.eval(&on_first(locator, body)).await?;
        if result.get("missing").and_then(Value::as_bool) == Some(true) {
            return Err(WaypointError::ElementNotFound {
                locator: locator.describe(),
            });
        }
        Ok(result.get_mut("value").map(Value::take).unwrap_or_default())
    }

    /// Scroll into view, check actionability and return the element box
    async fn actionable_box(&self, locator: &Locator, force: bool) -> WaypointResult<BoundingBox> {
        let state = self.eval_on(locator, ACTIONABILITY).await?;
        let reason = if force {
            None
        } else if state.get("visible").and_then(Value::as_bool) != Some(true) {
            Some("not visible")
        } else if state.get("enabled").and_then(Value::as_bool) != Some(true) {
            Some("disabled")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(WaypointError::NotActionable {
                locator: locator.describe(),
                reason: reason.to_string(),
            });
        }
        Ok(serde_json::from_value(
            state.get("box").cloned().unwrap_or_default(),
        )?)
    }

    async fn mouse_event(&self, kind: DispatchMouseEventType, at: Point) -> WaypointResult<()> {
        let mut builder = DispatchMouseEventParams::builder()
            .r#type(kind.clone())
            .x(at.x)
            .y(at.y);
        if kind != DispatchMouseEventType::MouseMoved {
            builder = builder.button(MouseButton::Left).click_count(1);
        }
        let params = builder.build().map_err(WaypointError::input)?;
        self.page
            .execute(params)
            .await
            .map_err(|e| WaypointError::input(e.to_string()))?;
        Ok(())
    }

    async fn key_event(&self, kind: DispatchKeyEventType, key: Key) -> WaypointResult<()> {
        let mut builder = DispatchKeyEventParams::builder()
            .r#type(kind.clone())
            .key(key.name())
            .code(key.name())
            .windows_virtual_key_code(key.key_code());
        if kind == DispatchKeyEventType::KeyDown {
            if let Some(text) = key.text() {
                builder = builder.text(text);
            }
        }
        let params = builder.build().map_err(WaypointError::input)?;
        self.page
            .execute(params)
            .await
            .map_err(|e| WaypointError::input(e.to_string()))?;
        Ok(())
    }

    async fn click_at(&self, at: Point) -> WaypointResult<()> {
        self.mouse_event(DispatchMouseEventType::MouseMoved, at).await?;
        self.mouse_event(DispatchMouseEventType::MousePressed, at).await?;
        self.mouse_event(DispatchMouseEventType::MouseReleased, at).await?;
        *self.pointer.lock().await = at;
        Ok(())
    }
}

#[async_trait]
impl BrowserSurface for CdpSurface {
    async fn count(&self, locator: &Locator) -> WaypointResult<usize> {
        let value = self.eval(&format!("{}.length", locator.to_query())).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn text_content(&self, locator: &Locator) -> WaypointResult<String> {
        let value = self.eval_on(locator, "return el.textContent || '';").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn input_value(&self, locator: &Locator) -> WaypointResult<String> {
        let value = self
            .eval_on(locator, "return el.value === undefined ? '' : String(el.value);")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> WaypointResult<Option<String>> {
        let value = self
            .eval_on(locator, &format!("return el.getAttribute({});", js_string(name)))
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn is_visible(&self, locator: &Locator) -> WaypointResult<bool> {
        let script = on_first(
            locator,
            "return el.getClientRects().length > 0 && getComputedStyle(el).visibility !== 'hidden';",
        );
        let result = self.eval(&script).await?;
        Ok(result.get("value").and_then(Value::as_bool).unwrap_or(false))
    }

    async fn is_enabled(&self, locator: &Locator) -> WaypointResult<bool> {
        let value = self
            .eval_on(
                locator,
                "return !el.disabled && el.getAttribute('aria-disabled') !== 'true';",
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_checked(&self, locator: &Locator) -> WaypointResult<bool> {
        let value = self
            .eval_on(
                locator,
                "return el.checked === undefined ? el.getAttribute('aria-checked') === 'true' : el.checked;",
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn bounding_box(&self, locator: &Locator) -> WaypointResult<Option<BoundingBox>> {
        let value = self
            .eval_on(
                locator,
                "const r = el.getBoundingClientRect(); \
                 return r.width || r.height ? { x: r.x, y: r.y, width: r.width, height: r.height } : null;",
            )
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    async fn click(&self, locator: &Locator, options: ClickOptions) -> WaypointResult<()> {
        let bbox = self.actionable_box(locator, options.force).await?;
        let at = options
            .position
            .map_or_else(|| bbox.center(), |offset| bbox.origin().offset(offset.x, offset.y));
        debug!(locator = %locator, x = at.x, y = at.y, "click");
        self.click_at(at).await
    }

    async fn hover(&self, locator: &Locator) -> WaypointResult<()> {
        let bbox = self.actionable_box(locator, false).await?;
        self.mouse_move(bbox.center(), 1).await
    }

    async fn fill(&self, locator: &Locator, text: &str) -> WaypointResult<()> {
        let _ = self.actionable_box(locator, false).await?;
        let body = format!(
            "el.focus(); \
             const proto = Object.getPrototypeOf(el); \
             const setter = Object.getOwnPropertyDescriptor(proto, 'value')?.set; \
             if (setter) {{ setter.call(el, {text}); }} else {{ el.value = {text}; }} \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return true;",
            text = js_string(text)
        );
        let _ = self.eval_on(locator, &body).await?;
        Ok(())
    }

    async fn press(&self, locator: &Locator, key: Key) -> WaypointResult<()> {
        let _ = self.eval_on(locator, "el.focus(); return true;").await?;
        self.key_event(DispatchKeyEventType::KeyDown, key).await?;
        self.key_event(DispatchKeyEventType::KeyUp, key).await
    }

    async fn type_text(&self, text: &str, delay: Duration) -> WaypointResult<()> {
        for ch in text.chars() {
            self.page
                .execute(InsertTextParams::new(ch.to_string()))
                .await
                .map_err(|e| WaypointError::input(e.to_string()))?;
            self.pause(delay).await;
        }
        Ok(())
    }

    async fn mouse_move(&self, to: Point, steps: u32) -> WaypointResult<()> {
        let from = *self.pointer.lock().await;
        let steps = steps.max(1);
        for i in 1..=steps {
            let t = f64::from(i) / f64::from(steps);
            let at = Point::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t);
            self.mouse_event(DispatchMouseEventType::MouseMoved, at).await?;
        }
        *self.pointer.lock().await = to;
        Ok(())
    }

    async fn mouse_down(&self) -> WaypointResult<()> {
        let at = *self.pointer.lock().await;
        self.mouse_event(DispatchMouseEventType::MousePressed, at).await
    }

    async fn mouse_up(&self) -> WaypointResult<()> {
        let at = *self.pointer.lock().await;
        self.mouse_event(DispatchMouseEventType::MouseReleased, at).await
    }

    async fn evaluate(&self, script: &str) -> WaypointResult<Value> {
        self.eval(script).await
    }

    async fn goto(&self, url: &str) -> WaypointResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| WaypointError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn screenshot(&self) -> WaypointResult<Vec<u8>> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();

        let screenshot =
            self.page
                .execute(params)
                .await
                .map_err(|e| WaypointError::Screenshot {
                    message: e.to_string(),
                })?;

        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(&screenshot.data)
            .map_err(|e| WaypointError::Screenshot {
                message: e.to_string(),
            })
    }

    async fn close(&self) -> WaypointResult<()> {
        debug!("closing page target");
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| WaypointError::PageClose {
                message: e.to_string(),
            })
    }
}
