//! Select dropdown with bounded retry.

use crate::config::{RetryPolicy, Timings};
use crate::locator::Locator;
use crate::matcher::TextMatch;
use crate::result::{WaypointError, WaypointResult};
use crate::surface::{BrowserSurface, ClickOptions};
use crate::wait::{wait_for_element, ElementState, WaitOptions};
use std::sync::Arc;
use tracing::{debug, warn};

/// Option rows rendered by the select popup, anywhere in the page
const OPTION_CSS: &str = ".ant-select-item-option";

/// A select dropdown rooted at a container element
#[derive(Clone)]
pub struct Dropdown {
    surface: Arc<dyn BrowserSurface>,
    root: Locator,
    selector: Locator,
    input: Locator,
    options: Locator,
    policy: RetryPolicy,
    element_wait: WaitOptions,
    option_wait: WaitOptions,
}

impl std::fmt::Debug for Dropdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dropdown")
            .field("root", &self.root.describe())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Dropdown {
    /// Create a dropdown rooted at `root`
    #[must_use]
    pub fn new(surface: Arc<dyn BrowserSurface>, root: Locator, timings: &Timings) -> Self {
        let selector = root.clone().child(".ant-select-selector");
        let input = selector.clone().child("input").first();
        Self {
            surface,
            root,
            selector,
            input,
            options: Locator::new(OPTION_CSS),
            policy: timings.dropdown,
            element_wait: timings.element_wait,
            option_wait: timings.option_wait,
        }
    }

    /// Override the retry policy
    #[must_use]
    pub const fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Container locator
    #[must_use]
    pub const fn root(&self) -> &Locator {
        &self.root
    }

    /// Clickable selection region
    #[must_use]
    pub const fn selector(&self) -> &Locator {
        &self.selector
    }

    /// Search input inside the selection region
    #[must_use]
    pub const fn input(&self) -> &Locator {
        &self.input
    }

    /// Option row whose label matches `target`
    #[must_use]
    pub fn option(&self, target: &TextMatch) -> Locator {
        self.options.clone().with_text(target.clone()).first()
    }

    /// Displayed selection, trimmed
    pub async fn selected(&self) -> WaypointResult<String> {
        let text = self.surface.text_content(&self.selector).await?;
        Ok(text.trim().to_string())
    }

    /// Whether the container is rendered
    pub async fn is_visible(&self) -> WaypointResult<bool> {
        self.surface.is_visible(&self.root).await
    }

    /// Whether the search input accepts input
    pub async fn is_enabled(&self) -> WaypointResult<bool> {
        self.surface.is_enabled(&self.input).await
    }

    /// Whether the option popup is expanded
    pub async fn is_open(&self) -> WaypointResult<bool> {
        Ok(self
            .surface
            .attribute(&self.input, "aria-expanded")
            .await?
            .as_deref()
            == Some("true"))
    }

    /// Wait for the container, then force-click the selection region
    pub async fn open(&self) -> WaypointResult<()> {
        wait_for_element(
            self.surface.as_ref(),
            &self.root,
            ElementState::Visible,
            self.element_wait,
        )
        .await?;
        self.surface
            .click(&self.selector, ClickOptions::forced())
            .await
    }

    /// Collapse the popup if it is expanded; otherwise do nothing
    pub async fn close(&self) -> WaypointResult<()> {
        if self.surface.is_visible(&self.input).await?
            && self.surface.is_enabled(&self.input).await?
            && self.is_open().await?
        {
            self.surface
                .click(&self.selector, ClickOptions::forced())
                .await?;
        }
        Ok(())
    }

    /// Select the first option matching `target`
    ///
    /// Returns immediately, without clicking, when the displayed selection
    /// already matches. Each failed attempt closes the popup and backs off.
    ///
    /// # Errors
    ///
    /// [`WaypointError::WidgetInteraction`] carrying the last failure once the
    /// attempt budget is spent
    pub async fn select(&self, target: impl Into<TextMatch>) -> WaypointResult<()> {
        let target = target.into();
        let mut last_error = None;

        for attempt in 1..=self.policy.attempts {
            match self.try_select(&target).await {
                Ok(()) => {
                    debug!(dropdown = %self.root, %target, attempt, "selected");
                    return Ok(());
                }
                Err(e) => {
                    warn!(dropdown = %self.root, %target, attempt, error = %e, "select attempt failed");
                    if let Err(close_err) = self.close().await {
                        debug!(dropdown = %self.root, error = %close_err, "close after failed attempt");
                    }
                    last_error = Some(e);
                    if attempt < self.policy.attempts {
                        self.surface.pause(self.policy.backoff()).await;
                    }
                }
            }
        }

        Err(WaypointError::WidgetInteraction {
            widget: format!("dropdown {target}"),
            attempts: self.policy.attempts,
            source: Box::new(last_error.unwrap_or_else(|| WaypointError::Timeout {
                what: format!("dropdown {target}"),
                attempts: 0,
            })),
        })
    }

    async fn try_select(&self, target: &TextMatch) -> WaypointResult<()> {
        if target.matches(&self.selected().await?) {
            return Ok(());
        }

        self.open().await?;

        let option = self.option(target);
        wait_for_element(
            self.surface.as_ref(),
            &option,
            ElementState::Visible,
            self.option_wait,
        )
        .await?;
        self.surface.click(&option, ClickOptions::default()).await?;

        let actual = self.selected().await?;
        if target.matches(&actual) {
            Ok(())
        } else {
            Err(WaypointError::SelectionMismatch {
                expected: target.to_string(),
                actual,
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::{MockCall, MockElement, MockSurface};

    fn site_dropdown(mock: &MockSurface) -> Dropdown {
        let root = Locator::new(".site");
        let dd = Dropdown::new(Arc::new(mock.clone()), root.clone(), &Timings::instant());
        mock.element(&root, MockElement::new())
            .element(dd.selector(), MockElement::new().text("No Site"))
            .element(
                dd.input(),
                MockElement::new().attr("aria-expanded", "false"),
            );
        dd
    }

    /// Clicking the selector expands it; clicking an option selects it
    fn wire_options(mock: &MockSurface, dd: &Dropdown, labels: &[&str]) {
        let input = dd.input().clone();
        mock.on_click(dd.selector(), move |scene, _| {
            let expanded = scene.element_mut(&input);
            let now = expanded.attributes.get("aria-expanded").map(String::as_str) == Some("true");
            expanded
                .attributes
                .insert("aria-expanded".into(), (!now).to_string());
        });
        for label in labels {
            let option = dd.option(&TextMatch::from(*label));
            mock.element(&option, MockElement::new().text(*label));
            let selector = dd.selector().clone();
            let input = dd.input().clone();
            let label = (*label).to_string();
            mock.on_click(&option, move |scene, _| {
                scene.set_text(&selector, label.clone());
                scene
                    .element_mut(&input)
                    .attributes
                    .insert("aria-expanded".into(), "false".into());
            });
        }
    }

    mod select_tests {
        use super::*;

        #[tokio::test]
        async fn test_already_selected_issues_no_click() {
            let mock = MockSurface::new();
            let dd = site_dropdown(&mock);
            mock.scene(|s| s.set_text(dd.selector(), "HQ"));
            dd.select("HQ").await.unwrap();
            assert!(!mock.calls().iter().any(|c| matches!(c, MockCall::Click { .. })));
        }

        #[tokio::test]
        async fn test_selects_option() {
            let mock = MockSurface::new();
            let dd = site_dropdown(&mock);
            wire_options(&mock, &dd, &["Depot", "HQ"]);
            dd.select("HQ").await.unwrap();
            assert_eq!(dd.selected().await.unwrap(), "HQ");
            assert_eq!(mock.clicks_on(dd.selector()), 1);
        }

        #[tokio::test]
        async fn test_pattern_target() {
            let mock = MockSurface::new();
            let dd = site_dropdown(&mock);
            let pattern = TextMatch::pattern("dock.*").unwrap();
            let option = dd.option(&pattern);
            mock.element(&option, MockElement::new().text("dock-7"));
            let selector = dd.selector().clone();
            mock.on_click(&option, move |scene, _| scene.set_text(&selector, "dock-7"));
            dd.select(pattern).await.unwrap();
            assert_eq!(dd.selected().await.unwrap(), "dock-7");
        }

        #[tokio::test]
        async fn test_recovers_from_transient_failures() {
            let mock = MockSurface::new();
            let dd = site_dropdown(&mock);
            wire_options(&mock, &dd, &["HQ"]);
            let option = dd.option(&"HQ".into());
            mock.fail_times(&option, 3);
            dd.select("HQ").await.unwrap();
            assert_eq!(dd.selected().await.unwrap(), "HQ");
        }

        #[tokio::test]
        async fn test_exhaustion_after_exact_budget() {
            let mock = MockSurface::new();
            let dd = site_dropdown(&mock).with_policy(RetryPolicy::new(4, 300));
            let err = dd.select("Missing").await.unwrap_err();
            match err {
                WaypointError::WidgetInteraction { attempts, source, .. } => {
                    assert_eq!(attempts, 4);
                    assert!(matches!(*source, WaypointError::Timeout { .. }));
                }
                other => panic!("unexpected {other:?}"),
            }
            assert_eq!(mock.clicks_on(dd.selector()), 4);
            let backoffs = mock
                .pauses()
                .into_iter()
                .filter(|d| d.as_millis() == 300)
                .count();
            assert_eq!(backoffs, 3);
        }

        #[tokio::test]
        async fn test_mismatch_closes_expanded_popup() {
            let mock = MockSurface::new();
            let dd = site_dropdown(&mock).with_policy(RetryPolicy::new(1, 0));
            wire_options(&mock, &dd, &["HQ"]);
            let option = dd.option(&"HQ".into());
            // Option click is swallowed: popup stays expanded, selection unchanged
            let input = dd.input().clone();
            let selector = dd.selector().clone();
            mock.on_click(&option, move |scene, _| {
                scene.set_text(&selector, "No Site");
                scene
                    .element_mut(&input)
                    .attributes
                    .insert("aria-expanded".into(), "true".into());
            });
            let err = dd.select("HQ").await.unwrap_err();
            let WaypointError::WidgetInteraction { source, .. } = err else {
                panic!("expected widget error");
            };
            assert!(matches!(*source, WaypointError::SelectionMismatch { .. }));
            // open click plus the best-effort close
            assert_eq!(mock.clicks_on(dd.selector()), 2);
            assert!(!dd.is_open().await.unwrap());
        }
    }

    mod close_tests {
        use super::*;

        #[tokio::test]
        async fn test_close_is_noop_when_collapsed() {
            let mock = MockSurface::new();
            let dd = site_dropdown(&mock);
            dd.close().await.unwrap();
            assert_eq!(mock.clicks_on(dd.selector()), 0);
        }

        #[tokio::test]
        async fn test_close_skips_disabled_input() {
            let mock = MockSurface::new();
            let dd = site_dropdown(&mock);
            mock.scene(|s| {
                let input = s.element_mut(dd.input());
                input.enabled = false;
                input.attributes.insert("aria-expanded".into(), "true".into());
            });
            dd.close().await.unwrap();
            assert_eq!(mock.clicks_on(dd.selector()), 0);
        }
    }
}
