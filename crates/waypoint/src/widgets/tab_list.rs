//! Segmented tab strip.

use crate::locator::{Locator, Selector};
use crate::matcher::TextMatch;
use crate::result::WaypointResult;
use crate::surface::{BrowserSurface, ClickOptions};
use std::sync::Arc;
use tracing::debug;

/// A labelled tab strip with an optional warning popover
#[derive(Clone)]
pub struct TabList {
    surface: Arc<dyn BrowserSurface>,
    root: Locator,
    tablist: Locator,
    buttons: Locator,
    title: Locator,
    notice: Locator,
    warning_button: Locator,
    warning_content: Locator,
}

impl std::fmt::Debug for TabList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabList")
            .field("root", &self.root.describe())
            .finish_non_exhaustive()
    }
}

impl TabList {
    /// Create a tab list rooted at `root`
    #[must_use]
    pub fn new(surface: Arc<dyn BrowserSurface>, root: Locator) -> Self {
        Self {
            surface,
            tablist: root
                .clone()
                .locator(Selector::xpath(".//div[@data-slot='tabList']")),
            buttons: root.clone().child("button"),
            title: root.clone().child("span").first(),
            notice: root.clone().child("span").last(),
            warning_button: root.clone().child("svg"),
            warning_content: Locator::xpath("//div[@data-slot='content' and @data-open='true']")
                .last(),
            root,
        }
    }

    /// Root locator
    #[must_use]
    pub const fn root(&self) -> &Locator {
        &self.root
    }

    /// Every tab button
    #[must_use]
    pub const fn buttons(&self) -> &Locator {
        &self.buttons
    }

    /// Label span
    #[must_use]
    pub const fn title(&self) -> &Locator {
        &self.title
    }

    /// Trailing notice span
    #[must_use]
    pub const fn notice(&self) -> &Locator {
        &self.notice
    }

    /// Warning icon
    #[must_use]
    pub const fn warning_button(&self) -> &Locator {
        &self.warning_button
    }

    /// Open warning popover, page-wide
    #[must_use]
    pub const fn warning_content(&self) -> &Locator {
        &self.warning_content
    }

    /// Currently selected tab button
    #[must_use]
    pub fn selected_tab(&self) -> Locator {
        self.tablist.clone().child("button[aria-selected=true]")
    }

    /// Tab button whose label starts with `name`
    #[must_use]
    pub fn tab(&self, name: &str) -> Locator {
        self.buttons
            .clone()
            .with_text(TextMatch::prefix(name))
            .first()
    }

    /// Label of the selected tab
    pub async fn selected(&self) -> WaypointResult<String> {
        let text = self.surface.text_content(&self.selected_tab()).await?;
        Ok(text.trim().to_string())
    }

    /// Select the tab starting with `name`; no-op when it is already selected
    pub async fn select(&self, name: &str) -> WaypointResult<()> {
        if self.selected().await? == name {
            return Ok(());
        }
        debug!(tablist = %self.root, name, "select tab");
        self.surface
            .click(&self.tab(name), ClickOptions::default())
            .await
    }

    /// Whether the strip's first button rejects input
    pub async fn disabled(&self) -> WaypointResult<bool> {
        Ok(!self.surface.is_enabled(&self.buttons.clone().first()).await?)
    }

    /// Text of the label span
    pub async fn title_text(&self) -> WaypointResult<String> {
        self.surface.text_content(&self.title).await
    }

    /// Text of the notice span
    pub async fn notice_text(&self) -> WaypointResult<String> {
        self.surface.text_content(&self.notice).await
    }

    /// Hover the warning icon and read the popover
    pub async fn warning_text(&self) -> WaypointResult<String> {
        self.surface.hover(&self.warning_button).await?;
        self.surface.text_content(&self.warning_content).await
    }
}
