//! Mission list views.

use super::{navigate, MissionEditor, PageObject};
use crate::config::SuiteConfig;
use crate::locator::Locator;
use crate::result::WaypointResult;
use crate::surface::{BrowserSurface, ClickOptions};
use std::sync::Arc;
use tracing::info;

/// Tabs of the missions area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissionsRoute {
    /// Overview
    #[default]
    Missions,
    /// Saved mission library
    Library,
    /// Scheduled runs
    Schedule,
    /// Completed runs
    Runs,
}

impl MissionsRoute {
    /// Relative route
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Missions => "missions",
            Self::Library => "missions/library",
            Self::Schedule => "missions/schedule",
            Self::Runs => "missions/runs",
        }
    }
}

/// A missions view; every tab shares the create-mission flow
pub struct MissionsPage {
    surface: Arc<dyn BrowserSurface>,
    config: SuiteConfig,
    route: MissionsRoute,
    create: Locator,
}

impl std::fmt::Debug for MissionsPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MissionsPage")
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}

impl PageObject for MissionsPage {
    fn route(&self) -> &str {
        self.route.path()
    }
}

impl MissionsPage {
    /// Bind the page for `route`
    #[must_use]
    pub fn new(surface: Arc<dyn BrowserSurface>, route: MissionsRoute, config: &SuiteConfig) -> Self {
        Self {
            surface,
            config: config.clone(),
            route,
            create: Locator::role("button", Some("Create New Mission".into())),
        }
    }

    /// View this page is bound to
    #[must_use]
    pub const fn missions_route(&self) -> MissionsRoute {
        self.route
    }

    /// "Create New Mission" button
    #[must_use]
    pub const fn create_button(&self) -> &Locator {
        &self.create
    }

    /// Navigate to the view
    pub async fn goto(&self) -> WaypointResult<()> {
        navigate(self.surface.as_ref(), &self.config, self).await
    }

    /// Start a new map-capture mission and return its editor
    pub async fn create_map_capture(&self) -> WaypointResult<MissionEditor> {
        info!(route = self.route.path(), "create map capture mission");
        self.surface
            .click(&self.create, ClickOptions::default())
            .await?;
        self.surface
            .click(&Locator::text("Map Capture"), ClickOptions::default())
            .await?;
        self.surface
            .click(
                &Locator::role("button", Some("Next".into())),
                ClickOptions::default(),
            )
            .await?;
        Ok(MissionEditor::new(Arc::clone(&self.surface), &self.config))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::{MockCall, MockElement, MockSurface};

    #[tokio::test]
    async fn test_goto_each_route() {
        let mock = MockSurface::new();
        let config = SuiteConfig::default();
        for route in [
            MissionsRoute::Missions,
            MissionsRoute::Library,
            MissionsRoute::Schedule,
            MissionsRoute::Runs,
        ] {
            MissionsPage::new(Arc::new(mock.clone()), route, &config)
                .goto()
                .await
                .unwrap();
        }
        let urls: Vec<_> = mock
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::Goto(url) => Some(url),
                _ => None,
            })
            .collect();
        assert_eq!(urls[0], "http://localhost:3000/missions");
        assert_eq!(urls[3], "http://localhost:3000/missions/runs");
    }

    #[tokio::test]
    async fn test_create_map_capture_flow() {
        let mock = MockSurface::new();
        let page = MissionsPage::new(
            Arc::new(mock.clone()),
            MissionsRoute::Library,
            &SuiteConfig::default(),
        );
        let map_capture = Locator::text("Map Capture");
        let next = Locator::role("button", Some("Next".into()));
        mock.element(page.create_button(), MockElement::new())
            .element(&map_capture, MockElement::new())
            .element(&next, MockElement::new());
        let editor = page.create_map_capture().await.unwrap();
        assert_eq!(mock.clicks_on(page.create_button()), 1);
        assert_eq!(mock.clicks_on(&map_capture), 1);
        assert_eq!(mock.clicks_on(&next), 1);
        assert_eq!(editor.route(), "missions/editor/3d-scan/unsaved");
    }

    #[tokio::test]
    async fn test_create_stops_when_menu_missing() {
        let mock = MockSurface::new();
        let page = MissionsPage::new(
            Arc::new(mock.clone()),
            MissionsRoute::Missions,
            &SuiteConfig::default(),
        );
        mock.element(page.create_button(), MockElement::new());
        assert!(page.create_map_capture().await.is_err());
    }
}
