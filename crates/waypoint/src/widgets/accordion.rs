//! Collapsible form section.

use crate::locator::Locator;
use crate::result::WaypointResult;
use crate::surface::{BrowserSurface, ClickOptions};
use std::sync::Arc;

/// Heading element that toggles the section
pub const HEADING_CSS: &str = ".AccordionForm_sectionHeading__yykmm";
/// Glyph shown inside the heading while the section is expanded
pub const OPEN_INDICATOR_CSS: &str = ".anticon-down";

/// An accordion section; open iff the indicator glyph is visible
#[derive(Clone)]
pub struct Accordion {
    surface: Arc<dyn BrowserSurface>,
    root: Locator,
    heading: Locator,
    indicator: Locator,
}

impl std::fmt::Debug for Accordion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accordion")
            .field("root", &self.root.describe())
            .finish_non_exhaustive()
    }
}

impl Accordion {
    /// Create an accordion using the planner's heading classes
    #[must_use]
    pub fn new(surface: Arc<dyn BrowserSurface>, root: Locator) -> Self {
        Self::with_parts(surface, root, HEADING_CSS, OPEN_INDICATOR_CSS)
    }

    /// Create an accordion with custom heading and indicator selectors
    #[must_use]
    pub fn with_parts(
        surface: Arc<dyn BrowserSurface>,
        root: Locator,
        heading_css: &str,
        indicator_css: &str,
    ) -> Self {
        let heading = root.clone().child(heading_css);
        let indicator = heading.clone().child(indicator_css);
        Self {
            surface,
            root,
            heading,
            indicator,
        }
    }

    /// Section locator
    #[must_use]
    pub const fn root(&self) -> &Locator {
        &self.root
    }

    /// Heading locator
    #[must_use]
    pub const fn heading(&self) -> &Locator {
        &self.heading
    }

    /// Indicator locator
    #[must_use]
    pub const fn indicator(&self) -> &Locator {
        &self.indicator
    }

    /// Whether the section is expanded
    pub async fn is_open(&self) -> WaypointResult<bool> {
        self.surface.is_visible(&self.indicator).await
    }

    /// Expand the section if collapsed
    pub async fn open(&self) -> WaypointResult<()> {
        if !self.is_open().await? {
            self.surface
                .click(&self.heading, ClickOptions::default())
                .await?;
        }
        Ok(())
    }

    /// Collapse the section if expanded
    pub async fn close(&self) -> WaypointResult<()> {
        if self.is_open().await? {
            self.surface
                .click(&self.heading, ClickOptions::default())
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::{MockElement, MockSurface};

    fn toggling(mock: &MockSurface) -> Accordion {
        let acc = Accordion::new(Arc::new(mock.clone()), Locator::new(".section").nth(1));
        mock.element(acc.heading(), MockElement::new())
            .element(acc.indicator(), MockElement::new().hidden());
        let indicator = acc.indicator().clone();
        mock.on_click(acc.heading(), move |scene, _| {
            let el = scene.element_mut(&indicator);
            el.visible = !el.visible;
        });
        acc
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let mock = MockSurface::new();
        let acc = toggling(&mock);
        acc.open().await.unwrap();
        acc.open().await.unwrap();
        assert!(acc.is_open().await.unwrap());
        assert_eq!(mock.clicks_on(acc.heading()), 1);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mock = MockSurface::new();
        let acc = toggling(&mock);
        acc.close().await.unwrap();
        assert_eq!(mock.clicks_on(acc.heading()), 0);
        acc.open().await.unwrap();
        acc.close().await.unwrap();
        acc.close().await.unwrap();
        assert!(!acc.is_open().await.unwrap());
        assert_eq!(mock.clicks_on(acc.heading()), 2);
    }

    #[test]
    fn test_indicator_is_inside_heading() {
        let acc = Accordion::new(Arc::new(MockSurface::new()), Locator::new(".s"));
        assert_eq!(
            acc.indicator().describe(),
            "css(.s) >> css(.AccordionForm_sectionHeading__yykmm) >> css(.anticon-down)"
        );
    }
}
