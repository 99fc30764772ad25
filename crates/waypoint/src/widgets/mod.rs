//! Retryable widgets over the planner's component library.
//!
//! Each widget holds locators and a shared surface. Nothing is cached
//! between calls; every operation re-resolves against the live page.

mod accordion;
mod dropdown;
mod slider;
mod tab_list;

pub use accordion::Accordion;
pub use dropdown::Dropdown;
pub use slider::Slider;
pub use tab_list::TabList;

use crate::locator::{BoundingBox, Locator};
use crate::result::{WaypointError, WaypointResult};
use crate::surface::BrowserSurface;

/// Bounding box of `locator` or a not-actionable error
pub(crate) async fn require_box(
    surface: &dyn BrowserSurface,
    locator: &Locator,
) -> WaypointResult<BoundingBox> {
    surface
        .bounding_box(locator)
        .await?
        .ok_or_else(|| WaypointError::NotActionable {
            locator: locator.describe(),
            reason: "not rendered".to_string(),
        })
}
