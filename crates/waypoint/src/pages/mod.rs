//! Page objects for the mission planner.
//!
//! A page object owns locators and a shared surface; it never caches element
//! state. Routes are relative to [`SuiteConfig::base_url`].

mod camera_settings;
mod mission_editor;
mod missions;

pub use camera_settings::{
    CameraSettings, CaptureRow, CaptureSetting, ModalTab, SettingLabel, TabSetting,
};
pub use mission_editor::{
    BOUNDARY_HINT, EditorAccordion, MissionDetails, MissionEditor, ScanSettings, ScanToggle,
    EDITOR_ROUTE,
};
pub use missions::{MissionsPage, MissionsRoute};

use crate::config::SuiteConfig;
use crate::result::WaypointResult;
use crate::surface::BrowserSurface;
use tracing::info;

/// A page or view reachable by URL
pub trait PageObject {
    /// Route relative to the application root, e.g. `missions/library`
    fn route(&self) -> &str;

    /// Name used in logs
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Navigate `surface` to the page's route
///
/// # Errors
///
/// Propagates [`crate::WaypointError::Navigation`] from the surface
pub async fn navigate(
    surface: &dyn BrowserSurface,
    config: &SuiteConfig,
    page: &(impl PageObject + ?Sized),
) -> WaypointResult<()> {
    let url = config.url(page.route());
    info!(page = page.page_name(), %url, "navigate");
    surface.goto(&url).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::{MockCall, MockSurface};

    struct Library;

    impl PageObject for Library {
        fn route(&self) -> &str {
            "missions/library"
        }
    }

    #[tokio::test]
    async fn test_navigate_joins_base_url() {
        let mock = MockSurface::new();
        let config = SuiteConfig {
            base_url: "https://planner.test/o/acme/".to_string(),
            ..SuiteConfig::default()
        };
        navigate(&mock, &config, &Library).await.unwrap();
        assert_eq!(
            mock.calls(),
            vec![MockCall::Goto(
                "https://planner.test/o/acme/missions/library".to_string()
            )]
        );
    }

    #[test]
    fn test_default_page_name() {
        assert!(Library.page_name().ends_with("Library"));
    }
}
