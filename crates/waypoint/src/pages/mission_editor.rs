//! Map-capture mission editor.
//!
//! ```text
//! MissionEditor
//! ├── map              (MapView)
//! ├── map search box
//! ├── mission_details  name · site ▾ · dock ▾ · [Add Outer Boundary]
//! ├── scan_settings    sliders · toggles · camera settings modal
//! ├── set_return
//! ├── review_json
//! ├── [Discard] [Save Mission Plan]
//! └── estimates table  time | photos | colour GSD | thermal GSD
//! ```

use super::{navigate, CameraSettings, PageObject};
use crate::config::{SuiteConfig, Timings};
use crate::locator::{Locator, Selector};
use crate::map::MapView;
use crate::change::{sampler, ChangeCheck};
use crate::metrics::{parse_rotation, Metric};
use crate::result::{WaypointError, WaypointResult};
use crate::surface::{BrowserSurface, ClickOptions, Key};
use crate::wait::{wait_for_change, WaitOptions};
use crate::widgets::{Accordion, Dropdown, Slider};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Route of a fresh, unsaved 3D-scan mission
pub const EDITOR_ROUTE: &str = "missions/editor/3d-scan/unsaved";

/// Scan settings hint while a fresh boundary is unplaced
pub const BOUNDARY_HINT: &str = "Drag the pillars on map to set your boundaries";

const SECTIONS_CSS: &str = ".AccordionForm_mid__reais > div > div";

fn labelled(root: &Locator, label: &str, tag: &str) -> Locator {
    root.clone()
        .locator(Selector::xpath(format!(
            "//span[text()='{label}']/parent::div/following-sibling::{tag}"
        )))
        .first()
}

fn labelled_nth(root: &Locator, label: &str, tag: &str, nth: i64) -> Locator {
    root.clone()
        .locator(Selector::xpath(format!(
            "//span[text()='{label}']/parent::div/following-sibling::{tag}[1]"
        )))
        .nth(nth)
}

// =============================================================================
// SECTIONS
// =============================================================================

/// One collapsible section of the editor form
#[derive(Clone)]
pub struct EditorAccordion {
    surface: Arc<dyn BrowserSurface>,
    accordion: Accordion,
}

impl std::fmt::Debug for EditorAccordion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EditorAccordion")
            .field(&self.accordion.root().describe())
            .finish()
    }
}

impl EditorAccordion {
    /// Section rooted at `root`
    #[must_use]
    pub fn new(surface: Arc<dyn BrowserSurface>, root: Locator) -> Self {
        Self {
            accordion: Accordion::new(Arc::clone(&surface), root),
            surface,
        }
    }

    /// Section root
    #[must_use]
    pub const fn root(&self) -> &Locator {
        self.accordion.root()
    }

    /// Underlying accordion
    #[must_use]
    pub const fn accordion(&self) -> &Accordion {
        &self.accordion
    }

    /// Whether the section is expanded
    pub async fn is_open(&self) -> WaypointResult<bool> {
        self.accordion.is_open().await
    }

    /// Expand the section
    pub async fn open(&self) -> WaypointResult<()> {
        self.accordion.open().await
    }

    /// Collapse the section
    pub async fn close(&self) -> WaypointResult<()> {
        self.accordion.close().await
    }

    /// Full text of the section
    pub async fn text(&self) -> WaypointResult<String> {
        self.surface.text_content(self.root()).await
    }
}

/// Name, site, dock and boundary controls
#[derive(Debug, Clone)]
pub struct MissionDetails {
    section: EditorAccordion,
    name: Locator,
    site: Dropdown,
    dock: Dropdown,
    add_boundary: Locator,
}

impl MissionDetails {
    /// Section rooted at `root`
    #[must_use]
    pub fn new(surface: Arc<dyn BrowserSurface>, root: Locator, timings: &Timings) -> Self {
        Self {
            name: labelled(&root, "Name", "input"),
            site: Dropdown::new(Arc::clone(&surface), labelled(&root, "Site", "div"), timings),
            dock: Dropdown::new(Arc::clone(&surface), labelled(&root, "Dock", "div"), timings),
            add_boundary: root
                .clone()
                .get_by_role("button", Some("Add Outer Boundary".into())),
            section: EditorAccordion::new(surface, root),
        }
    }

    /// Section accordion
    #[must_use]
    pub const fn section(&self) -> &EditorAccordion {
        &self.section
    }

    /// Expand the section
    pub async fn open(&self) -> WaypointResult<()> {
        self.section.open().await
    }

    /// Mission name input
    #[must_use]
    pub const fn name(&self) -> &Locator {
        &self.name
    }

    /// Site dropdown
    #[must_use]
    pub const fn site(&self) -> &Dropdown {
        &self.site
    }

    /// Dock dropdown
    #[must_use]
    pub const fn dock(&self) -> &Dropdown {
        &self.dock
    }

    /// "Add Outer Boundary" button
    #[must_use]
    pub const fn add_boundary(&self) -> &Locator {
        &self.add_boundary
    }

    fn surface(&self) -> &dyn BrowserSurface {
        self.section.surface.as_ref()
    }

    /// Replace the mission name
    pub async fn set_name(&self, name: &str) -> WaypointResult<()> {
        self.surface().fill(&self.name, name).await
    }

    /// Current mission name
    pub async fn name_value(&self) -> WaypointResult<String> {
        self.surface().input_value(&self.name).await
    }

    /// Suggested default name
    pub async fn name_placeholder(&self) -> WaypointResult<Option<String>> {
        self.surface().attribute(&self.name, "placeholder").await
    }

    /// Click "Add Outer Boundary"
    pub async fn click_add_boundary(&self) -> WaypointResult<()> {
        self.surface()
            .click(&self.add_boundary, ClickOptions::default())
            .await
    }
}

/// Toggle buttons in the scan settings section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanToggle {
    /// Second pass at right angles
    Crosshatch,
    /// Perimeter orbit
    Perimeter,
    /// Hover at each capture
    StopForPhoto,
    /// Keep the flight path inside the boundary
    StrictBoundaries,
    /// Manual flight heading
    CustomFlightDirection,
    /// Heading perpendicular to the flight lines
    PerpendicularHeading,
}

impl ScanToggle {
    /// Every toggle
    pub const ALL: [Self; 6] = [
        Self::Crosshatch,
        Self::Perimeter,
        Self::StopForPhoto,
        Self::StrictBoundaries,
        Self::CustomFlightDirection,
        Self::PerpendicularHeading,
    ];

    /// Visible label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Crosshatch => "Crosshatch",
            Self::Perimeter => "Perimeter",
            Self::StopForPhoto => "Stop for Photo",
            Self::StrictBoundaries => "Strict Boundaries",
            Self::CustomFlightDirection => "Custom Flight Direction",
            Self::PerpendicularHeading => "Use Perpendicular Heading",
        }
    }
}

/// Flight pattern and capture parameters
#[derive(Debug, Clone)]
pub struct ScanSettings {
    section: EditorAccordion,
    height: Slider,
    gimbal_angle: Slider,
    overlap: Slider,
    sidelap: Slider,
    perimeter_overlap: Slider,
    perimeter_angle: Slider,
    max_speed: Slider,
    camera_settings: CameraSettings,
}

impl ScanSettings {
    /// Section rooted at `root`
    #[must_use]
    pub fn new(surface: Arc<dyn BrowserSurface>, root: Locator, timings: &Timings) -> Self {
        let slider = |label: &str, nth: i64| {
            Slider::new(Arc::clone(&surface), labelled_nth(&root, label, "div", nth), timings)
        };
        Self {
            height: slider("Height above Launch Point", 0),
            gimbal_angle: slider("Gimbal Angle", 0),
            overlap: slider("Overlap", 0),
            sidelap: slider("Sidelap", 0),
            perimeter_overlap: slider("Overlap", 1),
            perimeter_angle: slider("Perimeter Gimbal Angle", 0),
            max_speed: slider("Maximum Speed", 0),
            camera_settings: CameraSettings::new(
                Arc::clone(&surface),
                root.clone().child("button").with_text("Edit"),
                timings,
            ),
            section: EditorAccordion::new(surface, root),
        }
    }

    /// Section accordion
    #[must_use]
    pub const fn section(&self) -> &EditorAccordion {
        &self.section
    }

    /// Expand the section
    pub async fn open(&self) -> WaypointResult<()> {
        self.section.open().await
    }

    /// Height above launch point, metres
    #[must_use]
    pub const fn height(&self) -> &Slider {
        &self.height
    }

    /// Gimbal pitch, degrees
    #[must_use]
    pub const fn gimbal_angle(&self) -> &Slider {
        &self.gimbal_angle
    }

    /// Frontal overlap, percent
    #[must_use]
    pub const fn overlap(&self) -> &Slider {
        &self.overlap
    }

    /// Side overlap, percent
    #[must_use]
    pub const fn sidelap(&self) -> &Slider {
        &self.sidelap
    }

    /// Perimeter overlap, percent
    #[must_use]
    pub const fn perimeter_overlap(&self) -> &Slider {
        &self.perimeter_overlap
    }

    /// Perimeter gimbal pitch, degrees
    #[must_use]
    pub const fn perimeter_angle(&self) -> &Slider {
        &self.perimeter_angle
    }

    /// Maximum speed
    #[must_use]
    pub const fn max_speed(&self) -> &Slider {
        &self.max_speed
    }

    /// Camera settings modal
    #[must_use]
    pub const fn camera_settings(&self) -> &CameraSettings {
        &self.camera_settings
    }

    /// Toggle button for `toggle`
    #[must_use]
    pub fn toggle(&self, toggle: ScanToggle) -> Locator {
        labelled_nth(self.section.root(), toggle.label(), "button", 0)
    }

    /// Whether `toggle` is on
    pub async fn is_on(&self, toggle: ScanToggle) -> WaypointResult<bool> {
        self.section.surface.is_checked(&self.toggle(toggle)).await
    }

    /// Turn `toggle` on or off; no click when already in that state
    pub async fn set_toggle(&self, toggle: ScanToggle, on: bool) -> WaypointResult<()> {
        if self.is_on(toggle).await? == on {
            return Ok(());
        }
        debug!(toggle = toggle.label(), on, "switch scan toggle");
        self.section
            .surface
            .click(&self.toggle(toggle), ClickOptions::default())
            .await
    }

    /// Hint shown while a new boundary awaits placement
    #[must_use]
    pub fn boundary_hint(&self) -> Locator {
        self.section.root().clone().get_by_text(BOUNDARY_HINT)
    }

    /// Camera glyph rotated by the gimbal slider
    #[must_use]
    pub fn gimbal_preview(&self) -> Locator {
        self.gimbal_angle.root().clone().child("img")
    }

    /// Rotation of the gimbal preview, degrees
    pub async fn gimbal_rotation(&self) -> WaypointResult<f64> {
        let preview = self.gimbal_preview();
        let style = self
            .section
            .surface
            .attribute(&preview, "style")
            .await?
            .ok_or_else(|| WaypointError::ElementNotFound {
                locator: format!("{preview} [style]"),
            })?;
        parse_rotation(&style)
    }
}

// =============================================================================
// EDITOR
// =============================================================================

/// The mission editor page
pub struct MissionEditor {
    surface: Arc<dyn BrowserSurface>,
    config: SuiteConfig,
    map: MapView,
    map_search: Locator,
    mission_details: MissionDetails,
    scan_settings: ScanSettings,
    set_return: EditorAccordion,
    review_json: EditorAccordion,
    discard: Locator,
    save: Locator,
    estimates: Locator,
}

impl std::fmt::Debug for MissionEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MissionEditor")
            .field("base_url", &self.config.base_url)
            .field("map", &self.map)
            .finish_non_exhaustive()
    }
}

impl PageObject for MissionEditor {
    fn route(&self) -> &str {
        EDITOR_ROUTE
    }
}

impl MissionEditor {
    /// Bind the editor to a page
    #[must_use]
    pub fn new(surface: Arc<dyn BrowserSurface>, config: &SuiteConfig) -> Self {
        let timings = &config.timings;
        let sections = Locator::new(SECTIONS_CSS);
        let section = |n: i64| sections.clone().nth(n);
        Self {
            map: MapView::new(Arc::clone(&surface), timings),
            map_search: Locator::role("textbox", Some("search".into())),
            mission_details: MissionDetails::new(Arc::clone(&surface), section(0), timings),
            scan_settings: ScanSettings::new(Arc::clone(&surface), section(1), timings),
            set_return: EditorAccordion::new(Arc::clone(&surface), section(2)),
            review_json: EditorAccordion::new(Arc::clone(&surface), section(3)),
            discard: Locator::role("button", Some("Discard".into())),
            save: Locator::role("button", Some("Save Mission Plan".into())),
            estimates: Locator::new("table").last(),
            config: config.clone(),
            surface,
        }
    }

    /// Open a fresh unsaved mission
    pub async fn goto(&self) -> WaypointResult<()> {
        navigate(self.surface.as_ref(), &self.config, self).await
    }

    /// Shared surface
    #[must_use]
    pub fn surface(&self) -> &Arc<dyn BrowserSurface> {
        &self.surface
    }

    /// Suite configuration the editor was bound with
    #[must_use]
    pub const fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Map and scene
    #[must_use]
    pub const fn map(&self) -> &MapView {
        &self.map
    }

    /// Address search box
    #[must_use]
    pub const fn map_search(&self) -> &Locator {
        &self.map_search
    }

    /// Mission details section
    #[must_use]
    pub const fn mission_details(&self) -> &MissionDetails {
        &self.mission_details
    }

    /// Scan settings section
    #[must_use]
    pub const fn scan_settings(&self) -> &ScanSettings {
        &self.scan_settings
    }

    /// Return behaviour section
    #[must_use]
    pub const fn set_return(&self) -> &EditorAccordion {
        &self.set_return
    }

    /// Mission JSON review section
    #[must_use]
    pub const fn review_json(&self) -> &EditorAccordion {
        &self.review_json
    }

    /// Discard button
    #[must_use]
    pub const fn discard(&self) -> &Locator {
        &self.discard
    }

    /// Save button
    #[must_use]
    pub const fn save(&self) -> &Locator {
        &self.save
    }

    /// Estimates table cell `n`
    #[must_use]
    pub fn estimate_cell(&self, n: i64) -> Locator {
        self.estimates.clone().child("td").nth(n)
    }

    /// Type `query` into the map search and submit it
    pub async fn search_in_map(&self, query: &str) -> WaypointResult<()> {
        debug!(query, "map search");
        self.surface
            .click(&self.map_search, ClickOptions::default())
            .await?;
        self.surface
            .type_text(query, Duration::from_millis(self.config.timings.typing_delay_ms))
            .await?;
        self.surface.press(&self.map_search, Key::Enter).await
    }

    /// Read `metric` from the estimates row
    pub async fn metric(&self, metric: Metric) -> WaypointResult<f64> {
        let text = self
            .surface
            .text_content(&self.estimate_cell(metric.column()))
            .await?;
        metric.parse(text.trim())
    }

    /// Change check sampling `metric` before and after an action
    #[must_use]
    pub fn track(&self, metric: Metric) -> ChangeCheck<'_, f64> {
        ChangeCheck::new(sampler(move || self.metric(metric)))
    }

    /// Estimated flight time, minutes
    pub async fn time(&self) -> WaypointResult<f64> {
        self.metric(Metric::Time).await
    }

    /// Estimated photo count
    pub async fn photos(&self) -> WaypointResult<f64> {
        self.metric(Metric::Photos).await
    }

    /// Colour ground sample distance
    pub async fn color_gsd(&self) -> WaypointResult<f64> {
        self.metric(Metric::ColorGsd).await
    }

    /// Thermal ground sample distance
    pub async fn thermal_gsd(&self) -> WaypointResult<f64> {
        self.metric(Metric::ThermalGsd).await
    }

    fn metric_wait(&self) -> WaitOptions {
        self.config.timings.metric_change
    }

    /// Poll `read` until it differs from its first sample
    ///
    /// Returns the new value, or the first sample when nothing changed.
    pub async fn wait_for_change<F, Fut>(&self, what: &str, read: F) -> WaypointResult<f64>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = WaypointResult<f64>>,
    {
        wait_for_change(self.surface.as_ref(), what, self.metric_wait(), read).await
    }

    /// `metric` after it next changes
    pub async fn wait_for_metric(&self, metric: Metric) -> WaypointResult<f64> {
        self.wait_for_change(&metric.to_string(), move || self.metric(metric))
            .await
    }

    /// Photo count after it next changes
    pub async fn wait_for_photos(&self) -> WaypointResult<f64> {
        self.wait_for_metric(Metric::Photos).await
    }

    /// Flight time after it next changes
    pub async fn wait_for_time(&self) -> WaypointResult<f64> {
        self.wait_for_metric(Metric::Time).await
    }

    /// Colour GSD after it next changes
    pub async fn wait_for_color_gsd(&self) -> WaypointResult<f64> {
        self.wait_for_metric(Metric::ColorGsd).await
    }

    /// Thermal GSD after it next changes
    pub async fn wait_for_thermal_gsd(&self) -> WaypointResult<f64> {
        self.wait_for_metric(Metric::ThermalGsd).await
    }
}
