//! Editor scenario catalogue.
//!
//! Each [`Scenario`] names the external test cases it covers, the
//! [`MissionFixture`] it starts from, and the checks it runs on a freshly
//! opened editor. A failed check returns [`WaypointError::AssertionFailed`].

use crate::config::SuiteConfig;
use crate::geometry::{midpoint, perpendicular_point, sort_by_angle, Point};
use crate::locator::Locator;
use crate::matcher::TextMatch;
use crate::metrics::Metric;
use crate::pages::{MissionEditor, ScanToggle, SettingLabel, TabSetting};
use crate::result::{ensure, WaypointError, WaypointResult};
use crate::surface::{BrowserSurface, Key};
use crate::widgets::{Slider, TabList};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Site label shown before any site is chosen
pub const NO_SITE: &str = "No Site";

/// Airframe whose wide sensor lacks some settings
pub const ZOOM_AIRFRAME: &str = "Skydio X10 VT300Z";

/// Airframe without a thermal sensor
pub const VISUAL_AIRFRAME: &str = "Skydio X10 V100L";

/// Popover text for a setting the airframe cannot honour
pub const UNAVAILABLE_WARNING: &str = "Setting not available";

/// Camera mode notice at full resolution
pub const QUARTER_ONLY_NOTICE: &str = "only available in 1/4";

/// Fewest vertices a boundary may keep
pub const MIN_BOUNDARY_VERTICES: usize = 3;

/// Option pattern for the dock whose label starts with `dock`
fn dock_pattern(dock: &str) -> WaypointResult<TextMatch> {
    TextMatch::pattern(&format!("^{}.*", regex::escape(dock)))
        .map_err(|e| WaypointError::config(format!("dock pattern: {e}")))
}

// =============================================================================
// FIXTURE
// =============================================================================

/// Editor state a scenario starts from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionFixture {
    /// Mission name typed into the name input
    pub name: Option<String>,
    /// Site selected by exact label
    pub site: Option<String>,
    /// Dock whose label starts with this text
    pub dock: Option<String>,
    /// Add an outer boundary and drag it to the configured corners
    pub boundary: bool,
}

impl MissionFixture {
    /// Configured site and dock with a boundary
    #[must_use]
    pub fn full(config: &SuiteConfig) -> Self {
        Self {
            name: None,
            site: Some(config.site_name.clone()),
            dock: Some(config.dock_name.clone()),
            boundary: true,
        }
    }

    /// Untouched editor
    #[must_use]
    pub const fn bare() -> Self {
        Self {
            name: None,
            site: None,
            dock: None,
            boundary: false,
        }
    }

    /// Set the mission name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the site
    #[must_use]
    pub fn with_site(mut self, site: Option<String>) -> Self {
        self.site = site;
        self
    }

    /// Set the dock
    #[must_use]
    pub fn with_dock(mut self, dock: Option<String>) -> Self {
        self.dock = dock;
        self
    }

    /// Enable or disable the boundary step
    #[must_use]
    pub const fn with_boundary(mut self, boundary: bool) -> Self {
        self.boundary = boundary;
        self
    }

    /// Reject combinations the editor cannot reach
    ///
    /// # Errors
    ///
    /// [`WaypointError::Config`] for a dock without a site
    pub fn validate(&self) -> WaypointResult<()> {
        if self.dock.is_some() && self.site.is_none() {
            return Err(WaypointError::config("a dock requires a site"));
        }
        Ok(())
    }

    /// Drive `editor` into this state
    ///
    /// # Errors
    ///
    /// Propagates widget, map and validation errors
    pub async fn apply(&self, editor: &MissionEditor) -> WaypointResult<()> {
        self.validate()?;
        let details = editor.mission_details();
        if let Some(name) = &self.name {
            details.set_name(name).await?;
        }
        if let Some(site) = &self.site {
            details.site().select(site.as_str()).await?;
        }
        if let Some(dock) = &self.dock {
            details.dock().select(dock_pattern(dock)?).await?;
        }
        if self.boundary {
            let map = editor.map();
            let watch = map.watch_rendered_count().await?;
            details.click_add_boundary().await?;
            let rendered = watch.wait_for_change().await?;
            debug!(rendered, "boundary rendered");
            let pairs = map
                .drag_boundary_to_match(&editor.config().scan_corners)
                .await?;
            info!(vertices = pairs.len(), "boundary placed");
        }
        Ok(())
    }
}

// =============================================================================
// CATALOGUE
// =============================================================================

/// A runnable editor scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Address search moves the map to the result
    MapSearch,
    /// Adding a boundary renders its vertices
    AddBoundary,
    /// Site dropdown starts empty and accepts the configured site
    SelectSite,
    /// Site and dock lock once a boundary is added
    SiteSelectionWithBoundary,
    /// Choosing a site recentres the map and renders the site
    SiteSelectionMap,
    /// A boundary can be started without choosing a site
    SiteProceedNoSite,
    /// Choosing a dock renders it on the map
    DockSelectionMap,
    /// Dragging boundary vertices moves them
    BoundaryEdit,
    /// Dragging an edge midpoint inserts a vertex
    BoundaryAdd,
    /// Deleting vertices stops at a triangle
    BoundaryDelete,
    /// Height slider limits and their effect on estimates
    HeightLimits,
    /// Gimbal slider limits and the preview rotation
    GimbalAngle,
    /// Overlap and sidelap limits and their effect on estimates
    SidelapOverlap,
    /// Crosshatch adds a second pass and removing it shortens the flight
    Crosshatch,
    /// Camera modal settings and the locks between them
    CameraSettings,
    /// Unsupported settings warn for the chosen airframe sensor
    SensorCompatibility,
    /// Perimeter orbit toggle and its sliders
    PerimeterSettings,
    /// Stop-for-photo lengthens the flight without adding photos
    StopForPhoto,
    /// Strict boundaries start off
    StrictBoundaries,
    /// Maximum speed limits and flight time
    MaxSpeed,
}

impl Scenario {
    /// Every scenario, in run order
    pub const ALL: [Self; 20] = [
        Self::MapSearch,
        Self::AddBoundary,
        Self::SelectSite,
        Self::SiteSelectionWithBoundary,
        Self::SiteSelectionMap,
        Self::SiteProceedNoSite,
        Self::DockSelectionMap,
        Self::BoundaryEdit,
        Self::BoundaryAdd,
        Self::BoundaryDelete,
        Self::HeightLimits,
        Self::GimbalAngle,
        Self::SidelapOverlap,
        Self::Crosshatch,
        Self::CameraSettings,
        Self::SensorCompatibility,
        Self::PerimeterSettings,
        Self::StopForPhoto,
        Self::StrictBoundaries,
        Self::MaxSpeed,
    ];

    /// Stable kebab-case name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MapSearch => "map-search",
            Self::AddBoundary => "add-boundary",
            Self::SelectSite => "select-site",
            Self::SiteSelectionWithBoundary => "site-selection-with-boundary",
            Self::SiteSelectionMap => "site-selection-map",
            Self::SiteProceedNoSite => "site-proceed-no-site",
            Self::DockSelectionMap => "dock-selection-map",
            Self::BoundaryEdit => "boundary-edit",
            Self::BoundaryAdd => "boundary-add",
            Self::BoundaryDelete => "boundary-delete",
            Self::HeightLimits => "height-limits",
            Self::GimbalAngle => "gimbal-angle",
            Self::SidelapOverlap => "sidelap-overlap",
            Self::Crosshatch => "crosshatch",
            Self::CameraSettings => "camera-settings",
            Self::SensorCompatibility => "sensor-compatibility",
            Self::PerimeterSettings => "perimeter-settings",
            Self::StopForPhoto => "stop-for-photo",
            Self::StrictBoundaries => "strict-boundaries",
            Self::MaxSpeed => "max-speed",
        }
    }

    /// Scenario by name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Scenarios whose name contains `filter`; all when `None`
    #[must_use]
    pub fn matching(filter: Option<&str>) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|s| filter.map_or(true, |f| s.name().contains(f)))
            .collect()
    }

    /// External test-case ids covered
    #[must_use]
    pub const fn case_ids(self) -> &'static [u64] {
        match self {
            Self::MapSearch => &[813391],
            Self::AddBoundary => &[812324],
            Self::SelectSite => &[813396, 813397],
            Self::SiteSelectionWithBoundary => &[813398, 813401],
            Self::SiteSelectionMap => &[813400, 813392],
            Self::SiteProceedNoSite => &[813399],
            Self::DockSelectionMap => &[813000],
            Self::BoundaryEdit => &[805428, 813394],
            Self::BoundaryAdd => &[805429],
            Self::BoundaryDelete => &[805430, 805431],
            Self::HeightLimits => &[805476, 805477, 812330, 812332, 805478],
            Self::GimbalAngle => &[813632, 812328, 812331, 812329, 813404],
            Self::SidelapOverlap => &[805480, 813405, 805481, 805483, 805482, 805484],
            Self::Crosshatch => &[805457, 805461, 805462],
            Self::CameraSettings => &[
                812341, 812335, 813183, 813185, 813405, 813184, 813192, 813406, 813410, 813417,
                813416, 813414, 813415,
            ],
            Self::SensorCompatibility => &[813419, 813420, 813422, 813423],
            Self::PerimeterSettings => &[
                805440, 805441, 805442, 805443, 805444, 805445, 805446, 805447,
            ],
            Self::StopForPhoto => &[805434, 805435],
            Self::StrictBoundaries => &[805437],
            Self::MaxSpeed => &[805450, 805451, 805452],
        }
    }

    /// Starting state
    #[must_use]
    pub fn fixture(self, config: &SuiteConfig) -> MissionFixture {
        match self {
            Self::MapSearch
            | Self::SelectSite
            | Self::SiteSelectionWithBoundary
            | Self::SiteSelectionMap
            | Self::SiteProceedNoSite => MissionFixture::bare(),
            Self::DockSelectionMap => {
                MissionFixture::bare().with_site(Some(config.site_name.clone()))
            }
            Self::AddBoundary => MissionFixture::full(config).with_boundary(false),
            Self::BoundaryEdit
            | Self::BoundaryAdd
            | Self::BoundaryDelete
            | Self::HeightLimits
            | Self::GimbalAngle
            | Self::SidelapOverlap
            | Self::Crosshatch
            | Self::CameraSettings
            | Self::SensorCompatibility
            | Self::PerimeterSettings
            | Self::StopForPhoto
            | Self::StrictBoundaries
            | Self::MaxSpeed => MissionFixture::full(config),
        }
    }

    /// Open a fresh editor, apply the fixture and run the checks
    ///
    /// # Errors
    ///
    /// Setup errors propagate unchanged; failed checks are `AssertionFailed`
    pub async fn execute(
        self,
        surface: Arc<dyn BrowserSurface>,
        config: &SuiteConfig,
    ) -> WaypointResult<()> {
        info!(scenario = self.name(), cases = ?self.case_ids(), "scenario start");
        let editor = MissionEditor::new(surface, config);
        editor.goto().await?;
        self.fixture(config).apply(&editor).await?;
        let outcome = self.run(&editor).await;
        match &outcome {
            Ok(()) => info!(scenario = self.name(), "scenario passed"),
            Err(e) => warn!(scenario = self.name(), error = %e, "scenario failed"),
        }
        outcome
    }

    /// Run the checks against an editor already in the fixture state
    ///
    /// # Errors
    ///
    /// [`WaypointError::AssertionFailed`] naming the first failed check
    pub async fn run(self, editor: &MissionEditor) -> WaypointResult<()> {
        match self {
            Self::MapSearch => map_search(editor).await,
            Self::AddBoundary => add_boundary(editor).await,
            Self::SelectSite => select_site(editor).await,
            Self::SiteSelectionWithBoundary => site_selection_with_boundary(editor).await,
            Self::SiteSelectionMap => site_selection_map(editor).await,
            Self::SiteProceedNoSite => site_proceed_no_site(editor).await,
            Self::DockSelectionMap => dock_selection_map(editor).await,
            Self::BoundaryEdit => boundary_edit(editor).await,
            Self::BoundaryAdd => boundary_add(editor).await,
            Self::BoundaryDelete => boundary_delete(editor).await,
            Self::HeightLimits => height_limits(editor).await,
            Self::GimbalAngle => gimbal_angle(editor).await,
            Self::SidelapOverlap => sidelap_overlap(editor).await,
            Self::Crosshatch => crosshatch(editor).await,
            Self::CameraSettings => camera_settings(editor).await,
            Self::SensorCompatibility => sensor_compatibility(editor).await,
            Self::PerimeterSettings => perimeter_settings(editor).await,
            Self::StopForPhoto => stop_for_photo(editor).await,
            Self::StrictBoundaries => strict_boundaries(editor).await,
            Self::MaxSpeed => max_speed(editor).await,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// CHECKS
// =============================================================================

async fn expect_value(slider: &Slider, expected: &str, what: &str) -> WaypointResult<()> {
    let actual = slider.value().await?;
    ensure(
        actual == expected,
        format!("{what}: expected {expected}, got {actual}"),
    )
}

async fn expect_integral(slider: &Slider, what: &str) -> WaypointResult<()> {
    let actual = slider.value().await?;
    ensure(
        !actual.contains('.'),
        format!("{what}: expected a whole number, got {actual}"),
    )
}

/// Limits shared by the slider scenarios
struct SliderLimits<'a> {
    what: &'a str,
    default: &'a str,
    min: &'a str,
    max: &'a str,
}

async fn check_limits(slider: &Slider, limits: &SliderLimits<'_>) -> WaypointResult<()> {
    let what = limits.what;
    expect_value(slider, limits.default, &format!("{what} default")).await?;
    slider.slide(0.0).await?;
    expect_value(slider, limits.min, &format!("{what} slid to minimum")).await?;
    slider.slide(1.0).await?;
    expect_value(slider, limits.max, &format!("{what} slid to maximum")).await
}

async fn check_typed_clamping(slider: &Slider, limits: &SliderLimits<'_>, fraction: f64) -> WaypointResult<()> {
    let what = limits.what;
    slider.fill_box(-100).await?;
    expect_value(slider, limits.min, &format!("{what} typed below range")).await?;
    slider.fill_box(500).await?;
    expect_value(slider, limits.max, &format!("{what} typed above range")).await?;
    slider.fill_box(fraction).await?;
    expect_integral(slider, what).await
}

async fn map_search(editor: &MissionEditor) -> WaypointResult<()> {
    let map = editor.map();
    map.poll_until_ready().await?;
    let (_, sample) = map
        .observe_change()
        .await?
        .around(|| editor.search_in_map(&editor.config().address_query))
        .await?;
    ensure(sample.change.bounds_changed, "map search did not move the map")?;
    let target = editor.config().address_location;
    ensure(
        map.contains_location(target).await?,
        format!("map does not show the search result {target}"),
    )
}

async fn select_site(editor: &MissionEditor) -> WaypointResult<()> {
    let site = editor.mission_details().site();
    let initial = site.selected().await?;
    ensure(
        initial == NO_SITE,
        format!("site should start as {NO_SITE:?}, got {initial:?}"),
    )?;
    let wanted = editor.config().site_name.as_str();
    site.select(wanted).await?;
    let selected = site.selected().await?;
    ensure(
        selected == wanted,
        format!("site should be {wanted:?}, got {selected:?}"),
    )
}

async fn site_selection_map(editor: &MissionEditor) -> WaypointResult<()> {
    let map = editor.map();
    map.poll_until_ready().await?;
    let site = editor.config().site_name.as_str();
    let (_, sample) = map
        .observe_change()
        .await?
        .around(|| editor.mission_details().site().select(site))
        .await?;
    ensure(sample.change.bounds_changed, "selecting a site did not move the map")?;
    ensure(
        sample.change.rendered_delta >= 1,
        format!(
            "selecting a site should render at least one object, delta {}",
            sample.change.rendered_delta
        ),
    )
}

async fn site_selection_with_boundary(editor: &MissionEditor) -> WaypointResult<()> {
    let details = editor.mission_details();
    let config = editor.config();
    details.site().select(config.site_name.as_str()).await?;
    details.dock().select(dock_pattern(&config.dock_name)?).await?;
    let site = details.site().selected().await?;
    ensure(
        site == config.site_name,
        format!("site should be {:?}, got {site:?}", config.site_name),
    )?;
    let dock = details.dock().selected().await?;
    ensure(
        dock.contains(&config.dock_name),
        format!("dock should contain {:?}, got {dock:?}", config.dock_name),
    )?;
    details.click_add_boundary().await?;
    ensure(
        !details.site().is_enabled().await?,
        "site should lock once a boundary is added",
    )?;
    ensure(
        !details.dock().is_enabled().await?,
        "dock should lock once a boundary is added",
    )
}

async fn site_proceed_no_site(editor: &MissionEditor) -> WaypointResult<()> {
    editor.search_in_map(&editor.config().address_query).await?;
    editor.map().wait_for_stable().await?;
    editor.mission_details().click_add_boundary().await?;
    let scan = editor.scan_settings();
    scan.open().await?;
    ensure(
        editor.surface().is_visible(&scan.boundary_hint()).await?,
        "boundary placement hint should show without a site",
    )
}

async fn dock_selection_map(editor: &MissionEditor) -> WaypointResult<()> {
    let pattern = dock_pattern(&editor.config().dock_name)?;
    let (_, sample) = editor
        .map()
        .observe_change()
        .await?
        .around(|| editor.mission_details().dock().select(pattern))
        .await?;
    ensure(
        sample.change.rendered_delta > 0,
        format!(
            "selecting a dock should render it, delta {}",
            sample.change.rendered_delta
        ),
    )
}

/// Two adjacent vertices of the boundary in angular order
fn adjacent_pair(sorted: &[Point]) -> WaypointResult<(Point, Point)> {
    match (sorted.get(1), sorted.get(2)) {
        (Some(&a), Some(&b)) => Ok((a, b)),
        _ => Err(WaypointError::geometry(format!(
            "boundary has {} vertices, need at least three",
            sorted.len()
        ))),
    }
}

async fn boundary_add(editor: &MissionEditor) -> WaypointResult<()> {
    let map = editor.map();
    let before = sort_by_angle(&map.rendered_vertices().await?, None);
    let (a, b) = adjacent_pair(&before)?;
    let goal = perpendicular_point(a, b)
        .ok_or_else(|| WaypointError::geometry("adjacent boundary vertices coincide"))?;
    let handle = map.to_page(midpoint(a, b)).await?;
    map.click_point(handle).await?;
    map.drag_point(handle, map.to_page(goal).await?).await?;
    let after = map.rendered_vertices().await?.len();
    ensure(
        after > before.len(),
        format!(
            "dragging an edge midpoint should add a vertex: {} -> {after}",
            before.len()
        ),
    )
}

async fn delete_vertex(editor: &MissionEditor, at: Point) -> WaypointResult<usize> {
    editor.map().click_point(at).await?;
    editor.surface().press(&Locator::body(), Key::Delete).await?;
    Ok(editor.map().rendered_vertices().await?.len())
}

async fn boundary_delete(editor: &MissionEditor) -> WaypointResult<()> {
    let vertices = editor.map().rendered_vertices_on_page().await?;
    let Some((&first, rest)) = vertices.split_first() else {
        return Err(WaypointError::geometry("boundary has no vertices"));
    };
    let left = delete_vertex(editor, first).await?;
    ensure(
        left < vertices.len(),
        format!("deleting a vertex should remove it: {} -> {left}", vertices.len()),
    )?;
    for &at in rest {
        let left = delete_vertex(editor, at).await?;
        ensure(
            left == MIN_BOUNDARY_VERTICES,
            format!("a boundary keeps {MIN_BOUNDARY_VERTICES} vertices, got {left}"),
        )?;
    }
    Ok(())
}

async fn add_boundary(editor: &MissionEditor) -> WaypointResult<()> {
    let map = editor.map();
    map.poll_until_ready().await?;
    let details = editor.mission_details();
    details.open().await?;
    let (_, sample) = map
        .observe_change()
        .await?
        .around(|| details.click_add_boundary())
        .await?;
    ensure(
        sample.change.rendered_delta > 0,
        format!(
            "adding a boundary should render vertices, delta {}",
            sample.change.rendered_delta
        ),
    )
}

async fn boundary_edit(editor: &MissionEditor) -> WaypointResult<()> {
    let surface = editor.surface();
    let details = editor.mission_details();
    ensure(
        !surface.is_visible(details.add_boundary()).await?,
        "add-boundary button should be hidden once a boundary exists",
    )?;
    let map = editor.map();
    let before = map.rendered_vertices().await?;
    map.drag_boundary_to_match(&editor.config().scan_corners)
        .await?;
    let after = map.rendered_vertices().await?;
    ensure(before != after, "dragging did not move any boundary vertex")
}

async fn height_limits(editor: &MissionEditor) -> WaypointResult<()> {
    let scan = editor.scan_settings();
    scan.open().await?;
    let height = scan.height();
    let limits = SliderLimits {
        what: "height",
        default: "66",
        min: "3",
        max: "400",
    };
    expect_value(height, limits.default, "height default").await?;
    height.slide(0.0).await?;
    expect_value(height, limits.min, "height slid to minimum").await?;
    let (low_time, low_photos) = (editor.time().await?, editor.photos().await?);
    height.slide(1.0).await?;
    expect_value(height, limits.max, "height slid to maximum").await?;
    let (high_time, high_photos) = (editor.time().await?, editor.photos().await?);
    check_typed_clamping(height, &limits, 5.123_942).await?;
    ensure(
        high_time < low_time,
        format!("flying higher should be faster: {high_time} >= {low_time}"),
    )?;
    ensure(
        high_photos < low_photos,
        format!("flying higher should need fewer photos: {high_photos} >= {low_photos}"),
    )
}

async fn gimbal_angle(editor: &MissionEditor) -> WaypointResult<()> {
    let scan = editor.scan_settings();
    scan.open().await?;
    let gimbal = scan.gimbal_angle();
    let limits = SliderLimits {
        what: "gimbal angle",
        default: "90",
        min: "55",
        max: "90",
    };
    expect_value(gimbal, limits.default, "gimbal angle default").await?;
    gimbal.slide(0.0).await?;
    expect_value(gimbal, limits.min, "gimbal angle slid to minimum").await?;
    let low = scan.gimbal_rotation().await?;
    gimbal.slide(1.0).await?;
    expect_value(gimbal, limits.max, "gimbal angle slid to maximum").await?;
    let high = scan.gimbal_rotation().await?;
    check_typed_clamping(gimbal, &limits, 60.123_942).await?;
    ensure(
        high > low,
        format!("gimbal preview should rotate with the angle: {high} <= {low}"),
    )
}

async fn sidelap_overlap(editor: &MissionEditor) -> WaypointResult<()> {
    let scan = editor.scan_settings();
    scan.open().await?;
    let (overlap, sidelap) = (scan.overlap(), scan.sidelap());
    for (slider, what) in [(overlap, "overlap"), (sidelap, "sidelap")] {
        check_limits(
            slider,
            &SliderLimits {
                what,
                default: "70",
                min: "1",
                max: "95",
            },
        )
        .await?;
    }
    overlap.fill_box(0).await?;
    sidelap.fill_box(0).await?;

    let photos = editor.track(Metric::Photos).begin().await?;
    let (_, time) = editor
        .track(Metric::Time)
        .begin()
        .await?
        .around(|| overlap.fill_box(70))
        .await?;
    let photos = photos.finish().await?;
    ensure(photos.change > 0.0, "more overlap should add photos")?;
    ensure(time.change == 0.0, "overlap should not change flight time")?;

    let photos = editor.track(Metric::Photos).begin().await?;
    let (_, time) = editor
        .track(Metric::Time)
        .begin()
        .await?
        .around(|| sidelap.fill_box(70))
        .await?;
    let photos = photos.finish().await?;
    ensure(photos.change > 0.0, "more sidelap should add photos")?;
    ensure(time.change > 0.0, "more sidelap should lengthen the flight")
}

async fn max_speed(editor: &MissionEditor) -> WaypointResult<()> {
    let scan = editor.scan_settings();
    scan.open().await?;
    let speed = scan.max_speed();
    expect_value(speed, "11", "max speed default").await?;
    speed.slide(0.0).await?;
    expect_value(speed, "1", "max speed slid to minimum").await?;
    let (_, time) = editor
        .track(Metric::Time)
        .begin()
        .await?
        .around(|| async {
            speed.slide(1.0).await?;
            expect_value(speed, "36", "max speed slid to maximum").await
        })
        .await?;
    ensure(
        time.change < 0.0,
        format!("a faster drone should finish sooner, change {}", time.change),
    )
}

async fn stop_for_photo(editor: &MissionEditor) -> WaypointResult<()> {
    editor.scan_settings().open().await?;
    expect_off(editor, ScanToggle::StopForPhoto).await?;
    let (photos, time) = toggle_effect(editor, ScanToggle::StopForPhoto, true).await?;
    ensure(photos == 0.0, "stopping for photos should not add photos")?;
    ensure(time > 0.0, "stopping for photos should lengthen the flight")
}

/// Photo and time deltas across switching `toggle` to `on`
async fn toggle_effect(
    editor: &MissionEditor,
    toggle: ScanToggle,
    on: bool,
) -> WaypointResult<(f64, f64)> {
    let scan = editor.scan_settings();
    let photos = editor.track(Metric::Photos).begin().await?;
    let (_, time) = editor
        .track(Metric::Time)
        .begin()
        .await?
        .around(|| scan.set_toggle(toggle, on))
        .await?;
    let photos = photos.finish().await?;
    ensure(
        scan.is_on(toggle).await? == on,
        format!("{} did not switch {}", toggle.label(), if on { "on" } else { "off" }),
    )?;
    Ok((photos.change, time.change))
}

async fn expect_off(editor: &MissionEditor, toggle: ScanToggle) -> WaypointResult<()> {
    ensure(
        !editor.scan_settings().is_on(toggle).await?,
        format!("{} should start off", toggle.label()),
    )
}

async fn crosshatch(editor: &MissionEditor) -> WaypointResult<()> {
    editor.scan_settings().open().await?;
    expect_off(editor, ScanToggle::Crosshatch).await?;
    let (photos, _) = toggle_effect(editor, ScanToggle::Crosshatch, true).await?;
    ensure(photos > 0.0, format!("crosshatch should add photos, change {photos}"))?;
    gimbal_angle(editor).await?;
    let (photos, time) = toggle_effect(editor, ScanToggle::Crosshatch, false).await?;
    ensure(
        photos < 0.0,
        format!("dropping crosshatch should remove photos, change {photos}"),
    )?;
    ensure(
        time < 0.0,
        format!("dropping crosshatch should shorten the flight, change {time}"),
    )
}

async fn expect_tab(tabs: &TabList, expected: &str, what: &str) -> WaypointResult<()> {
    let actual = tabs.selected().await?;
    ensure(
        actual == expected,
        format!("{what}: expected {expected:?}, got {actual:?}"),
    )
}

async fn camera_settings(editor: &MissionEditor) -> WaypointResult<()> {
    let scan = editor.scan_settings();
    scan.open().await?;
    let camera = scan.camera_settings();
    camera.open().await?;
    ensure(camera.is_open().await?, "camera settings modal did not open")?;
    for setting in TabSetting::ALL {
        let tabs = camera.tab(setting).await?;
        ensure(
            editor.surface().is_visible(tabs.root()).await?,
            format!("{} should be shown", setting.label()),
        )?;
    }

    let resolution = camera.tab(TabSetting::Resolution).await?;
    let mode = camera.tab(TabSetting::CameraMode).await?;
    expect_tab(&resolution, "Full", "resolution").await?;
    ensure(mode.disabled().await?, "camera mode should be locked at full resolution")?;
    let notice = mode.notice_text().await?;
    ensure(
        notice.contains(QUARTER_ONLY_NOTICE),
        format!("camera mode notice should mention 1/4 resolution, got {notice:?}"),
    )?;
    resolution.select("1/4").await?;
    ensure(!mode.disabled().await?, "camera mode should unlock at 1/4 resolution")?;

    let sensor = camera.tab(TabSetting::CameraSensor).await?;
    sensor.select("X10 Wide").await?;
    let gsd = editor.track(Metric::ColorGsd).begin().await?;
    let (_, photos) = editor
        .track(Metric::Photos)
        .begin()
        .await?
        .around(|| sensor.select("X10 Narrow"))
        .await?;
    let gsd = gsd.finish().await?;
    ensure(
        gsd.change < 0.0,
        format!("narrow sensor should sharpen colour gsd, change {}", gsd.change),
    )?;
    ensure(
        photos.change > 0.0,
        format!("narrow sensor should need more photos, change {}", photos.change),
    )?;

    expect_tab(&camera.tab(TabSetting::ImageFileType).await?, "JPG", "image file type").await?;
    let thermal = camera.tab(TabSetting::CaptureThermal).await?;
    let thermal_type = camera.tab(TabSetting::ThermalFileType).await?;
    expect_tab(&thermal, "Off", "capture thermal").await?;
    ensure(
        thermal_type.disabled().await?,
        "thermal file type should be locked while thermal capture is off",
    )?;
    thermal.select("On").await?;
    ensure(
        !thermal_type.disabled().await?,
        "thermal file type should unlock with thermal capture",
    )?;
    expect_tab(&thermal_type, "JPG", "thermal file type").await?;
    thermal_type.select("RJPG").await?;
    expect_tab(&thermal_type, "RJPG", "thermal file type").await
}

async fn expect_warning(tabs: &TabList, what: &str) -> WaypointResult<()> {
    let text = tabs.warning_text().await?;
    ensure(
        text.contains(UNAVAILABLE_WARNING),
        format!("{what} should warn {UNAVAILABLE_WARNING:?}, got {text:?}"),
    )
}

async fn expect_no_warning(editor: &MissionEditor, tabs: &TabList, what: &str) -> WaypointResult<()> {
    ensure(
        !editor.surface().is_visible(tabs.warning_button()).await?,
        format!("{what} should not warn"),
    )
}

async fn sensor_compatibility(editor: &MissionEditor) -> WaypointResult<()> {
    let scan = editor.scan_settings();
    scan.open().await?;
    let camera = scan.camera_settings();
    camera.open().await?;

    camera.select_sensor(ZOOM_AIRFRAME).await?;
    let sensor = camera.tab(TabSetting::CameraSensor).await?;
    sensor.select("X10 Wide").await?;
    expect_warning(&sensor, "wide sensor").await?;
    sensor.select("X10 Narrow").await?;
    expect_no_warning(editor, &sensor, "narrow sensor").await?;

    camera.select_sensor(VISUAL_AIRFRAME).await?;
    let thermal = camera.tab(TabSetting::CaptureThermal).await?;
    let thermal_type = camera.tab(TabSetting::ThermalFileType).await?;
    thermal.select("On").await?;
    expect_warning(&thermal, "capture thermal").await?;
    expect_warning(&thermal_type, "thermal file type").await?;
    thermal.select("Off").await?;
    expect_no_warning(editor, &thermal, "capture thermal").await?;
    expect_no_warning(editor, &thermal_type, "thermal file type").await
}

async fn perimeter_settings(editor: &MissionEditor) -> WaypointResult<()> {
    let scan = editor.scan_settings();
    scan.open().await?;
    expect_off(editor, ScanToggle::Perimeter).await?;
    let (photos, time) = toggle_effect(editor, ScanToggle::Perimeter, true).await?;
    ensure(photos > 0.0, format!("perimeter should add photos, change {photos}"))?;
    ensure(time > 0.0, format!("perimeter should lengthen the flight, change {time}"))?;

    let (overlap, angle) = (scan.perimeter_overlap(), scan.perimeter_angle());
    for (slider, what) in [(overlap, "perimeter overlap"), (angle, "perimeter gimbal angle")] {
        ensure(
            editor.surface().is_visible(slider.root()).await?,
            format!("{what} should show once perimeter is on"),
        )?;
    }

    expect_value(overlap, "80", "perimeter overlap default").await?;
    overlap.slide(0.0).await?;
    expect_value(overlap, "1", "perimeter overlap slid to minimum").await?;
    let (_, photos) = editor
        .track(Metric::Photos)
        .begin()
        .await?
        .around(|| overlap.slide(1.0))
        .await?;
    expect_value(overlap, "95", "perimeter overlap slid to maximum").await?;
    ensure(
        photos.change > 0.0,
        format!("more perimeter overlap should add photos, change {}", photos.change),
    )?;

    check_limits(
        angle,
        &SliderLimits {
            what: "perimeter gimbal angle",
            default: "60",
            min: "10",
            max: "80",
        },
    )
    .await
}

async fn strict_boundaries(editor: &MissionEditor) -> WaypointResult<()> {
    editor.scan_settings().open().await?;
    expect_off(editor, ScanToggle::StrictBoundaries).await
}
