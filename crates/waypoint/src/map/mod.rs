//! Map and scene correlator.
//!
//! ```text
//! ┌──────────────┐  project   ┌──────────────┐  + canvas   ┌──────────────┐
//! │ LngLat       │──────────► │ canvas-local │────origin──►│ page frame   │
//! │ (geographic) │            │ pixels       │             │ (pointer)    │
//! └──────────────┘            └──────────────┘             └──────────────┘
//!                                    ▲
//!                 vertex sprites ────┘ (scene camera → NDC → canvas)
//! ```
//!
//! Store and scene refs are populated asynchronously by the application, so
//! every access goes through a fixed-backoff retry that ends in
//! [`WaypointError::MapUnavailable`].

pub mod scripts;

use crate::change::{sampler, ChangeBracket, ChangeCheck};
use crate::config::{RetryPolicy, Timings};
use crate::geometry::{pair_by_angle, Point, Polygon, VertexPair};
use crate::locator::Locator;
use crate::result::{WaypointError, WaypointResult};
use crate::surface::BrowserSurface;
use crate::wait::{poll_until, WaitOptions};
use crate::widgets::require_box;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// A geographic position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LngLat {
    /// Longitude in degrees
    pub lng: f64,
    /// Latitude in degrees
    pub lat: f64,
}

impl LngLat {
    /// Create a position
    #[must_use]
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Finite and within WGS84 ranges
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lng.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lng)
            && (-90.0..=90.0).contains(&self.lat)
    }
}

impl fmt::Display for LngLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lng, self.lat)
    }
}

/// Visible map extent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[[f64; 2]; 2]", into = "[[f64; 2]; 2]")]
pub struct MapBounds {
    /// South-west corner
    pub south_west: LngLat,
    /// North-east corner
    pub north_east: LngLat,
}

impl MapBounds {
    /// Whether `at` lies inside the extent
    #[must_use]
    pub fn contains(&self, at: LngLat) -> bool {
        (self.south_west.lng..=self.north_east.lng).contains(&at.lng)
            && (self.south_west.lat..=self.north_east.lat).contains(&at.lat)
    }
}

impl From<[[f64; 2]; 2]> for MapBounds {
    fn from([[w, s], [e, n]]: [[f64; 2]; 2]) -> Self {
        Self {
            south_west: LngLat::new(w, s),
            north_east: LngLat::new(e, n),
        }
    }
}

impl From<MapBounds> for [[f64; 2]; 2] {
    fn from(b: MapBounds) -> Self {
        [
            [b.south_west.lng, b.south_west.lat],
            [b.north_east.lng, b.north_east.lat],
        ]
    }
}

/// Map state sampled by [`MapView::observe_change`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapSnapshot {
    /// Visible extent
    pub bounds: MapBounds,
    /// Interactive object count
    pub rendered: usize,
}

/// Difference between two [`MapSnapshot`]s
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapChange {
    /// Extent moved
    pub bounds_changed: bool,
    /// Interactive objects added (negative when removed)
    pub rendered_delta: i64,
}

impl MapChange {
    fn between(before: &MapSnapshot, after: &MapSnapshot) -> Self {
        Self {
            bounds_changed: before.bounds != after.bounds,
            rendered_delta: after.rendered as i64 - before.rendered as i64,
        }
    }
}

/// The mission map: a map canvas with a 3D overlay scene
pub struct MapView {
    surface: Arc<dyn BrowserSurface>,
    canvas: Locator,
    access: RetryPolicy,
    stable: WaitOptions,
    rendered_change: WaitOptions,
    library_settle: Duration,
    drag_steps: u32,
    scene_library: OnceCell<()>,
}

impl fmt::Debug for MapView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapView")
            .field("canvas", &self.canvas.describe())
            .field("access", &self.access)
            .field("scene_library_loaded", &self.scene_library.initialized())
            .finish_non_exhaustive()
    }
}

impl MapView {
    /// Create a map view over the page's first canvas
    #[must_use]
    pub fn new(surface: Arc<dyn BrowserSurface>, timings: &Timings) -> Self {
        Self {
            surface,
            canvas: Locator::new("canvas").first(),
            access: timings.map_access,
            stable: timings.map_stable,
            rendered_change: timings.rendered_change,
            library_settle: Timings::ms(timings.scene_library_settle_ms),
            drag_steps: timings.drag_steps,
            scene_library: OnceCell::new(),
        }
    }

    /// Canvas locator
    #[must_use]
    pub const fn canvas(&self) -> &Locator {
        &self.canvas
    }

    // =========================================================================
    // Store access
    // =========================================================================

    async fn evaluate_retrying(&self, what: &str, script: &str) -> WaypointResult<serde_json::Value> {
        let mut last_error = String::from("no attempt made");
        for attempt in 1..=self.access.attempts {
            match self.surface.evaluate(script).await {
                Ok(value) if !value.is_null() => return Ok(value),
                Ok(_) => last_error = "returned null".to_string(),
                Err(e) => last_error = e.to_string(),
            }
            debug!(what, attempt, error = %last_error, "map handle not ready");
            if attempt < self.access.attempts {
                self.surface.pause(self.access.backoff()).await;
            }
        }
        Err(WaypointError::MapUnavailable {
            what: what.to_string(),
            attempts: self.access.attempts,
            last_error,
        })
    }

    async fn evaluate_as<T: DeserializeOwned>(&self, what: &str, script: &str) -> WaypointResult<T> {
        let value = self.evaluate_retrying(what, script).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Visible extent
    pub async fn bounds(&self) -> WaypointResult<MapBounds> {
        self.evaluate_as("bounds", &scripts::bounds()).await
    }

    /// Whether the camera is zooming or panning
    pub async fn is_animating(&self) -> WaypointResult<bool> {
        self.evaluate_as("animating", &scripts::animating()).await
    }

    /// Whether the viewport contains `at`
    pub async fn contains_location(&self, at: LngLat) -> WaypointResult<bool> {
        self.evaluate_as("contains", &scripts::contains(at)).await
    }

    /// Number of interactive objects in the scene
    pub async fn rendered_object_count(&self) -> WaypointResult<usize> {
        self.evaluate_as("rendered-count", &scripts::rendered_count())
            .await
    }

    /// Poll until the map answers a bounds query
    ///
    /// # Errors
    ///
    /// [`WaypointError::Timeout`] when the map never becomes queryable
    pub async fn poll_until_ready(&self) -> WaypointResult<()> {
        let script = scripts::bounds();
        let script = script.as_str();
        let surface = self.surface.as_ref();
        poll_until(surface, "map to be ready", self.stable, move || async move {
            Ok(surface.evaluate(script).await?.is_array())
        })
        .await
    }

    /// Poll the animation flag until the camera is at rest
    ///
    /// # Errors
    ///
    /// [`WaypointError::Timeout`] when the camera keeps moving
    pub async fn wait_for_stable(&self) -> WaypointResult<()> {
        poll_until(
            self.surface.as_ref(),
            "map camera to settle",
            self.stable,
            move || async move { Ok(!self.is_animating().await?) },
        )
        .await
    }

    // =========================================================================
    // Frames
    // =========================================================================

    /// Page-frame origin of the canvas
    pub async fn canvas_origin(&self) -> WaypointResult<Point> {
        Ok(require_box(self.surface.as_ref(), &self.canvas).await?.origin())
    }

    /// Convert a canvas-local point to the page frame
    pub async fn to_page(&self, local: Point) -> WaypointResult<Point> {
        let origin = self.canvas_origin().await?;
        Ok(local.offset(origin.x, origin.y))
    }

    /// Canvas-local pixel of `at`
    pub async fn project_local(&self, at: LngLat) -> WaypointResult<Point> {
        self.evaluate_as("project", &scripts::project(at)).await
    }

    /// Page-frame pixel of `at`
    pub async fn project_to_pixel(&self, at: LngLat) -> WaypointResult<Point> {
        let local = self.project_local(at).await?;
        self.to_page(local).await
    }

    // =========================================================================
    // Scene vertices
    // =========================================================================

    async fn ensure_scene_library(&self) -> WaypointResult<()> {
        self.scene_library
            .get_or_try_init(|| async {
                let present = self
                    .surface
                    .evaluate(&scripts::scene_library_present())
                    .await?
                    .as_bool()
                    .unwrap_or(false);
                if !present {
                    self.surface.pause(self.library_settle).await;
                    self.surface
                        .evaluate(&scripts::load_scene_library())
                        .await?;
                    info!(url = scripts::SCENE_LIBRARY_URL, "scene library injected");
                }
                Ok::<(), WaypointError>(())
            })
            .await
            .map(|_| ())
    }

    /// Canvas-local positions of the editable boundary vertices
    pub async fn rendered_vertices(&self) -> WaypointResult<Vec<Point>> {
        self.ensure_scene_library().await?;
        self.evaluate_as("vertices", &scripts::vertices()).await
    }

    /// Page-frame positions of the editable boundary vertices
    pub async fn rendered_vertices_on_page(&self) -> WaypointResult<Vec<Point>> {
        let local = self.rendered_vertices().await?;
        let origin = self.canvas_origin().await?;
        Ok(local
            .into_iter()
            .map(|p| p.offset(origin.x, origin.y))
            .collect())
    }

    // =========================================================================
    // Correlation and drags
    // =========================================================================

    /// Pair actual vertices with desired positions by angle around their shared centroid
    ///
    /// Both sets must be in the same frame. Non-convex input is paired anyway
    /// and logged, since the angular rule can mis-pair it.
    ///
    /// # Errors
    ///
    /// [`WaypointError::Geometry`] when either set has fewer than three distinct points
    pub fn correlate(&self, desired: &[Point], actual: &[Point]) -> WaypointResult<Vec<VertexPair>> {
        let desired_poly = Polygon::new(desired.to_vec());
        let actual_poly = Polygon::new(actual.to_vec());
        desired_poly.ensure_correlatable("desired")?;
        actual_poly.ensure_correlatable("actual")?;
        for (role, poly) in [("desired", &desired_poly), ("actual", &actual_poly)] {
            if !poly.is_convex() {
                warn!(role, vertices = poly.len(), "non-convex polygon; angular pairing may mis-pair");
            }
        }
        if desired.len() != actual.len() {
            warn!(desired = desired.len(), actual = actual.len(), "vertex counts differ; pairing truncated");
        }
        Ok(pair_by_angle(desired, actual))
    }

    /// Press at `from`, move to `to`, release; both in the page frame
    pub async fn drag_point(&self, from: Point, to: Point) -> WaypointResult<()> {
        debug!(?from, ?to, steps = self.drag_steps, "drag");
        self.surface.mouse_move(from, self.drag_steps).await?;
        self.surface.mouse_down().await?;
        self.surface.mouse_move(to, self.drag_steps).await?;
        self.surface.mouse_up().await
    }

    /// Move to `at` and click there; page frame
    pub async fn click_point(&self, at: Point) -> WaypointResult<()> {
        debug!(?at, "map click");
        self.surface.mouse_move(at, self.drag_steps).await?;
        self.surface.mouse_down().await?;
        self.surface.mouse_up().await
    }

    /// Drag the rendered boundary so its vertices land on `desired`
    ///
    /// Vertices are read and correlated once; pairs are then dragged in order
    /// without re-reading the scene.
    pub async fn drag_boundary_to_match(&self, desired: &[LngLat]) -> WaypointResult<Vec<VertexPair>> {
        let mut targets = Vec::with_capacity(desired.len());
        for &at in desired {
            targets.push(self.project_to_pixel(at).await?);
        }
        let actual = self.rendered_vertices_on_page().await?;
        let pairs = self.correlate(&targets, &actual)?;
        info!(pairs = pairs.len(), "dragging boundary vertices");
        for pair in &pairs {
            self.drag_point(pair.actual, pair.desired).await?;
        }
        Ok(pairs)
    }

    // =========================================================================
    // Change observation
    // =========================================================================

    /// Current extent and object count
    pub async fn snapshot(&self) -> WaypointResult<MapSnapshot> {
        Ok(MapSnapshot {
            bounds: self.bounds().await?,
            rendered: self.rendered_object_count().await?,
        })
    }

    /// Open a bracket over extent and object count
    ///
    /// `finish` waits for the camera to settle before sampling again.
    pub async fn observe_change(&self) -> WaypointResult<ChangeBracket<'_, MapSnapshot, MapChange>> {
        ChangeCheck::comparing(sampler(move || self.snapshot()), MapChange::between)
            .with_after(sampler(move || async move {
                self.wait_for_stable().await?;
                self.snapshot().await
            }))
            .begin()
            .await
    }

    /// Record the object count so a later change can be awaited
    pub async fn watch_rendered_count(&self) -> WaypointResult<RenderedWatch<'_>> {
        Ok(RenderedWatch {
            map: self,
            before: self.rendered_object_count().await?,
        })
    }
}

/// Object count captured before an action
#[derive(Debug)]
pub struct RenderedWatch<'a> {
    map: &'a MapView,
    before: usize,
}

impl RenderedWatch<'_> {
    /// Count captured when the watch began
    #[must_use]
    pub const fn before(&self) -> usize {
        self.before
    }

    /// Poll until the object count differs from the captured one
    ///
    /// # Errors
    ///
    /// [`WaypointError::Timeout`] when the count never changes
    pub async fn wait_for_change(self) -> WaypointResult<usize> {
        let options = self.map.rendered_change;
        for attempt in 1..=options.attempts {
            let current = self.map.rendered_object_count().await?;
            if current != self.before {
                debug!(before = self.before, current, attempt, "rendered count changed");
                return Ok(current);
            }
            if attempt < options.attempts {
                self.map.surface.pause(options.poll_interval()).await;
            }
        }
        Err(WaypointError::Timeout {
            what: format!("rendered object count to change from {}", self.before),
            attempts: options.attempts,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::locator::BoundingBox;
    use crate::mock::{MockElement, MockSurface};
    use serde_json::json;

    fn map_on(mock: &MockSurface) -> MapView {
        mock.element(
            &Locator::new("canvas").first(),
            MockElement::new().bbox(BoundingBox::new(300.0, 64.0, 1200.0, 900.0)),
        );
        MapView::new(Arc::new(mock.clone()), &Timings::instant())
    }

    mod types_tests {
        use super::*;

        #[test]
        fn test_bounds_from_array() {
            let b: MapBounds = serde_json::from_value(json!([[-122.4, 37.5], [-122.2, 37.6]])).unwrap();
            assert!(b.contains(LngLat::new(-122.3, 37.55)));
            assert!(!b.contains(LngLat::new(-122.1, 37.55)));
        }

        #[test]
        fn test_lng_lat_validity() {
            assert!(LngLat::new(-122.3, 37.5).is_valid());
            assert!(!LngLat::new(37.5, -122.3).is_valid());
            assert!(!LngLat::new(f64::NAN, 0.0).is_valid());
        }
    }

    mod access_tests {
        use super::*;

        #[tokio::test]
        async fn test_store_unavailable_after_budget() {
            let mock = MockSurface::new();
            let map = map_on(&mock);
            mock.on_eval_fn("bounds", |_| Err(WaypointError::script("map store unavailable")));
            let err = map.bounds().await.unwrap_err();
            match err {
                WaypointError::MapUnavailable { attempts, last_error, .. } => {
                    assert_eq!(attempts, 10);
                    assert!(last_error.contains("map store unavailable"));
                }
                other => panic!("unexpected {other:?}"),
            }
            assert_eq!(mock.evaluations("bounds"), 10);
        }

        #[tokio::test]
        async fn test_store_becomes_available() {
            let mock = MockSurface::new();
            let map = map_on(&mock);
            mock.on_eval_sequence("rendered-count", [json!(null), json!(null), json!(4)]);
            assert_eq!(map.rendered_object_count().await.unwrap(), 4);
            assert_eq!(mock.evaluations("rendered-count"), 3);
        }

        #[tokio::test]
        async fn test_wait_for_stable() {
            let mock = MockSurface::new();
            let map = map_on(&mock);
            mock.on_eval_sequence("animating", [json!(true), json!(true), json!(false)]);
            map.wait_for_stable().await.unwrap();
            mock.on_eval("animating", json!(true));
            assert!(matches!(
                map.wait_for_stable().await,
                Err(WaypointError::Timeout { .. })
            ));
        }
    }

    mod frame_tests {
        use super::*;

        #[tokio::test]
        async fn test_project_adds_canvas_origin() {
            let mock = MockSurface::new();
            let map = map_on(&mock);
            mock.on_eval("project", json!({"x": 10.0, "y": 20.0}));
            assert_eq!(
                map.project_to_pixel(LngLat::new(-122.3, 37.5)).await.unwrap(),
                Point::new(310.0, 84.0)
            );
        }

        #[tokio::test]
        async fn test_scene_library_loaded_once() {
            let mock = MockSurface::new();
            let map = map_on(&mock);
            mock.on_eval("scene-library", json!(false))
                .on_eval("load-scene-library", json!(true))
                .on_eval("vertices", json!([{"x": 1.0, "y": 2.0}]));
            map.rendered_vertices().await.unwrap();
            let on_page = map.rendered_vertices_on_page().await.unwrap();
            assert_eq!(on_page, vec![Point::new(301.0, 66.0)]);
            assert_eq!(mock.evaluations("load-scene-library"), 1);
            assert_eq!(mock.evaluations("scene-library"), 1);
        }
    }

    mod correlation_tests {
        use super::*;

        #[test]
        fn test_rejects_short_polygons() {
            let mock = MockSurface::new();
            let map = map_on(&mock);
            let tri = [Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 1.0)];
            assert!(map.correlate(&tri, &tri[..2]).is_err());
            assert!(map.correlate(&tri, &tri).is_ok());
        }

        #[tokio::test]
        async fn test_drag_boundary_reads_scene_once() {
            let mock = MockSurface::new();
            let map = map_on(&mock);
            // Desired corners project to a square; rendered vertices sit slightly rotated
            mock.on_eval("scene-library", json!(true))
                .on_eval_sequence(
                    "project",
                    [
                        json!({"x": 100.0, "y": 100.0}),
                        json!({"x": 200.0, "y": 100.0}),
                        json!({"x": 200.0, "y": 200.0}),
                        json!({"x": 100.0, "y": 200.0}),
                    ],
                )
                .on_eval(
                    "vertices",
                    json!([
                        {"x": 205.0, "y": 195.0},
                        {"x": 95.0, "y": 105.0},
                        {"x": 195.0, "y": 95.0},
                        {"x": 105.0, "y": 205.0},
                    ]),
                );
            let pairs = map
                .drag_boundary_to_match(&crate::config::DEFAULT_SCAN_CORNERS)
                .await
                .unwrap();
            assert_eq!(pairs.len(), 4);
            assert_eq!(mock.evaluations("vertices"), 1);
            let drags = mock.drags();
            assert_eq!(drags.len(), 4);
            for (from, to) in drags {
                assert!(from.distance(to) < 10.0, "{from:?} -> {to:?}");
            }
        }

        #[tokio::test]
        async fn test_click_point_is_a_stationary_drag() {
            let mock = MockSurface::new();
            let map = map_on(&mock);
            let at = Point::new(450.0, 300.0);
            map.click_point(at).await.unwrap();
            assert_eq!(mock.drags(), vec![(at, at)]);
        }
    }

    mod change_tests {
        use super::*;

        #[tokio::test]
        async fn test_observe_change() {
            let mock = MockSurface::new();
            let map = map_on(&mock);
            mock.on_eval_sequence(
                "bounds",
                [json!([[0.0, 0.0], [1.0, 1.0]]), json!([[2.0, 2.0], [3.0, 3.0]])],
            )
            .on_eval_sequence("rendered-count", [json!(3), json!(5)])
            .on_eval("animating", json!(false));
            let bracket = map.observe_change().await.unwrap();
            assert_eq!(bracket.before().rendered, 3);
            let sample = bracket.finish().await.unwrap();
            assert_eq!(
                sample.change,
                MapChange {
                    bounds_changed: true,
                    rendered_delta: 2
                }
            );
        }

        #[tokio::test]
        async fn test_watch_rendered_count() {
            let mock = MockSurface::new();
            let map = map_on(&mock);
            mock.on_eval_sequence("rendered-count", [json!(3), json!(3), json!(4)]);
            let watch = map.watch_rendered_count().await.unwrap();
            assert_eq!(watch.wait_for_change().await.unwrap(), 4);

            mock.on_eval("rendered-count", json!(3));
            let watch = map.watch_rendered_count().await.unwrap();
            assert!(matches!(
                watch.wait_for_change().await,
                Err(WaypointError::Timeout { attempts: 10, .. })
            ));
        }
    }
}
