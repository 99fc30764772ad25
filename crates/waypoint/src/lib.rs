//! Waypoint: Retryable Page Objects for Mission-Planner E2E Tests
//!
//! Waypoint drives the drone mission planner through an abstract
//! [`BrowserSurface`]. Widgets over the planner's component library retry
//! within bounded budgets, the map correlator lines up rendered boundary
//! vertices with geographic targets, and scenarios assert on the derived
//! mission metrics before and after each edit.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    WAYPOINT Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenarios  │    │ Page       │    │ Widgets    │            │
//! │   │ + Report   │───►│ Objects    │───►│ + MapView  │            │
//! │   └────────────┘    └────────────┘    └─────┬──────┘            │
//! │                                             │                   │
//! │                         ┌───────────────────┴──────┐            │
//! │                         ▼                          ▼            │
//! │                  ┌────────────┐            ┌────────────┐       │
//! │                  │ CdpSurface │            │ MockSurface│       │
//! │                  │ (chromium) │            │ (scripted) │       │
//! │                  └────────────┘            └────────────┘       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

/// Before/after sampling around a mutation
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::doc_markdown
)]
pub mod change;

/// Timings, retry budgets and suite configuration
pub mod config;

/// Plane geometry for boundary correlation
#[allow(clippy::suboptimal_flops, clippy::must_use_candidate)]
pub mod geometry;

/// Map view, scene handles and vertex correlation
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
pub mod map;

/// Parsers for derived mission metrics
pub mod metrics;

/// Scripted in-memory surface
#[allow(clippy::missing_const_for_fn, clippy::must_use_candidate)]
pub mod mock;

/// Mission planner page objects
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
pub mod pages;

/// Per-run case results
pub mod report;

/// Regression scenario catalogue
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::doc_markdown
)]
pub mod scenarios;

/// Bounded polling
#[allow(clippy::missing_errors_doc)]
pub mod wait;

/// Retryable component-library widgets
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
pub mod widgets;

/// Real browser surface over the Chrome DevTools Protocol
#[cfg(feature = "browser")]
#[allow(
    clippy::missing_errors_doc,
    clippy::significant_drop_tightening,
    clippy::cast_possible_truncation
)]
pub mod cdp;

mod locator;
mod matcher;
mod result;
mod surface;

pub use config::{BrowserConfig, RetryPolicy, SliderTimings, SuiteConfig, Timings};
pub use geometry::{centroid, pair_by_angle, sort_by_angle, Point, Polygon, VertexPair};
pub use locator::{BoundingBox, Locator, Selector};
pub use map::{LngLat, MapBounds, MapChange, MapSnapshot, MapView};
pub use matcher::TextMatch;
pub use metrics::{Gsd, Metric};
pub use mock::{MockCall, MockElement, MockScene, MockSurface};
pub use pages::{MissionEditor, MissionsPage, MissionsRoute, PageObject};
pub use report::{CaseResult, CaseStatus, RunReport};
pub use result::{ensure, WaypointError, WaypointResult};
pub use scenarios::{MissionFixture, Scenario};
pub use surface::{BrowserSurface, ClickOptions, Key};
pub use wait::{ElementState, WaitOptions};
pub use widgets::{Accordion, Dropdown, Slider, TabList};

#[cfg(feature = "browser")]
pub use cdp::{CdpBrowser, CdpSurface};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::change::{check_change, sampler, ChangeBracket, ChangeCheck, ChangeSample};
    pub use super::config::*;
    pub use super::geometry::*;
    pub use super::locator::*;
    pub use super::map::{LngLat, MapBounds, MapChange, MapSnapshot, MapView};
    pub use super::matcher::*;
    pub use super::metrics::*;
    pub use super::mock::*;
    pub use super::pages::*;
    pub use super::report::*;
    pub use super::result::*;
    pub use super::scenarios::*;
    pub use super::surface::*;
    pub use super::wait::*;
    pub use super::widgets::*;

    #[cfg(feature = "browser")]
    pub use super::cdp::*;
}
