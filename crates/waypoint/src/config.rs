//! Suite, browser and timing configuration.
//!
//! [`SuiteConfig`] is loaded from YAML. Every section has production
//! defaults so a config file only names what differs.

use crate::map::LngLat;
use crate::result::{WaypointError, WaypointResult};
use crate::wait::WaitOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding [`SuiteConfig::base_url`]
pub const BASE_URL_ENV: &str = "WAYPOINT_BASE_URL";

// =============================================================================
// TIMINGS
// =============================================================================

/// Attempt budget with a fixed pause between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub attempts: u32,
    /// Pause between attempts in milliseconds
    pub backoff_ms: u64,
}

impl RetryPolicy {
    /// Create a retry policy
    #[must_use]
    pub const fn new(attempts: u32, backoff_ms: u64) -> Self {
        Self {
            attempts,
            backoff_ms,
        }
    }

    /// Set the attempt budget
    #[must_use]
    pub const fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Set the backoff
    #[must_use]
    pub const fn with_backoff(mut self, backoff_ms: u64) -> Self {
        self.backoff_ms = backoff_ms;
        self
    }

    /// Backoff as Duration
    #[must_use]
    pub const fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Settle delays for slider gestures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliderTimings {
    /// Pause after pressing the handle
    pub press_settle_ms: u64,
    /// Pause after releasing the handle
    pub release_settle_ms: u64,
    /// Pause after committing a typed value
    pub commit_settle_ms: u64,
    /// Pixels left of the rail origin used for a zero-fraction drag
    pub zero_overshoot_px: f64,
}

impl Default for SliderTimings {
    fn default() -> Self {
        Self {
            press_settle_ms: 100,
            release_settle_ms: 500,
            commit_settle_ms: 1000,
            zero_overshoot_px: 10.0,
        }
    }
}

/// Every retry budget, poll interval and settle delay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Dropdown select attempts
    pub dropdown: RetryPolicy,
    /// Map store and scene handle acquisition
    pub map_access: RetryPolicy,
    /// Element visibility waits
    pub element_wait: WaitOptions,
    /// Dropdown option list wait
    pub option_wait: WaitOptions,
    /// Camera animation settle
    pub map_stable: WaitOptions,
    /// Derived metric change polling
    pub metric_change: WaitOptions,
    /// Rendered object count change polling
    pub rendered_change: WaitOptions,
    /// Slider gesture delays
    pub slider: SliderTimings,
    /// Pause after injecting the scene-graph library
    pub scene_library_settle_ms: u64,
    /// Pointer move increments per drag
    pub drag_steps: u32,
    /// Per-character delay for map search typing
    pub typing_delay_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            dropdown: RetryPolicy::new(10, 300),
            map_access: RetryPolicy::new(10, 2000),
            element_wait: WaitOptions::new(50, 100),
            option_wait: WaitOptions::new(20, 100),
            map_stable: WaitOptions::new(50, 200),
            metric_change: WaitOptions::new(200, 200),
            rendered_change: WaitOptions::new(10, 200),
            slider: SliderTimings::default(),
            scene_library_settle_ms: 500,
            drag_steps: 3,
            typing_delay_ms: 200,
        }
    }
}

impl Timings {
    /// Production budgets with every delay set to zero
    #[must_use]
    pub fn instant() -> Self {
        let d = Self::default();
        Self {
            dropdown: d.dropdown.with_backoff(0),
            map_access: d.map_access.with_backoff(0),
            element_wait: d.element_wait.instant(),
            option_wait: d.option_wait.instant(),
            map_stable: d.map_stable.instant(),
            metric_change: d.metric_change.instant(),
            rendered_change: d.rendered_change.instant(),
            slider: SliderTimings {
                press_settle_ms: 0,
                release_settle_ms: 0,
                commit_settle_ms: 0,
                ..d.slider
            },
            scene_library_settle_ms: 0,
            typing_delay_ms: 0,
            ..d
        }
    }

    /// Duration helper
    #[must_use]
    pub const fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }
}

// =============================================================================
// BROWSER
// =============================================================================

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<PathBuf>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Profile directory carrying a signed-in session
    pub user_data_dir: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            chromium_path: None,
            sandbox: true,
            user_data_dir: None,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Reuse a browser profile directory
    #[must_use]
    pub fn with_user_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_data_dir = Some(dir.into());
        self
    }
}

// =============================================================================
// SUITE
// =============================================================================

/// Scan boundary used by fixtures when none is configured
pub const DEFAULT_SCAN_CORNERS: [LngLat; 4] = [
    LngLat::new(-122.331_450_737_094_81, 37.534_434_118_992_55),
    LngLat::new(-122.332_090_494_437_92, 37.533_761_023_769_43),
    LngLat::new(-122.331_290_448_289_88, 37.533_280_247_471_254),
    LngLat::new(-122.330_640_063_346_22, 37.533_942_581_363_306),
];

/// Configuration for one suite run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Application root, e.g. `https://planner.example.com/`
    pub base_url: String,
    /// Site used by fixtures
    pub site_name: String,
    /// Dock used by fixtures; matched as a prefix pattern
    pub dock_name: String,
    /// Exact mission name used by fixtures
    pub mission_name: String,
    /// Pattern that fixture-created mission names match
    pub mission_name_pattern: String,
    /// Map search query
    pub address_query: String,
    /// Expected location of the search result
    pub address_location: LngLat,
    /// Boundary fixtures drag to
    pub scan_corners: Vec<LngLat>,
    /// Browser launch settings
    pub browser: BrowserConfig,
    /// Retry and settle budgets
    pub timings: Timings,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/".to_string(),
            site_name: "HQ".to_string(),
            dock_name: "dock".to_string(),
            mission_name: "waypoint-e2e".to_string(),
            mission_name_pattern: "^waypoint-e2e".to_string(),
            address_query: "1 Marina Blvd, San Mateo".to_string(),
            address_location: LngLat::new(-122.3316, 37.5338),
            scan_corners: DEFAULT_SCAN_CORNERS.to_vec(),
            browser: BrowserConfig::default(),
            timings: Timings::default(),
        }
    }
}

impl SuiteConfig {
    /// Parse YAML, apply the environment override and validate
    ///
    /// # Errors
    ///
    /// Returns error on malformed YAML or invalid values
    pub fn from_yaml(yaml: &str) -> WaypointResult<Self> {
        let mut config: Self = serde_yaml_ng::from_str(yaml)?;
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.base_url = url;
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> WaypointResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Check values the harness relies on
    ///
    /// # Errors
    ///
    /// Returns [`WaypointError::Config`] naming the first invalid field
    pub fn validate(&self) -> WaypointResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(WaypointError::config(format!(
                "base_url must be http(s), got `{}`",
                self.base_url
            )));
        }
        if self.scan_corners.len() < 3 {
            return Err(WaypointError::config(format!(
                "scan_corners needs at least 3 points, got {}",
                self.scan_corners.len()
            )));
        }
        if let Some(bad) = self.scan_corners.iter().find(|c| !c.is_valid()) {
            return Err(WaypointError::config(format!(
                "scan corner {bad} is out of range"
            )));
        }
        if regex::Regex::new(&self.mission_name_pattern).is_err() {
            return Err(WaypointError::config(format!(
                "mission_name_pattern `{}` is not a valid pattern",
                self.mission_name_pattern
            )));
        }
        for (name, attempts) in [
            ("dropdown", self.timings.dropdown.attempts),
            ("map_access", self.timings.map_access.attempts),
            ("element_wait", self.timings.element_wait.attempts),
            ("metric_change", self.timings.metric_change.attempts),
            ("rendered_change", self.timings.rendered_change.attempts),
        ] {
            if attempts == 0 {
                return Err(WaypointError::config(format!(
                    "timings.{name}.attempts must be at least 1"
                )));
            }
        }
        Ok(())
    }

    /// `base_url` joined with a relative route
    #[must_use]
    pub fn url(&self, route: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod timings_tests {
        use super::*;

        #[test]
        fn test_production_defaults() {
            let t = Timings::default();
            assert_eq!(t.dropdown, RetryPolicy::new(10, 300));
            assert_eq!(t.map_access.attempts, 10);
            assert_eq!(t.metric_change, WaitOptions::new(200, 200));
            assert_eq!(t.slider.zero_overshoot_px, 10.0);
        }

        #[test]
        fn test_instant_keeps_budgets() {
            let t = Timings::instant();
            assert_eq!(t.dropdown.attempts, 10);
            assert_eq!(t.dropdown.backoff_ms, 0);
            assert_eq!(t.slider.release_settle_ms, 0);
            assert_eq!(t.slider.zero_overshoot_px, 10.0);
            assert_eq!(t.drag_steps, 3);
        }
    }

    mod browser_tests {
        use super::*;

        #[test]
        fn test_builder() {
            let b = BrowserConfig::default()
                .with_headless(false)
                .with_viewport(1280, 720)
                .with_no_sandbox()
                .with_user_data_dir("/tmp/profile");
            assert!(!b.headless);
            assert_eq!((b.viewport_width, b.viewport_height), (1280, 720));
            assert!(!b.sandbox);
            assert_eq!(b.user_data_dir, Some(PathBuf::from("/tmp/profile")));
        }
    }

    mod suite_tests {
        use super::*;

        #[test]
        fn test_partial_yaml_keeps_defaults() {
            let config: SuiteConfig = serde_yaml_ng::from_str(
                "base_url: https://planner.test/\nsite_name: Depot\ntimings:\n  dropdown:\n    attempts: 3\n    backoff_ms: 50\n",
            )
            .unwrap();
            assert_eq!(config.site_name, "Depot");
            assert_eq!(config.timings.dropdown, RetryPolicy::new(3, 50));
            assert_eq!(config.timings.map_access.attempts, 10);
            assert_eq!(config.scan_corners.len(), 4);
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_rejects_non_http_url() {
            let config = SuiteConfig {
                base_url: "ftp://x".to_string(),
                ..SuiteConfig::default()
            };
            assert!(matches!(config.validate(), Err(WaypointError::Config { .. })));
        }

        #[test]
        fn test_rejects_short_boundary() {
            let config = SuiteConfig {
                scan_corners: DEFAULT_SCAN_CORNERS[..2].to_vec(),
                ..SuiteConfig::default()
            };
            assert!(config.validate().unwrap_err().to_string().contains("scan_corners"));
        }

        #[test]
        fn test_rejects_zero_attempts() {
            let mut config = SuiteConfig::default();
            config.timings.rendered_change.attempts = 0;
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_url_join() {
            let config = SuiteConfig::default();
            assert_eq!(
                config.url("/missions/editor/3d-scan/unsaved"),
                "http://localhost:3000/missions/editor/3d-scan/unsaved"
            );
        }

        #[test]
        fn test_load_from_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("suite.yaml");
            std::fs::write(&path, "mission_name: nightly\n").unwrap();
            let config = SuiteConfig::load(&path).unwrap();
            assert_eq!(config.mission_name, "nightly");
        }

        #[test]
        fn test_malformed_yaml() {
            assert!(matches!(
                SuiteConfig::from_yaml("base_url: [unterminated"),
                Err(WaypointError::Yaml(_))
            ));
        }
    }
}
