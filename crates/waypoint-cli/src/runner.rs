//! Scenario runner: one fresh page per scenario, results into a [`RunReport`].

use crate::error::CliResult;
use crate::output::ProgressReporter;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use waypoint::{BrowserSurface, RunReport, Scenario, SuiteConfig, WaypointResult};

/// Runs scenarios and records their outcomes
#[derive(Debug, Clone)]
pub struct SuiteRunner {
    config: SuiteConfig,
    artifacts: PathBuf,
    fail_fast: bool,
}

impl SuiteRunner {
    /// Runner writing failure screenshots under `artifacts`
    #[must_use]
    pub fn new(config: SuiteConfig, artifacts: impl Into<PathBuf>) -> Self {
        Self {
            config,
            artifacts: artifacts.into(),
            fail_fast: false,
        }
    }

    /// Stop after the first failed scenario
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Screenshot path for a failed scenario
    #[must_use]
    pub fn screenshot_path(&self, scenario: Scenario) -> PathBuf {
        self.artifacts.join(format!("{}.png", scenario.name()))
    }

    /// Run `scenarios`, each on a page from `open_page`
    ///
    /// Scenario failures are recorded, not returned. Every page is closed
    /// once its scenario ends.
    ///
    /// # Errors
    ///
    /// Returns error when a page cannot be opened
    pub async fn run<F, Fut>(
        &self,
        scenarios: &[Scenario],
        mut open_page: F,
        reporter: &mut ProgressReporter,
    ) -> CliResult<RunReport>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = WaypointResult<Arc<dyn BrowserSurface>>>,
    {
        let mut report = RunReport::new();
        info!(run_id = %report.run_id, scenarios = scenarios.len(), "run start");
        reporter.begin(scenarios);

        for &scenario in scenarios {
            reporter.scenario_started(scenario);
            let surface = open_page().await?;
            let started = Instant::now();
            let outcome = scenario.execute(Arc::clone(&surface), &self.config).await;
            let elapsed = started.elapsed();

            match &outcome {
                Ok(()) => reporter.scenario_passed(scenario, elapsed),
                Err(e) => {
                    reporter.scenario_failed(scenario, e);
                    self.capture(surface.as_ref(), scenario).await;
                }
            }
            if let Err(e) = surface.close().await {
                warn!(scenario = scenario.name(), error = %e, "page did not close");
            }
            report.record(scenario.name(), scenario.case_ids(), &outcome, elapsed);

            if self.fail_fast && outcome.is_err() {
                warn!(scenario = scenario.name(), "stopping after first failure");
                break;
            }
        }

        reporter.end();
        Ok(report)
    }

    async fn capture(&self, surface: &dyn BrowserSurface, scenario: Scenario) {
        let path = self.screenshot_path(scenario);
        match surface.screenshot().await {
            Ok(png) => match write_artifact(&path, &png) {
                Ok(()) => info!(path = %path.display(), "failure screenshot saved"),
                Err(e) => warn!(path = %path.display(), error = %e, "cannot save screenshot"),
            },
            Err(e) => warn!(scenario = scenario.name(), error = %e, "screenshot failed"),
        }
    }
}

fn write_artifact(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)
}
