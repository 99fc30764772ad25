//! Terminal output for a scenario run

use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use waypoint::{RunReport, Scenario, WaypointError};

const BAR_TEMPLATE: &str = "{spinner:.green} [{bar:32.cyan/blue}] {pos}/{len} {msg}";

#[derive(Debug, Clone, Copy)]
enum Mark {
    Pass,
    Fail,
    Note,
}

impl Mark {
    fn render(self, color: bool) -> String {
        match (self, color) {
            (Self::Pass, true) => style("✓").green().bold().to_string(),
            (Self::Fail, true) => style("✗").red().bold().to_string(),
            (Self::Note, true) => style("·").dim().to_string(),
            (Self::Pass, false) => "PASS".to_string(),
            (Self::Fail, false) => "FAIL".to_string(),
            (Self::Note, false) => "    ".to_string(),
        }
    }
}

fn case_list(scenario: Scenario) -> String {
    scenario
        .case_ids()
        .iter()
        .map(|id| format!("C{id}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Scenario-by-scenario progress on stderr
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    bar: Option<ProgressBar>,
    color: bool,
    quiet: bool,
}

impl ProgressReporter {
    /// Reporter writing to stderr
    #[must_use]
    pub fn new(color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            bar: None,
            color,
            quiet,
        }
    }

    /// Show a bar over `scenarios`; nothing in quiet mode
    pub fn begin(&mut self, scenarios: &[Scenario]) {
        if self.quiet {
            return;
        }
        let bar = ProgressBar::new(scenarios.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        self.bar = Some(bar);
    }

    /// Name the scenario now running
    pub fn scenario_started(&self, scenario: Scenario) {
        if let Some(bar) = &self.bar {
            bar.set_message(scenario.name());
        }
    }

    /// One passed scenario
    pub fn scenario_passed(&self, scenario: Scenario, elapsed: Duration) {
        if !self.quiet {
            self.line(
                Mark::Pass,
                &format!("{scenario} ({:.1}s)", elapsed.as_secs_f64()),
            );
        }
        self.advance();
    }

    /// One failed scenario with the cases it fails; shown even when quiet
    pub fn scenario_failed(&self, scenario: Scenario, error: &WaypointError) {
        self.line(
            Mark::Fail,
            &format!("{scenario} [{}]: {error}", case_list(scenario)),
        );
        self.advance();
    }

    /// Free-form note
    pub fn note(&self, message: &str) {
        if !self.quiet {
            self.line(Mark::Note, message);
        }
    }

    /// Remove the bar
    pub fn end(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    /// Case totals of `report`; failed case ids are listed
    pub fn summary(&self, report: &RunReport, elapsed: Duration) {
        let failed = report.failed();
        if self.quiet && failed == 0 {
            return;
        }
        let verdict = match (failed, self.color) {
            (0, true) => style("PASSED").green().bold().to_string(),
            (_, true) => style("FAILED").red().bold().to_string(),
            (0, false) => "PASSED".to_string(),
            (_, false) => "FAILED".to_string(),
        };
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&format!(
            "{verdict} {}/{} cases in {:.2}s (run {})",
            report.passed(),
            report.len(),
            elapsed.as_secs_f64(),
            report.run_id
        ));
        if failed > 0 {
            let ids: Vec<String> = report
                .failed_cases()
                .map(|id| format!("C{id}"))
                .collect();
            let _ = self.term.write_line(&format!("  failed: {}", ids.join(" ")));
        }
    }

    fn advance(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn line(&self, mark: Mark, message: &str) {
        let text = format!("{} {message}", mark.render(self.color));
        match &self.bar {
            Some(bar) => bar.println(text),
            None => {
                let _ = self.term.write_line(&text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_run_has_no_bar() {
        let mut reporter = ProgressReporter::new(false, true);
        reporter.begin(&Scenario::ALL);
        assert!(reporter.bar.is_none());
        reporter.scenario_passed(Scenario::MapSearch, Duration::ZERO);
        reporter.end();
    }

    #[test]
    fn test_bar_advances_per_scenario() {
        let mut reporter = ProgressReporter::new(false, false);
        reporter.begin(&[Scenario::MapSearch, Scenario::SelectSite]);
        reporter.scenario_started(Scenario::MapSearch);
        reporter.scenario_failed(
            Scenario::MapSearch,
            &WaypointError::assertion("map search did not move the map"),
        );
        let bar = reporter.bar.as_ref().map(|b| (b.position(), b.length()));
        assert_eq!(bar, Some((1, Some(2))));
        reporter.end();
    }

    #[test]
    fn test_case_list() {
        assert_eq!(case_list(Scenario::SiteSelectionMap), "C813400 C813392");
    }

    #[test]
    fn test_plain_marks() {
        assert_eq!(Mark::Pass.render(false), "PASS");
        assert_eq!(Mark::Fail.render(false), "FAIL");
    }
}
