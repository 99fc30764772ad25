//! Waypoint CLI: run mission-planner editor scenarios
//!
//! ## Usage
//!
//! ```bash
//! waypoint list                                  # Scenario catalogue
//! waypoint check-config suite.yaml               # Validate a config
//! waypoint run --config suite.yaml --filter site # Run matching scenarios
//! ```

use clap::Parser;
use std::process::ExitCode;
use waypoint::{Scenario, SuiteConfig};
use waypoint_cli::{
    logging, CheckConfigArgs, Cli, CliConfig, CliError, CliResult, Commands, ListArgs, RunArgs,
    Verbosity,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    logging::init(&config);

    match cli.command {
        Commands::List(args) => run_list(&args),
        Commands::CheckConfig(args) => run_check_config(&args),
        Commands::Run(args) => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run_suite(&config, &args))
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into())
        .with_log_json(cli.log_json)
}

fn run_list(args: &ListArgs) -> CliResult<()> {
    let scenarios = Scenario::matching(args.filter.as_deref());
    if args.json {
        let entries: Vec<_> = scenarios
            .iter()
            .map(|s| serde_json::json!({ "name": s.name(), "cases": s.case_ids() }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    for scenario in scenarios {
        let cases: Vec<String> = scenario.case_ids().iter().map(|id| format!("C{id}")).collect();
        println!("{:<20} {}", scenario.name(), cases.join(" "));
    }
    Ok(())
}

fn run_check_config(args: &CheckConfigArgs) -> CliResult<()> {
    let config = SuiteConfig::load(&args.config)?;
    println!("config ok: {}", args.config.display());
    println!("  base_url     {}", config.base_url);
    println!("  site / dock  {} / {}", config.site_name, config.dock_name);
    println!("  scan corners {}", config.scan_corners.len());
    println!(
        "  browser      {}x{} headless={}",
        config.browser.viewport_width, config.browser.viewport_height, config.browser.headless
    );
    Ok(())
}

fn load_for_run(args: &RunArgs) -> CliResult<(SuiteConfig, Vec<Scenario>)> {
    let mut config = SuiteConfig::load(&args.config)?;
    if args.headed {
        config.browser.headless = false;
    }
    let scenarios = Scenario::matching(args.filter.as_deref());
    if scenarios.is_empty() {
        return Err(CliError::invalid_argument(format!(
            "no scenario matches `{}`",
            args.filter.as_deref().unwrap_or_default()
        )));
    }
    Ok((config, scenarios))
}

#[cfg(feature = "browser")]
async fn run_suite(cli: &CliConfig, args: &RunArgs) -> CliResult<()> {
    use std::sync::Arc;
    use waypoint::{BrowserSurface, CdpBrowser};
    use waypoint_cli::{ProgressReporter, SuiteRunner};

    let (config, scenarios) = load_for_run(args)?;
    let mut reporter = ProgressReporter::new(cli.color.should_color(), cli.verbosity.is_quiet());
    reporter.note(&format!(
        "{} scenarios against {}",
        scenarios.len(),
        config.base_url
    ));

    let browser = CdpBrowser::launch(&config.browser).await?;
    let runner = SuiteRunner::new(config, &args.artifacts).with_fail_fast(args.fail_fast);
    let started = std::time::Instant::now();
    let shared = &browser;
    let outcome = runner
        .run(
            &scenarios,
            move || async move {
                let page = shared.new_page().await?;
                Ok(Arc::new(page) as Arc<dyn BrowserSurface>)
            },
            &mut reporter,
        )
        .await;
    if let Err(e) = browser.close().await {
        tracing::warn!(error = %e, "browser did not close cleanly");
    }
    let report = outcome?;

    report.save(&args.report)?;
    reporter.summary(&report, started.elapsed());
    reporter.note(&format!("report written to {}", args.report.display()));
    if report.all_passed() {
        Ok(())
    } else {
        Err(CliError::RunFailed {
            failed: report.failed(),
            total: report.len(),
        })
    }
}

#[cfg(not(feature = "browser"))]
async fn run_suite(_cli: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let _ = load_for_run(args)?;
    Err(CliError::BrowserUnavailable)
}
