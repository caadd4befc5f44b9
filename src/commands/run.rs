// Run command - execute tests

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::{Cli, ReporterKind};
use crate::config::Config;
use crate::execution::{CommandDiscovery, CommandExecutor, SuiteRunner};
use crate::report::{
    self, Combined, ErrorDetailReporter, JsonStreamReporter, Reporter, SpecReporter,
    SummaryReporter, TeamCityReporter,
};
use crate::utils::FileUtils;

/// Reporter for one `--reporter` choice, writing to stdout
pub fn build_reporter(kind: ReporterKind, colors: bool) -> Box<dyn Reporter> {
    match kind {
        ReporterKind::Spec => Box::new(SpecReporter::stdout(colors)),
        ReporterKind::Summary => Box::new(SummaryReporter::stdout(colors)),
        ReporterKind::Errors => Box::new(ErrorDetailReporter::stdout(colors)),
        ReporterKind::Json => Box::new(JsonStreamReporter::stdout()),
        ReporterKind::Teamcity => Box::new(TeamCityReporter::stdout()),
    }
}

/// Runs the selected tests. Returns whether every test passed.
pub async fn run_tests(cli: &Cli, config: &Config) -> Result<bool> {
    let options = cli.runner_options(config)?;
    info!("Parallelism: {}", options.parallelism);

    let list_command = cli.list_command(config)?;
    let run_command = cli.run_command(config)?;
    if list_command.is_empty() || run_command.is_empty() {
        anyhow::bail!(
            "No test commands configured. Pass --list-command and --run-command \
             or set [command] in the config file"
        );
    }

    let mut test_files = Vec::new();
    for path in &cli.paths {
        if path.exists() {
            test_files.extend(FileUtils::collect_test_files(
                path,
                &config.general.extensions,
            ));
        } else {
            warn!("Path not found: {}", path.display());
        }
    }
    test_files.sort();
    test_files.dedup();

    info!("Found {} test file(s)", test_files.len());
    if test_files.is_empty() {
        warn!("No test files found");
        return Ok(true);
    }

    let colors = cli.color(config);
    let reporters: Combined = cli
        .reporter_kinds(config)?
        .into_iter()
        .map(|kind| build_reporter(kind, colors))
        .collect();

    let runner = SuiteRunner::new(
        CommandDiscovery::new(list_command),
        CommandExecutor::new(run_command),
        options,
    );

    let cancel = runner.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, aborting remaining tests");
            cancel.cancel();
        }
    });

    let mut pipeline = report::pipeline(reporters);
    let summary = runner.run(&test_files, &mut pipeline).await?;

    Ok(summary.all_passed())
}
