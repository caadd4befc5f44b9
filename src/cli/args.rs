// CLI argument definitions using Clap

use crate::config::Config;
use crate::execution::RunnerOptions;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;

/// Available reporters
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReporterKind {
    /// Indented tree of suites and tests
    Spec,
    /// Totals per outcome
    Summary,
    /// Details of every failed test
    Errors,
    /// One JSON event per line
    Json,
    /// TeamCity service messages
    Teamcity,
}

impl std::str::FromStr for ReporterKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
            .map_err(|_| anyhow::anyhow!("Unknown reporter: {}", s))
    }
}

/// Parallel test-suite runner
#[derive(Parser, Debug)]
#[command(name = "parasuite")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run test suites in parallel with sequential reporting", long_about = None)]
pub struct Cli {
    /// Test files or directories to run
    #[arg(required = false)]
    pub paths: Vec<PathBuf>,

    /// Tests to run at once ("auto" for one per CPU)
    #[arg(short = 'p', long, value_name = "N")]
    pub parallelism: Option<String>,

    /// Per-attempt test timeout in milliseconds
    #[arg(short = 't', long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Attempts per test before it counts as failed
    #[arg(short = 'a', long, value_name = "N")]
    pub attempts: Option<u32>,

    /// Highlight tests slower than this many milliseconds
    #[arg(long, value_name = "MS")]
    pub slow_threshold: Option<u64>,

    /// Only run tests whose full name matches this regex
    #[arg(short = 'g', long, value_name = "PATTERN")]
    pub grep: Option<String>,

    /// Run the tests --grep does not match
    #[arg(short = 'i', long, default_value_t = false, requires = "grep")]
    pub invert: bool,

    /// Reporter to use (repeatable)
    #[arg(short = 'r', long = "reporter", value_name = "NAME")]
    pub reporters: Vec<ReporterKind>,

    /// Command printing the suite tree of {file} as JSON
    #[arg(long, value_name = "COMMAND")]
    pub list_command: Option<String>,

    /// Command running test {test} of {file}
    #[arg(long, value_name = "COMMAND")]
    pub run_command: Option<String>,

    /// Read configuration from this file instead of the default locations
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(short = 'c', long, default_value_t = false)]
    pub no_color: bool,

    /// Show current configuration and exit
    #[arg(long, default_value_t = false)]
    pub config: bool,

    /// Create default configuration file
    #[arg(long, value_name = "CONFIG_FILE")]
    pub init_config: Option<PathBuf>,

    /// Print shell completion script (bash, zsh, fish, powershell)
    #[arg(long, value_name = "SHELL_TYPE", value_parser = ["bash", "zsh", "fish", "powershell"])]
    pub completion: Option<String>,
}

/// Splits a command line the way a POSIX shell would, honouring quotes
fn split_command(flag: &str, command: &str) -> Result<Vec<String>> {
    shlex::split(command).with_context(|| format!("Unbalanced quotes in {}: {}", flag, command))
}

impl Cli {
    /// Effective parallelism (auto-detect if set to "auto")
    pub fn parallelism(&self, config: &Config) -> usize {
        let parallelism = self
            .parallelism
            .as_deref()
            .unwrap_or(&config.general.parallelism);

        if parallelism == "auto" {
            std::thread::available_parallelism()
                .ok()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            parallelism.parse().unwrap_or(1).max(1)
        }
    }

    /// Reporters from the command line, else from the config file
    pub fn reporter_kinds(&self, config: &Config) -> Result<Vec<ReporterKind>> {
        if !self.reporters.is_empty() {
            return Ok(self.reporters.clone());
        }
        config.report.reporters.iter().map(|r| r.parse()).collect()
    }

    pub fn color(&self, config: &Config) -> bool {
        !self.no_color && config.report.color
    }

    pub fn list_command(&self, config: &Config) -> Result<Vec<String>> {
        match &self.list_command {
            Some(command) => split_command("--list-command", command),
            None => Ok(config.command.list.clone()),
        }
    }

    pub fn run_command(&self, config: &Config) -> Result<Vec<String>> {
        match &self.run_command {
            Some(command) => split_command("--run-command", command),
            None => Ok(config.command.run.clone()),
        }
    }

    /// Runner settings: command line first, then config file, then defaults
    pub fn runner_options(&self, config: &Config) -> Result<RunnerOptions> {
        let grep = self
            .grep
            .as_deref()
            .map(Regex::new)
            .transpose()
            .context("Invalid --grep pattern")?;

        Ok(RunnerOptions {
            parallelism: self.parallelism(config),
            timeout: Duration::from_millis(self.timeout.unwrap_or(config.general.timeout_ms)),
            timeout_grace: Duration::from_millis(config.general.timeout_grace_ms),
            attempts: self.attempts.unwrap_or(config.general.attempts).max(1),
            slow_threshold: Duration::from_millis(
                self.slow_threshold.unwrap_or(config.general.slow_threshold_ms),
            ),
            grep,
            invert: self.invert,
        })
    }
}
