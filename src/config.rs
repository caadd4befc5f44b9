// Configuration file handling

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File names looked up in the working directory, then the home directory
pub const CONFIG_FILE_NAMES: [&str; 2] = [".parasuiterc.toml", ".parasuiterc"];

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub command: CommandConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Number of tests run at once, or "auto" for one per CPU
    #[serde(default = "default_parallelism")]
    pub parallelism: String,

    /// Per-attempt test timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// How long a timed out test may keep reporting (after hooks) before it is killed
    #[serde(default = "default_timeout_grace_ms")]
    pub timeout_grace_ms: u64,

    /// Attempts per test before it counts as failed
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Tests slower than this are highlighted
    #[serde(default = "default_slow_threshold_ms")]
    pub slow_threshold_ms: u64,

    /// Extensions of test files collected from directories
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            timeout_ms: default_timeout_ms(),
            timeout_grace_ms: default_timeout_grace_ms(),
            attempts: default_attempts(),
            slow_threshold_ms: default_slow_threshold_ms(),
            extensions: default_extensions(),
        }
    }
}

/// Command templates for the external collaborators.
///
/// `{file}` expands to the test file, `{test}` to the JSON array of the
/// test's path.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CommandConfig {
    /// Prints the suite tree of `{file}` as JSON
    #[serde(default)]
    pub list: Vec<String>,

    /// Runs the single test `{test}` of `{file}`
    #[serde(default)]
    pub run: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportConfig {
    /// Reporters to enable (spec, summary, errors, json, teamcity)
    #[serde(default = "default_reporters")]
    pub reporters: Vec<String>,

    /// Enable colored output
    #[serde(default = "default_color")]
    pub color: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            reporters: default_reporters(),
            color: default_color(),
        }
    }
}

pub fn default_parallelism() -> String {
    String::from("auto")
}

pub fn default_timeout_ms() -> u64 {
    10_000
}

fn default_timeout_grace_ms() -> u64 {
    crate::execution::runner::DEFAULT_TIMEOUT_GRACE_MS
}

fn default_attempts() -> u32 {
    1
}

fn default_slow_threshold_ms() -> u64 {
    1_000
}

fn default_extensions() -> Vec<String> {
    vec!["js".to_string()]
}

pub fn default_reporters() -> Vec<String> {
    vec![
        "spec".to_string(),
        "summary".to_string(),
        "errors".to_string(),
    ]
}

fn default_color() -> bool {
    true
}

impl Config {
    /// First config file found in the working directory, then home
    pub fn find() -> Option<PathBuf> {
        let mut dirs = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            dirs.push(cwd);
        }
        if let Some(home) = dirs::home_dir() {
            dirs.push(home);
        }

        dirs.iter()
            .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
            .find(|path| path.is_file())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Generate configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
