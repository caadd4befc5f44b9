// Commands module - handles CLI command execution

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::Cli;
use crate::config::{self, Config};

pub mod run;

pub use run::run_tests;

/// Handle shell completion
pub fn handle_completion(shell_type: &str) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{Shell, generate};

    let shell = match shell_type.to_lowercase().as_str() {
        "bash" => Shell::Bash,
        "zsh" => Shell::Zsh,
        "fish" => Shell::Fish,
        "powershell" => Shell::PowerShell,
        _ => {
            anyhow::bail!(
                "Unsupported shell: {}. Supported: bash, zsh, fish, powershell",
                shell_type
            );
        }
    };

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    let mut stdout = std::io::stdout();

    generate(shell, &mut cmd, name, &mut stdout);

    Ok(())
}

/// Print the effective settings and where they came from
pub fn show_config(cli: &Cli, config: &Config, source: Option<&Path>) -> Result<()> {
    let options = cli.runner_options(config)?;

    println!("Current configuration:");
    match source {
        Some(path) => println!("\n  Configuration file: {}", path.display()),
        None => {
            println!("\n  No configuration file loaded");
            println!(
                "  Create one with: parasuite --init-config {}",
                config::CONFIG_FILE_NAMES[0]
            );
        }
    }

    println!("\n  Effective settings:");
    println!("    Parallelism: {}", options.parallelism);
    println!("    Timeout: {}ms", options.timeout.as_millis());
    println!("    Timeout grace: {}ms", options.timeout_grace.as_millis());
    println!("    Attempts: {}", options.attempts);
    println!("    Slow threshold: {}ms", options.slow_threshold.as_millis());
    if let Some(grep) = &options.grep {
        println!(
            "    Grep: {}{}",
            grep.as_str(),
            if options.invert { " (inverted)" } else { "" }
        );
    }
    let reporters: Vec<String> = cli
        .reporter_kinds(config)?
        .iter()
        .map(|kind| format!("{:?}", kind).to_lowercase())
        .collect();
    println!("    Reporters: {}", reporters.join(", "));
    println!(
        "    Color: {}",
        if cli.color(config) { "enabled" } else { "disabled" }
    );
    println!("    Extensions: {}", config.general.extensions.join(", "));
    println!("    List command: {}", cli.list_command(config)?.join(" "));
    println!("    Run command: {}", cli.run_command(config)?.join(" "));

    println!("\nConfiguration precedence:");
    println!("  1. Command-line arguments (highest)");
    println!("  2. Configuration file");
    println!("  3. Built-in defaults (lowest)");

    Ok(())
}

/// Write a configuration file holding the defaults
pub fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Refusing to overwrite existing file: {}", path.display());
    }
    let content = Config::default().to_toml()?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    println!("Configuration file created: {}", path.display());
    println!("\nSet [command] list and run before the first run.");
    Ok(())
}
