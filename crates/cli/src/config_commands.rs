use std::path::Path;

use {
    anyhow::Result,
    clap::Subcommand,
    parley_config::{
        ParleyConfig,
        validate::{self, Severity},
    },
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors/warnings.
    Check,
    /// Print where configuration files are searched.
    Path,
}

pub fn handle_config(action: ConfigAction, path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Check => check(path),
        ConfigAction::Path => {
            match parley_config::find_config_file() {
                Some(found) => println!("{}", found.display()),
                None => println!("no config file found"),
            }
            if let Some(dir) = parley_config::config_dir() {
                println!("user config dir: {}", dir.display());
            }
            Ok(())
        },
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(path: Option<&Path>) -> Result<()> {
    let config: ParleyConfig = match path {
        Some(path) => {
            eprintln!("Checking {}\n", path.display());
            parley_config::load_config(path)?
        },
        None => match parley_config::find_config_file() {
            Some(found) => {
                eprintln!("Checking {}\n", found.display());
                parley_config::load_config(&found)?
            },
            None => {
                eprintln!("No config file found; checking defaults.\n");
                ParleyConfig::default()
            },
        },
    };

    let result = validate::validate(&config);
    for d in &result.diagnostics {
        let color = match d.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
        };
        eprintln!("  {BOLD}{color}{}{RESET} {}: {}", d.severity, d.path, d.message);
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    if !result.diagnostics.is_empty() {
        eprintln!();
    }
    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}
