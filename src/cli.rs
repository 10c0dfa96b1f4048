// CLI module - command-line argument parsing and handlers
//
// Subcommands:
// - config --show: Display effective configuration
// - config --path: Show config file path
// - config --reset: Regenerate config file with defaults
// - config --update: Rewrite config with current structure, keeping values
// - demo: Run a scripted edit session (default when no subcommand is given)

use crate::demo::DemoOptions;
use clap::{Parser, Subcommand};
use og_editable::config::{Config, ConfigError, VERSION};
use std::io::Write;

/// og-editable - inline click-to-edit for marked page regions
#[derive(Parser)]
#[command(name = "og-editable")]
#[command(version = VERSION)]
#[command(about = "Inline click-to-edit session runner", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Update config with new defaults (preserves user values)
        #[arg(long)]
        update: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Run a scripted hover/click/edit session against a sample page
    Demo {
        /// Route to start on (overrides config), e.g. "/positions"
        #[arg(long)]
        route: Option<String>,

        /// Value typed into the edit dialog
        #[arg(long, default_value = "IBM Common Stock")]
        value: String,

        /// Press Cancel instead of OK
        #[arg(long)]
        cancel: bool,
    },
}

impl Cli {
    /// Demo settings from the command line, falling back to config
    pub fn demo_options(&self, config: &Config) -> DemoOptions {
        match &self.command {
            Some(Commands::Demo {
                route,
                value,
                cancel,
            }) => DemoOptions {
                route: route.clone().unwrap_or_else(|| config.route.clone()),
                value: value.clone(),
                cancel: *cancel,
            },
            _ => DemoOptions {
                route: config.route.clone(),
                ..DemoOptions::default()
            },
        }
    }
}

/// Handle config commands. Returns true if a command was handled (exit after).
pub fn handle_cli(cli: &Cli) -> bool {
    match &cli.command {
        Some(Commands::Config {
            show,
            reset,
            update,
            path,
        }) => {
            if *path {
                handle_config_path();
            } else if *show {
                handle_config_show();
            } else if *reset {
                handle_config_reset();
            } else if *update {
                handle_config_update();
            } else {
                println!("Usage: og-editable config [--show|--reset|--update|--path]");
                println!();
                println!("Options:");
                println!("  --show    Display effective configuration");
                println!("  --reset   Reset config file to defaults");
                println!("  --update  Update config with new defaults (preserves user values)");
                println!("  --path    Show config file path");
            }
            true
        }
        Some(Commands::Demo { .. }) | None => false,
    }
}

/// Print a config error with hints and exit
pub fn exit_with_config_error(error: &ConfigError) -> ! {
    eprintln!("\n╔══════════════════════════════════════════════════════════════╗");
    eprintln!("║  CONFIG ERROR - Failed to load configuration file           ║");
    eprintln!("╚══════════════════════════════════════════════════════════════╝\n");
    eprintln!("  Error: {}\n", error);
    if matches!(error, ConfigError::Parse { .. }) {
        eprintln!("  Tip: Check for:\n");
        eprintln!("    - Missing quotes around string values");
        eprintln!("    - Invalid boolean values (use true/false)");
        eprintln!("    - Malformed array syntax");
        eprintln!("    - Typos in section names\n");
    }
    eprintln!("  To reset, run: og-editable config --reset\n");
    std::process::exit(1);
}

fn load_or_exit() -> Config {
    Config::from_env().unwrap_or_else(|e| exit_with_config_error(&e))
}

fn handle_config_path() {
    match Config::config_path() {
        Some(path) => println!("{}", path.display()),
        None => {
            eprintln!("Error: Could not determine config path");
            std::process::exit(1);
        }
    }
}

fn handle_config_show() {
    let config = load_or_exit();

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    println!();
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
}

fn handle_config_reset() {
    let Some(path) = Config::config_path() else {
        eprintln!("Error: Could not determine config path");
        std::process::exit(1);
    };

    if path.exists() {
        eprint!(
            "Config file exists at {}. Overwrite? [y/N] ",
            path.display()
        );
        let _ = std::io::stderr().flush();

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input).is_err()
            || !input.trim().eq_ignore_ascii_case("y")
        {
            println!("Aborted.");
            return;
        }
    }

    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("Error creating directory: {}", e);
            std::process::exit(1);
        }
    }

    if let Err(e) = std::fs::write(&path, Config::default().to_toml()) {
        eprintln!("Error writing config: {}", e);
        std::process::exit(1);
    }

    println!("Config reset to defaults: {}", path.display());
}

fn handle_config_update() {
    let Some(path) = Config::config_path() else {
        eprintln!("Error: Could not determine config path");
        std::process::exit(1);
    };

    if !path.exists() {
        Config::ensure_config_exists();
        println!("Created new config file: {}", path.display());
        return;
    }

    let updated = load_or_exit().to_toml();

    let backup_path = path.with_extension("toml.bak");
    if let Err(e) = std::fs::copy(&path, &backup_path) {
        eprintln!("Warning: Could not create backup: {}", e);
    } else {
        println!("Backup created: {}", backup_path.display());
    }

    if let Err(e) = std::fs::write(&path, updated) {
        eprintln!("Error writing config: {}", e);
        std::process::exit(1);
    }

    println!("Config updated with latest structure: {}", path.display());
    println!("Your values have been preserved.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_options_from_args() {
        let cli = Cli::parse_from([
            "og-editable",
            "demo",
            "--route",
            "/portfolios",
            "--value",
            "Bob",
            "--cancel",
        ]);
        let options = cli.demo_options(&Config::default());
        assert_eq!(options.route, "/portfolios");
        assert_eq!(options.value, "Bob");
        assert!(options.cancel);
        assert!(!handle_cli(&cli));
    }

    #[test]
    fn test_no_subcommand_runs_demo_on_configured_route() {
        let cli = Cli::parse_from(["og-editable"]);
        let mut config = Config::default();
        config.route = "/securities".to_string();

        let options = cli.demo_options(&config);
        assert_eq!(options.route, "/securities");
        assert!(!options.cancel);
        assert!(!handle_cli(&cli));
    }
}
