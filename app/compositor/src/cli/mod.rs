//! Command-line interface for Lattice.
//!
//! - `replay` - run a scripted session through the compositor event loop
//! - `schema` - print the configuration JSON Schema
//! - `config` - print the effective configuration or its search paths
//! - `completions` - generate shell completions

mod replay;

use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};
use colored::Colorize;
pub use replay::{Script, ScriptStep, replay};
use tracing_subscriber::EnvFilter;

use crate::config::{self, config_paths};
use crate::error::LatticeError;

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lattice CLI - replay harness and configuration tooling.
#[derive(Parser, Debug)]
#[command(name = "lattice")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a custom configuration file.
    ///
    /// Overrides the default configuration file search paths.
    /// Supports JSONC format (JSON with comments).
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr. `RUST_LOG` takes precedence.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum Commands {
    /// Replay a scripted session.
    ///
    /// Runs the steps of a JSON (or JSONC) script through the compositor
    /// event loop with simulated clients, then prints the applied layout.
    #[command(after_long_help = r#"Examples:
  lattice replay session.json
  lattice replay session.json --json
  lattice --config ./lattice.jsonc replay session.json"#)]
    Replay {
        /// Script to run.
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,

        /// Print the final layout as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Output the configuration JSON Schema.
    ///
    /// Can be redirected to a file for use with editors that support JSON
    /// Schema validation.
    Schema,

    /// Show the effective configuration.
    Config {
        /// List the configuration search paths instead.
        #[arg(long)]
        paths: bool,
    },

    /// Generate shell completions.
    ///
    /// Usage:
    ///   eval "$(lattice completions --shell zsh)"
    ///   lattice completions --shell fish > ~/.config/fish/completions/lattice.fish
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

/// Parses the command line and runs the command.
///
/// # Errors
///
/// Returns an error if the command fails.
pub fn run() -> Result<(), LatticeError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    cli.execute()
}

/// Install the `tracing` subscriber, writing to stderr.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "lattice_lib=debug" } else { "lattice_lib=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    if tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).try_init().is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command execution fails.
    pub fn execute(&self) -> Result<(), LatticeError> {
        if let Some(path) = &self.config
            && !path.exists()
        {
            return Err(LatticeError::InvalidArguments(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        match &self.command {
            Commands::Replay { script, json } => {
                let (config, _) = config::load_or_default(self.config.as_deref());
                replay::execute(script, *json, config)
            }
            Commands::Schema => {
                println!("{}", config::generate_schema_json());
                Ok(())
            }
            Commands::Config { paths } => {
                if *paths {
                    print_config_paths();
                    Ok(())
                } else {
                    self.print_config()
                }
            }
            Commands::Completions { shell } => {
                Self::print_completions(*shell);
                Ok(())
            }
        }
    }

    fn print_config(&self) -> Result<(), LatticeError> {
        let (config, source) = config::load_or_default(self.config.as_deref());
        match source {
            Some(path) => eprintln!("{} {}", "Loaded from".dimmed(), path.display()),
            None => eprintln!("{}", "No configuration file found, showing defaults.".dimmed()),
        }
        println!("{}", serde_json::to_string_pretty(&config)?);
        Ok(())
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        generate(generator, &mut cmd, "lattice", &mut io::stdout());
    }
}

/// List the search paths, marking the one in use.
fn print_config_paths() {
    println!("Configuration file search paths (in priority order):\n");

    let mut found = false;
    for (i, path) in config_paths().iter().enumerate() {
        let exists = path.exists();
        let marker = if exists && !found {
            found = true;
            " (active)".green().to_string()
        } else if exists {
            " (exists)".dimmed().to_string()
        } else {
            String::new()
        };
        println!("  {}. {}{marker}", i + 1, path.display());
    }

    if !found {
        println!("\nNo configuration file found; defaults are used.");
    }
}
