//! sysprobe - host diagnostics collector
//!
//! Runs a fixed set of independent probes (public address, location, CPU,
//! GPU, OS, battery, display, client environment, ad blocking, device
//! permissions) and reports one display string per output slot, either on
//! the terminal or through a small local web page.

mod api_routes;
mod collector;
mod config;
mod error;
mod host;
mod probes;
mod report;
mod server;
mod services;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::collector::Collector;
use crate::config::Config;
use crate::report::{Report, Slot};

/// sysprobe - Collect host diagnostics
#[derive(Parser)]
#[command(name = "sysprobe")]
#[command(version)]
#[command(about = "Collect network, hardware, display and permission diagnostics for this machine")]
struct Cli {
    /// Log probe activity at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect diagnostics once and print them (default)
    Run {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Serve the diagnostics page
    Serve {
        /// Port to run the server on (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not auto-open the browser
        #[arg(long, default_value_t = false)]
        no_open: bool,
    },

    /// List the output slots and the probe that fills each one
    Slots,

    /// Show configuration file location and effective settings
    Config {
        /// Write a default config file if none exists
        #[arg(long, default_value_t = false)]
        init: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Run { format }) => run_once(format)?,
        None => run_once(OutputFormat::Text)?,
        Some(Commands::Serve { port, no_open }) => {
            let config = Config::load_effective()?;
            let port = port.unwrap_or(config.server.port);
            let open_browser = config.server.open_browser && !no_open;
            let collector = Arc::new(Collector::from_config(&config));

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(server::start_server(port, open_browser, collector))
                .with_context(|| format!("Diagnostics server on port {port} failed"))?;
        }
        Some(Commands::Slots) => print_slots(),
        Some(Commands::Config { init }) => show_config_info(init)?,
    }

    Ok(())
}

/// `RUST_LOG` takes precedence; otherwise info, or debug with `--verbose`.
/// Logs go to stderr so stdout stays parseable.
fn init_logging(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("sysprobe=debug,info")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_once(format: OutputFormat) -> Result<()> {
    let config = Config::load_effective()?;
    let collector = Collector::from_config(&config);

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(collector.run_all());
    // Host queries abandoned at the deadline may still be blocked
    rt.shutdown_background();

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).context("Failed to encode report")?;
            println!("{json}");
        }
        OutputFormat::Text => print_report(&report),
    }

    Ok(())
}

fn print_report(report: &Report) {
    println!("{}", report.display());

    let unset = report.unset_slots();
    if !unset.is_empty() {
        let keys: Vec<&str> = unset.iter().map(|slot| slot.key()).collect();
        println!(
            "{} {}",
            "Not reported:".bright_yellow(),
            keys.join(", ").bright_black()
        );
    }
}

fn print_slots() {
    println!("{}", "Output slots\n".bright_cyan().bold());
    for slot in Slot::ALL {
        println!(
            "  {:<26} {:<18} {}",
            slot.key().bright_white(),
            slot.label(),
            slot.owner().name().bright_black()
        );
    }
}

fn show_config_info(init: bool) -> Result<()> {
    println!("{}", "sysprobe Configuration\n".bright_cyan().bold());

    match config::get_config_path() {
        Ok(path) => {
            println!("{} {}", "Config file:".bright_yellow(), path.bright_white());
            if std::path::Path::new(&path).exists() {
                println!("  {} {}", "Status:".bright_cyan(), "Exists".bright_green());
            } else if init {
                Config::init()?;
                println!("  {} {}", "Status:".bright_cyan(), "Created".bright_green());
            } else {
                println!(
                    "  {} {}",
                    "Status:".bright_cyan(),
                    "Not created yet (using defaults, `sysprobe config --init` writes one)"
                        .bright_yellow()
                );
            }
        }
        Err(e) => {
            println!(
                "{} Could not determine config path: {}",
                "Error:".bright_red(),
                e
            );
        }
    }

    let cfg = Config::load_effective()?;
    let toml = toml::to_string_pretty(&cfg).context("Failed to serialize config to TOML")?;
    println!("\n{}", "Effective settings:".bright_white().bold());
    println!("{}", toml.trim_end());

    Ok(())
}
