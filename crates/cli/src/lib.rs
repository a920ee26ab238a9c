pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use tourfare_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat, LoggingConfig};
use tracing::Level;

#[derive(Debug, Parser)]
#[command(
    name = "tourfare",
    about = "Tourfare pricing operator CLI",
    long_about = "Price booking contexts against the active rule set, inspect seasons and rules, and check configuration readiness.",
    after_help = "Examples:\n  tourfare quote --context booking.json --now 2026-05-01T10:00:00Z\n  tourfare season 2026-01-25\n  tourfare rules --service-type hotel\n  tourfare --config ops/tourfare.toml doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Config file to load; it must exist")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override logging.level (trace|debug|info|warn|error)")]
    log_level: Option<String>,
    #[arg(long, global = true, help = "Override logging.format (compact|pretty|json)")]
    log_format: Option<LogFormat>,
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// Flags become the highest-precedence config layer. `--config` names a
    /// file that must exist.
    fn load_options(&self) -> LoadOptions {
        let rules_path = match &self.command {
            Command::Quote { rules, .. } | Command::Rules { rules, .. } => rules.clone(),
            Command::Season { .. } | Command::Config | Command::Doctor { .. } => None,
        };

        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                rules_path,
                log_level: self.log_level.clone(),
                log_format: self.log_format,
            },
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Price a JSON pricing context and print the pricing result")]
    Quote {
        #[arg(long, help = "Path to the pricing context JSON file")]
        context: PathBuf,
        #[arg(long, help = "Rule file to use instead of the configured rule source")]
        rules: Option<PathBuf>,
        #[arg(long, help = "Pin the pricing clock to an RFC 3339 instant")]
        now: Option<String>,
    },
    #[command(about = "Show the pricing season of a calendar date")]
    Season {
        #[arg(help = "Date formatted YYYY-MM-DD")]
        date: String,
    },
    #[command(about = "List pricing rules in evaluation order with lint findings")]
    Rules {
        #[arg(long, help = "Rule file to use instead of the configured rule source")]
        rules: Option<PathBuf>,
        #[arg(long, help = "Only list rules for this service type")]
        service_type: Option<String>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, rule set lint, and pricing readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    let logging = AppConfig::load(options.clone())
        .map(|config| config.logging)
        .unwrap_or_else(|_| AppConfig::default().logging);
    if let Err(error) = init_logging(&logging) {
        eprintln!("tourfare: {error:#}");
    }

    let result = match cli.command {
        Command::Quote { context, now, .. } => {
            commands::quote::run(options, &context, now.as_deref())
        }
        Command::Season { date } => commands::season::run(&date),
        Command::Rules { service_type, .. } => {
            commands::rules::run(options, service_type.as_deref())
        }
        Command::Config => commands::config::run(options),
        Command::Doctor { json } => commands::doctor::run(options, json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Diagnostics go to stderr so stdout stays a clean JSON document.
pub fn init_logging(logging: &LoggingConfig) -> anyhow::Result<()> {
    let level = logging
        .level
        .parse::<Level>()
        .map_err(|_| anyhow!("unsupported log level `{}`", logging.level))?;

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr);

    let installed = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow!("failed to install log subscriber: {error}"))
}
