pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use sensorquote_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat, RulePolicy};
use tracing::Level;

use commands::{
    connection_price::ConnectionPriceArgs, option_price::OptionPriceArgs, price::PriceArgs,
    CommandResult, Invocation,
};

#[derive(Debug, Parser)]
#[command(
    name = "sensorquote",
    about = "SensorQuote pricing CLI",
    long_about = "Price configured sensor selections against a catalog snapshot and inspect configuration.",
    after_help = "Examples:\n  sensorquote price --product F1-S-115 --length 24 --option connection_type=Flange --option flange_rating=150# --option flange_size=2\n  sensorquote option-price --base 6 --model per_foot --length 24\n  sensorquote catalog-check"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a sensorquote.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Catalog snapshot file (TOML or JSON)")]
    catalog: Option<PathBuf>,
    #[arg(long, global = true, help = "Treatment of unrecognised catalog rules: lenient|strict")]
    rule_policy: Option<RulePolicy>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Price a product selection and return the result as JSON")]
    Price(PriceArgs),
    #[command(about = "Price a single add-on option from its base price and price model")]
    OptionPrice(OptionPriceArgs),
    #[command(about = "Look up a connection in the flat connection price table")]
    ConnectionPrice(ConnectionPriceArgs),
    #[command(about = "Load and validate the configured catalog snapshot")]
    CatalogCheck,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                catalog_path: self.catalog.clone(),
                rule_policy: self.rule_policy,
                ..ConfigOverrides::default()
            },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let invocation = Invocation::new(cli.load_options());

    // Logging follows the effective config when it loads; commands report the
    // config failure themselves otherwise.
    if let Ok(config) = AppConfig::load(invocation.load_options.clone()) {
        if let Err(error) = init_logging(&config) {
            eprintln!("{error}");
        }
    }
    tracing::debug!(
        event_name = "cli.invocation.started",
        correlation_id = %invocation.correlation_id,
        "cli invocation started"
    );

    let result = dispatch(&cli.command, &invocation);

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn dispatch(command: &Command, invocation: &Invocation) -> CommandResult {
    match command {
        Command::Price(args) => commands::price::run(args, invocation),
        Command::OptionPrice(args) => commands::option_price::run(args, invocation),
        Command::ConnectionPrice(args) => commands::connection_price::run(args, invocation),
        Command::CatalogCheck => commands::catalog::run(invocation),
        Command::Config => commands::config::run(invocation),
    }
}

/// Installs the stderr log subscriber; stdout carries only the JSON payload.
pub fn init_logging(config: &AppConfig) -> anyhow::Result<()> {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow!("failed to install log subscriber: {error}"))
}
