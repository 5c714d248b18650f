//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the GEX engine.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::adapters::schwab::SchwabClient;
use crate::adapters::store::FileStore;
use crate::analytics::{analyze, EngineParams};
use crate::application::{GexService, HistoryRecorder};
use crate::config::{load_config, Config};
use crate::ports::RawOptionChain;

use super::output::{render_history, render_profile};

/// gex - Options gamma exposure analytics
#[derive(Parser, Debug)]
#[command(
    name = "gex",
    version = env!("CARGO_PKG_VERSION"),
    about = "Options gamma exposure (GEX) analytics",
    long_about = "Builds a per-strike dealer gamma exposure profile from an option chain, \
                  derives gamma flip, call/put walls and ATM IV, and keeps a bounded \
                  intraday IV history per symbol."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch a live chain and compute its GEX profile
    Profile(ProfileCmd),

    /// Compute a GEX profile from a saved chain JSON file
    Analyze(AnalyzeCmd),

    /// Show today's recorded IV history for a symbol
    History(HistoryCmd),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Compute a live profile
#[derive(Parser, Debug)]
pub struct ProfileCmd {
    /// Underlying symbol (e.g., SPY, $SPX)
    #[arg(value_name = "SYMBOL")]
    pub symbol: String,

    /// Use this spot price instead of a quote lookup
    #[arg(long, value_name = "PRICE")]
    pub spot: Option<f64>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/gex.toml")]
    pub config: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Skip the IV history sample for this run
    #[arg(long)]
    pub no_record: bool,
}

/// Offline analysis of a saved chain
#[derive(Parser, Debug)]
pub struct AnalyzeCmd {
    /// Chain JSON in the provider's `/chains` response shape
    #[arg(long, value_name = "FILE")]
    pub chain: PathBuf,

    /// Spot price of the underlying
    #[arg(long, value_name = "PRICE")]
    pub spot: f64,

    /// Symbol label (defaults to the chain's own symbol)
    #[arg(long, value_name = "SYMBOL")]
    pub symbol: Option<String>,

    /// Configuration file for engine parameters (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Show IV history
#[derive(Parser, Debug)]
pub struct HistoryCmd {
    /// Underlying symbol
    #[arg(value_name = "SYMBOL")]
    pub symbol: String,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/gex.toml")]
    pub config: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    // Initialize logging based on flags
    init_logging(app.verbose, app.debug)?;

    match app.command {
        Command::Profile(cmd) => profile_command(cmd).await,
        Command::Analyze(cmd) => analyze_command(cmd),
        Command::History(cmd) => history_command(cmd).await,
    }
}

/// Initialize logging system
fn init_logging(verbose: bool, debug: bool) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn load(path: &Path) -> Result<Config> {
    tracing::info!("Config: {}", path.display());
    load_config(path).with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn build_service(config: &Config) -> Result<GexService<SchwabClient, FileStore>> {
    let client_config = config.provider.client_config();
    if client_config.access_token.is_none() {
        tracing::warn!("No access token configured (set GEX_ACCESS_TOKEN); requests are unauthenticated");
    }
    let client = SchwabClient::with_config(client_config)
        .context("Failed to create market data client")?;

    let store_path = config.store.get_path();
    tracing::debug!("Store: {}", store_path.display());
    let recorder = HistoryRecorder::new(FileStore::new(store_path), config.history.settings()?);

    Ok(GexService::new(client, recorder, config.engine.params()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to serialize output")?);
    Ok(())
}

/// Handle profile command
async fn profile_command(cmd: ProfileCmd) -> Result<()> {
    let config = load(&cmd.config)?;
    let service = build_service(&config)?.with_history(config.history.enabled && !cmd.no_record);

    let profile = service
        .compute_profile(&cmd.symbol, cmd.spot)
        .await
        .with_context(|| format!("Failed to compute GEX profile for {}", cmd.symbol))?;

    match cmd.format {
        OutputFormat::Json => print_json(&profile)?,
        OutputFormat::Text => print!("{}", render_profile(&profile)),
    }
    Ok(())
}

/// Handle analyze command
fn analyze_command(cmd: AnalyzeCmd) -> Result<()> {
    let params = match cmd.config {
        Some(ref path) => load(path)?.engine.params(),
        None => EngineParams::default(),
    };

    let content = std::fs::read_to_string(&cmd.chain)
        .with_context(|| format!("Failed to read chain file {}", cmd.chain.display()))?;
    let chain: RawOptionChain = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse chain file {}", cmd.chain.display()))?;

    let symbol = cmd
        .symbol
        .or_else(|| chain.symbol.clone())
        .unwrap_or_else(|| "UNKNOWN".to_string())
        .to_uppercase();

    let profile = analyze(&symbol, &chain, cmd.spot, &params)
        .with_context(|| format!("Failed to analyze chain for {}", symbol))?;

    match cmd.format {
        OutputFormat::Json => print_json(&profile)?,
        OutputFormat::Text => print!("{}", render_profile(&profile)),
    }
    Ok(())
}

/// Handle history command
async fn history_command(cmd: HistoryCmd) -> Result<()> {
    let config = load(&cmd.config)?;
    let service = build_service(&config)?;

    let history = service
        .iv_history(&cmd.symbol)
        .await
        .with_context(|| format!("Failed to read IV history for {}", cmd.symbol))?;

    match cmd.format {
        OutputFormat::Json => print_json(&history)?,
        OutputFormat::Text => print!("{}", render_history(&history)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile_command() {
        let app = CliApp::try_parse_from([
            "gex", "profile", "spy", "--spot", "451.5", "--format", "json", "--no-record", "-v",
        ])
        .unwrap();

        assert!(app.verbose);
        match app.command {
            Command::Profile(cmd) => {
                assert_eq!(cmd.symbol, "spy");
                assert_eq!(cmd.spot, Some(451.5));
                assert_eq!(cmd.format, OutputFormat::Json);
                assert!(cmd.no_record);
                assert_eq!(cmd.config, PathBuf::from("config/gex.toml"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_analyze_requires_chain_and_spot() {
        assert!(CliApp::try_parse_from(["gex", "analyze", "--spot", "100"]).is_err());
        assert!(CliApp::try_parse_from(["gex", "analyze", "--chain", "c.json"]).is_err());

        let app = CliApp::try_parse_from(["gex", "analyze", "--chain", "c.json", "--spot", "100"])
            .unwrap();
        match app.command {
            Command::Analyze(cmd) => {
                assert!(cmd.config.is_none());
                assert_eq!(cmd.format, OutputFormat::Text);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_analyze_command_on_saved_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.json");
        std::fs::write(
            &path,
            r#"{"symbol": "SPY", "callExpDateMap": {"2024-01-19:3": {"100.0": [
                {"gamma": 0.05, "openInterest": 1000, "totalVolume": 10, "volatility": 20.0}
            ]}}}"#,
        )
        .unwrap();

        let cmd = AnalyzeCmd {
            chain: path,
            spot: 102.0,
            symbol: None,
            config: None,
            format: OutputFormat::Json,
        };
        assert!(analyze_command(cmd).is_ok());
    }

    #[test]
    fn test_analyze_command_rejects_bad_spot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.json");
        std::fs::write(&path, "{}").unwrap();

        let cmd = AnalyzeCmd {
            chain: path,
            spot: 0.0,
            symbol: Some("spy".into()),
            config: None,
            format: OutputFormat::Text,
        };
        assert!(analyze_command(cmd).is_err());
    }
}
