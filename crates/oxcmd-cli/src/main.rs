//! Offline tooling for the oxcmd command engine.
//!
//! Inspects what the engine would do without connecting to a browser or
//! device: how a locator resolves, which commands exist, and which
//! configuration is in effect.
//!
//! # Usage
//!
//! ```bash
//! # Show the selector a locator renders to
//! oxcmd resolve "id=submit"
//!
//! # Resolve in a native Android context
//! oxcmd resolve "text=Sign in" --platform android --native
//!
//! # Resolve a page object from an object repository
//! oxcmd resolve @login.submit --repo objects.json
//!
//! # List every registered command
//! oxcmd commands
//!
//! # Print the effective configuration as JSON
//! oxcmd --format json config
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use oxcmd_core::command::CommandKind;
use oxcmd_core::config::EngineConfig;
use oxcmd_core::locator::{LocatorContext, LocatorResolver, Platform};
use oxcmd_core::repository::{MapRepository, ObjectRepository};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Offline tooling for the oxcmd command engine.
#[derive(Parser)]
#[command(name = "oxcmd")]
#[command(about = "Inspect locators, commands and configuration of the oxcmd engine")]
#[command(version)]
struct Cli {
    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a locator to the selector sent to the driver
    Resolve {
        /// The locator (e.g. id=submit, //div[@id='x'], @login.submit)
        locator: String,
        /// Target platform: web, android or ios
        #[arg(short, long, default_value = "web", env = "OXCMD_PLATFORM")]
        platform: String,
        /// Resolve in the native-app context instead of a web view
        #[arg(short, long)]
        native: bool,
        /// Object repository JSON file for page-object names
        /// [default: object_repository from ~/.oxcmd/config.json]
        #[arg(short, long, env = "OXCMD_REPOSITORY")]
        repo: Option<PathBuf>,
    },

    /// List registered commands
    Commands,

    /// Print the effective engine configuration
    Config {
        /// Read this file instead of ~/.oxcmd/config.json
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

#[derive(Debug)]
enum CliError {
    Usage(String),
    Config(String),
    Output(String),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Usage(_) => ExitCode::from(1),
            CliError::Config(_) => ExitCode::from(2),
            CliError::Output(_) => ExitCode::from(3),
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Output(msg) => write!(f, "Output error: {}", msg),
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Resolve { ref locator, ref platform, native, ref repo } => {
            resolve(locator, platform, native, repo.as_ref(), cli.format)
        }
        Command::Commands => list_commands(cli.format),
        Command::Config { ref file } => show_config(file.as_ref(), cli.format),
    }
}

fn resolve(
    raw: &str,
    platform: &str,
    native: bool,
    repo: Option<&PathBuf>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let platform: Platform = platform.parse().map_err(CliError::Usage)?;
    if native && platform == Platform::Web {
        return Err(CliError::Usage("--native requires --platform android or ios".to_string()));
    }
    let ctx = if native {
        LocatorContext::native(platform)
    } else {
        LocatorContext { platform, native: false }
    };

    let repo = repo.cloned().or_else(|| EngineConfig::load().object_repository);
    let repository = match repo {
        Some(ref path) => {
            let repository = MapRepository::load_from(path)
                .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))?;
            debug!(entries = repository.len(), path = %path.display(), "object repository loaded");
            Some(Arc::new(repository) as Arc<dyn ObjectRepository>)
        }
        None => None,
    };

    let locator = LocatorResolver::new(repository)
        .resolve(raw, &ctx)
        .map_err(|e| CliError::Usage(e.to_string()))?;
    let selector = locator.to_selector(&ctx);

    if format == OutputFormat::Json {
        println!(
            "{}",
            serde_json::json!({
                "locator": raw,
                "strategy": locator.strategy,
                "value": locator.value,
                "using": selector.using,
                "selector": selector.value,
            })
        );
    } else {
        println!("strategy: {}", locator.strategy);
        println!("using:    {}", selector.using);
        println!("value:    {}", selector.value);
    }
    Ok(())
}

fn list_commands(format: OutputFormat) -> Result<(), CliError> {
    if format == OutputFormat::Json {
        let commands: Vec<_> = CommandKind::ALL
            .iter()
            .map(|kind| {
                serde_json::json!({
                    "name": kind.name(),
                    "category": kind.category(),
                    "isAction": kind.is_action(),
                })
            })
            .collect();
        let out = serde_json::to_string_pretty(&commands)
            .map_err(|e| CliError::Output(e.to_string()))?;
        println!("{}", out);
        return Ok(());
    }

    for kind in CommandKind::ALL {
        let marker = if kind.is_action() { " (action)" } else { "" };
        println!("{:<11} {}{}", kind.category(), kind.name(), marker);
    }
    Ok(())
}

fn show_config(file: Option<&PathBuf>, format: OutputFormat) -> Result<(), CliError> {
    let config = match file {
        Some(path) => EngineConfig::load_from(path)
            .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))?,
        None => EngineConfig::load(),
    };

    if format == OutputFormat::Json {
        let out = serde_json::to_string_pretty(&config)
            .map_err(|e| CliError::Output(e.to_string()))?;
        println!("{}", out);
        return Ok(());
    }

    println!("screenshots:       {}", config.screenshots);
    println!("fetch_stats:       {}", config.fetch_stats);
    println!("wait_timeout_ms:   {}", config.wait_timeout_ms);
    println!("poll_interval_ms:  {}", config.poll_interval_ms);
    println!("platform:          {}", config.platform);
    if let Some(browser) = &config.browser_name {
        println!("browser_name:      {}", browser);
    }
    if let Some(context) = &config.context {
        println!("context:           {}", context);
    }
    if let Some(repo) = &config.object_repository {
        println!("object_repository: {}", repo.display());
    }
    Ok(())
}
