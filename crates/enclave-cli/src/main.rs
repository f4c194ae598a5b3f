//! Enclave CLI
//!
//! A command-line tool for inspecting and invoking code units inside
//! one-shot isolated boundaries.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use enclave::{Config, EXAMPLE_CONFIG, IsolationRunner};
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "enclave")]
#[command(about = "A tool for running code units in disposable isolated boundaries")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory to resolve unit names against (overrides config)
    #[arg(short, long, global = true)]
    unit_root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new configuration file
    Init {
        /// Output path (default: enclave.toml)
        #[arg(short, long, default_value = "enclave.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Load a unit in a fresh boundary and list its exports
    Exports {
        /// Unit name (resolved against the unit root)
        #[arg(value_name = "UNIT")]
        unit: String,
    },

    /// Load a unit in a fresh boundary and invoke one of its exports
    Invoke {
        /// Unit name (resolved against the unit root)
        #[arg(value_name = "UNIT")]
        unit: String,

        /// Exported function to invoke
        #[arg(value_name = "FUNC")]
        func: String,

        /// Integer arguments passed to the function
        #[arg(value_name = "ARGS")]
        args: Vec<i64>,
    },

    /// Show effective configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load configuration
    let mut config = if let Some(ref path) = cli.config {
        info!(?path, "loading configuration");
        Config::from_file(path).context("failed to load configuration")?
    } else {
        debug!("using default configuration");
        Config::default()
    };

    if let Some(unit_root) = cli.unit_root {
        config.unit_root = unit_root;
    }

    match cli.command {
        Commands::Init { output, force } => init_config(&output, force).await,
        Commands::Exports { unit } => run_exports(config, unit).await,
        Commands::Invoke { unit, func, args } => run_invoke(config, unit, func, args).await,
        Commands::ShowConfig => {
            show_config(&config);
            Ok(())
        }
    }
}

async fn run_exports(config: Config, unit: String) -> Result<()> {
    let runner = IsolationRunner::new(config).context("failed to set up isolation runner")?;

    info!(unit, "inspecting unit in a fresh boundary");

    let exports = runner
        .run_isolated(|boundary| {
            let unit = unit.clone();
            async move {
                boundary.load_unit(&unit).await?;
                Ok(boundary.exports(&unit).await?)
            }
        })
        .await
        .context("failed to inspect unit")?;

    println!("Exports of '{unit}':");
    for name in exports {
        println!("  {name}");
    }

    Ok(())
}

async fn run_invoke(config: Config, unit: String, func: String, args: Vec<i64>) -> Result<()> {
    let runner = IsolationRunner::new(config).context("failed to set up isolation runner")?;

    info!(unit, func, ?args, "invoking unit export in a fresh boundary");

    let results = runner
        .run_isolated(|boundary| {
            let unit = unit.clone();
            let func = func.clone();
            let args = args.clone();
            async move {
                boundary.load_unit(&unit).await?;
                Ok(boundary.invoke(&unit, &func, &args).await?)
            }
        })
        .await
        .context("invocation failed")?;

    match results.as_slice() {
        [] => println!("'{unit}.{func}' returned no results"),
        values => {
            let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            println!("{}", rendered.join(" "));
        }
    }

    Ok(())
}

fn show_config(config: &Config) {
    println!("Unit root: {}", config.unit_root.display());
    println!("Unit extensions: {}", config.unit_extensions.join(", "));
    println!();
    println!("Reclamation policy:");
    println!("  Attempts: {}", config.reclaim.attempts);
    println!("  Pause: {} ms", config.reclaim.pause_ms);
}

async fn init_config(output: &PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at '{}'. Use --force to overwrite.",
            output.display()
        );
    }

    tokio::fs::write(output, EXAMPLE_CONFIG)
        .await
        .context("failed to write configuration file")?;

    println!("Created configuration file at '{}'", output.display());
    Ok(())
}
