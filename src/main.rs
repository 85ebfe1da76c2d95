//! dreamhost-ddns - keep DreamHost DNS records pointed at this host.

use clap::{Parser, Subcommand};
use dreamhost_ddns::config::Config;
use dreamhost_ddns::detector::IpDetector;
use dreamhost_ddns::providers::create_provider;
use dreamhost_ddns::reconciler::{run_with, Reconciler, RunReport};
use dreamhost_ddns::DdnsError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dreamhost-ddns")]
#[command(about = "Keep DreamHost A/AAAA records in sync with this host's public IP")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile DNS records with the current public IP (default)
    Update {
        /// Compute and print the plan without changing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show public addresses, current records and pending changes
    Status {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration and credentials
    Validate,

    /// Print an example configuration file
    ExampleConfig,
}

fn get_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_path {
        return path;
    }

    // Default locations
    let candidates = [
        dirs::config_dir().map(|p| p.join("dreamhost-ddns/config.toml")),
        Some(PathBuf::from("/etc/dreamhost-ddns/config.toml")),
        Some(PathBuf::from("config.toml")),
    ];

    for candidate in candidates.into_iter().flatten() {
        if candidate.exists() {
            return candidate;
        }
    }

    // Return default even if it doesn't exist
    Config::default_path().unwrap_or_else(|_| PathBuf::from("config.toml"))
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Update { dry_run: false });
    let config_path = get_config_path(cli.config);

    let result = dispatch(command, &config_path).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e
                .downcast_ref::<DdnsError>()
                .map(DdnsError::exit_code)
                .unwrap_or(1);
            tracing::error!(phase = ?e.downcast_ref::<DdnsError>().and_then(DdnsError::phase), "{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn dispatch(command: Commands, config_path: &PathBuf) -> anyhow::Result<()> {
    if let Commands::ExampleConfig = command {
        return cmd_example_config();
    }

    let config = load_config(config_path)?;
    match command {
        Commands::Update { dry_run } => cmd_update(config, dry_run).await,
        Commands::Status { json } => cmd_status(config, json).await,
        Commands::Validate => cmd_validate(config).await,
        Commands::ExampleConfig => cmd_example_config(),
    }
}

fn load_config(path: &PathBuf) -> dreamhost_ddns::Result<Config> {
    let config = Config::load_from(path)?;
    config.validate()?;
    Ok(config)
}

struct Components {
    detector: IpDetector,
    reconciler: Reconciler,
}

fn components(config: &Config) -> dreamhost_ddns::Result<Components> {
    Ok(Components {
        detector: IpDetector::from_config(config)?,
        reconciler: Reconciler::new(
            create_provider(config)?,
            config.target(),
            config.retry_policy(),
        ),
    })
}

async fn cmd_update(config: Config, dry_run: bool) -> anyhow::Result<()> {
    let Components {
        detector,
        reconciler,
    } = components(&config)?;
    let report = run_with(&detector, &reconciler, config.run_timeout(), dry_run).await?;

    if report.changed() {
        for step in &report.plan {
            if dry_run {
                println!("would {}", step);
            } else {
                println!("{}", step);
            }
        }
    } else {
        println!("{}: up to date", report.domain);
    }

    Ok(())
}

async fn cmd_status(config: Config, json: bool) -> anyhow::Result<()> {
    let Components {
        detector,
        reconciler,
    } = components(&config)?;
    let report = run_with(&detector, &reconciler, config.run_timeout(), true).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_status(&report);
    }

    Ok(())
}

fn print_status(report: &RunReport) {
    println!("dreamhost-ddns Status");
    println!("=====================\n");
    println!("Domain: {}\n", report.domain);

    println!("Public addresses:");
    for address in &report.resolved {
        println!("  {:<4} {}", address.record_type.as_str(), address.value);
    }

    println!("\nCurrent records:");
    if report.current.is_empty() {
        println!("  (none)");
    }
    for record in &report.current {
        println!("  {:<4} {}", record.record_type.as_str(), record.value);
    }

    println!("\nPending changes:");
    if report.plan.is_empty() {
        println!("  (none)");
    }
    for step in &report.plan {
        println!("  {}", step);
    }
}

async fn cmd_validate(config: Config) -> anyhow::Result<()> {
    println!("Validating configuration...\n");
    println!("  domain:  {}", config.domain);
    println!(
        "  records: {}",
        config
            .target()
            .record_types()
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let Components { reconciler, .. } = components(&config)?;
    print!("  {} credentials: ", reconciler.provider_name());

    match reconciler.current_records().await {
        Ok(records) => {
            println!("OK ({} managed records found)", records.len());
            Ok(())
        }
        Err(e) => {
            println!("FAILED");
            Err(e.into())
        }
    }
}

fn cmd_example_config() -> anyhow::Result<()> {
    print!("{}", Config::example().to_toml()?);
    Ok(())
}
