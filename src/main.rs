//! LotReport - dealership sales reporting over WhatsApp
//!
//! A CLI tool that reads an automotive sales Excel workbook, computes
//! summary statistics, renders a text report plus chart images, and
//! delivers everything to a WhatsApp number via Twilio.
//!
//! Exit codes:
//!   0 - Success (report generated, all sends delivered or skipped)
//!   1 - Runtime error (workbook missing, no usable data, config error)
//!   2 - Report generated but one or more sends failed

mod analysis;
mod cli;
mod config;
mod delivery;
mod models;
mod report;
mod source;

use anyhow::{bail, Context, Result};
use cli::Args;
use config::Config;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("LotReport v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the pipeline
    match run_report(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Report run failed: {}", e);
            eprintln!("\nError: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .lotreport.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(".lotreport.toml");

    if path.exists() {
        eprintln!(".lotreport.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .lotreport.toml")?;

    println!("Created .lotreport.toml with default settings.");
    println!("Edit it to set the workbook path and Twilio credentials.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete pipeline. Returns exit code (0 or 2).
async fn run_report(args: Args) -> Result<i32> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // Step 1: Load the workbook
    let workbook_path = PathBuf::from(&config.source.workbook);
    println!("Reading workbook: {}", workbook_path.display());
    let tables = source::load_workbook(&workbook_path)?;

    // Step 2: Compute aggregates
    let bundle = analysis::compute(&tables);
    if bundle.is_empty() {
        bail!(
            "no analyzable sheets found in {}",
            workbook_path.display()
        );
    }
    info!(sections = bundle.sections.len(), "analysis complete");

    if let Some(ref dump_path) = args.dump_analysis {
        report::write_analysis_json(&bundle, dump_path)?;
    }

    // Step 3: Render the text report
    let text_content = report::render_text(&bundle);

    // Handle --dry-run: print the report and exit
    if args.dry_run {
        println!("\n{}", text_content);
        println!("Dry run complete. No files written, no messages sent.");
        return Ok(0);
    }

    let output_dir = PathBuf::from(&config.general.output_dir);
    let text_artifact =
        match report::write_text_report(&text_content, &output_dir, &config.report.text_file_name)
        {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                // Delivery still runs; the recipient gets a notice instead.
                warn!("failed to write text report: {e}");
                None
            }
        };

    // Step 4: Render the charts
    let specs = report::chart_specs(&bundle);
    let charts = report::render_charts(
        &specs,
        &output_dir,
        &config.report.image_base_name,
        &config.report.image_extension,
    )?;
    println!(
        "Generated {} chart(s) in {}",
        charts.len(),
        output_dir.display()
    );

    // Handle --skip-send: artifacts only
    if args.skip_send {
        println!("Delivery skipped (--skip-send).");
        return Ok(0);
    }

    // Step 5: Deliver over WhatsApp
    if !config.delivery.is_configured() {
        bail!(
            "delivery is not configured: set Twilio credentials and the public \
             base URL in .lotreport.toml or via flags, or pass --skip-send"
        );
    }

    let client = delivery::WhatsAppClient::new(&config.delivery)?;
    let outcome = delivery::deliver_report(
        &client,
        &config.delivery.public_base_url,
        text_artifact.as_ref(),
        &charts,
    )
    .await;

    println!(
        "\nDelivery summary: {} attempted, {} delivered, {} failed",
        outcome.attempted, outcome.delivered, outcome.failed
    );

    if outcome.failed > 0 {
        eprintln!("Some messages failed to send (exit code 2).");
        return Ok(2);
    }

    println!("Report delivered to {}", config.delivery.to);
    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .lotreport.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
