//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// LotReport - dealership sales reporting over WhatsApp
///
/// Reads an automotive sales Excel workbook, computes summary
/// statistics, renders a text report plus chart images, and delivers
/// them to a WhatsApp number via Twilio.
///
/// Examples:
///   lotreport --input Ventas-Fundamentos.xlsx --base-url https://abc.ngrok.io
///   lotreport --input ventas.xlsx --skip-send
///   lotreport --dry-run --dump-analysis analysis.json
///   lotreport --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the Excel workbook to analyze
    ///
    /// If not specified, uses the path from .lotreport.toml
    /// (default: Ventas-Fundamentos.xlsx).
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Directory where report artifacts are written
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Public base URL under which the output directory is served
    ///
    /// Media URLs sent over WhatsApp are built from this base, so it
    /// must be reachable by Twilio (e.g. an ngrok tunnel).
    #[arg(long, value_name = "URL", env = "LOTREPORT_BASE_URL")]
    pub base_url: Option<String>,

    /// Twilio account SID
    #[arg(long, value_name = "SID", env = "TWILIO_ACCOUNT_SID")]
    pub account_sid: Option<String>,

    /// Twilio auth token
    #[arg(long, value_name = "TOKEN", env = "TWILIO_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Sender number in whatsapp:+NNN format
    #[arg(long, value_name = "NUMBER", env = "LOTREPORT_FROM")]
    pub from: Option<String>,

    /// Recipient number in whatsapp:+NNN format
    #[arg(long, value_name = "NUMBER", env = "LOTREPORT_TO")]
    pub to: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .lotreport.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the computed analysis as JSON to this path
    #[arg(long, value_name = "FILE")]
    pub dump_analysis: Option<PathBuf>,

    /// Request timeout in seconds for delivery
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Generate all artifacts but skip the WhatsApp delivery phase
    #[arg(long)]
    pub skip_send: bool,

    /// Dry run: analyze the workbook and print the report without
    /// writing files or sending messages
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .lotreport.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref base_url) = self.base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err("Base URL must start with 'http://' or 'https://'".to_string());
            }
        }

        for (flag, value) in [("--from", &self.from), ("--to", &self.to)] {
            if let Some(number) = value {
                if !number.starts_with("whatsapp:") {
                    return Err(format!("{flag} must use the 'whatsapp:+NNN' format"));
                }
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
