//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.lotreport.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Workbook source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Report output settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// WhatsApp delivery settings.
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory where report artifacts are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            verbose: false,
        }
    }
}

fn default_output_dir() -> String {
    "Reports".to_string()
}

/// Workbook source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path to the Excel workbook to analyze.
    #[serde(default = "default_workbook")]
    pub workbook: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            workbook: default_workbook(),
        }
    }
}

fn default_workbook() -> String {
    "Ventas-Fundamentos.xlsx".to_string()
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// File name of the text report document.
    #[serde(default = "default_text_file_name")]
    pub text_file_name: String,

    /// Base name for chart image files.
    #[serde(default = "default_image_base_name")]
    pub image_base_name: String,

    /// Chart image file extension (with dot).
    #[serde(default = "default_image_extension")]
    pub image_extension: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            text_file_name: default_text_file_name(),
            image_base_name: default_image_base_name(),
            image_extension: default_image_extension(),
        }
    }
}

fn default_text_file_name() -> String {
    "Business_Report.txt".to_string()
}

fn default_image_base_name() -> String {
    "report_chart".to_string()
}

fn default_image_extension() -> String {
    ".png".to_string()
}

/// WhatsApp delivery settings (Twilio).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Twilio account SID.
    #[serde(default)]
    pub account_sid: String,

    /// Twilio auth token.
    #[serde(default)]
    pub auth_token: String,

    /// Sender number, `whatsapp:+...` format.
    #[serde(default)]
    pub from: String,

    /// Recipient number, `whatsapp:+...` format.
    #[serde(default)]
    pub to: String,

    /// Public base URL under which report artifacts are served
    /// (e.g. an ngrok tunnel to the output directory).
    #[serde(default)]
    pub public_base_url: String,

    /// Twilio API base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            from: String::new(),
            to: String::new(),
            public_base_url: String::new(),
            api_base_url: default_api_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.twilio.com".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl DeliveryConfig {
    /// True when every field needed to send messages is present.
    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty()
            && !self.auth_token.is_empty()
            && !self.from.is_empty()
            && !self.to.is_empty()
            && !self.public_base_url.is_empty()
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".lotreport.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.source.workbook = input.display().to_string();
        }
        if let Some(ref output_dir) = args.output_dir {
            self.general.output_dir = output_dir.display().to_string();
        }

        if let Some(ref base_url) = args.base_url {
            self.delivery.public_base_url = base_url.clone();
        }
        if let Some(ref account_sid) = args.account_sid {
            self.delivery.account_sid = account_sid.clone();
        }
        if let Some(ref auth_token) = args.auth_token {
            self.delivery.auth_token = auth_token.clone();
        }
        if let Some(ref from) = args.from {
            self.delivery.from = from.clone();
        }
        if let Some(ref to) = args.to {
            self.delivery.to = to.clone();
        }
        if let Some(timeout) = args.timeout {
            self.delivery.timeout_seconds = timeout;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output_dir, "Reports");
        assert_eq!(config.source.workbook, "Ventas-Fundamentos.xlsx");
        assert_eq!(config.report.text_file_name, "Business_Report.txt");
        assert_eq!(config.delivery.api_base_url, "https://api.twilio.com");
        assert_eq!(config.delivery.timeout_seconds, 30);
        assert!(!config.delivery.is_configured());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output_dir = "out"
verbose = true

[source]
workbook = "data/ventas.xlsx"

[delivery]
account_sid = "AC123"
auth_token = "secret"
from = "whatsapp:+14155238886"
to = "whatsapp:+51999999999"
public_base_url = "https://example.ngrok.io"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output_dir, "out");
        assert!(config.general.verbose);
        assert_eq!(config.source.workbook, "data/ventas.xlsx");
        assert!(config.delivery.is_configured());
        // Unspecified sections fall back to defaults.
        assert_eq!(config.report.image_base_name, "report_chart");
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[source]"));
        assert!(toml_str.contains("[report]"));
        assert!(toml_str.contains("[delivery]"));
    }

    #[test]
    fn test_merge_with_args_overrides_only_provided_values() {
        use crate::cli::Args;
        use std::path::PathBuf;

        let mut config = Config::default();
        let args = Args {
            input: Some(PathBuf::from("custom.xlsx")),
            output_dir: None,
            base_url: Some("https://tunnel.ngrok.io".to_string()),
            account_sid: None,
            auth_token: None,
            from: None,
            to: None,
            config: None,
            dump_analysis: None,
            timeout: Some(10),
            skip_send: false,
            dry_run: false,
            init_config: false,
            verbose: true,
            quiet: false,
        };

        config.merge_with_args(&args);
        assert_eq!(config.source.workbook, "custom.xlsx");
        assert_eq!(config.delivery.public_base_url, "https://tunnel.ngrok.io");
        assert_eq!(config.delivery.timeout_seconds, 10);
        assert!(config.general.verbose);
        // Untouched by the args above.
        assert_eq!(config.general.output_dir, "Reports");
        assert!(config.delivery.account_sid.is_empty());
    }

    #[test]
    fn test_is_configured_requires_all_fields() {
        let mut delivery = DeliveryConfig {
            account_sid: "AC123".to_string(),
            auth_token: "secret".to_string(),
            from: "whatsapp:+14155238886".to_string(),
            to: "whatsapp:+51999999999".to_string(),
            public_base_url: "https://example.ngrok.io".to_string(),
            ..DeliveryConfig::default()
        };
        assert!(delivery.is_configured());

        delivery.public_base_url.clear();
        assert!(!delivery.is_configured());
    }
}
