pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;

/// Command-line flags of the `bulk-scan` binary. Flags win over the config file.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "bulk-scan")]
#[command(about = "Submit business locations for a bulk scan and export their quality metrics")]
pub struct CliArgs {
    /// CSV file with Name, Address, Phone, City, State and Zip Code columns
    #[arg(short, long)]
    pub input: Option<String>,

    /// API key passed to every scan call
    #[arg(long)]
    pub api_key: Option<String>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory the report is written to
    #[arg(long)]
    pub output_path: Option<String>,

    /// Report file name
    #[arg(long)]
    pub filename: Option<String>,

    /// Seconds to wait between submitting and fetching metrics
    #[arg(long)]
    pub cooldown_seconds: Option<u64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Do not draw the progress bar")]
    pub no_progress: bool,
}

#[cfg(feature = "cli")]
impl CliArgs {
    /// Loads the config file when given, then applies flag overrides.
    pub fn resolve_config(&self) -> crate::Result<toml_config::ScanConfig> {
        let mut config = match &self.config {
            Some(path) => toml_config::ScanConfig::from_file(path)?,
            None => toml_config::ScanConfig::default(),
        };

        if let Some(output_path) = &self.output_path {
            config.output.output_path = output_path.clone();
        }
        if let Some(filename) = &self.filename {
            config.output.filename = filename.clone();
        }
        if let Some(cooldown) = self.cooldown_seconds {
            config.run.cooldown_seconds = cooldown;
        }
        if let Some(api_key) = &self.api_key {
            config.api.api_key = Some(api_key.clone());
        }

        Ok(config)
    }
}
