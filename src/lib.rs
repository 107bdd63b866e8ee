pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::{cli::LocalStorage, toml_config::ScanConfig};

pub use adapters::HttpScanClient;
pub use crate::core::{
    engine::ScanEngine,
    export::ReportExporter,
    progress::{LoggingHandler, ProgressEvent, ProgressHandler, ProgressTracker},
    run_state::RunState,
};
pub use domain::model::{
    Credential, InputFile, LocationField, Record, ScanReport, ScanRequest, SubmissionResult,
};
pub use utils::error::{Result, ScanError};
