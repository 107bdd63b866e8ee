use crate::domain::model::ScanReport;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("{operation} returned HTTP {status}")]
    RemoteStatus { operation: String, status: u16 },

    #[error("{operation} returned an unexpected body: {message}")]
    UnexpectedResponse { operation: String, message: String },

    #[error("Submission failed for '{record}': {message}")]
    RecordSubmissionError { record: String, message: String },

    #[error("Metrics fetch failed for job '{job_id}': {message}")]
    RecordEnrichmentError { job_id: String, message: String },

    #[error("A scan run is already in progress (state: {state})")]
    RunInProgress { state: String },

    /// 掃描已完成但報表寫入失敗，保留結果
    #[error("Scan finished but the report could not be written: {source}")]
    ExportError {
        report: Box<ScanReport>,
        #[source]
        source: Box<ScanError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Data,
    Run,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ScanError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScanError::ConfigError { .. }
            | ScanError::MissingConfigError { .. }
            | ScanError::InvalidConfigValueError { .. }
            | ScanError::ConfigValidationError { .. }
            | ScanError::UrlError(_) => ErrorCategory::Configuration,
            ScanError::ApiError(_)
            | ScanError::RemoteStatus { .. }
            | ScanError::UnexpectedResponse { .. } => ErrorCategory::Network,
            ScanError::CsvError(_)
            | ScanError::IoError(_)
            | ScanError::SerializationError(_)
            | ScanError::ExportError { .. } => ErrorCategory::Data,
            ScanError::RecordSubmissionError { .. }
            | ScanError::RecordEnrichmentError { .. }
            | ScanError::RunInProgress { .. } => ErrorCategory::Run,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單筆失敗會被隔離，不影響整體執行
            ScanError::RecordSubmissionError { .. } | ScanError::RecordEnrichmentError { .. } => {
                ErrorSeverity::Low
            }
            ScanError::ApiError(_)
            | ScanError::RemoteStatus { .. }
            | ScanError::UnexpectedResponse { .. }
            | ScanError::RunInProgress { .. } => ErrorSeverity::Medium,
            ScanError::ConfigError { .. }
            | ScanError::MissingConfigError { .. }
            | ScanError::InvalidConfigValueError { .. }
            | ScanError::ConfigValidationError { .. }
            | ScanError::UrlError(_)
            | ScanError::CsvError(_)
            | ScanError::SerializationError(_) => ErrorSeverity::High,
            ScanError::IoError(_) => ErrorSeverity::Critical,
            ScanError::ExportError { source, .. } => source.severity(),
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ScanError::MissingConfigError { field } => {
                format!("Provide a value for '{}' before starting the scan", field)
            }
            ScanError::InvalidConfigValueError { field, .. }
            | ScanError::ConfigValidationError { field, .. } => {
                format!("Check the '{}' setting in the configuration file", field)
            }
            ScanError::ConfigError { .. } | ScanError::UrlError(_) => {
                "Review the configuration file and command-line flags".to_string()
            }
            ScanError::ApiError(_) | ScanError::RemoteStatus { .. } => {
                "Check network connectivity and that the API key is valid".to_string()
            }
            ScanError::UnexpectedResponse { .. } => {
                "Verify the API versions configured for the scan service".to_string()
            }
            ScanError::CsvError(_) => {
                "Make sure the input is a comma-separated file with a header row".to_string()
            }
            ScanError::IoError(_) => {
                "Check that the input file exists and the output directory is writable".to_string()
            }
            ScanError::SerializationError(_) => "Re-run the scan and export again".to_string(),
            ScanError::RecordSubmissionError { .. } | ScanError::RecordEnrichmentError { .. } => {
                "The record is kept in the report; rescan it in a later run".to_string()
            }
            ScanError::RunInProgress { .. } => {
                "Wait for the current run to finish before starting another".to_string()
            }
            ScanError::ExportError { .. } => {
                "Check that the output directory is writable; the results are printed above"
                    .to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("Could not talk to the scan service: {}", self),
            ErrorCategory::Data => format!("Could not process the data: {}", self),
            ErrorCategory::Run => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
