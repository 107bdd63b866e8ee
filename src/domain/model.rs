use crate::utils::error::{Result, ScanError};
use crate::utils::validation::validate_required_field;
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Columns recognized in an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LocationField {
    Name,
    Address,
    Phone,
    City,
    State,
    Zip,
}

impl LocationField {
    pub const ALL: [LocationField; 6] = [
        LocationField::Name,
        LocationField::Address,
        LocationField::Phone,
        LocationField::City,
        LocationField::State,
        LocationField::Zip,
    ];

    /// Exact header text expected in the input file.
    pub fn header(self) -> &'static str {
        match self {
            LocationField::Name => "Name",
            LocationField::Address => "Address",
            LocationField::Phone => "Phone",
            LocationField::City => "City",
            LocationField::State => "State",
            LocationField::Zip => "Zip Code",
        }
    }

    /// Key used for the field in the scan request body.
    pub fn api_key(self) -> &'static str {
        match self {
            LocationField::Name => "name",
            LocationField::Address => "address",
            LocationField::Phone => "phone",
            LocationField::City => "city",
            LocationField::State => "state",
            LocationField::Zip => "zip",
        }
    }

    pub fn from_header(header: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.header() == header)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// A cell value, with an explicit variant for columns the row did not have.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldValue {
    Present(String),
    #[default]
    Missing,
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Present(value) => Some(value),
            FieldValue::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }
}

/// One decoded input row representing a business location.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    values: [FieldValue; 6],
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: LocationField, value: impl Into<String>) -> Self {
        self.set(field, FieldValue::Present(value.into()));
        self
    }

    pub fn set(&mut self, field: LocationField, value: FieldValue) {
        self.values[field.index()] = value;
    }

    pub fn get(&self, field: LocationField) -> &FieldValue {
        &self.values[field.index()]
    }

    pub fn name(&self) -> Option<&str> {
        self.get(LocationField::Name).as_str()
    }

    /// Present fields in column order.
    pub fn present_fields(&self) -> impl Iterator<Item = (LocationField, &str)> + '_ {
        LocationField::ALL
            .into_iter()
            .filter_map(move |field| self.get(field).as_str().map(|value| (field, value)))
    }
}

// 以原始欄位標題序列化，缺少的欄位不輸出
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (field, value) in self.present_fields() {
            map.serialize_entry(field.header(), value)?;
        }
        map.end()
    }
}

/// Opaque API key threaded into every remote call of a run.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Rejects only a blank key; the value itself is passed through untouched.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ScanError::MissingConfigError {
                field: "credential".to_string(),
            });
        }
        Ok(Self(raw))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Outcome of submitting one record, later enriched with formatted metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub name: String,
    pub job_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews_percentile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listings_inaccuracy: Option<String>,
}

impl SubmissionResult {
    pub fn submitted(name: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            job_id: job_id.into(),
            success: true,
            reviews_percentile: None,
            listings_inaccuracy: None,
        }
    }

    pub fn failed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            job_id: String::new(),
            success: false,
            reviews_percentile: None,
            listings_inaccuracy: None,
        }
    }

    pub fn is_enriched(&self) -> bool {
        self.reviews_percentile.is_some() || self.listings_inaccuracy.is_some()
    }
}

/// Metrics as returned by the scan service, decimals in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct RawMetrics {
    #[serde(default)]
    pub reviews_percentile: Option<f64>,
    #[serde(default)]
    pub listings_inaccuracy: Option<f64>,
}

/// A selected input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub name: String,
    pub contents: String,
}

impl InputFile {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// What the caller hands over to start a run. Either part may still be missing.
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    pub credential: Option<String>,
    pub input: Option<InputFile>,
}

impl ScanRequest {
    pub fn new(credential: impl Into<String>, input: InputFile) -> Self {
        Self {
            credential: Some(credential.into()),
            input: Some(input),
        }
    }

    /// Checks the input first, then the credential.
    pub fn into_parts(self) -> Result<(Credential, InputFile)> {
        let input = self.input.ok_or_else(|| ScanError::MissingConfigError {
            field: "input".to_string(),
        })?;
        let raw = validate_required_field("credential", &self.credential)?;
        let credential = Credential::new(raw.as_str())?;

        Ok((credential, input))
    }
}

/// Final state of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub input_name: String,
    pub results: Vec<SubmissionResult>,
    pub progress: f64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ScanReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn enriched(&self) -> usize {
        self.results.iter().filter(|r| r.is_enriched()).count()
    }
}
