use crate::config::toml_config::ApiConfig;
use crate::domain::model::{Credential, RawMetrics, Record};
use crate::domain::ports::ScanClient;
use crate::utils::error::{Result, ScanError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use url::Url;

/// Every scan service body is wrapped as `{"response": ...}`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: T,
}

#[derive(Debug, Deserialize)]
struct SubmitPayload {
    #[serde(rename = "jobId", default)]
    job_id: Option<Value>,
}

/// reqwest implementation of the scan service.
pub struct HttpScanClient {
    client: Client,
    base_url: Url,
    api: ApiConfig,
}

impl HttpScanClient {
    pub fn new(api: ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&api.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ScanError::InvalidConfigValueError {
                field: "api.base_url".to_string(),
                value: api.base_url.clone(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(api.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // new() 已確認可作為 base，這裡不會失敗
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// JSON body of a scan submission. Missing record fields are left out.
pub fn scan_request_body(record: &Record) -> Value {
    let mut body = Map::new();
    for (field, value) in record.present_fields() {
        body.insert(field.api_key().to_string(), Value::String(value.to_string()));
    }
    body.insert("includeReviewMetrics".to_string(), Value::Bool(true));
    body.insert("performDuplicateSearch".to_string(), Value::Bool(true));
    Value::Object(body)
}

fn job_id_from(value: Option<Value>) -> Result<String> {
    match value {
        Some(Value::String(id)) if !id.is_empty() => Ok(id),
        Some(Value::Number(id)) => Ok(id.to_string()),
        other => Err(ScanError::UnexpectedResponse {
            operation: "submit".to_string(),
            message: format!("missing response.jobId (got {:?})", other),
        }),
    }
}

#[async_trait]
impl ScanClient for HttpScanClient {
    async fn submit(&self, credential: &Credential, record: &Record) -> Result<String> {
        let url = self.endpoint(&[self.api.scan_segment.as_str()]);
        tracing::debug!("POST {}", url);

        // reqwest 的錯誤訊息會帶 URL（含 api_key），一律去掉
        let response = self
            .client
            .post(url)
            .query(&[
                ("api_key", credential.expose()),
                ("v", self.api.scan_version.as_str()),
            ])
            .json(&scan_request_body(record))
            .send()
            .await
            .map_err(|e| e.without_url())?;

        let status = response.status();
        tracing::debug!("Submit response status: {}", status);
        if !status.is_success() {
            return Err(ScanError::RemoteStatus {
                operation: "submit".to_string(),
                status: status.as_u16(),
            });
        }

        let envelope: Envelope<SubmitPayload> =
            response.json().await.map_err(|e| e.without_url())?;
        job_id_from(envelope.response.job_id)
    }

    async fn fetch_metrics(&self, credential: &Credential, job_id: &str) -> Result<RawMetrics> {
        let url = self.endpoint(&[self.api.metrics_segment.as_str(), job_id]);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .query(&[
                ("api_key", credential.expose()),
                ("v", self.api.metrics_version.as_str()),
            ])
            .send()
            .await
            .map_err(|e| e.without_url())?;

        let status = response.status();
        tracing::debug!("Metrics response status: {}", status);
        if !status.is_success() {
            return Err(ScanError::RemoteStatus {
                operation: "metrics".to_string(),
                status: status.as_u16(),
            });
        }

        let envelope: Envelope<RawMetrics> =
            response.json().await.map_err(|e| e.without_url())?;
        Ok(envelope.response)
    }
}
