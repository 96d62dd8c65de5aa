use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::config::Config;
use crate::error::FraudError;
use crate::models::{FraudQuery, FraudResult, PortalJob};

// --- Service trait ---

#[async_trait]
pub trait ScoringService: Send + Sync {
    /// `POST /fraud/predict` for one job.
    async fn predict(&self, query: &FraudQuery) -> Result<FraudResult, FraudError>;

    /// `GET /jobs/fraud_detect/?job_title=..`. An empty answer is an error.
    async fn lookup_jobs(&self, job_title: &str) -> Result<Vec<PortalJob>, FraudError>;
}

// --- Wire normalization ---

#[derive(Debug, Deserialize)]
struct PredictResponse {
    probability: Option<f64>,
    fraud_probability: Option<f64>,
    is_fraud: Option<bool>,
}

/// Maps a prediction body onto `FraudResult`.
///
/// Either `probability` or `fraud_probability` is accepted, the former wins
/// when both are present.
pub fn normalize_prediction(body: &str) -> Result<FraudResult, FraudError> {
    let raw: PredictResponse = serde_json::from_str(body)
        .map_err(|e| FraudError::MalformedResponse(e.to_string()))?;

    let probability = raw
        .probability
        .or(raw.fraud_probability)
        .ok_or_else(|| FraudError::MalformedResponse("missing probability".to_string()))?;
    if !(0.0..=1.0).contains(&probability) {
        return Err(FraudError::MalformedResponse(format!(
            "probability {} outside [0, 1]",
            probability
        )));
    }
    let is_fraud = raw
        .is_fraud
        .ok_or_else(|| FraudError::MalformedResponse("missing is_fraud".to_string()))?;

    Ok(FraudResult {
        probability,
        is_fraud,
        job_title: None,
    })
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<PortalJob>),
    One(Box<PortalJob>),
}

/// Maps a lookup body onto a list of jobs. `null` and `[]` are empty results.
pub fn normalize_lookup(body: &str, job_title: &str) -> Result<Vec<PortalJob>, FraudError> {
    let parsed: Option<OneOrMany> = serde_json::from_str(body)
        .map_err(|e| FraudError::MalformedResponse(e.to_string()))?;

    let jobs = match parsed {
        Some(OneOrMany::Many(jobs)) => jobs,
        Some(OneOrMany::One(job)) => vec![*job],
        None => Vec::new(),
    };

    if jobs.is_empty() {
        return Err(FraudError::EmptyResult {
            job_title: job_title.to_string(),
        });
    }
    Ok(jobs)
}

// --- HTTP client ---

#[derive(Debug, Clone)]
pub struct HttpScoringClient {
    client: Client,
    predict_url: Url,
    lookup_url: Url,
}

impl HttpScoringClient {
    pub fn new(config: &Config) -> Result<Self> {
        // No timeout: a request stays pending until the service answers
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            predict_url: config.predict_url()?,
            lookup_url: config.fraud_detect_url()?,
        })
    }

    async fn read_body(response: reqwest::Response) -> Result<(StatusCode, String), FraudError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| FraudError::network(&e))?;
        Ok((status, body))
    }
}

#[async_trait]
impl ScoringService for HttpScoringClient {
    async fn predict(&self, query: &FraudQuery) -> Result<FraudResult, FraudError> {
        tracing::debug!(url = %self.predict_url, title = %query.title, "requesting prediction");

        let response = self
            .client
            .post(self.predict_url.clone())
            .json(query)
            .send()
            .await
            .map_err(|e| FraudError::network(&e))?;

        let (status, body) = Self::read_body(response).await?;
        if !status.is_success() {
            let fallback = format!("Server error ({})", status.as_u16());
            return Err(FraudError::from_status(status.as_u16(), &body, fallback));
        }

        normalize_prediction(&body)
    }

    async fn lookup_jobs(&self, job_title: &str) -> Result<Vec<PortalJob>, FraudError> {
        let mut url = self.lookup_url.clone();
        url.query_pairs_mut().append_pair("job_title", job_title);
        tracing::debug!(url = %url, "looking up jobs");

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FraudError::network(&e))?;

        let (status, body) = Self::read_body(response).await?;
        if !status.is_success() {
            let fallback = format!(
                "API Error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            );
            return Err(FraudError::from_status(status.as_u16(), &body, fallback.trim_end().to_string()));
        }

        normalize_lookup(&body, job_title)
    }
}

// --- Scripted double for tests ---
