use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use url::Url;

use crate::error::FraudError;
use crate::models::{JobRecord, RecordId};

/// Where the catalog comes from: a local CSV file or one served over HTTP.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogSource {
    File(PathBuf),
    Remote(Url),
}

impl CatalogSource {
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            if let Ok(url) = Url::parse(source) {
                return CatalogSource::Remote(url);
            }
        }
        CatalogSource::File(PathBuf::from(source))
    }

    async fn fetch(&self) -> Result<String, FraudError> {
        match self {
            CatalogSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| FraudError::Load(format!("{}: {}", path.display(), e))),
            CatalogSource::Remote(url) => {
                let response = reqwest::get(url.clone())
                    .await
                    .map_err(|e| FraudError::Load(format!("{}: {}", url, e)))?;
                if !response.status().is_success() {
                    return Err(FraudError::Load(format!(
                        "{}: HTTP {}",
                        url,
                        response.status().as_u16()
                    )));
                }
                response
                    .text()
                    .await
                    .map_err(|e| FraudError::Load(format!("{}: {}", url, e)))
            }
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::File(path) => write!(f, "{}", path.display()),
            CatalogSource::Remote(url) => write!(f, "{}", url),
        }
    }
}

// Column names follow the public fake job postings dataset.
#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    company_profile: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    requirements: Option<String>,
    #[serde(default)]
    telecommuting: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    department: Option<String>,
    #[serde(default)]
    salary_range: Option<String>,
    #[serde(default)]
    benefits: Option<String>,
    #[serde(default)]
    employment_type: Option<String>,
    #[serde(default)]
    required_experience: Option<String>,
    #[serde(default)]
    required_education: Option<String>,
    #[serde(default)]
    industry: Option<String>,
    #[serde(default)]
    function: Option<String>,
    #[serde(default, alias = "redirect_url")]
    apply_url: Option<String>,
}

impl CatalogRow {
    fn into_record(self, id: RecordId) -> Option<JobRecord> {
        let title = non_empty(self.title)?;
        let description = non_empty(self.description)?;
        let (salary_min, salary_max) = self
            .salary_range
            .as_deref()
            .map(parse_salary_range)
            .unwrap_or((None, None));

        Some(JobRecord {
            id,
            title,
            description,
            company_profile: self.company_profile.unwrap_or_default(),
            requirements: self.requirements.unwrap_or_default(),
            telecommuting: self.telecommuting.as_deref().is_some_and(parse_flag),
            location: non_empty(self.location),
            department: non_empty(self.department),
            salary_min,
            salary_max,
            benefits: non_empty(self.benefits),
            employment_type: non_empty(self.employment_type),
            required_experience: non_empty(self.required_experience),
            required_education: non_empty(self.required_education),
            industry: non_empty(self.industry),
            function: non_empty(self.function),
            apply_url: non_empty(self.apply_url),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("t") {
        return true;
    }
    value.parse::<f64>().map(|n| n != 0.0).unwrap_or(false)
}

/// `"40000-50000"` → bounds. Anything else yields no bounds.
fn parse_salary_range(range: &str) -> (Option<f64>, Option<f64>) {
    let Some((low, high)) = range.split_once('-') else {
        return (None, None);
    };
    match (low.trim().parse::<f64>(), high.trim().parse::<f64>()) {
        (Ok(min), Ok(max)) if min <= max => (Some(min), Some(max)),
        (Ok(min), Ok(max)) => (Some(max), Some(min)),
        _ => (None, None),
    }
}

/// Parses CSV text with a header row into catalog records.
///
/// Rows with a blank `title` or `description` are dropped. Ids are assigned
/// densely in the order the surviving rows appear.
pub fn parse_catalog(text: &str) -> Result<Vec<JobRecord>, FraudError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| FraudError::Load(format!("unreadable header row: {}", e)))?
        .clone();
    for required in ["title", "description"] {
        if !headers.iter().any(|h| h == required) {
            return Err(FraudError::Load(format!("missing '{}' column", required)));
        }
    }

    let mut records = Vec::new();
    let mut dropped = 0usize;
    for (line, row) in reader.deserialize::<CatalogRow>().enumerate() {
        let row = row.map_err(|e| FraudError::Load(format!("row {}: {}", line + 2, e)))?;
        match row.into_record(records.len()) {
            Some(record) => records.push(record),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::debug!(dropped, "dropped catalog rows without title or description");
    }
    Ok(records)
}

/// Load-once store of job records.
#[derive(Debug, Default)]
pub struct CatalogStore {
    records: Vec<JobRecord>,
    error: Option<FraudError>,
}

impl CatalogStore {
    /// Loads the catalog. A failure leaves the store empty with the error kept.
    pub async fn load(source: &CatalogSource) -> Self {
        let loaded = match source.fetch().await {
            Ok(text) => parse_catalog(&text),
            Err(e) => Err(e),
        };
        match loaded {
            Ok(records) => {
                tracing::info!(source = %source, records = records.len(), "catalog loaded");
                Self::from_records(records)
            }
            Err(error) => {
                tracing::warn!(source = %source, error = %error, "catalog load failed");
                Self {
                    records: Vec::new(),
                    error: Some(error),
                }
            }
        }
    }

    pub fn from_records(records: Vec<JobRecord>) -> Self {
        Self {
            records,
            error: None,
        }
    }

    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }

    pub fn get(&self, id: RecordId) -> Option<&JobRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn error(&self) -> Option<&FraudError> {
        self.error.as_ref()
    }
}
