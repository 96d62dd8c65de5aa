use anyhow::{Context, Result, anyhow};
use url::Url;

pub const DEFAULT_API_URL: &str = "https://numeric-nomads.onrender.com";
pub const DEFAULT_PAGE_SIZE: usize = 12;

const PREDICT_PATH: &str = "fraud/predict";
const FRAUD_DETECT_PATH: &str = "jobs/fraud_detect/";

#[derive(Debug, Clone)]
pub struct Config {
    api_url: Url,
    pub page_size: usize,
}

impl Config {
    pub fn new(api_url: &str, page_size: usize) -> Result<Self> {
        let mut api_url = Url::parse(api_url.trim())
            .with_context(|| format!("Invalid scoring service URL: {}", api_url))?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "Scoring service URL must be http or https, got '{}'",
                api_url.scheme()
            ));
        }
        if page_size == 0 {
            return Err(anyhow!("Page size must be at least 1"));
        }
        // Url::join drops the last path segment unless it ends with '/'
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }
        Ok(Self { api_url, page_size })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn predict_url(&self) -> Result<Url> {
        self.api_url
            .join(PREDICT_PATH)
            .context("Failed to build prediction URL")
    }

    /// Lookup endpoint without the `job_title` query pair.
    pub fn fraud_detect_url(&self) -> Result<Url> {
        self.api_url
            .join(FRAUD_DETECT_PATH)
            .context("Failed to build lookup URL")
    }
}
