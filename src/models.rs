use serde::{Deserialize, Serialize};

/// Position of a record in the loaded catalog. Stable for the whole session.
pub type RecordId = usize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: RecordId,
    pub title: String,
    pub company_profile: String,
    pub description: String,
    pub requirements: String,
    pub telecommuting: bool,
    pub location: Option<String>,
    pub department: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub benefits: Option<String>,
    pub employment_type: Option<String>,
    pub required_experience: Option<String>,
    pub required_education: Option<String>,
    pub industry: Option<String>,
    pub function: Option<String>,
    pub apply_url: Option<String>,
}

impl JobRecord {
    /// Minimal record, mostly useful for tests and ad-hoc catalogs.
    pub fn new(id: RecordId, title: &str, company_profile: &str, description: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            company_profile: company_profile.to_string(),
            description: description.to_string(),
            requirements: String::new(),
            telecommuting: false,
            location: None,
            department: None,
            salary_min: None,
            salary_max: None,
            benefits: None,
            employment_type: None,
            required_experience: None,
            required_education: None,
            industry: None,
            function: None,
            apply_url: None,
        }
    }

    pub fn salary_label(&self) -> Option<String> {
        salary_label(self.salary_min, self.salary_max)
    }
}

/// Formats salary bounds, e.g. `$40000 - $50000`. `None` when both are missing.
pub fn salary_label(min: Option<f64>, max: Option<f64>) -> Option<String> {
    match (min, max) {
        (Some(min), Some(max)) => Some(format!("${} - ${}", min as i64, max as i64)),
        (Some(min), None) => Some(format!("${}+", min as i64)),
        (None, Some(max)) => Some(format!("up to ${}", max as i64)),
        (None, None) => None,
    }
}

/// Body of `POST /fraud/predict`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FraudQuery {
    pub title: String,
    pub description: String,
    pub company_profile: String,
    pub requirements: String,
    pub telecommuting: u8, // 0 or 1
}

impl FraudQuery {
    /// Catalog path: no validation, whatever the record holds is sent.
    pub fn from_record(record: &JobRecord) -> Self {
        Self {
            title: record.title.trim().to_string(),
            description: record.description.trim().to_string(),
            company_profile: record.company_profile.trim().to_string(),
            requirements: record.requirements.trim().to_string(),
            telecommuting: u8::from(record.telecommuting),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const MEDIUM_THRESHOLD: f64 = 0.4;
    pub const HIGH_THRESHOLD: f64 = 0.7;

    pub fn from_probability(probability: f64) -> Self {
        if probability >= Self::HIGH_THRESHOLD {
            RiskLevel::High
        } else if probability >= Self::MEDIUM_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low Risk",
            RiskLevel::Medium => "Medium Risk",
            RiskLevel::High => "High Risk",
        }
    }

    pub fn recommendations(&self) -> [&'static str; 3] {
        match self {
            RiskLevel::High => [
                "Exercise extreme caution with this job posting",
                "Verify company details independently",
                "Never provide personal information or pay upfront fees",
            ],
            RiskLevel::Medium => [
                "Research the company thoroughly before applying",
                "Look for additional red flags in the posting",
                "Be cautious during the application process",
            ],
            RiskLevel::Low => [
                "This job posting appears legitimate",
                "Still verify company details as a best practice",
                "Proceed with normal application caution",
            ],
        }
    }
}

/// Canonical outcome of one completed prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudResult {
    pub probability: f64, // [0, 1]
    pub is_fraud: bool,
    pub job_title: Option<String>,
}

impl FraudResult {
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_probability(self.probability)
    }

    /// Probability as a percentage with one decimal, e.g. `82.0%`.
    pub fn percent(&self) -> String {
        format!("{:.1}%", self.probability * 100.0)
    }

    pub fn verdict(&self) -> &'static str {
        if self.is_fraud {
            "This job posting shows signs of potential fraud."
        } else {
            "This job posting appears to be legitimate."
        }
    }

    pub fn with_job_title(mut self, title: &str) -> Self {
        self.job_title = Some(title.to_string());
        self
    }
}

/// One job returned by the live `/jobs/fraud_detect/` lookup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PortalJob {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub department: Option<String>,
    pub function: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub redirect_url: Option<String>,
    pub fraud_probability: Option<f64>,
    pub is_fraud: Option<bool>, // None while the service is still analyzing
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PortalStatus {
    Safe,
    HighRisk,
    Analyzing,
}

impl PortalStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PortalStatus::Safe => "SAFE",
            PortalStatus::HighRisk => "HIGH RISK",
            PortalStatus::Analyzing => "ANALYZING",
        }
    }
}

impl PortalJob {
    /// The service's thresholded verdict. No probability banding here.
    pub fn status(&self) -> PortalStatus {
        match self.is_fraud {
            Some(true) => PortalStatus::HighRisk,
            Some(false) => PortalStatus::Safe,
            None => PortalStatus::Analyzing,
        }
    }

    /// Canonical risk band, when the service reported a probability.
    pub fn risk_level(&self) -> Option<RiskLevel> {
        self.fraud_probability.map(RiskLevel::from_probability)
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("No Title Available")
    }
}
