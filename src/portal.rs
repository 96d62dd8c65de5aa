use std::sync::Arc;

use crate::error::FraudError;
use crate::models::{PortalJob, PortalStatus};
use crate::scoring::ScoringService;

pub const DEFAULT_JOB_TITLE: &str = "data scientist";

pub const JOB_TITLE_PRESETS: [&str; 14] = [
    "developer",
    "machine learning",
    "data scientist",
    "data analyst",
    "software engineer",
    "web developer",
    "backend developer",
    "frontend developer",
    "devops engineer",
    "cloud architect",
    "product manager",
    "ai engineer",
    "cyber security analyst",
    "business analyst",
];

#[derive(Debug, Clone, PartialEq)]
pub enum LookupState {
    NotLoaded,
    Loaded(Vec<PortalJob>),
    Failed(FraudError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub safe: usize,
    pub high_risk: usize,
    pub analyzing: usize,
}

/// Live lookup of jobs already scored by the service, one job title at a time.
pub struct PortalView {
    service: Arc<dyn ScoringService>,
    job_title: String,
    state: LookupState,
    expanded: Option<usize>,
}

impl PortalView {
    pub fn new(service: Arc<dyn ScoringService>, job_title: &str) -> Self {
        Self {
            service,
            job_title: job_title.to_string(),
            state: LookupState::NotLoaded,
            expanded: None,
        }
    }

    pub fn job_title(&self) -> &str {
        &self.job_title
    }

    pub fn state(&self) -> &LookupState {
        &self.state
    }

    pub fn jobs(&self) -> &[PortalJob] {
        match &self.state {
            LookupState::Loaded(jobs) => jobs,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&FraudError> {
        match &self.state {
            LookupState::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Runs the lookup for the current title. Failures leave no jobs behind.
    pub async fn refresh(&mut self) -> &LookupState {
        self.expanded = None;
        self.state = match self.service.lookup_jobs(&self.job_title).await {
            Ok(jobs) => {
                tracing::info!(job_title = %self.job_title, jobs = jobs.len(), "lookup finished");
                LookupState::Loaded(jobs)
            }
            Err(error) => {
                tracing::warn!(job_title = %self.job_title, error = %error, "lookup failed");
                LookupState::Failed(error)
            }
        };
        &self.state
    }

    pub async fn select_title(&mut self, job_title: &str) -> &LookupState {
        self.job_title = job_title.to_string();
        self.refresh().await
    }

    /// Expands a job card, or collapses it if it was the expanded one.
    pub fn toggle_expansion(&mut self, index: usize) {
        self.expanded = if self.expanded == Some(index) {
            None
        } else {
            Some(index)
        };
    }

    pub fn expanded(&self) -> Option<usize> {
        self.expanded
    }

    pub fn counts(&self) -> StatusCounts {
        self.jobs()
            .iter()
            .fold(StatusCounts::default(), |mut counts, job| {
                match job.status() {
                    PortalStatus::Safe => counts.safe += 1,
                    PortalStatus::HighRisk => counts.high_risk += 1,
                    PortalStatus::Analyzing => counts.analyzing += 1,
                }
                counts
            })
    }

    pub fn summary(&self) -> Option<String> {
        let count = self.jobs().len();
        if count == 0 {
            return None;
        }
        Some(format!(
            "Found {} job{} for \"{}\"",
            count,
            if count == 1 { "" } else { "s" },
            self.job_title
        ))
    }
}
