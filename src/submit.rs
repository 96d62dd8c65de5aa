use std::sync::Arc;

use crate::error::FraudError;
use crate::models::{FraudQuery, RecordId};
use crate::requests::{FraudRequestManager, RequestState};
use crate::scoring::ScoringService;

/// The four fields the prediction endpoint cannot do without, in form order.
pub const REQUIRED_FIELDS: [&str; 4] = ["title", "description", "company_profile", "requirements"];

const SUBMISSION_ID: RecordId = 0;

/// A hand-entered job posting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionForm {
    pub title: String,
    pub company_profile: String,
    pub description: String,
    pub requirements: String,
    pub telecommuting: bool,
    // Collected for the user's reference, never sent
    pub location: Option<String>,
    pub department: Option<String>,
    pub salary_range: Option<String>,
    pub benefits: Option<String>,
    pub employment_type: Option<String>,
    pub required_experience: Option<String>,
    pub education: Option<String>,
    pub role: Option<String>,
}

impl SubmissionForm {
    fn field(&self, name: &str) -> &str {
        match name {
            "title" => &self.title,
            "description" => &self.description,
            "company_profile" => &self.company_profile,
            "requirements" => &self.requirements,
            _ => "",
        }
    }

    /// Required fields that are empty or whitespace only.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|name| self.field(name).trim().is_empty())
            .collect()
    }

    /// Optional fields the user filled in, for echoing back. Never transmitted.
    pub fn reference_fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("Location", &self.location),
            ("Department", &self.department),
            ("Salary range", &self.salary_range),
            ("Benefits", &self.benefits),
            ("Employment type", &self.employment_type),
            ("Required experience", &self.required_experience),
            ("Education", &self.education),
            ("Role", &self.role),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (label, v))
        })
        .collect()
    }

    pub fn validate(&self) -> Result<FraudQuery, FraudError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(FraudError::Validation { missing });
        }
        Ok(FraudQuery {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            company_profile: self.company_profile.trim().to_string(),
            requirements: self.requirements.trim().to_string(),
            telecommuting: u8::from(self.telecommuting),
        })
    }
}

/// The one-record sibling of the catalog browser.
pub struct SubmissionFlow {
    requests: FraudRequestManager,
}

impl SubmissionFlow {
    pub fn new(service: Arc<dyn ScoringService>) -> Self {
        Self {
            requests: FraudRequestManager::new(service),
        }
    }

    pub fn state(&self) -> &RequestState {
        self.requests.status(SUBMISSION_ID)
    }

    /// Validates and issues the check. Nothing is sent when fields are missing,
    /// and the current state is left as it was.
    pub fn submit(&mut self, form: &SubmissionForm) -> Result<u64, FraudError> {
        let query = form.validate()?;
        let title = query.title.clone();
        Ok(self.requests.issue(SUBMISSION_ID, query, Some(title)))
    }

    /// Waits until the latest submission resolves.
    pub async fn wait(&mut self) -> &RequestState {
        while self.state().is_pending() {
            match self.requests.next_completion().await {
                Some(completion) => {
                    self.requests.apply(completion);
                }
                None => break,
            }
        }
        self.state()
    }

    /// Clears the result. A response still in flight is ignored when it lands.
    pub fn reset(&mut self) {
        self.requests.reset(SUBMISSION_ID);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::mock::{ScriptedScoring, ok};

    fn filled() -> SubmissionForm {
        SubmissionForm {
            title: " Data Entry Clerk ".to_string(),
            company_profile: "Acme".to_string(),
            description: "Type things".to_string(),
            requirements: "Keyboard".to_string(),
            telecommuting: true,
            location: Some("Remote".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_fields_are_named_exactly() {
        let mut form = filled();
        form.description = "   ".to_string();
        form.requirements = String::new();
        assert_eq!(form.missing_fields(), vec!["description", "requirements"]);

        let err = form.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please fill in all required fields: description, requirements"
        );
    }

    #[test]
    fn test_empty_form_lists_every_required_field() {
        let form = SubmissionForm::default();
        assert_eq!(form.missing_fields(), REQUIRED_FIELDS.to_vec());
    }

    #[test]
    fn test_validate_trims_and_drops_optional_fields() {
        let query = filled().validate().unwrap();
        assert_eq!(query.title, "Data Entry Clerk");
        assert_eq!(query.telecommuting, 1);
        let json = serde_json::to_value(&query).unwrap();
        assert!(json.get("location").is_none());
    }

    #[test]
    fn test_reference_fields_skip_blank() {
        let mut form = filled();
        form.role = Some("  ".to_string());
        form.benefits = Some("Dental".to_string());
        assert_eq!(
            form.reference_fields(),
            vec![("Location", "Remote"), ("Benefits", "Dental")]
        );
    }

    #[tokio::test]
    async fn test_validation_error_sends_nothing() {
        let service = ScriptedScoring::new();
        let mut flow = SubmissionFlow::new(service.clone());
        let mut form = filled();
        form.title = "\t".to_string();

        let err = flow.submit(&form).unwrap_err();
        assert_eq!(err, FraudError::Validation { missing: vec!["title"] });
        assert_eq!(flow.state(), &RequestState::Idle);
        tokio::task::yield_now().await;
        assert!(service.queries().is_empty());
    }

    #[tokio::test]
    async fn test_submit_resolves() {
        let service = ScriptedScoring::new();
        let reply = service.expect_prediction();
        let mut flow = SubmissionFlow::new(service);

        flow.submit(&filled()).unwrap();
        assert_eq!(flow.state(), &RequestState::Pending);
        reply.send(ok(0.5, false)).unwrap();

        let state = flow.wait().await;
        let result = state.result().unwrap();
        assert_eq!(result.job_title.as_deref(), Some("Data Entry Clerk"));
        assert_eq!(result.percent(), "50.0%");
    }

    #[tokio::test]
    async fn test_resubmit_keeps_latest() {
        let service = ScriptedScoring::new();
        let first = service.expect_prediction();
        let second = service.expect_prediction();
        let mut flow = SubmissionFlow::new(service);

        flow.submit(&filled()).unwrap();
        flow.submit(&filled()).unwrap();
        first.send(ok(0.9, true)).unwrap();
        second.send(ok(0.2, false)).unwrap();

        let state = flow.wait().await;
        assert_eq!(state.result().map(|r| r.probability), Some(0.2));
    }

    #[tokio::test]
    async fn test_reset_returns_to_idle() {
        let service = ScriptedScoring::new();
        let reply = service.expect_prediction();
        let mut flow = SubmissionFlow::new(service);

        flow.submit(&filled()).unwrap();
        flow.reset();
        assert_eq!(flow.state(), &RequestState::Idle);
        reply.send(ok(0.9, true)).unwrap();
        assert_eq!(flow.wait().await, &RequestState::Idle);
    }
}
