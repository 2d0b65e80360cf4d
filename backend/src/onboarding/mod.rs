//! Onboarding wizard state.
//!
//! Three steps: organization details, branding (logo), team invites. Each step
//! is validated before the wizard moves past it. Submitting creates the
//! organization first and then sends every staged invite concurrently; invite
//! failures are collected and reported, they never undo the organization.

pub mod client;

use async_trait::async_trait;
use futures::future::join_all;
use uuid::Uuid;
use validator::{Validate, ValidateEmail};

pub use client::{ApiClient, ClientError};

use crate::models::{
    invite::{CreateInviteRequest, CreatedInvite},
    member::MemberRole,
    organization::{CreateOrganizationRequest, Organization},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    #[default]
    Details,
    Branding,
    Team,
}

impl Step {
    pub const COUNT: u8 = 3;

    /// 1-based position, for progress display.
    pub fn number(self) -> u8 {
        match self {
            Step::Details => 1,
            Step::Branding => 2,
            Step::Team => 3,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::Details => "Organization Details",
            Step::Branding => "Branding",
            Step::Team => "Team Setup",
        }
    }

    fn fields(self) -> &'static [&'static str] {
        match self {
            Step::Details => &["name", "description", "website"],
            Step::Branding => &["logo"],
            Step::Team => &[],
        }
    }

    fn next(self) -> Step {
        match self {
            Step::Details => Step::Branding,
            Step::Branding | Step::Team => Step::Team,
        }
    }

    fn previous(self) -> Step {
        match self {
            Step::Details | Step::Branding => Step::Details,
            Step::Team => Step::Branding,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldProblem {
    pub field: String,
    pub message: String,
}

#[derive(thiserror::Error, Debug)]
pub enum OnboardingError {
    #[error("{} step is incomplete", .step.title())]
    InvalidStep {
        step: Step,
        problems: Vec<FieldProblem>,
    },

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("This email has already been invited")]
    DuplicateInvite,

    #[error("Finish the earlier steps before submitting")]
    NotReady,

    #[error("Failed to create organization: {0}")]
    CreateOrganization(#[from] ClientError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StagedInvite {
    pub email: String,
    pub role: MemberRole,
}

#[derive(Debug)]
pub struct InviteFailure {
    pub email: String,
    pub error: ClientError,
}

#[derive(Debug)]
pub struct OnboardingOutcome {
    pub organization: Organization,
    pub invited: Vec<CreatedInvite>,
    pub failed: Vec<InviteFailure>,
}

/// Where the wizard sends its results.
#[async_trait]
pub trait OnboardingBackend: Send + Sync {
    async fn create_organization(
        &self,
        req: &CreateOrganizationRequest,
    ) -> Result<Organization, ClientError>;

    async fn create_invite(
        &self,
        org_id: Uuid,
        req: &CreateInviteRequest,
    ) -> Result<CreatedInvite, ClientError>;
}

#[derive(Debug, Clone, Default)]
pub struct OnboardingForm {
    step: Step,
    name: String,
    description: String,
    website: String,
    logo: Option<String>,
    invites: Vec<StagedInvite>,
}

impl OnboardingForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn set_details(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        website: impl Into<String>,
    ) {
        self.name = name.into();
        self.description = description.into();
        self.website = website.into();
    }

    pub fn set_logo(&mut self, logo: Option<String>) {
        self.logo = logo;
    }

    pub fn invites(&self) -> &[StagedInvite] {
        &self.invites
    }

    /// Stage a teammate with the MEMBER role.
    pub fn stage_invite(&mut self, email: &str) -> Result<(), OnboardingError> {
        self.stage_invite_as(email, MemberRole::Member)
    }

    pub fn stage_invite_as(
        &mut self,
        email: &str,
        role: MemberRole,
    ) -> Result<(), OnboardingError> {
        let email = email.trim().to_lowercase();
        if !email.validate_email() {
            return Err(OnboardingError::InvalidEmail);
        }
        if self.invites.iter().any(|i| i.email == email) {
            return Err(OnboardingError::DuplicateInvite);
        }
        self.invites.push(StagedInvite { email, role });
        Ok(())
    }

    /// Returns whether anything was removed.
    pub fn remove_invite(&mut self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        let before = self.invites.len();
        self.invites.retain(|i| i.email != email);
        self.invites.len() != before
    }

    /// Validate the current step and move to the next one. On the last step
    /// this only validates; use [`OnboardingForm::submit`] to finish.
    pub fn next(&mut self) -> Result<Step, OnboardingError> {
        self.validate_step(self.step)?;
        self.step = self.step.next();
        Ok(self.step)
    }

    pub fn back(&mut self) -> Step {
        self.step = self.step.previous();
        self.step
    }

    /// The organization payload as it will be submitted.
    pub fn request(&self) -> CreateOrganizationRequest {
        CreateOrganizationRequest {
            name: self.name.clone(),
            description: self.description.clone(),
            website: Some(self.website.clone()),
            logo: self.logo.clone(),
        }
    }

    pub fn validate_step(&self, step: Step) -> Result<(), OnboardingError> {
        let fields = step.fields();
        if fields.is_empty() {
            return Ok(());
        }
        let Err(errors) = self.request().validate() else {
            return Ok(());
        };

        let mut problems = Vec::new();
        for (field, errs) in errors.field_errors() {
            let field = field.to_string();
            if !fields.contains(&field.as_str()) {
                continue;
            }
            for err in errs.iter() {
                problems.push(FieldProblem {
                    field: field.clone(),
                    message: err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string()),
                });
            }
        }

        if problems.is_empty() {
            return Ok(());
        }
        problems.sort_by(|a, b| a.field.cmp(&b.field));
        Err(OnboardingError::InvalidStep { step, problems })
    }

    /// Create the organization, then invite every staged teammate at once.
    pub async fn submit<B>(&self, backend: &B) -> Result<OnboardingOutcome, OnboardingError>
    where
        B: OnboardingBackend + ?Sized,
    {
        if self.step != Step::Team {
            return Err(OnboardingError::NotReady);
        }
        self.validate_step(Step::Details)?;
        self.validate_step(Step::Branding)?;

        let organization = backend.create_organization(&self.request()).await?;
        let org_id = organization.id;

        let results = join_all(self.invites.iter().map(|staged| async move {
            let req = CreateInviteRequest {
                email: staged.email.clone(),
                role: staged.role,
            };
            (staged.email.clone(), backend.create_invite(org_id, &req).await)
        }))
        .await;

        let mut invited = Vec::new();
        let mut failed = Vec::new();
        for (email, result) in results {
            match result {
                Ok(invite) => invited.push(invite),
                Err(error) => {
                    tracing::warn!(%email, "Failed to send invite: {}", error);
                    failed.push(InviteFailure { email, error });
                }
            }
        }

        tracing::info!(
            organization_id = %org_id,
            invited = invited.len(),
            failed = failed.len(),
            "Onboarding complete"
        );

        Ok(OnboardingOutcome {
            organization,
            invited,
            failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> OnboardingForm {
        let mut form = OnboardingForm::new();
        form.set_details("Acme Events", "We run the best conferences in town.", "");
        form
    }

    #[test]
    fn details_must_be_valid_to_advance() {
        let mut form = OnboardingForm::new();
        form.set_details("A", "short", "not a url");

        match form.next() {
            Err(OnboardingError::InvalidStep { step, problems }) => {
                assert_eq!(step, Step::Details);
                let fields: Vec<&str> = problems.iter().map(|p| p.field.as_str()).collect();
                assert_eq!(fields, vec!["description", "name", "website"]);
            }
            other => panic!("expected invalid details, got {:?}", other),
        }
        assert_eq!(form.step(), Step::Details);
    }

    #[test]
    fn walks_through_all_steps() {
        let mut form = filled();
        assert_eq!(form.next().unwrap(), Step::Branding);
        assert_eq!(form.next().unwrap(), Step::Team);
        assert_eq!(form.step().number(), Step::COUNT);
        assert_eq!(form.back(), Step::Branding);
    }

    #[test]
    fn bad_logo_blocks_branding_step_only() {
        let mut form = filled();
        form.set_logo(Some("data:image/gif;base64,R0lGODlh".into()));
        assert_eq!(form.next().unwrap(), Step::Branding);
        assert!(matches!(
            form.next(),
            Err(OnboardingError::InvalidStep {
                step: Step::Branding,
                ..
            })
        ));
    }

    #[test]
    fn staging_rejects_malformed_and_duplicate_emails() {
        let mut form = filled();
        assert!(matches!(
            form.stage_invite("not-an-email"),
            Err(OnboardingError::InvalidEmail)
        ));
        form.stage_invite("alice@x.com").unwrap();
        assert!(matches!(
            form.stage_invite(" ALICE@x.com"),
            Err(OnboardingError::DuplicateInvite)
        ));
        form.stage_invite_as("bob@x.com", MemberRole::Admin).unwrap();
        assert_eq!(form.invites().len(), 2);

        assert!(form.remove_invite("alice@x.com"));
        assert!(!form.remove_invite("alice@x.com"));
        assert_eq!(form.invites()[0].role, MemberRole::Admin);
    }
}
