use async_trait::async_trait;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::OnboardingBackend;
use crate::{
    auth::Session,
    models::{
        invite::{
            AcceptInviteResponse, CreateInviteRequest, CreatedInvite, InviteValidation,
            OrganizationInvite,
        },
        organization::{CreateOrganizationRequest, Organization},
    },
};

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },
}

impl ClientError {
    /// HTTP status of an API-level failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

/// Thin HTTP client for the organization and invite endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Attach the session token issued by the auth service.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| body["error"].as_str().map(str::to_string))
                .unwrap_or_else(|| status.to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json().await?)
    }

    pub async fn session(&self) -> Result<Session, ClientError> {
        self.send(self.http.get(self.url("/api/session"))).await
    }

    pub async fn create_organization(
        &self,
        req: &CreateOrganizationRequest,
    ) -> Result<Organization, ClientError> {
        self.send(self.http.post(self.url("/api/organizations")).json(req))
            .await
    }

    pub async fn create_invite(
        &self,
        org_id: Uuid,
        req: &CreateInviteRequest,
    ) -> Result<CreatedInvite, ClientError> {
        let url = self.url(&format!("/api/organizations/{}/invites", org_id));
        self.send(self.http.post(url).json(req)).await
    }

    pub async fn list_invites(&self, org_id: Uuid) -> Result<Vec<OrganizationInvite>, ClientError> {
        let url = self.url(&format!("/api/organizations/{}/invites", org_id));
        self.send(self.http.get(url)).await
    }

    pub async fn validate_invite(&self, token: &str) -> Result<InviteValidation, ClientError> {
        let url = self.url(&format!("/api/organizations/invites/{}/validate", token));
        self.send(self.http.get(url)).await
    }

    pub async fn accept_invite(
        &self,
        org_id: Uuid,
        token: &str,
    ) -> Result<AcceptInviteResponse, ClientError> {
        let url = self.url(&format!("/api/organizations/{}/invites/{}", org_id, token));
        self.send(self.http.post(url)).await
    }
}

#[async_trait]
impl OnboardingBackend for ApiClient {
    async fn create_organization(
        &self,
        req: &CreateOrganizationRequest,
    ) -> Result<Organization, ClientError> {
        ApiClient::create_organization(self, req).await
    }

    async fn create_invite(
        &self,
        org_id: Uuid,
        req: &CreateInviteRequest,
    ) -> Result<CreatedInvite, ClientError> {
        ApiClient::create_invite(self, org_id, req).await
    }
}
