use std::borrow::Cow;

use base64::Engine;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::{Validate, ValidateUrl, ValidationError};

use super::member::OrganizationMember;

/// Decoded logo payloads larger than this are rejected.
pub const MAX_LOGO_BYTES: usize = 5 * 1024 * 1024;
const ACCEPTED_LOGO_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub website: Option<String>,
    pub logo: Option<String>,
    pub owner_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationWithMembers {
    #[serde(flatten)]
    pub organization: Organization,
    pub members: Vec<OrganizationMember>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(
        min = 2,
        max = 100,
        message = "Organization name must be between 2 and 100 characters"
    ))]
    #[serde(alias = "orgName")]
    pub name: String,
    #[validate(length(
        min = 10,
        max = 500,
        message = "Description must be between 10 and 500 characters"
    ))]
    pub description: String,
    #[validate(custom(function = "validate_website"))]
    pub website: Option<String>,
    #[validate(custom(function = "validate_logo"))]
    pub logo: Option<String>,
}

/// Store input for a new organization. The owner becomes its first ADMIN.
#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub name: String,
    pub description: String,
    pub website: Option<String>,
    pub logo: Option<String>,
    pub owner_id: Uuid,
}

impl CreateOrganizationRequest {
    /// Empty optional fields are stored as NULL.
    pub fn into_new(self, owner_id: Uuid) -> NewOrganization {
        NewOrganization {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            website: self.website.filter(|w| !w.trim().is_empty()),
            logo: self.logo.filter(|l| !l.is_empty()),
            owner_id,
        }
    }
}

fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// An empty website is allowed and means "none".
pub fn validate_website(website: &str) -> Result<(), ValidationError> {
    if website.trim().is_empty() || website.trim().validate_url() {
        return Ok(());
    }
    Err(validation_error("url", "Please enter a valid URL"))
}

/// Logos travel as `data:image/<type>;base64,<payload>` URIs.
pub fn validate_logo(logo: &str) -> Result<(), ValidationError> {
    if logo.is_empty() {
        return Ok(());
    }

    let (header, payload) = logo
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| validation_error("logo_format", "Logo must be a base64 data URI"))?;

    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| validation_error("logo_format", "Logo must be a base64 data URI"))?
        .to_ascii_lowercase();

    if !ACCEPTED_LOGO_TYPES.contains(&mime.as_str()) {
        return Err(validation_error(
            "logo_type",
            "Logo must be a JPEG, PNG or WebP image",
        ));
    }

    if base64::decoded_len_estimate(payload.len()) > MAX_LOGO_BYTES + 3 {
        return Err(validation_error("logo_size", "Logo must be 5MB or smaller"));
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|_| validation_error("logo_encoding", "Logo is not valid base64"))?;

    if bytes.len() > MAX_LOGO_BYTES {
        return Err(validation_error("logo_size", "Logo must be 5MB or smaller"));
    }

    Ok(())
}
