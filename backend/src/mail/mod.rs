//! Invite notifications.
//!
//! - `SmtpMailer` delivers through an SMTP relay using lettre
//! - `LogMailer` only writes a log line (local development)

pub mod log;
pub mod smtp;

use async_trait::async_trait;
use html_escape::{encode_double_quoted_attribute, encode_text};

pub use self::log::LogMailer;
pub use self::smtp::SmtpMailer;

#[derive(thiserror::Error, Debug)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("delivery rejected: {0}")]
    Rejected(String),
}

/// Everything needed to tell someone they have been invited.
#[derive(Debug, Clone, PartialEq)]
pub struct InviteEmail {
    pub to_email: String,
    pub organization_name: String,
    pub organization_logo: Option<String>,
    pub sender_name: String,
    pub sender_email: String,
    pub invite_token: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_invite(&self, email: &InviteEmail) -> Result<(), MailError>;
}

impl InviteEmail {
    /// Acceptance page in the web app.
    pub fn invite_url(&self, base_url: &str) -> String {
        format!("{}/invite/{}", base_url.trim_end_matches('/'), self.invite_token)
    }

    pub fn subject(&self) -> String {
        format!("Join {} on Events Palour", self.organization_name)
    }

    pub fn text_body(&self, base_url: &str) -> String {
        format!(
            "Hello {to},\n\n\
             {sender} ({sender_email}) has invited you to join {org} on Events Palour.\n\n\
             Accept the invitation: {url}\n\n\
             This invitation expires in 7 days. \
             If you were not expecting it, you can ignore this email.\n",
            to = self.to_email,
            sender = self.sender_name,
            sender_email = self.sender_email,
            org = self.organization_name,
            url = self.invite_url(base_url),
        )
    }

    pub fn html_body(&self, base_url: &str) -> String {
        let logo = self
            .organization_logo
            .as_deref()
            .map(|src| {
                format!(
                    r#"<img src="{}" alt="{}" width="80" height="80" style="border-radius:8px" />"#,
                    encode_double_quoted_attribute(src),
                    encode_double_quoted_attribute(&self.organization_name)
                )
            })
            .unwrap_or_default();

        let url = self.invite_url(base_url);

        format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family:sans-serif;background:#f6f9fc;padding:24px">
  <div style="max-width:480px;margin:0 auto;background:#ffffff;padding:32px;border-radius:8px">
    {logo}
    <h1 style="font-size:20px">Join <strong>{org}</strong> on Events Palour</h1>
    <p>Hello {to},</p>
    <p><strong>{sender}</strong> (<a href="mailto:{sender_email_attr}">{sender_email}</a>) has invited you to join <strong>{org}</strong>.</p>
    <p><a href="{url_attr}" style="display:inline-block;background:#000000;color:#ffffff;padding:12px 20px;border-radius:6px;text-decoration:none">Join the team</a></p>
    <p style="color:#666666;font-size:12px">or copy and paste this URL into your browser: {url}</p>
    <p style="color:#666666;font-size:12px">This invitation expires in 7 days.</p>
  </div>
</body>
</html>"#,
            logo = logo,
            org = encode_text(&self.organization_name),
            to = encode_text(&self.to_email),
            sender = encode_text(&self.sender_name),
            sender_email = encode_text(&self.sender_email),
            sender_email_attr = encode_double_quoted_attribute(&self.sender_email),
            url = encode_text(&url),
            url_attr = encode_double_quoted_attribute(&url),
        )
    }
}
