use async_trait::async_trait;

use super::{InviteEmail, MailError, Mailer};

/// Writes invites to the log instead of sending them. The acceptance link is
/// only logged at debug level since it carries the invite token.
#[derive(Debug, Clone)]
pub struct LogMailer {
    base_url: String,
}

impl LogMailer {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_invite(&self, email: &InviteEmail) -> Result<(), MailError> {
        tracing::info!(
            to = %email.to_email,
            subject = %email.subject(),
            "Invite email (not delivered, SMTP not configured)"
        );
        tracing::debug!(url = %email.invite_url(&self.base_url), "Invite link");
        Ok(())
    }
}
