use std::sync::Arc;

use lectern::platform::{MailConfig, MailProviderType};
use lectern_types::Result;

#[cfg(feature = "smtp")]
mod smtp;
pub mod templates;

#[cfg(feature = "smtp")]
pub use smtp::SmtpMailClient;

#[derive(Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_html: Option<String>,
    pub body_text: Option<String>,
}

#[async_trait::async_trait]
pub trait MailClient: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<()>;
    fn from_email(&self) -> &str;
    fn from_name(&self) -> &str;
}

pub type DynMailClient = Arc<dyn MailClient>;

pub async fn create_mail_client(config: &MailConfig) -> Result<DynMailClient> {
    match config.provider {
        MailProviderType::Smtp => {
            #[cfg(feature = "smtp")]
            {
                let smtp_settings = config.smtp.as_ref().ok_or_else(|| {
                    lectern_types::anyhow!("SMTP settings required for SMTP provider")
                })?;
                let client = SmtpMailClient::new(config, smtp_settings)?;
                Ok(Arc::new(client))
            }
            #[cfg(not(feature = "smtp"))]
            {
                Err(lectern_types::anyhow!("SMTP feature not enabled"))
            }
        }
    }
}
