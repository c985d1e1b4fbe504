//! Workflow outcome emails via SMTP.
//!
//! [`EmailDelivery`] wraps the `lettre` async SMTP transport to send
//! plain-text emails to a document's submitter. Configuration is loaded from
//! environment variables; if `SMTP_HOST` is not set, [`EmailConfig::from_env`]
//! returns `None` and the engine is wired with a
//! [`NullNotifier`](signoff_engine::NullNotifier) instead.

use async_trait::async_trait;
use signoff_db::models::document::Document;
use signoff_db::models::organization::User;
use signoff_db::repositories::MembershipRepo;
use signoff_db::DbPool;
use signoff_engine::Notifier;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// The recipient could not be resolved from the database.
    #[error("Recipient lookup failed: {0}")]
    Recipient(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@signoff.local";

/// Default frontend base URL for resubmission links.
const DEFAULT_APP_BASE_URL: &str = "http://localhost:5173";

/// Configuration for the SMTP email delivery service.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
    /// Frontend base URL used to build resubmission links.
    pub app_base_url: String,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured and should be skipped.
    ///
    /// | Variable        | Required | Default                   |
    /// |-----------------|----------|---------------------------|
    /// | `SMTP_HOST`     | yes      | --                        |
    /// | `SMTP_PORT`     | no       | `587`                     |
    /// | `SMTP_FROM`     | no       | `noreply@signoff.local`   |
    /// | `SMTP_USER`     | no       | --                        |
    /// | `SMTP_PASSWORD` | no       | --                        |
    /// | `APP_BASE_URL`  | no       | `http://localhost:5173`   |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            app_base_url: std::env::var("APP_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_APP_BASE_URL.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

/// Sends plain-text emails via SMTP.
pub struct EmailDelivery {
    config: EmailConfig,
}

impl EmailDelivery {
    /// Create a new email delivery service with the given configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Send one plain-text message.
    pub async fn deliver(
        &self,
        to_email: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        use lettre::{
            message::header::ContentType, transport::smtp::authentication::Credentials,
            AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
        };

        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(to_email.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| EmailError::Build(e.to_string()))?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(email).await?;

        tracing::info!(to = to_email, subject, "Notification email sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EmailNotifier
// ---------------------------------------------------------------------------

/// SMTP-backed implementation of the engine's [`Notifier`] port.
///
/// Emails go to the document's submitter. Errors are returned as strings so
/// the engine can log them without coupling to lettre's error types.
pub struct EmailNotifier {
    pool: DbPool,
    delivery: EmailDelivery,
    app_base_url: String,
}

impl EmailNotifier {
    pub fn new(pool: DbPool, config: EmailConfig) -> Self {
        let app_base_url = config.app_base_url.clone();
        Self {
            pool,
            delivery: EmailDelivery::new(config),
            app_base_url,
        }
    }

    async fn submitter_email(&self, document: &Document) -> Result<String, EmailError> {
        let user = MembershipRepo::find_user(&self.pool, document.created_by)
            .await
            .map_err(|e| EmailError::Recipient(e.to_string()))?
            .ok_or_else(|| {
                EmailError::Recipient(format!("submitter {} not found", document.created_by))
            })?;
        Ok(user.email)
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send_approval_email(&self, document: &Document) -> Result<(), String> {
        let run = async {
            let to = self.submitter_email(document).await?;
            let subject = format!("[Signoff] \"{}\" was approved", document.title);
            let body = format!(
                "Your document \"{}\" completed its approval workflow and has been signed.\n\n\
                 View it at {}/documents/{}",
                document.title, self.app_base_url, document.id
            );
            self.delivery.deliver(&to, &subject, &body).await
        };
        run.await.map_err(|e: EmailError| e.to_string())
    }

    async fn send_rejection_email(
        &self,
        document: &Document,
        reason: Option<&str>,
        rejected_by: &User,
    ) -> Result<(), String> {
        let run = async {
            let to = self.submitter_email(document).await?;
            let subject = format!("[Signoff] \"{}\" was rejected", document.title);
            let body = format!(
                "Your document \"{}\" was rejected by {}.\n\
                 Reason: {}\n\n\
                 You can revise and resubmit it at {}/documents/{}/resubmit",
                document.title,
                rejected_by.display_name,
                reason.unwrap_or("(no reason given)"),
                self.app_base_url,
                document.id
            );
            self.delivery.deliver(&to, &subject, &body).await
        };
        run.await.map_err(|e: EmailError| e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
