use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::{MailerConfig, TransportConfig};
use crate::error::MailError;
use crate::message::EmailMessage;
use crate::transport::{DeliveryReceipt, HttpApiTransport, MailTransport, SmtpMailer};

/// The mail dispatcher: one sender identity, one transport, no state between
/// calls. Built once at startup and shared for the process lifetime; `send`
/// supports unbounded concurrent invocation.
pub struct MailDispatcher {
    sender: String,
    transport: MailTransport,
}

impl MailDispatcher {
    /// Build the dispatcher from resolved configuration. For the SMTP
    /// variant this also creates the pooled transport; its sockets are
    /// closed when the dispatcher is dropped at shutdown.
    pub fn from_config(config: &MailerConfig) -> Result<Self, MailError> {
        let sender = config.sender.mailbox();
        let timeout = config.timeout();

        let transport = match &config.transport {
            TransportConfig::HttpApi(http) => {
                MailTransport::HttpApi(HttpApiTransport::new(http.clone(), timeout))
            }
            TransportConfig::Smtp(smtp) => MailTransport::Smtp(SmtpMailer::new(smtp, timeout)?),
        };

        Ok(Self { sender, transport })
    }

    /// The composed sender mailbox, e.g. `Acme <shop@example.com>`.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn transport_kind(&self) -> &'static str {
        self.transport.kind()
    }

    /// Deliver one message: a single best-effort attempt against the
    /// configured transport, bounded by the configured deadline. Callers
    /// needing reliability implement retry themselves.
    #[instrument(skip(self, message), fields(recipient = %message.recipient, transport = self.transport.kind()))]
    pub async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, MailError> {
        if message.recipient.trim().is_empty() {
            return Err(MailError::InvalidMessage(
                "recipient must not be empty".to_string(),
            ));
        }

        let dispatch_id = Uuid::new_v4();
        info!(dispatch_id = %dispatch_id, "submitting email to {}", message.recipient);

        match self.transport.submit(&self.sender, message).await {
            Ok(receipt) => {
                info!(
                    dispatch_id = %dispatch_id,
                    provider_id = receipt.provider_id.as_deref().unwrap_or("-"),
                    "email accepted by transport"
                );
                Ok(receipt)
            }
            Err(error) => {
                warn!(dispatch_id = %dispatch_id, error = %error, "email delivery failed");
                Err(error)
            }
        }
    }
}
