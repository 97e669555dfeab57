// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;

use actix_web::http::header;
use lettre::message::{Mailbox, Message, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters, TlsVersion};
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use serde::Serialize;
use tracing::debug;

use crate::config::{HttpApiConfig, SmtpConfig};
use crate::error::MailError;
use crate::message::EmailMessage;

/// Opaque acknowledgment returned by a transport after a successful hand-off.
/// The provider-assigned identifier is surfaced when the provider returns one.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReceipt {
    pub provider_id: Option<String>,
    pub detail: String,
}

/// TLS mode for an SMTP session, derived from the port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// TLS from connection start (SMTPS).
    Implicit,
    /// Plaintext connection upgraded via STARTTLS.
    StartTls,
}

/// Port 465 is the SMTPS port; everything else must upgrade with STARTTLS.
pub fn tls_mode_for_port(port: u16) -> TlsMode {
    if port == 465 {
        TlsMode::Implicit
    } else {
        TlsMode::StartTls
    }
}

/// The delivery mechanism behind the dispatcher, selected once at startup.
pub enum MailTransport {
    HttpApi(HttpApiTransport),
    Smtp(SmtpMailer),
}

impl MailTransport {
    pub fn kind(&self) -> &'static str {
        match self {
            MailTransport::HttpApi(_) => "http-api",
            MailTransport::Smtp(_) => "smtp",
        }
    }

    /// Submit a message as `sender`. One best-effort attempt, no retry.
    pub async fn submit(
        &self,
        sender: &str,
        message: &EmailMessage,
    ) -> Result<DeliveryReceipt, MailError> {
        match self {
            MailTransport::HttpApi(transport) => transport.submit(sender, message).await,
            MailTransport::Smtp(transport) => transport.submit(sender, message).await,
        }
    }
}

/// Wire payload for the hosted mail API: `{from, to, subject, html|text}`.
#[derive(Debug, Serialize)]
struct OutboundEmail<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

/// Hosted HTTP mail API transport: a single bearer-authenticated POST with a
/// bounded deadline. Any non-success response or network failure is terminal
/// for the call.
pub struct HttpApiTransport {
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl HttpApiTransport {
    pub fn new(config: HttpApiConfig, timeout: Duration) -> Self {
        Self {
            endpoint: config.endpoint,
            api_key: config.api_key,
            timeout,
        }
    }

    pub async fn submit(
        &self,
        sender: &str,
        message: &EmailMessage,
    ) -> Result<DeliveryReceipt, MailError> {
        let payload = OutboundEmail {
            from: sender,
            to: &message.recipient,
            subject: &message.subject,
            html: message.body_is_html.then_some(message.body.as_str()),
            text: (!message.body_is_html).then_some(message.body.as_str()),
        };

        // The client timeout bounds the whole request; the connector timeout
        // bounds connection setup within it.
        let connector = awc::Connector::new().timeout(self.timeout);
        let client = awc::ClientBuilder::new()
            .timeout(self.timeout)
            .connector(connector)
            .finish();

        debug!(endpoint = %self.endpoint, "posting email to mail API");

        let mut response = client
            .post(self.endpoint.as_str())
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", self.api_key)))
            .send_json(&payload)
            .await
            .map_err(|e| MailError::TransportUnreachable(e.to_string()))?;

        let status = response.status();
        let body = response.body().await.unwrap_or_default();

        if !status.is_success() {
            return Err(MailError::TransportRejected(provider_error_detail(
                status.as_u16(),
                &body,
            )));
        }

        let parsed: Option<serde_json::Value> = serde_json::from_slice(&body).ok();
        let provider_id = parsed
            .as_ref()
            .and_then(|v| v.get("id"))
            .and_then(|v| v.as_str())
            .map(str::to_owned);
        let detail = parsed
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(|v| v.as_str())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("accepted with status {}", status.as_u16()));

        Ok(DeliveryReceipt {
            provider_id,
            detail,
        })
    }
}

/// Prefer the provider's own error message when the body is JSON, then the
/// raw body, then the bare status code.
fn provider_error_detail(status: u16, body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            return format!("{} (status {})", message, status);
        }
    }
    match std::str::from_utf8(body) {
        Ok(text) if !text.trim().is_empty() => format!("{} (status {})", text.trim(), status),
        _ => format!("provider returned status {}", status),
    }
}

/// SMTP transport over a long-lived, internally pooled connection. The pool
/// closes its sockets when the mailer is dropped at shutdown.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, timeout: Duration) -> Result<Self, MailError> {
        let mode = tls_mode_for_port(config.port);

        let builder = match mode {
            TlsMode::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host),
            TlsMode::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            }
        }
        .map_err(|e| {
            MailError::TransportUnreachable(format!("failed to create SMTP transport: {}", e))
        })?;

        // Minimum TLS 1.2 in both modes; certificate verification stays on
        // unless explicitly opted out.
        let tls_parameters = TlsParameters::builder(config.host.clone())
            .set_min_tls_version(TlsVersion::Tlsv12)
            .dangerous_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| {
                MailError::TransportUnreachable(format!("failed to set up TLS: {}", e))
            })?;
        let tls = match mode {
            TlsMode::Implicit => Tls::Wrapper(tls_parameters),
            TlsMode::StartTls => Tls::Required(tls_parameters),
        };

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(timeout))
            .tls(tls)
            .build();

        Ok(Self { transport })
    }

    pub async fn submit(
        &self,
        sender: &str,
        message: &EmailMessage,
    ) -> Result<DeliveryReceipt, MailError> {
        let email = compose(sender, message)?;

        debug!(recipient = %message.recipient, "submitting email over SMTP");

        let response = self.transport.send(email).await.map_err(smtp_error)?;

        let detail = response
            .first_line()
            .map(str::to_owned)
            .unwrap_or_else(|| response.code().to_string());

        Ok(DeliveryReceipt {
            provider_id: None,
            detail,
        })
    }
}

/// Build the RFC 5322 message for SMTP submission.
pub fn compose(sender: &str, message: &EmailMessage) -> Result<Message, MailError> {
    let content_type = if message.body_is_html {
        ContentType::TEXT_HTML
    } else {
        ContentType::TEXT_PLAIN
    };

    Message::builder()
        .from(sender.parse::<Mailbox>().map_err(|e| {
            MailError::InvalidMessage(format!("invalid sender address '{}': {}", sender, e))
        })?)
        .to(message.recipient.parse::<Mailbox>().map_err(|e| {
            MailError::InvalidMessage(format!(
                "invalid recipient address '{}': {}",
                message.recipient, e
            ))
        })?)
        .subject(&message.subject)
        .header(content_type)
        .body(message.body.clone())
        .map_err(|e| MailError::InvalidMessage(format!("failed to build email: {}", e)))
}

/// A server reply (permanent or transient) means the provider rejected us;
/// anything else never got an answer.
fn smtp_error(error: lettre::transport::smtp::Error) -> MailError {
    if error.is_permanent() || error.is_transient() {
        MailError::TransportRejected(error.to_string())
    } else {
        MailError::TransportUnreachable(error.to_string())
    }
}
