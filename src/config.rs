use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::MailError;

/// Environment variable names for the mailer configuration
pub const MAIL_API_URL_ENV: &str = "MAIL_API_URL";
pub const MAIL_API_KEY_ENV: &str = "MAIL_API_KEY";
pub const FROM_NAME_ENV: &str = "FROM_NAME";
pub const FROM_EMAIL_ENV: &str = "FROM_EMAIL";
pub const SMTP_HOST_ENV: &str = "SMTP_HOST";
pub const SMTP_PORT_ENV: &str = "SMTP_PORT";
pub const SMTP_USER_ENV: &str = "SMTP_USER";
pub const SMTP_PASS_ENV: &str = "SMTP_PASS";
pub const TRANSPORT_ENV: &str = "MAILGATE_TRANSPORT";
pub const FROM_LOCAL_PART_ENV: &str = "MAILGATE_FROM_LOCAL_PART";
pub const SEND_TIMEOUT_MS_ENV: &str = "MAILGATE_SEND_TIMEOUT_MS";
pub const ACCEPT_INVALID_CERTS_ENV: &str = "MAILGATE_SMTP_ACCEPT_INVALID_CERTS";

/// Default values
pub const DEFAULT_FROM_LOCAL_PART: &str = "shop";
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// The identity emails are sent as. The composed mailbox is
/// `"{display_name} <{local_part}@{domain}>"`; the local part is
/// configuration, not a hardcoded literal, since it varies by deployment.
#[derive(Debug, Clone, Deserialize)]
pub struct SenderIdentity {
    pub display_name: String,
    #[serde(default = "default_local_part")]
    pub local_part: String,
    pub domain: String,
}

fn default_local_part() -> String {
    DEFAULT_FROM_LOCAL_PART.to_string()
}

impl SenderIdentity {
    /// Compose the full sender mailbox, e.g. `Acme <shop@example.com>`.
    pub fn mailbox(&self) -> String {
        format!("{} <{}@{}>", self.display_name, self.local_part, self.domain)
    }
}

/// Transport selection, resolved once at configuration load.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TransportConfig {
    HttpApi(HttpApiConfig),
    Smtp(SmtpConfig),
}

/// Hosted HTTP mail API: a single POST with a bearer token.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpApiConfig {
    pub endpoint: String,
    pub api_key: String,
}

/// Direct SMTP submission. Port 465 implies TLS from connection start;
/// any other port requires STARTTLS.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Skip server certificate verification. Explicit opt-in only.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

/// Process-wide mailer configuration: read once at startup, never mutated.
#[derive(Debug, Clone, Deserialize)]
pub struct MailerConfig {
    pub sender: SenderIdentity,
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    pub transport: TransportConfig,
}

fn default_send_timeout_ms() -> u64 {
    DEFAULT_SEND_TIMEOUT_MS
}

impl MailerConfig {
    /// The per-attempt deadline applied to both transport variants.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    /// Load configuration from the process environment.
    ///
    /// `MAILGATE_TRANSPORT` selects the transport explicitly; otherwise the
    /// presence of `MAIL_API_URL` selects the HTTP API and the presence of
    /// `SMTP_HOST` selects SMTP.
    pub fn from_env() -> Result<Self, MailError> {
        let sender = SenderIdentity {
            display_name: require_env(FROM_NAME_ENV)?,
            local_part: std::env::var(FROM_LOCAL_PART_ENV)
                .unwrap_or_else(|_| DEFAULT_FROM_LOCAL_PART.to_string()),
            domain: require_env(FROM_EMAIL_ENV)?,
        };

        let send_timeout_ms = std::env::var(SEND_TIMEOUT_MS_ENV)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SEND_TIMEOUT_MS);

        let transport = match transport_kind_from_env()? {
            TransportKind::HttpApi => TransportConfig::HttpApi(HttpApiConfig {
                endpoint: require_env(MAIL_API_URL_ENV)?,
                api_key: require_env(MAIL_API_KEY_ENV)?,
            }),
            TransportKind::Smtp => TransportConfig::Smtp(SmtpConfig {
                host: require_env(SMTP_HOST_ENV)?,
                port: std::env::var(SMTP_PORT_ENV)
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_SMTP_PORT),
                username: require_env(SMTP_USER_ENV)?,
                password: require_env(SMTP_PASS_ENV)?,
                accept_invalid_certs: env_flag(ACCEPT_INVALID_CERTS_ENV),
            }),
        };

        Ok(Self {
            sender,
            send_timeout_ms,
            transport,
        })
    }

    /// Parse configuration from a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, MailError> {
        toml::from_str(raw)
            .map_err(|e| MailError::ConfigurationMissing(format!("invalid config file: {}", e)))
    }

    /// Load configuration from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, MailError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            MailError::ConfigurationMissing(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransportKind {
    HttpApi,
    Smtp,
}

fn transport_kind_from_env() -> Result<TransportKind, MailError> {
    if let Ok(kind) = std::env::var(TRANSPORT_ENV) {
        return match kind.to_lowercase().as_str() {
            "http-api" | "http_api" | "http" => Ok(TransportKind::HttpApi),
            "smtp" => Ok(TransportKind::Smtp),
            other => Err(MailError::ConfigurationMissing(format!(
                "unknown transport kind '{}' in {}",
                other, TRANSPORT_ENV
            ))),
        };
    }

    if std::env::var(MAIL_API_URL_ENV).is_ok() {
        Ok(TransportKind::HttpApi)
    } else if std::env::var(SMTP_HOST_ENV).is_ok() {
        Ok(TransportKind::Smtp)
    } else {
        Err(MailError::ConfigurationMissing(format!(
            "set {} or {} to select a mail transport",
            MAIL_API_URL_ENV, SMTP_HOST_ENV
        )))
    }
}

fn require_env(name: &str) -> Result<String, MailError> {
    std::env::var(name)
        .map_err(|_| MailError::ConfigurationMissing(format!("{} env var not set", name)))
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.as_str(), "true" | "1" | "yes" | "on"))
        .unwrap_or(false)
}
