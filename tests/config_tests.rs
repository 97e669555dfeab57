// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;

use mailgate::config::{
    DEFAULT_SEND_TIMEOUT_MS, MailerConfig, SenderIdentity, SmtpConfig, TransportConfig,
};
use mailgate::dispatch::MailDispatcher;
use mailgate::error::MailError;
use mailgate::message::EmailMessage;
use mailgate::transport::{SmtpMailer, TlsMode, compose, tls_mode_for_port};

fn sender(display_name: &str, local_part: &str, domain: &str) -> SenderIdentity {
    SenderIdentity {
        display_name: display_name.to_string(),
        local_part: local_part.to_string(),
        domain: domain.to_string(),
    }
}

#[test]
fn test_sender_mailbox_composition() {
    let identity = sender("Acme", "shop", "example.com");
    assert_eq!(identity.mailbox(), "Acme <shop@example.com>");

    // The local part is configuration, not a fixed literal
    let identity = sender("Okoli Shop", "okoli", "okoli.example");
    assert_eq!(identity.mailbox(), "Okoli Shop <okoli@okoli.example>");
}

#[test]
fn test_tls_mode_selection() {
    // 465 is SMTPS; everything else upgrades via STARTTLS
    assert_eq!(tls_mode_for_port(465), TlsMode::Implicit);
    assert_eq!(tls_mode_for_port(587), TlsMode::StartTls);
    assert_eq!(tls_mode_for_port(2525), TlsMode::StartTls);
}

#[test]
fn test_toml_config_smtp() {
    let raw = r#"
        [sender]
        display_name = "Acme"
        domain = "example.com"

        [transport]
        kind = "smtp"
        host = "smtp.example.com"
        username = "mailer"
        password = "hunter2"
    "#;

    let config = MailerConfig::from_toml_str(raw).unwrap();
    assert_eq!(config.sender.mailbox(), "Acme <shop@example.com>");
    assert_eq!(config.timeout(), Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS));

    match &config.transport {
        TransportConfig::Smtp(smtp) => {
            assert_eq!(smtp.host, "smtp.example.com");
            assert_eq!(smtp.port, 587);
            assert!(!smtp.accept_invalid_certs);
        }
        other => panic!("expected SMTP transport, got {:?}", other),
    }
}

#[test]
fn test_toml_config_http_api() {
    let raw = r#"
        send_timeout_ms = 5000

        [sender]
        display_name = "Acme"
        local_part = "orders"
        domain = "example.com"

        [transport]
        kind = "http-api"
        endpoint = "https://mail.example.com/v1/send"
        api_key = "secret"
    "#;

    let config = MailerConfig::from_toml_str(raw).unwrap();
    assert_eq!(config.timeout(), Duration::from_millis(5000));
    assert_eq!(config.sender.mailbox(), "Acme <orders@example.com>");

    match &config.transport {
        TransportConfig::HttpApi(http) => {
            assert_eq!(http.endpoint, "https://mail.example.com/v1/send");
            assert_eq!(http.api_key, "secret");
        }
        other => panic!("expected HTTP API transport, got {:?}", other),
    }
}

#[test]
fn test_invalid_toml_is_a_configuration_error() {
    let result = MailerConfig::from_toml_str("not really toml = ");
    assert!(matches!(result, Err(MailError::ConfigurationMissing(_))));
}

#[test]
fn test_message_body_defaults_to_html() {
    let message: EmailMessage = serde_json::from_str(
        r#"{ "recipient": "a@example.com", "subject": "Hi", "body": "<p>Hi</p>" }"#,
    )
    .unwrap();
    assert!(message.body_is_html);

    let message = EmailMessage::text("a@example.com", "Hi", "Hi");
    assert!(!message.body_is_html);
}

#[test]
fn test_compose_builds_rfc5322_message() {
    let message = EmailMessage::html("customer@example.com", "Your order", "<p>Shipped!</p>");
    assert!(compose("Acme <shop@example.com>", &message).is_ok());
}

#[test]
fn test_compose_rejects_bad_addresses() {
    let message = EmailMessage::html("not an address", "Hi", "<p>Hi</p>");
    let result = compose("Acme <shop@example.com>", &message);
    assert!(matches!(result, Err(MailError::InvalidMessage(_))));

    let message = EmailMessage::html("customer@example.com", "Hi", "<p>Hi</p>");
    let result = compose("not a mailbox", &message);
    assert!(matches!(result, Err(MailError::InvalidMessage(_))));
}

fn smtp_config(port: u16, accept_invalid_certs: bool) -> SmtpConfig {
    SmtpConfig {
        host: "smtp.example.com".to_string(),
        port,
        username: "mailer".to_string(),
        password: "hunter2".to_string(),
        accept_invalid_certs,
    }
}

#[actix_web::test]
async fn test_smtp_mailer_builds_for_both_tls_modes() {
    // Construction only; nothing connects until a send
    for port in [465, 587] {
        assert!(SmtpMailer::new(&smtp_config(port, false), Duration::from_secs(15)).is_ok());
    }

    // Self-signed opt-in still constructs
    assert!(SmtpMailer::new(&smtp_config(587, true), Duration::from_secs(15)).is_ok());
}

#[actix_web::test]
async fn test_dispatcher_from_smtp_config() {
    let config = MailerConfig {
        sender: sender("Acme", "shop", "example.com"),
        send_timeout_ms: 15_000,
        transport: TransportConfig::Smtp(smtp_config(465, false)),
    };

    let dispatcher = MailDispatcher::from_config(&config).unwrap();
    assert_eq!(dispatcher.transport_kind(), "smtp");
    assert_eq!(dispatcher.sender(), "Acme <shop@example.com>");
}

#[test]
fn test_smtp_config_default_port() {
    let raw = r#"
        host = "smtp.example.com"
        username = "mailer"
        password = "hunter2"
    "#;
    let smtp: SmtpConfig = toml::from_str(raw).unwrap();
    assert_eq!(smtp.port, 587);
    assert!(!smtp.accept_invalid_certs);
}
