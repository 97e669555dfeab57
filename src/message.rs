use serde::{Deserialize, Serialize};

/// A single outbound email, immutable once constructed.
///
/// The dispatcher performs no content validation beyond requiring a
/// non-empty recipient; subject and body are passed through as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    /// Whether the body is HTML. Transactional mail defaults to HTML.
    #[serde(default = "default_body_is_html")]
    pub body_is_html: bool,
}

fn default_body_is_html() -> bool {
    true
}

impl EmailMessage {
    /// Create a message with an HTML body.
    pub fn html(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
            body_is_html: true,
        }
    }

    /// Create a message with a plain-text body.
    pub fn text(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
            body_is_html: false,
        }
    }
}
