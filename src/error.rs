use thiserror::Error;

/// Failure taxonomy for mail dispatch.
///
/// Every transport-level failure is folded into one of these variants with a
/// human-readable cause; no underlying transport error type leaks to callers.
#[derive(Debug, Error)]
pub enum MailError {
    /// A required configuration value was absent or unusable at startup.
    #[error("missing configuration: {0}")]
    ConfigurationMissing(String),

    /// The message itself could not be built or addressed.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// The transport could not be reached: connection, DNS or timeout failure.
    #[error("mail transport unreachable: {0}")]
    TransportUnreachable(String),

    /// The provider answered but refused the message or the credentials.
    #[error("mail transport rejected the message: {0}")]
    TransportRejected(String),
}
