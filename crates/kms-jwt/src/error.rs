use crate::signing::KmsError;

/// Errors returned by signing methods, the parser and the registry.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// The key handed to a signing method has the wrong shape for it.
    #[error("key is invalid")]
    InvalidKey,
    /// A KMS context was supplied without an attached [`KmsConfig`](crate::signing::KmsConfig).
    #[error("kms configuration is missing from context")]
    MissingConfig,
    /// The remote signer failed. Never retried at this layer.
    #[error("kms operation failed: {0}")]
    Remote(#[from] KmsError),
    #[error("signature is invalid")]
    SignatureInvalid,
    #[error("token is malformed: {0}")]
    Malformed(String),
    #[error("signing method {0} is not registered")]
    UnknownAlgorithm(String),
    #[error("unexpected signing method: {0}")]
    UnexpectedAlgorithm(String),
    #[error("failed to parse key: {0}")]
    KeyParse(String),
    #[error("cryptographic operation failed: {0}")]
    Crypto(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
