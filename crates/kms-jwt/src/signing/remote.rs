use async_trait::async_trait;

use super::{Algorithm, KmsContext};

/// Errors reported by a [`RemoteSigner`].
#[derive(Debug, thiserror::Error)]
pub enum KmsError {
    #[error("key version not found: {0}")]
    KeyNotFound(String),
    #[error("permission denied on {0}")]
    PermissionDenied(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("key version {key_version} does not support {algorithm}")]
    UnsupportedAlgorithm {
        key_version: String,
        algorithm: Algorithm,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// SPKI PEM public key as returned by a key-management service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyPem(pub String);

/// A key-management service that signs digests with keys it never reveals.
///
/// Implementations own transport, credentials and retries. The context is the
/// caller's own; implementations should stop work once it is cancelled.
#[async_trait]
pub trait RemoteSigner: Send + Sync {
    /// Signs a precomputed digest. ECDSA signatures are returned DER-encoded.
    async fn sign(
        &self,
        ctx: &KmsContext,
        key_version: &str,
        digest: &[u8],
        algorithm: Algorithm,
    ) -> Result<Vec<u8>, KmsError>;

    async fn public_key(&self, ctx: &KmsContext, key_version: &str)
    -> Result<PublicKeyPem, KmsError>;
}
