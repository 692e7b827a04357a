use async_trait::async_trait;

use super::KmsContext;
use crate::error::JwtError;

/// What a caller hands a signing method in the key position.
#[derive(Debug, Clone)]
pub enum KeyMaterial {
    /// In-process key bytes: a PKCS#8 private key for signing, an SPKI public
    /// key for verification, both PEM-encoded.
    Pem(String),
    /// An execution context carrying the remote key to use.
    Kms(KmsContext),
}

/// Produces and checks JWS signatures for one `alg` value.
///
/// Signatures cross this boundary base64url-encoded without padding, the way
/// they appear as the third segment of a compact token.
#[async_trait]
pub trait SigningMethod: Send + Sync {
    fn alg(&self) -> &str;

    async fn sign(&self, signing_string: &str, key: &KeyMaterial) -> Result<String, JwtError>;

    async fn verify(
        &self,
        signing_string: &str,
        signature: &str,
        key: &KeyMaterial,
    ) -> Result<(), JwtError>;
}
