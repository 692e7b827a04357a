use async_trait::async_trait;

use super::{Algorithm, KeyMaterial, PrivateKey, SigningMethod, VerificationKey};
use crate::error::JwtError;
use crate::token::{decode_segment, encode_segment};

/// Signing method backed by in-process PEM keys.
///
/// These are what a registry holds for each algorithm before a KMS-backed
/// method overrides it.
#[derive(Debug)]
pub struct LocalSigningMethod {
    algorithm: Algorithm,
}

impl LocalSigningMethod {
    pub fn new(algorithm: Algorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}

fn pem(key: &KeyMaterial) -> Result<&str, JwtError> {
    match key {
        KeyMaterial::Pem(pem) => Ok(pem.as_str()),
        KeyMaterial::Kms(_) => Err(JwtError::InvalidKey),
    }
}

#[async_trait]
impl SigningMethod for LocalSigningMethod {
    fn alg(&self) -> &str {
        self.algorithm.name()
    }

    async fn sign(&self, signing_string: &str, key: &KeyMaterial) -> Result<String, JwtError> {
        let private_key = PrivateKey::from_pkcs8_pem(self.algorithm, pem(key)?)?;
        let digest = self.algorithm.digest(signing_string.as_bytes());
        let signature = private_key.sign_digest(self.algorithm, &digest)?;
        Ok(encode_segment(&signature))
    }

    async fn verify(
        &self,
        signing_string: &str,
        signature: &str,
        key: &KeyMaterial,
    ) -> Result<(), JwtError> {
        let public_key = VerificationKey::from_pem(self.algorithm, pem(key)?)?;
        let signature = decode_segment(signature)?;
        let digest = self.algorithm.digest(signing_string.as_bytes());
        public_key.verify_digest(self.algorithm, &digest, &signature)
    }
}
