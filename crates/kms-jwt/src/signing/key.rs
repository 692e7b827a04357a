use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use rand_core::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::{Pkcs1v15Sign, Pss, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use super::Algorithm;
use crate::error::JwtError;

/// Public key material able to check a JWS signature for one algorithm family.
#[derive(Debug, Clone)]
pub enum VerificationKey {
    Rsa(RsaPublicKey),
    P256(p256::ecdsa::VerifyingKey),
    P384(p384::ecdsa::VerifyingKey),
}

impl VerificationKey {
    /// Parses an SPKI PEM public key of the type `alg` expects.
    pub fn from_pem(alg: Algorithm, pem: &str) -> Result<Self, JwtError> {
        let key = match alg {
            Algorithm::Rs256 | Algorithm::Ps256 => RsaPublicKey::from_public_key_pem(pem)
                .map(Self::Rsa)
                .map_err(|e| JwtError::KeyParse(e.to_string()))?,
            Algorithm::Es256 => p256::ecdsa::VerifyingKey::from_public_key_pem(pem)
                .map(Self::P256)
                .map_err(|e| JwtError::KeyParse(e.to_string()))?,
            Algorithm::Es384 => p384::ecdsa::VerifyingKey::from_public_key_pem(pem)
                .map(Self::P384)
                .map_err(|e| JwtError::KeyParse(e.to_string()))?,
        };
        Ok(key)
    }

    /// Verifies a JWS signature (`r || s` for ECDSA) over an already computed digest.
    pub fn verify_digest(
        &self,
        alg: Algorithm,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<(), JwtError> {
        match (self, alg) {
            (Self::Rsa(key), Algorithm::Rs256) => key
                .verify(Pkcs1v15Sign::new::<Sha256>(), digest, signature)
                .map_err(|_| JwtError::SignatureInvalid),
            (Self::Rsa(key), Algorithm::Ps256) => key
                .verify(Pss::new::<Sha256>(), digest, signature)
                .map_err(|_| JwtError::SignatureInvalid),
            (Self::P256(key), Algorithm::Es256) => {
                let signature = p256::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| JwtError::SignatureInvalid)?;
                key.verify_prehash(digest, &signature)
                    .map_err(|_| JwtError::SignatureInvalid)
            }
            (Self::P384(key), Algorithm::Es384) => {
                let signature = p384::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| JwtError::SignatureInvalid)?;
                key.verify_prehash(digest, &signature)
                    .map_err(|_| JwtError::SignatureInvalid)
            }
            _ => Err(JwtError::InvalidKey),
        }
    }
}

/// Private key material held in-process.
///
/// Used by the built-in signing methods and by [`LocalKms`](super::LocalKms).
/// Signatures come out JWS-encoded: raw for RSA, fixed-width `r || s` for ECDSA.
#[derive(Debug, Clone)]
pub enum PrivateKey {
    Rsa(RsaPrivateKey),
    P256(p256::ecdsa::SigningKey),
    P384(p384::ecdsa::SigningKey),
}

impl PrivateKey {
    /// Parses a PKCS#8 PEM private key of the type `alg` expects.
    pub fn from_pkcs8_pem(alg: Algorithm, pem: &str) -> Result<Self, JwtError> {
        let key = match alg {
            Algorithm::Rs256 | Algorithm::Ps256 => RsaPrivateKey::from_pkcs8_pem(pem)
                .map(Self::Rsa)
                .map_err(|e| JwtError::KeyParse(e.to_string()))?,
            Algorithm::Es256 => p256::ecdsa::SigningKey::from_pkcs8_pem(pem)
                .map(Self::P256)
                .map_err(|e| JwtError::KeyParse(e.to_string()))?,
            Algorithm::Es384 => p384::ecdsa::SigningKey::from_pkcs8_pem(pem)
                .map(Self::P384)
                .map_err(|e| JwtError::KeyParse(e.to_string()))?,
        };
        Ok(key)
    }

    pub fn sign_digest(&self, alg: Algorithm, digest: &[u8]) -> Result<Vec<u8>, JwtError> {
        match (self, alg) {
            (Self::Rsa(key), Algorithm::Rs256) => key
                .sign(Pkcs1v15Sign::new::<Sha256>(), digest)
                .map_err(|e| JwtError::Crypto(e.to_string())),
            (Self::Rsa(key), Algorithm::Ps256) => key
                .sign_with_rng(&mut OsRng, Pss::new::<Sha256>(), digest)
                .map_err(|e| JwtError::Crypto(e.to_string())),
            (Self::P256(key), Algorithm::Es256) => {
                let signature: p256::ecdsa::Signature = key
                    .sign_prehash(digest)
                    .map_err(|e| JwtError::Crypto(e.to_string()))?;
                Ok(signature.to_bytes().to_vec())
            }
            (Self::P384(key), Algorithm::Es384) => {
                let signature: p384::ecdsa::Signature = key
                    .sign_prehash(digest)
                    .map_err(|e| JwtError::Crypto(e.to_string()))?;
                Ok(signature.to_bytes().to_vec())
            }
            _ => Err(JwtError::InvalidKey),
        }
    }

    pub fn public_key_pem(&self) -> Result<String, JwtError> {
        let pem = match self {
            Self::Rsa(key) => key.to_public_key().to_public_key_pem(LineEnding::LF),
            Self::P256(key) => key.verifying_key().to_public_key_pem(LineEnding::LF),
            Self::P384(key) => key.verifying_key().to_public_key_pem(LineEnding::LF),
        };
        pem.map_err(|e| JwtError::KeyParse(e.to_string()))
    }

    pub fn verification_key(&self) -> VerificationKey {
        match self {
            Self::Rsa(key) => VerificationKey::Rsa(key.to_public_key()),
            Self::P256(key) => VerificationKey::P256(key.verifying_key().clone()),
            Self::P384(key) => VerificationKey::P384(key.verifying_key().clone()),
        }
    }
}

/// Converts a DER-encoded ECDSA signature into the fixed-width JWS form.
///
/// RSA signatures are passed through.
pub fn der_to_jws_signature(alg: Algorithm, signature: &[u8]) -> Result<Vec<u8>, JwtError> {
    match alg {
        Algorithm::Rs256 | Algorithm::Ps256 => Ok(signature.to_vec()),
        Algorithm::Es256 => p256::ecdsa::Signature::from_der(signature)
            .map(|sig| sig.to_bytes().to_vec())
            .map_err(|_| JwtError::SignatureInvalid),
        Algorithm::Es384 => p384::ecdsa::Signature::from_der(signature)
            .map(|sig| sig.to_bytes().to_vec())
            .map_err(|_| JwtError::SignatureInvalid),
    }
}

/// Inverse of [`der_to_jws_signature`].
pub fn jws_to_der_signature(alg: Algorithm, signature: &[u8]) -> Result<Vec<u8>, JwtError> {
    match alg {
        Algorithm::Rs256 | Algorithm::Ps256 => Ok(signature.to_vec()),
        Algorithm::Es256 => p256::ecdsa::Signature::from_slice(signature)
            .map(|sig| sig.to_der().as_bytes().to_vec())
            .map_err(|_| JwtError::SignatureInvalid),
        Algorithm::Es384 => p384::ecdsa::Signature::from_slice(signature)
            .map(|sig| sig.to_der().as_bytes().to_vec())
            .map_err(|_| JwtError::SignatureInvalid),
    }
}
