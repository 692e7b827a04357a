use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use parking_lot::RwLock;
use rand_chacha::ChaCha20Rng;
use rand_chacha::rand_core::SeedableRng;
use rsa::RsaPrivateKey;
use sha2::{Digest, Sha256, Sha384};

use super::{
    Algorithm, KmsContext, KmsError, PrivateKey, PublicKeyPem, RemoteSigner, jws_to_der_signature,
};

const RSA_KEY_BITS: usize = 2048;
const KEY_VERSION_SEGMENT: &str = "/cryptoKeyVersions/";

struct LocalKeyVersion {
    algorithm: Algorithm,
    private_key: PrivateKey,
}

/// In-process stand-in for a key-management service.
///
/// Key versions are derived from a seed string: the same seed and key-version
/// name always produce the same key, so separate processes sharing a seed can
/// sign and verify for each other. A crypto-key name without a version segment
/// resolves to its primary version, the first one created under it.
pub struct LocalKms {
    seed: String,
    versions: RwLock<HashMap<String, Arc<LocalKeyVersion>>>,
    primaries: RwLock<HashMap<String, String>>,
}

impl LocalKms {
    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            versions: RwLock::new(HashMap::new()),
            primaries: RwLock::new(HashMap::new()),
        }
    }

    /// Derives and stores the key for `key_version`, returning its public key.
    ///
    /// Creating a version that already exists replaces it with an identical key.
    pub fn create_key_version(
        &self,
        key_version: &str,
        algorithm: Algorithm,
    ) -> Result<PublicKeyPem, KmsError> {
        let material = format!("{}{KEY_VERSION_SEGMENT}{key_version}", self.seed);
        let private_key = match algorithm {
            Algorithm::Rs256 | Algorithm::Ps256 => {
                let mut rng = ChaCha20Rng::from_seed(Sha256::digest(material.as_bytes()).into());
                let key = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS)
                    .context("generating RSA key from seed")?;
                PrivateKey::Rsa(key)
            }
            Algorithm::Es256 => {
                let scalar = Sha256::digest(material.as_bytes());
                let key = p256::ecdsa::SigningKey::from_bytes(&scalar)
                    .map_err(|e| anyhow::anyhow!("invalid P-256 seed: {e}"))?;
                PrivateKey::P256(key)
            }
            Algorithm::Es384 => {
                let scalar = Sha384::digest(material.as_bytes());
                let key = p384::ecdsa::SigningKey::from_bytes(&scalar)
                    .map_err(|e| anyhow::anyhow!("invalid P-384 seed: {e}"))?;
                PrivateKey::P384(key)
            }
        };
        self.import_key_version(key_version, algorithm, private_key)
    }

    /// Stores an existing private key under `key_version`.
    pub fn import_key_version(
        &self,
        key_version: &str,
        algorithm: Algorithm,
        private_key: PrivateKey,
    ) -> Result<PublicKeyPem, KmsError> {
        let public_key = private_key
            .public_key_pem()
            .context("encoding public key")?;

        if let Some((crypto_key, _)) = key_version.split_once(KEY_VERSION_SEGMENT) {
            self.primaries
                .write()
                .entry(crypto_key.to_owned())
                .or_insert_with(|| key_version.to_owned());
        }
        self.versions.write().insert(
            key_version.to_owned(),
            Arc::new(LocalKeyVersion {
                algorithm,
                private_key,
            }),
        );
        tracing::debug!(%key_version, %algorithm, "created key version");

        Ok(PublicKeyPem(public_key))
    }

    fn lookup(&self, ctx: &KmsContext, key_version: &str) -> Result<Arc<LocalKeyVersion>, KmsError> {
        if ctx.is_cancelled() {
            return Err(KmsError::Cancelled);
        }
        let resolved = self
            .primaries
            .read()
            .get(key_version)
            .cloned()
            .unwrap_or_else(|| key_version.to_owned());
        tracing::trace!(%key_version, %resolved, "looking up key version");
        self.versions
            .read()
            .get(&resolved)
            .cloned()
            .ok_or_else(|| KmsError::KeyNotFound(key_version.to_owned()))
    }
}

#[async_trait]
impl RemoteSigner for LocalKms {
    async fn sign(
        &self,
        ctx: &KmsContext,
        key_version: &str,
        digest: &[u8],
        algorithm: Algorithm,
    ) -> Result<Vec<u8>, KmsError> {
        let version = self.lookup(ctx, key_version)?;
        if version.algorithm != algorithm {
            return Err(KmsError::UnsupportedAlgorithm {
                key_version: key_version.to_owned(),
                algorithm,
            });
        }
        let signature = version
            .private_key
            .sign_digest(algorithm, digest)
            .context("signing digest")?;
        Ok(jws_to_der_signature(algorithm, &signature).context("encoding signature")?)
    }

    async fn public_key(
        &self,
        ctx: &KmsContext,
        key_version: &str,
    ) -> Result<PublicKeyPem, KmsError> {
        let version = self.lookup(ctx, key_version)?;
        let pem = version
            .private_key
            .public_key_pem()
            .context("encoding public key")?;
        Ok(PublicKeyPem(pem))
    }
}
