//! Signing methods that delegate private-key work to a remote key-management service.
//!
//! A [`KmsSigningMethod`] takes the place of a built-in method under the same
//! `alg` name. Callers hand it a [`KeyMaterial::Kms`] context carrying a
//! [`KmsConfig`] instead of key bytes:
//!
//! ```text
//! attach_config(ctx, config) → sign/verify(signing_string, KeyMaterial::Kms(ctx))
//!     → resolve key version (config.key_path, header kid on verify)
//!     → RemoteSigner::sign, or KeyCache / RemoteSigner::public_key on verify
//! ```
//!
//! The methods hold no per-call state, so one instance serves concurrent calls
//! with different configs.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;

use super::{
    Algorithm, CachedKey, KeyCache, KeyMaterial, KmsConfig, KmsContext, RemoteSigner,
    SigningMethod, SigningMethodRegistry, VerificationKey, der_to_jws_signature,
};
use crate::error::JwtError;
use crate::token::{UnverifiedToken, decode_segment, encode_segment, header_kid};

const KEY_VERSION_SEGMENT: &str = "/cryptoKeyVersions/";

/// Resolves the key version a call should use.
///
/// Without a `kid` this is `key_path` itself. With one, the version segment of
/// `key_path` is replaced by the `kid`, so the lookup stays within the same
/// crypto key. A `kid` containing `/` could name another key entirely and is
/// rejected as malformed.
pub fn resolve_key_version(key_path: &str, kid: Option<&str>) -> Result<String, JwtError> {
    match kid {
        None => Ok(key_path.to_owned()),
        Some(kid) if kid.is_empty() || kid.contains('/') => Err(JwtError::Malformed(format!(
            "kid {kid:?} is not a key version id"
        ))),
        Some(kid) => {
            let crypto_key = key_path
                .split_once(KEY_VERSION_SEGMENT)
                .map_or(key_path, |(crypto_key, _)| crypto_key);
            Ok(format!("{crypto_key}{KEY_VERSION_SEGMENT}{kid}"))
        }
    }
}

fn kms_context(key: &KeyMaterial) -> Result<(&KmsContext, &KmsConfig), JwtError> {
    match key {
        KeyMaterial::Kms(ctx) => ctx
            .config()
            .map(|config| (ctx, config))
            .ok_or(JwtError::MissingConfig),
        KeyMaterial::Pem(_) => Err(JwtError::InvalidKey),
    }
}

/// KMS-backed signing method for one algorithm.
pub struct KmsSigningMethod {
    algorithm: Algorithm,
    signer: Arc<dyn RemoteSigner>,
    cache: Arc<KeyCache>,
    /// Method displaced the first time this one overrode a registry entry.
    overridden: OnceLock<Arc<dyn SigningMethod>>,
}

impl KmsSigningMethod {
    pub fn new(algorithm: Algorithm, signer: Arc<dyn RemoteSigner>, cache: Arc<KeyCache>) -> Self {
        Self {
            algorithm,
            signer,
            cache,
            overridden: OnceLock::new(),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn cache(&self) -> &Arc<KeyCache> {
        &self.cache
    }

    /// Registers this method in `registry` under its `alg`, replacing the
    /// current entry. Calling it again is a no-op.
    pub fn override_in(self: &Arc<Self>, registry: &SigningMethodRegistry) -> Arc<dyn SigningMethod> {
        let this: Arc<dyn SigningMethod> = self.clone();
        if let Some(displaced) = registry.override_method(Arc::clone(&this)) {
            let _ = self.overridden.set(displaced);
        }
        this
    }

    /// [`override_in`](Self::override_in) on the process-wide registry.
    ///
    /// The override is permanent for the life of the process.
    pub fn override_global(self: &Arc<Self>) -> Arc<dyn SigningMethod> {
        self.override_in(SigningMethodRegistry::global())
    }

    pub fn overridden(&self) -> Option<&Arc<dyn SigningMethod>> {
        self.overridden.get()
    }

    async fn verification_key(
        &self,
        ctx: &KmsContext,
        key_version: &str,
    ) -> Result<Arc<CachedKey>, JwtError> {
        if let Some(cached) = self.cache.get(self.algorithm, key_version) {
            return Ok(cached);
        }
        let pem = self.signer.public_key(ctx, key_version).await?;
        let key = VerificationKey::from_pem(self.algorithm, &pem.0)?;
        Ok(self.cache.put(self.algorithm, key_version, key))
    }
}

#[async_trait]
impl SigningMethod for KmsSigningMethod {
    fn alg(&self) -> &str {
        self.algorithm.name()
    }

    async fn sign(&self, signing_string: &str, key: &KeyMaterial) -> Result<String, JwtError> {
        let (ctx, config) = kms_context(key)?;
        let digest = self.algorithm.digest(signing_string.as_bytes());
        let signature = self
            .signer
            .sign(ctx, &config.key_path, &digest, self.algorithm)
            .await?;
        let signature = der_to_jws_signature(self.algorithm, &signature)?;
        Ok(encode_segment(&signature))
    }

    async fn verify(
        &self,
        signing_string: &str,
        signature: &str,
        key: &KeyMaterial,
    ) -> Result<(), JwtError> {
        let (ctx, config) = kms_context(key)?;
        let kid = header_kid(signing_string)?;
        let key_version = resolve_key_version(&config.key_path, kid.as_deref())?;

        let cached = self.verification_key(ctx, &key_version).await?;
        let signature = decode_segment(signature)?;
        let digest = self.algorithm.digest(signing_string.as_bytes());
        cached.key.verify_digest(self.algorithm, &digest, &signature)
    }
}

/// One [`KmsSigningMethod`] per supported algorithm, sharing a signer and cache.
pub struct KmsSigningMethods {
    pub rs256: Arc<KmsSigningMethod>,
    pub ps256: Arc<KmsSigningMethod>,
    pub es256: Arc<KmsSigningMethod>,
    pub es384: Arc<KmsSigningMethod>,
    cache: Arc<KeyCache>,
}

impl KmsSigningMethods {
    pub fn new(signer: Arc<dyn RemoteSigner>) -> Self {
        let cache = Arc::new(KeyCache::new());
        let method = |alg| {
            Arc::new(KmsSigningMethod::new(
                alg,
                Arc::clone(&signer),
                Arc::clone(&cache),
            ))
        };
        Self {
            rs256: method(Algorithm::Rs256),
            ps256: method(Algorithm::Ps256),
            es256: method(Algorithm::Es256),
            es384: method(Algorithm::Es384),
            cache,
        }
    }

    pub fn get(&self, algorithm: Algorithm) -> &Arc<KmsSigningMethod> {
        match algorithm {
            Algorithm::Rs256 => &self.rs256,
            Algorithm::Ps256 => &self.ps256,
            Algorithm::Es256 => &self.es256,
            Algorithm::Es384 => &self.es384,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<KmsSigningMethod>> {
        [&self.rs256, &self.ps256, &self.es256, &self.es384].into_iter()
    }

    /// Overrides every built-in entry in `registry`.
    pub fn override_in(&self, registry: &SigningMethodRegistry) {
        for method in self.iter() {
            method.override_in(registry);
        }
    }

    pub fn cache(&self) -> &Arc<KeyCache> {
        &self.cache
    }
}

/// Key function for [`Parser::parse`](crate::token::Parser::parse).
///
/// Rejects tokens whose `alg` is not a KMS-backed algorithm, then hands the
/// verifier `ctx` with `config` attached.
pub fn kms_keyfunc(
    ctx: &KmsContext,
    config: KmsConfig,
) -> impl Fn(&UnverifiedToken) -> Result<KeyMaterial, JwtError> + use<> {
    let ctx = ctx.with_config(config);
    move |token| match token.alg() {
        Some(alg) if Algorithm::from_name(alg).is_some() => Ok(KeyMaterial::Kms(ctx.clone())),
        other => Err(JwtError::UnexpectedAlgorithm(
            other.unwrap_or_default().to_owned(),
        )),
    }
}
