#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use kms_jwt::signing::{KmsError, PublicKeyPem};
use kms_jwt::token::Claims;
use kms_jwt::{Algorithm, KmsContext, LocalKms, RemoteSigner};
use serde_json::json;

pub const RING: &str = "projects/test/locations/global/keyRings/jwt";

pub fn crypto_key(alg: Algorithm) -> String {
    format!("{RING}/cryptoKeys/{}", alg.name().to_lowercase())
}

pub fn key_version(alg: Algorithm, version: &str) -> String {
    format!("{}/cryptoKeyVersions/{version}", crypto_key(alg))
}

/// Versions 1 and 2 of one crypto key per algorithm. Version 1 is primary.
pub static KMS: LazyLock<Arc<LocalKms>> = LazyLock::new(|| {
    let kms = LocalKms::from_seed("integration-tests");
    for alg in Algorithm::ALL {
        for version in ["1", "2"] {
            kms.create_key_version(&key_version(alg, version), alg)
                .unwrap();
        }
    }
    Arc::new(kms)
});

pub fn claims() -> Claims {
    json!({"foo": "bar"}).as_object().unwrap().clone()
}

/// Remote signer double counting calls into the shared [`KMS`].
#[derive(Default)]
pub struct CountingSigner {
    pub sign_calls: AtomicUsize,
    pub public_key_calls: AtomicUsize,
}

impl CountingSigner {
    pub fn public_key_calls(&self) -> usize {
        self.public_key_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteSigner for CountingSigner {
    async fn sign(
        &self,
        ctx: &KmsContext,
        key_version: &str,
        digest: &[u8],
        algorithm: Algorithm,
    ) -> Result<Vec<u8>, KmsError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        KMS.sign(ctx, key_version, digest, algorithm).await
    }

    async fn public_key(
        &self,
        ctx: &KmsContext,
        key_version: &str,
    ) -> Result<PublicKeyPem, KmsError> {
        self.public_key_calls.fetch_add(1, Ordering::SeqCst);
        KMS.public_key(ctx, key_version).await
    }
}
