mod algorithm;
mod builtin;
mod cache;
mod context;
mod key;
mod kms;
mod local_kms;
mod method;
mod registry;
mod remote;

pub use algorithm::Algorithm;
pub use builtin::LocalSigningMethod;
pub use cache::{CachedKey, KeyCache};
pub use context::{KmsConfig, KmsContext, attach_config};
pub use key::{PrivateKey, VerificationKey, der_to_jws_signature, jws_to_der_signature};
pub use kms::{KmsSigningMethod, KmsSigningMethods, kms_keyfunc, resolve_key_version};
pub use local_kms::LocalKms;
pub use method::{KeyMaterial, SigningMethod};
pub use registry::SigningMethodRegistry;
pub use remote::{KmsError, PublicKeyPem, RemoteSigner};
