pub mod error;
pub mod signing;
pub mod token;

pub use error::JwtError;
pub use signing::{
    Algorithm, KeyMaterial, KmsConfig, KmsContext, KmsSigningMethod, KmsSigningMethods,
    LocalKms, RemoteSigner, SigningMethod, SigningMethodRegistry, attach_config,
};
pub use token::{Parser, Token, parse_unverified};
