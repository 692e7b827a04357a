use std::fmt;

use sha2::{Digest, Sha256, Sha384};

/// Algorithm families a signing method can be backed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    Rs256,
    /// RSASSA-PSS with SHA-256, salt length equal to the digest length.
    Ps256,
    /// ECDSA on P-256 with SHA-256.
    Es256,
    /// ECDSA on P-384 with SHA-384.
    Es384,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::Rs256,
        Algorithm::Ps256,
        Algorithm::Es256,
        Algorithm::Es384,
    ];

    /// JWS `alg` header value.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Rs256 => "RS256",
            Algorithm::Ps256 => "PS256",
            Algorithm::Es256 => "ES256",
            Algorithm::Es384 => "ES384",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|alg| alg.name() == name)
    }

    /// Hashes `data` with the digest this algorithm signs over.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Algorithm::Rs256 | Algorithm::Ps256 | Algorithm::Es256 => {
                Sha256::digest(data).to_vec()
            }
            Algorithm::Es384 => Sha384::digest(data).to_vec(),
        }
    }

    /// Width of the fixed-size `r || s` signature for ECDSA families.
    pub fn ecdsa_signature_len(self) -> Option<usize> {
        match self {
            Algorithm::Es256 => Some(64),
            Algorithm::Es384 => Some(96),
            Algorithm::Rs256 | Algorithm::Ps256 => None,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
