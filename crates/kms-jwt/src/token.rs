//! Compact JWS tokens: building, signing and parsing.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Map, Value};

use crate::error::JwtError;
use crate::signing::{KeyMaterial, SigningMethod, SigningMethodRegistry};

pub type Header = Map<String, Value>;
pub type Claims = Map<String, Value>;

pub(crate) fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

pub(crate) fn decode_segment(segment: &str) -> Result<Vec<u8>, JwtError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| JwtError::Malformed(format!("invalid base64url segment: {e}")))
}

fn decode_json(segment: &str) -> Result<Map<String, Value>, JwtError> {
    serde_json::from_slice(&decode_segment(segment)?)
        .map_err(|e| JwtError::Malformed(format!("invalid json segment: {e}")))
}

fn kid_of(header: &Header) -> Result<Option<&str>, JwtError> {
    match header.get("kid") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(kid)) => Ok(Some(kid.as_str())),
        Some(_) => Err(JwtError::Malformed("kid must be a string".into())),
    }
}

/// Reads the `kid` header parameter from the first segment of a signing string.
pub fn header_kid(signing_string: &str) -> Result<Option<String>, JwtError> {
    let (header, _) = signing_string
        .split_once('.')
        .ok_or_else(|| JwtError::Malformed("signing string has no claims segment".into()))?;
    let header = decode_json(header)?;
    Ok(kid_of(&header)?.map(str::to_owned))
}

/// A token being built or one that passed verification.
pub struct Token {
    pub header: Header,
    pub claims: Claims,
    pub method: Arc<dyn SigningMethod>,
}

impl Token {
    /// A token with `alg` set from `method` and `typ` set to `JWT`.
    pub fn new(method: Arc<dyn SigningMethod>, claims: Claims) -> Self {
        let mut header = Header::new();
        header.insert("alg".into(), Value::String(method.alg().to_owned()));
        header.insert("typ".into(), Value::String("JWT".into()));
        Self {
            header,
            claims,
            method,
        }
    }

    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.header.insert("kid".into(), Value::String(kid.into()));
        self
    }

    pub fn kid(&self) -> Option<&str> {
        self.header.get("kid").and_then(Value::as_str)
    }

    /// `base64url(header) "." base64url(claims)`.
    pub fn signing_string(&self) -> Result<String, JwtError> {
        let header = serde_json::to_vec(&self.header)?;
        let claims = serde_json::to_vec(&self.claims)?;
        Ok(format!(
            "{}.{}",
            encode_segment(&header),
            encode_segment(&claims)
        ))
    }

    /// Signs with `self.method` and returns the compact serialization.
    pub async fn signed_string(&self, key: &KeyMaterial) -> Result<String, JwtError> {
        let signing_string = self.signing_string()?;
        let signature = self.method.sign(&signing_string, key).await?;
        Ok(format!("{signing_string}.{signature}"))
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("header", &self.header)
            .field("claims", &self.claims)
            .field("method", &self.method.alg())
            .finish()
    }
}

/// A decoded token whose signature has not been checked.
#[derive(Debug, Clone)]
pub struct UnverifiedToken {
    pub header: Header,
    pub claims: Claims,
    signing_string: String,
    signature: String,
}

impl UnverifiedToken {
    pub fn alg(&self) -> Option<&str> {
        self.header.get("alg").and_then(Value::as_str)
    }

    pub fn kid(&self) -> Result<Option<&str>, JwtError> {
        kid_of(&self.header)
    }

    pub fn signing_string(&self) -> &str {
        &self.signing_string
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }
}

/// Splits and decodes a compact token without verifying it.
pub fn parse_unverified(token: &str) -> Result<UnverifiedToken, JwtError> {
    let mut parts = token.split('.');
    let (Some(header), Some(claims), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(JwtError::Malformed("token must have three segments".into()));
    };

    Ok(UnverifiedToken {
        header: decode_json(header)?,
        claims: decode_json(claims)?,
        signing_string: format!("{header}.{claims}"),
        signature: signature.to_owned(),
    })
}

/// Verifies compact tokens with methods looked up by their `alg` header.
pub struct Parser<'a> {
    registry: &'a SigningMethodRegistry,
}

impl<'a> Parser<'a> {
    pub fn new(registry: &'a SigningMethodRegistry) -> Self {
        Self { registry }
    }

    /// Parses `token`, asks `keyfunc` for the key and verifies the signature.
    pub async fn parse<F>(&self, token: &str, keyfunc: F) -> Result<Token, JwtError>
    where
        F: FnOnce(&UnverifiedToken) -> Result<KeyMaterial, JwtError>,
    {
        let unverified = parse_unverified(token)?;
        let alg = unverified
            .alg()
            .ok_or_else(|| JwtError::Malformed("header has no alg".into()))?;
        let method = self
            .registry
            .get(alg)
            .ok_or_else(|| JwtError::UnknownAlgorithm(alg.to_owned()))?;

        let key = keyfunc(&unverified)?;
        method
            .verify(unverified.signing_string(), unverified.signature(), &key)
            .await?;

        Ok(Token {
            header: unverified.header,
            claims: unverified.claims,
            method,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::{Algorithm, LocalSigningMethod};
    use serde_json::json;

    fn claims() -> Claims {
        json!({"foo": "bar"}).as_object().unwrap().clone()
    }

    fn token() -> Token {
        Token::new(Arc::new(LocalSigningMethod::new(Algorithm::Rs256)), claims())
    }

    #[test]
    fn new_sets_alg_and_typ() {
        let token = token();
        assert_eq!(token.header["alg"], "RS256");
        assert_eq!(token.header["typ"], "JWT");
        assert_eq!(token.kid(), None);
    }

    #[test]
    fn header_kid_reads_first_segment() {
        let signing_string = token().with_kid("2").signing_string().unwrap();
        assert_eq!(header_kid(&signing_string).unwrap().as_deref(), Some("2"));

        let signing_string = token().signing_string().unwrap();
        assert_eq!(header_kid(&signing_string).unwrap(), None);
    }

    #[test]
    fn non_string_kid_is_malformed() {
        let mut token = token();
        token.header.insert("kid".into(), json!(7));
        let signing_string = token.signing_string().unwrap();
        assert!(matches!(
            header_kid(&signing_string),
            Err(JwtError::Malformed(_))
        ));
    }

    #[test]
    fn parse_unverified_splits_segments() {
        let signing_string = token().with_kid("1").signing_string().unwrap();
        let compact = format!("{signing_string}.c2ln");

        let parsed = parse_unverified(&compact).unwrap();
        assert_eq!(parsed.alg(), Some("RS256"));
        assert_eq!(parsed.kid().unwrap(), Some("1"));
        assert_eq!(parsed.claims, claims());
        assert_eq!(parsed.signing_string(), signing_string);
        assert_eq!(parsed.signature(), "c2ln");
    }

    #[test]
    fn parse_unverified_rejects_wrong_segment_count() {
        assert!(matches!(
            parse_unverified("a.b"),
            Err(JwtError::Malformed(_))
        ));
        assert!(matches!(
            parse_unverified("a.b.c.d"),
            Err(JwtError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn parser_rejects_unregistered_alg() {
        let registry = SigningMethodRegistry::new();
        let compact = format!("{}.c2ln", token().signing_string().unwrap());

        let result = Parser::new(&registry)
            .parse(&compact, |_| Ok(KeyMaterial::Pem(String::new())))
            .await;
        assert!(matches!(result, Err(JwtError::UnknownAlgorithm(alg)) if alg == "RS256"));
    }
}
