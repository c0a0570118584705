//! JWT Token handling
//!
//! Tokens are self-contained: validity is decided from the signature and the
//! `exp` claim alone, nothing is kept server-side.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT configuration
#[derive(Debug)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: SecretString,
    /// Token expiration time in hours
    pub expiration_hours: i64,
    /// Issuer claim
    pub issuer: String,
}

impl JwtConfig {
    pub const DEFAULT_EXPIRATION_HOURS: i64 = 24;
    pub const DEFAULT_ISSUER: &'static str = "campus-auth";
    /// One hundred years.
    pub const MAX_EXPIRATION_HOURS: i64 = 876_000;

    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            expiration_hours: Self::DEFAULT_EXPIRATION_HOURS,
            issuer: Self::DEFAULT_ISSUER.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("signing secret is not configured")]
    MissingSecret,

    #[error(
        "token lifetime must be between 1 and {max} hours, got {0}",
        max = JwtConfig::MAX_EXPIRATION_HOURS
    )]
    InvalidTtl(i64),

    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject (username)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

impl TokenClaims {
    pub fn new(subject: &str, ttl: Duration, issuer: &str) -> Self {
        let now = Utc::now();
        let exp = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: issuer.to_string(),
        }
    }

    /// A token is valid only while `now < exp`.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Key used to sign new tokens.
pub struct SigningKey<'a> {
    /// Written to the `kid` header when present.
    pub kid: Option<&'a str>,
    pub key: &'a EncodingKey,
}

/// Looks up signing and verification keys.
///
/// The token service never holds the secret directly, so a multi-key
/// resolver can be swapped in for rotation without touching callers.
pub trait KeyResolver: Send + Sync {
    fn signing_key(&self) -> SigningKey<'_>;

    /// Key for a token carrying `kid` (or none). `None` means the key is unknown.
    fn verification_key(&self, kid: Option<&str>) -> Option<&DecodingKey>;
}

/// A single process-wide HMAC secret.
pub struct StaticKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl StaticKey {
    pub fn new(secret: &SecretString) -> Result<Self, TokenError> {
        let raw = secret.expose_secret().as_bytes();
        if raw.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(raw),
            decoding: DecodingKey::from_secret(raw),
        })
    }
}

impl KeyResolver for StaticKey {
    fn signing_key(&self) -> SigningKey<'_> {
        SigningKey {
            kid: None,
            key: &self.encoding,
        }
    }

    fn verification_key(&self, kid: Option<&str>) -> Option<&DecodingKey> {
        match kid {
            None => Some(&self.decoding),
            Some(_) => None,
        }
    }
}

/// Issues and verifies bearer tokens.
pub struct TokenService {
    keys: Box<dyn KeyResolver>,
    ttl: Duration,
    issuer: String,
}

impl TokenService {
    /// Build a service around a single static secret.
    pub fn new(config: &JwtConfig) -> Result<Self, TokenError> {
        if !(1..=JwtConfig::MAX_EXPIRATION_HOURS).contains(&config.expiration_hours) {
            return Err(TokenError::InvalidTtl(config.expiration_hours));
        }
        let keys = StaticKey::new(&config.secret)?;
        Ok(Self::with_resolver(
            keys,
            Duration::hours(config.expiration_hours),
            config.issuer.clone(),
        ))
    }

    pub fn with_resolver(
        keys: impl KeyResolver + 'static,
        ttl: Duration,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            keys: Box::new(keys),
            ttl,
            issuer: issuer.into(),
        }
    }

    /// Create a token for `subject` valid for the configured TTL.
    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        let claims = TokenClaims::new(subject, self.ttl, &self.issuer);
        self.sign(&claims)
    }

    fn sign(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        let signing = self.keys.signing_key();
        let mut header = Header::new(ALGORITHM);
        header.kid = signing.kid.map(str::to_string);

        encode(&header, claims, signing.key).map_err(TokenError::Signing)
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let header = decode_header(token).map_err(classify)?;
        let key = self
            .keys
            .verification_key(header.kid.as_deref())
            .ok_or(TokenError::InvalidSignature)?;

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);

        let claims = decode::<TokenClaims>(token, key, &validation)
            .map_err(classify)?
            .claims;

        if claims.is_expired() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidKeyFormat
        | ErrorKind::InvalidIssuer => TokenError::InvalidSignature,
        _ => TokenError::Malformed,
    }
}
