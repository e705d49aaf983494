use std::path::{Path, PathBuf};

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};
use uuid::Uuid;

use super::claims::Claims;
use crate::config::JwtConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token is expired")]
    Expired,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Raised once at startup; the process must not serve traffic without a key.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("signing key unavailable at {}: {reason}", .path.display())]
    Unavailable { path: PathBuf, reason: String },
}

/// Signs and verifies HS256 login tokens with a key loaded once per process.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl: Duration,
}

impl TokenCodec {
    pub fn from_secret(secret: &[u8], issuer: impl Into<String>, ttl: Duration) -> Self {
        let issuer = issuer.into();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(std::slice::from_ref(&issuer));
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_aud = false;
        // expiry is checked in verify_at against an explicit clock
        validation.validate_exp = false;
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            issuer,
            ttl,
        }
    }

    pub fn from_key_file(path: &Path, issuer: impl Into<String>, ttl: Duration) -> Result<Self, KeyError> {
        let secret = std::fs::read(path).map_err(|e| KeyError::Unavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if secret.is_empty() {
            return Err(KeyError::Unavailable {
                path: path.to_path_buf(),
                reason: "key file is empty".into(),
            });
        }
        info!(path = %path.display(), "jwt signing key loaded");
        Ok(Self::from_secret(&secret, issuer, ttl))
    }

    pub fn from_config(cfg: &JwtConfig) -> Result<Self, KeyError> {
        Self::from_key_file(&cfg.key_path, cfg.issuer.clone(), Duration::minutes(cfg.ttl_minutes))
    }

    /// Lifetime applied to login tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, subject: Uuid, ttl: Duration) -> Result<String, TokenError> {
        self.issue_at(subject, ttl, OffsetDateTime::now_utc())
    }

    pub fn issue_at(&self, subject: Uuid, ttl: Duration, now: OffsetDateTime) -> Result<String, TokenError> {
        let expires = now
            .checked_add(ttl)
            .ok_or_else(|| TokenError::Signing(format!("ttl {ttl} overflows the clock")))?;
        let claims = Claims {
            sub: subject,
            iss: self.issuer.clone(),
            iat: now.unix_timestamp(),
            exp: expires.unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        debug!(user_id = %subject, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    /// Returns the subject only when signature, issuer and expiry all check out.
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Uuid, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        })?;
        if data.claims.exp <= now.unix_timestamp() {
            return Err(TokenError::Expired);
        }
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims.sub)
    }
}
