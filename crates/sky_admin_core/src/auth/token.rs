//! Stateless signed identity tokens.
//!
//! # Responsibility
//! - Issue HS256-signed claim sets `{ sub, iat_ms, exp_ms, ..extra }`.
//! - Verify signature integrity and expiry without any server-side state.
//!
//! # Invariants
//! - Expiry is checked in milliseconds: a token is expired once
//!   `now > exp_ms`.
//! - Tokens are never revoked; they stay valid for their full TTL.
//! - Token bodies and the signing secret are never logged.

use crate::clock::{epoch_millis, Timestamp};
use crate::config::AuthConfig;
use crate::context::ActorId;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::time::Duration;

/// Claim names that extra claims may not shadow.
pub const RESERVED_CLAIMS: &[&str] = &["sub", "iat_ms", "exp_ms", "iat", "exp", "nbf", "aud", "iss"];

/// Opaque serialized token handed back to the client.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityToken(String);

impl IdentityToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for IdentityToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for IdentityToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Debug for IdentityToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("IdentityToken([REDACTED])")
    }
}

/// Signed claim set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Actor id in decimal form.
    pub sub: String,
    pub iat_ms: Timestamp,
    pub exp_ms: Timestamp,
    /// Caller-supplied claims carried alongside the reserved ones.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Token issuance and verification failures.
#[derive(Debug)]
pub enum AuthError {
    /// Structure, encoding, signature, or subject is invalid.
    Malformed,
    /// The token was valid but its lifetime has passed.
    Expired,
    /// No token was presented with the request.
    MissingToken,
    /// An extra claim tried to shadow a reserved claim name.
    ReservedClaim(String),
    /// The claim set could not be signed.
    Signing(jsonwebtoken::errors::Error),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed => write!(f, "identity token is malformed"),
            Self::Expired => write!(f, "identity token has expired"),
            Self::MissingToken => write!(f, "identity token is missing"),
            Self::ReservedClaim(name) => write!(f, "claim `{name}` is reserved"),
            Self::Signing(err) => write!(f, "failed to sign identity token: {err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Signing(err) => Some(err),
            Self::Malformed | Self::Expired | Self::MissingToken | Self::ReservedClaim(_) => None,
        }
    }
}

/// Issues and verifies identity tokens with a server-held secret.
pub struct TokenAuthenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    default_ttl: Duration,
    header_name: String,
}

impl Debug for TokenAuthenticator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthenticator")
            .field("default_ttl", &self.default_ttl)
            .field("header_name", &self.header_name)
            .finish_non_exhaustive()
    }
}

impl TokenAuthenticator {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            default_ttl: config.ttl(),
            header_name: config.header_name().to_string(),
        }
    }

    /// Lower-cased name of the request header carrying tokens.
    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    /// Issues a token for `actor` valid for `ttl` from now.
    ///
    /// # Errors
    /// - `ReservedClaim` when `extra` uses a reserved claim name.
    /// - `Signing` when the backend cannot encode the claim set.
    pub fn issue(
        &self,
        actor: ActorId,
        ttl: Duration,
        extra: Map<String, Value>,
    ) -> Result<IdentityToken, AuthError> {
        if let Some(name) = extra
            .keys()
            .find(|name| RESERVED_CLAIMS.contains(&name.as_str()))
        {
            warn!(
                "event=token_issue module=auth status=error error_code=reserved_claim claim={}",
                name
            );
            return Err(AuthError::ReservedClaim(name.clone()));
        }

        let issued_at = epoch_millis();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let claims = IdentityClaims {
            sub: actor.to_string(),
            iat_ms: issued_at,
            exp_ms: issued_at.saturating_add(ttl_ms),
            extra,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AuthError::Signing)?;
        debug!(
            "event=token_issue module=auth status=ok actor={} ttl_ms={}",
            actor, ttl_ms
        );
        Ok(IdentityToken(token))
    }

    /// Issues a token using the configured TTL.
    pub fn issue_default(
        &self,
        actor: ActorId,
        extra: Map<String, Value>,
    ) -> Result<IdentityToken, AuthError> {
        self.issue(actor, self.default_ttl, extra)
    }

    /// Verifies `token` and returns the actor it was issued for.
    pub fn verify(&self, token: &IdentityToken) -> Result<ActorId, AuthError> {
        let claims = self.verify_claims(token)?;
        claims.sub.parse::<ActorId>().map_err(|_| AuthError::Malformed)
    }

    /// Verifies `token` and returns its full claim set.
    pub fn verify_claims(&self, token: &IdentityToken) -> Result<IdentityClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is enforced below with millisecond precision.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let claims = decode::<IdentityClaims>(token.as_str(), &self.decoding_key, &validation)
            .map_err(|err| {
                debug!(
                    "event=token_verify module=auth status=error error_code=malformed error={}",
                    err
                );
                AuthError::Malformed
            })?
            .claims;

        if epoch_millis() > claims.exp_ms {
            debug!(
                "event=token_verify module=auth status=error error_code=expired exp_ms={}",
                claims.exp_ms
            );
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }
}
