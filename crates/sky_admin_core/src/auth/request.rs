//! Binding an inbound request to an identity context.
//!
//! # Responsibility
//! - Find the configured token header among the request headers.
//! - Pull the token out of its value, verify it, and produce the request's
//!   `IdentityContext`.
//!
//! # Invariants
//! - A context is produced only for a verified, unexpired token.
//! - Header names match case-insensitively; the first match wins.

use super::token::{AuthError, IdentityToken, TokenAuthenticator};
use crate::context::IdentityContext;
use log::{info, warn};

const BEARER_SCHEME: &str = "bearer";

/// Extracts the token from `Bearer <token>` or a bare token value.
///
/// Returns `None` for absent, empty, or scheme-only values.
pub fn extract_bearer(header_value: &str) -> Option<&str> {
    let trimmed = header_value.trim();
    let token = match trimmed.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case(BEARER_SCHEME) => rest.trim(),
        Some(_) => return None,
        None if trimmed.eq_ignore_ascii_case(BEARER_SCHEME) => return None,
        None => trimmed,
    };

    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Returns the value of the first header named `name`.
pub fn find_header<'a>(headers: &[(&str, &'a str)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(header, _)| header.trim().eq_ignore_ascii_case(name))
        .map(|(_, value)| *value)
}

/// Verifies the request's token and returns a context bound to its subject.
///
/// The token is read from the header named by
/// `TokenAuthenticator::header_name`.
///
/// # Errors
/// - `MissingToken` when the header is absent or carries no token.
/// - `Malformed` / `Expired` from token verification.
pub fn authenticate_request(
    authenticator: &TokenAuthenticator,
    headers: &[(&str, &str)],
) -> Result<IdentityContext, AuthError> {
    let mut ctx = IdentityContext::new();

    let Some(raw) = find_header(headers, authenticator.header_name()).and_then(extract_bearer)
    else {
        warn!(
            "event=request_auth module=auth status=error error_code=missing_token header={} request_id={}",
            authenticator.header_name(),
            ctx.request_id()
        );
        return Err(AuthError::MissingToken);
    };

    match authenticator.verify(&IdentityToken::from(raw)) {
        Ok(actor) => {
            ctx.set(actor);
            info!(
                "event=request_auth module=auth status=ok actor={} request_id={}",
                actor,
                ctx.request_id()
            );
            Ok(ctx)
        }
        Err(err) => {
            warn!(
                "event=request_auth module=auth status=error request_id={} error={}",
                ctx.request_id(),
                err
            );
            Err(err)
        }
    }
}
