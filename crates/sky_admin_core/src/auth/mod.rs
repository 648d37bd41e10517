//! Authentication: stateless identity tokens, request binding, credentials.
//!
//! # Responsibility
//! - Issue and verify signed, time-limited identity tokens.
//! - Turn an inbound token into the request's `IdentityContext`.
//! - Hash and verify stored account passwords.
//!
//! # Invariants
//! - No session store exists; a token carries everything needed to verify it.
//!
//! # See also
//! - `crate::config::AuthConfig`

pub mod password;
pub mod request;
pub mod token;

pub use password::{CredentialHasher, PasswordError, DEFAULT_PASSWORD};
pub use request::{authenticate_request, extract_bearer, find_header};
pub use token::{AuthError, IdentityClaims, IdentityToken, TokenAuthenticator};
