//! Authentication of incoming connection requests.
//!
//! There are no user accounts to look up: a request presents a token,
//! and the token is compared against two shared secrets. Matching the
//! administrator password grants admin rights, matching the user password
//! grants a regular session. Every success mints a brand-new session, so
//! two tabs with the same password are two participants.
//!
//! The token is looked for, in order, in:
//!
//! 1. the `password` query parameter
//! 2. an `Authorization: Bearer <token>` header
//! 3. a `password` cookie
//!
//! The first non-empty one wins.

use std::sync::Arc;

use sharedesk_transport::HandshakeRequest;

use crate::{MemberProfile, Session, SessionError, SessionManager};

/// Name of the query parameter and cookie carrying the token.
pub const TOKEN_NAME: &str = "password";

/// Read access to the parts of a request that can carry a credential.
///
/// Implemented for the transport's [`HandshakeRequest`]; implement it for
/// any other request type to authenticate through a different front end.
pub trait CredentialSource {
    /// First value of the named query parameter.
    fn query_param(&self, name: &str) -> Option<&str>;

    /// First value of the named header, case-insensitive.
    fn header(&self, name: &str) -> Option<&str>;

    /// Value of the named cookie.
    fn cookie(&self, name: &str) -> Option<&str>;
}

impl CredentialSource for HandshakeRequest {
    fn query_param(&self, name: &str) -> Option<&str> {
        HandshakeRequest::query_param(self, name)
    }

    fn header(&self, name: &str) -> Option<&str> {
        HandshakeRequest::header(self, name)
    }

    fn cookie(&self, name: &str) -> Option<&str> {
        HandshakeRequest::cookie(self, name)
    }
}

/// Pulls the credential token out of a request, or `None` if there is
/// none anywhere.
pub fn extract_token<R>(request: &R) -> Option<&str>
where
    R: CredentialSource + ?Sized,
{
    request
        .query_param(TOKEN_NAME)
        .filter(|token| !token.is_empty())
        .or_else(|| request.header("Authorization").and_then(bearer_token))
        .or_else(|| {
            request
                .cookie(TOKEN_NAME)
                .filter(|token| !token.is_empty())
        })
}

/// `Bearer <token>`: longer than 7 bytes, scheme compared ignoring ASCII
/// case, token is everything after the 7th byte.
fn bearer_token(header: &str) -> Option<&str> {
    if header.len() <= 7 {
        return None;
    }
    let scheme = header.get(..6)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    header.get(7..)
}

impl SessionManager {
    /// Authenticates a request and registers a fresh session for it.
    ///
    /// The new session is registered but offline; the caller attaches a
    /// peer with [`Session::connect`].
    ///
    /// # Errors
    /// - [`SessionError::CredentialMissing`] — no token in the request
    /// - [`SessionError::CredentialInvalid`] — token matches neither password
    /// - whatever the [`IdentityMinter`](crate::IdentityMinter) returns
    pub fn authenticate<R>(&self, request: &R) -> Result<Arc<Session>, SessionError>
    where
        R: CredentialSource + ?Sized,
    {
        let token = extract_token(request).ok_or(SessionError::CredentialMissing)?;

        let config = &self.shared().config;
        let is_admin = token == config.admin_password;
        let is_user = token == config.password;

        if !is_admin && !is_user {
            tracing::debug!("rejected request with invalid password");
            return Err(SessionError::CredentialInvalid);
        }

        let id = self.shared().minter.mint()?;
        tracing::info!(session_id = %id, is_admin, "request authenticated");

        Ok(self.create(id, MemberProfile::ad_hoc(is_admin)))
    }
}
