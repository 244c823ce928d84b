//! Bearer token guard backed by signed claims and a revocation store.
//!
//! Verification policy, in order:
//!
//! 1. decode the bearer token and verify signature and expiry
//! 2. look up the `jti` claim in the token store; reject unknown, revoked
//!    or expired records
//! 3. compare the record's client fingerprint (IP + user agent hash stamped
//!    at issue time) against the presenting request; reject mismatches
//!
//! Any rejection resolves to "no principal" — the middleware turns that into
//! a 401 without learning why, and the reason is left in the logs.

use super::token_store::{client_fingerprint, TokenRecord, TokenStore};
use super::{Guard, PermissionStore, Principal};
use crate::ids::new_token_id;
use crate::server::request::Request;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, warn};

/// Claim set carried by issued tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub jti: String,
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("signing key is not configured")]
    MissingSigningKey,
    #[error("token encoding failed: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

/// Guard that authenticates `Authorization: Bearer` tokens.
pub struct JwtGuard {
    signing_key: String,
    token_ttl_secs: u64,
    leeway_secs: u64,
    store: Arc<dyn TokenStore>,
    permissions: Arc<dyn PermissionStore>,
}

impl JwtGuard {
    pub fn new(
        signing_key: impl Into<String>,
        store: Arc<dyn TokenStore>,
        permissions: Arc<dyn PermissionStore>,
    ) -> Self {
        Self {
            signing_key: signing_key.into(),
            token_ttl_secs: 3600,
            leeway_secs: 30,
            store,
            permissions,
        }
    }

    /// Lifetime of newly issued tokens, in seconds.
    pub fn token_ttl(mut self, secs: u64) -> Self {
        self.token_ttl_secs = secs;
        self
    }

    /// Clock skew tolerance for signature-level expiry checks.
    pub fn leeway(mut self, secs: u64) -> Self {
        self.leeway_secs = secs;
        self
    }

    /// Issue a token for `subject`, persisting its record bound to the
    /// presenting client's fingerprint.
    pub fn authorize(&self, subject: &str, request: &Request) -> Result<String, AuthError> {
        if self.signing_key.is_empty() {
            return Err(AuthError::MissingSigningKey);
        }
        let now = now_secs();
        let claims = TokenClaims {
            jti: new_token_id(),
            sub: subject.to_string(),
            iat: now,
            exp: now + self.token_ttl_secs,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.signing_key.as_bytes()),
        )?;
        self.store.insert(TokenRecord {
            jti: claims.jti.clone(),
            subject: claims.sub,
            fingerprint: client_fingerprint(&request.client_ip, request.user_agent()),
            issued_at: claims.iat,
            expires_at: claims.exp,
            revoked: false,
        });
        debug!(jti = %claims.jti, "Token issued");
        Ok(token)
    }

    /// Decode and verify the signature/expiry of a token, without consulting
    /// the store.
    #[must_use]
    pub fn payload(&self, token: &str) -> Option<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);
        validation.leeway = self.leeway_secs;
        match jsonwebtoken::decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.signing_key.as_bytes()),
            &validation,
        ) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!(error = %e, "Token rejected at decode");
                None
            }
        }
    }

    /// The `jti` claim of a token that passes signature verification.
    #[must_use]
    pub fn jti(&self, token: &str) -> Option<String> {
        self.payload(token).map(|c| c.jti)
    }

    /// Revoke a token by id (logout/refresh). Returns false for unknown ids.
    pub fn revoke(&self, jti: &str) -> bool {
        let revoked = self.store.revoke(jti);
        if revoked {
            debug!(jti = %jti, "Token revoked");
        }
        revoked
    }

    /// Full verification policy: signature, store lookup, revocation,
    /// expiry, client fingerprint.
    fn verify(&self, token: &str, request: &Request) -> Option<TokenClaims> {
        let claims = self.payload(token)?;
        let record = match self.store.get(&claims.jti) {
            Some(r) => r,
            None => {
                warn!(jti = %claims.jti, "Token not found in store");
                return None;
            }
        };
        if record.revoked {
            warn!(jti = %claims.jti, "Revoked token presented");
            return None;
        }
        if record.is_expired(now_secs()) {
            debug!(jti = %claims.jti, "Expired token presented");
            return None;
        }
        let presented = client_fingerprint(&request.client_ip, request.user_agent());
        if presented != record.fingerprint {
            warn!(jti = %claims.jti, "Token presented from a different client fingerprint");
            return None;
        }
        Some(claims)
    }
}

impl Guard for JwtGuard {
    fn user(&self, request: &Request) -> Option<Principal> {
        let token = request.bearer_token()?;
        let claims = self.verify(token, request)?;
        Some(Principal {
            permissions: self.permissions.permissions_for(&claims.sub),
            id: claims.sub,
        })
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
