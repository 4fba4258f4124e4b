//! Session decoding
//!
//! The subject of an access token is read without verifying its signature.
//! The client cannot verify signatures, so the result only personalizes the
//! UI (e.g. "is this my post"); the server re-checks authorization on every
//! call.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::credentials::{Credential, CredentialStore};

/// Authenticated subject identifier
pub type UserId = i64;

/// Session lifecycle notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A credential was stored (login, registration, refresh)
    Started,
    /// The session was terminated client-side (logout or failed refresh)
    Ended,
}

/// Claims the decoder cares about
#[derive(Debug, Deserialize)]
struct SubjectClaims {
    sub: Option<Value>,
}

fn insecure_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}

/// Read the numeric `sub` claim of a structured token
///
/// Returns `None` for any malformation: wrong segment count, undecodable
/// payload, missing subject, or a subject that is not an integer.
pub fn subject_of(credential: &Credential) -> Option<UserId> {
    let token = credential.as_str();
    if token.split('.').count() != 3 {
        warn!("Access token is not a three-segment token");
        return None;
    }

    let data = match decode::<SubjectClaims>(token, &DecodingKey::from_secret(&[]), &insecure_validation()) {
        Ok(data) => data,
        Err(e) => {
            warn!("Failed to decode access token payload: {}", e);
            return None;
        }
    };

    let subject = match data.claims.sub {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };

    if subject.is_none() {
        warn!("Access token carries no numeric subject");
    }
    subject
}

/// Subject of the currently stored credential
pub fn current_user_id(store: &dyn CredentialStore) -> Option<UserId> {
    store.get().as_ref().and_then(subject_of)
}
