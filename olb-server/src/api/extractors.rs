//! Custom Axum extractors for request authentication.
//!
//! `AuthedTeacher` verifies the `Authorization: Bearer {token}` header. The
//! token is a signed record token embedding the teacher id and an expiry;
//! verification is delegated to [`olb_sdk::signature`].

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use olb_sdk::signature::{self, SignatureError};
use uuid::Uuid;

use crate::state::AppState;

/// An authenticated teacher, extracted from the bearer access token.
pub struct AuthedTeacher {
    pub teacher_id: Uuid,
}

/// Errors that can occur during access-token verification.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing Authorization header")]
    MissingHeader,
    #[error("invalid Authorization header format")]
    InvalidHeader,
    #[error("invalid access token")]
    InvalidToken,
    #[error("access token expired")]
    Expired,
}

impl From<SignatureError> for AuthError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::InvalidFormat | SignatureError::InvalidBase64 => Self::InvalidToken,
            SignatureError::SignatureMismatch => Self::InvalidToken,
            SignatureError::Expired => Self::Expired,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingHeader => "missing Authorization header",
            AuthError::InvalidHeader => "invalid Authorization header format",
            AuthError::InvalidToken => "invalid access token",
            AuthError::Expired => "access token expired",
        };
        (StatusCode::UNAUTHORIZED, message).into_response()
    }
}

impl FromRequestParts<AppState> for AuthedTeacher {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidHeader)?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidHeader)?;

        let auth = state.config.auth.read().await;
        let teacher_id = signature::redeem_token(token, auth.session_secret())?;
        drop(auth);

        Ok(AuthedTeacher { teacher_id })
    }
}
