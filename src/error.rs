use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::auth::VerificationError;

#[derive(Debug, Error)]
pub enum ErrorCode {
    Unauthorized(#[from] VerificationError),
    UnreadableBody(String),
    PayloadTooLarge(usize),
}

#[derive(Serialize)]
pub struct ErrorCodeDetail {
    #[serde(skip)]
    status_code: StatusCode,
    internal_code: u32,
    message: String,
}

impl ErrorCode {
    pub fn details(&self) -> ErrorCodeDetail {
        self.into()
    }
}

impl ErrorCodeDetail {
    pub fn with_status_code<T: Into<String>>(
        status_code: StatusCode,
        internal_code: u32,
        message: T,
    ) -> Self {
        Self {
            internal_code,
            status_code,
            message: message.into(),
        }
    }

    pub fn bad_request<T: Into<String>>(internal_code: u32, message: T) -> Self {
        Self::with_status_code(StatusCode::BAD_REQUEST, internal_code, message)
    }

    pub fn unauthorized<T: Into<String>>(internal_code: u32, message: T) -> Self {
        Self::with_status_code(StatusCode::UNAUTHORIZED, internal_code, message)
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    pub fn internal_code(&self) -> u32 {
        self.internal_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn verification_code(error: &VerificationError) -> u32 {
    match error {
        VerificationError::MissingSenderIdentity => 1,
        VerificationError::MissingHeader => 2,
        VerificationError::WrongScheme => 3,
        VerificationError::UnknownSigningIdentity(_) => 4,
        VerificationError::EmptyBody => 5,
        VerificationError::SignatureMismatch => 6,
        VerificationError::InternalVerificationFailure => 7,
    }
}

impl From<&ErrorCode> for ErrorCodeDetail {
    fn from(value: &ErrorCode) -> Self {
        match value {
            ErrorCode::Unauthorized(e) => Self::unauthorized(verification_code(e), e.to_string()),
            ErrorCode::UnreadableBody(e) => {
                Self::bad_request(10, format!("Unreadable request body: '{}'", e))
            }
            ErrorCode::PayloadTooLarge(limit) => Self::with_status_code(
                StatusCode::PAYLOAD_TOO_LARGE,
                11,
                format!("Request body exceeds {} bytes", limit),
            ),
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let detail = ErrorCodeDetail::from(self);
        f.write_str(&detail.message)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_verification_error_details() {
        let detail = ErrorCode::from(VerificationError::SignatureMismatch).details();

        assert_eq!(detail.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(detail.internal_code(), 6);
        assert_eq!(detail.message(), "Authentication header value mismatch.");
    }

    #[test]
    fn test_detail_serialization_skips_status() {
        let detail = ErrorCode::UnreadableBody("boom".into()).details();

        assert_eq!(
            serde_json::to_value(&detail).unwrap(),
            serde_json::json!({
                "internal_code": 10,
                "message": "Unreadable request body: 'boom'"
            })
        );
        assert_eq!(detail.status_code(), StatusCode::BAD_REQUEST);
    }
}
