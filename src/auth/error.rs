use thiserror::Error;

/// Reasons an inbound request is rejected.
///
/// Messages are safe to return to the caller: they never carry key or MAC material.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Id not present on request.")]
    MissingSenderIdentity,
    #[error("Authentication header not present on request.")]
    MissingHeader,
    #[error("Incorrect authorization header scheme.")]
    WrongScheme,
    #[error("Signing key for {0} is not configured")]
    UnknownSigningIdentity(String),
    #[error("Unable to validate authentication header for messages with empty body.")]
    EmptyBody,
    #[error("Authentication header value mismatch.")]
    SignatureMismatch,
    #[error("Internal error while verifying MAC on incoming request.")]
    InternalVerificationFailure,
}
