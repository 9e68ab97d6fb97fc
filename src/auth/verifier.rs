use crate::crypto::{compute_signature, decode_key, is_valid_signature, CryptoError};

use super::{AuthHeader, KeyStore, VerificationError, HMAC_SCHEME};

/// Identity whose signing key proved the request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSender(String);

impl VerifiedSender {
    pub fn identity(&self) -> &str {
        &self.0
    }
}

/// Accept/reject verdict, with a reason iff rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub accepted: bool,
    pub reason: Option<String>,
}

impl VerificationResult {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            reason: None,
        }
    }

    pub fn rejected(error: &VerificationError) -> Self {
        Self {
            accepted: false,
            reason: Some(error.to_string()),
        }
    }
}

impl<T> From<Result<T, VerificationError>> for VerificationResult {
    fn from(value: Result<T, VerificationError>) -> Self {
        match value {
            Ok(_) => Self::accepted(),
            Err(e) => Self::rejected(&e),
        }
    }
}

/// HMAC-SHA-256 request verifier over an immutable [`KeyStore`].
#[derive(Debug, Clone)]
pub struct Verifier {
    key_store: KeyStore,
    default_sender: Option<String>,
}

impl Verifier {
    pub fn new(key_store: KeyStore) -> Self {
        Self {
            key_store,
            default_sender: None,
        }
    }

    /// Use `sender` when a request carries no sender identity, instead of
    /// rejecting it.
    pub fn with_default_sender<T: Into<String>>(mut self, sender: T) -> Self {
        self.default_sender = Some(sender.into()).filter(|s| !s.is_empty());
        self
    }

    pub fn key_store(&self) -> &KeyStore {
        &self.key_store
    }

    pub fn default_sender(&self) -> Option<&str> {
        self.default_sender.as_deref()
    }

    /// Verify that `body` was signed by the key of the claimed sender.
    ///
    /// Checks run in a fixed order and the first failure wins:
    /// header presence, scheme, sender identity, key lookup, empty body, then
    /// the MAC itself.
    #[tracing::instrument(skip(self, header, body), fields(body_len = body.len()))]
    pub fn verify(
        &self,
        header: Option<&AuthHeader>,
        body: &[u8],
        claimed_sender: Option<&str>,
    ) -> Result<VerifiedSender, VerificationError> {
        let sender = claimed_sender
            .filter(|s| !s.is_empty())
            .or(self.default_sender.as_deref());

        let header = header.ok_or(VerificationError::MissingHeader)?;
        if header.scheme() != HMAC_SCHEME {
            return Err(VerificationError::WrongScheme);
        }

        let sender = sender
            .ok_or(VerificationError::MissingSenderIdentity)?
            .to_lowercase();
        let encoded_key = self
            .key_store
            .get(&sender)
            .ok_or_else(|| VerificationError::UnknownSigningIdentity(sender.clone()))?;

        if body.is_empty() {
            return Err(VerificationError::EmptyBody);
        }

        let provided = header.parameter().unwrap_or_default();
        let valid = decode_key(encoded_key)
            .and_then(|key| is_valid_signature(provided, body, &key))
            .map_err(|e| internal_failure(&sender, e))?;

        if valid {
            tracing::info!(sender = %sender, "request signature verified");
            Ok(VerifiedSender(sender))
        } else {
            tracing::debug!(sender = %sender, provided = %provided, "signature mismatch");
            Err(VerificationError::SignatureMismatch)
        }
    }

    /// Same checks as [`Verifier::verify`], flattened into a verdict.
    pub fn validate(
        &self,
        header: Option<&AuthHeader>,
        body: &[u8],
        claimed_sender: Option<&str>,
    ) -> VerificationResult {
        self.verify(header, body, claimed_sender).into()
    }

    /// Build the `Authorization` header `sender` would present for `body`.
    pub fn sign(&self, sender: &str, body: &[u8]) -> Result<AuthHeader, VerificationError> {
        let sender = sender.to_lowercase();
        let encoded_key = self
            .key_store
            .get(&sender)
            .ok_or_else(|| VerificationError::UnknownSigningIdentity(sender.clone()))?;

        decode_key(encoded_key)
            .and_then(|key| compute_signature(&key, body))
            .map(AuthHeader::hmac)
            .map_err(|e| internal_failure(&sender, e))
    }
}

fn internal_failure(sender: &str, error: CryptoError) -> VerificationError {
    tracing::error!(
        sender = %sender,
        error = %error,
        "exception occurred while verifying HMAC on the incoming request"
    );
    VerificationError::InternalVerificationFailure
}
