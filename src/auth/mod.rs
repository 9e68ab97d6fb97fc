mod error;
mod header;
mod key_store;
mod verifier;

pub use self::error::VerificationError;
pub use self::header::{AuthHeader, HMAC_SCHEME};
pub use self::key_store::KeyStore;
pub use self::verifier::{VerificationResult, VerifiedSender, Verifier};
