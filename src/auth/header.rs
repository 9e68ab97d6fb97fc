use std::{fmt, str::FromStr};

use super::VerificationError;

/// Scheme token expected in the `Authorization` header.
pub const HMAC_SCHEME: &str = "HMAC";

/// Parsed `Authorization` header: `<scheme> <parameter>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeader {
    scheme: String,
    parameter: Option<String>,
}

impl AuthHeader {
    pub fn new<S: Into<String>, P: Into<String>>(scheme: S, parameter: P) -> Self {
        Self {
            scheme: scheme.into(),
            parameter: Some(parameter.into()),
        }
    }

    pub fn hmac<P: Into<String>>(parameter: P) -> Self {
        Self::new(HMAC_SCHEME, parameter)
    }

    /// Parse a raw header value. Blank values are treated as absent.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        let (scheme, parameter) = match value.split_once(char::is_whitespace) {
            Some((scheme, rest)) => (scheme, Some(rest.trim()).filter(|p| !p.is_empty())),
            None => (value, None),
        };

        Some(Self {
            scheme: scheme.into(),
            parameter: parameter.map(Into::into),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn parameter(&self) -> Option<&str> {
        self.parameter.as_deref()
    }
}

impl FromStr for AuthHeader {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or(VerificationError::MissingHeader)
    }
}

impl fmt::Display for AuthHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parameter {
            Some(p) => write!(f, "{} {}", self.scheme, p),
            None => f.write_str(&self.scheme),
        }
    }
}
