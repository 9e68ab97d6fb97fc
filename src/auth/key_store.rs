use std::collections::HashMap;

/// Immutable table of sender identities to base64-encoded signing keys.
///
/// Identities are stored lowercase, so lookups are case-insensitive on the
/// identity and exact on the key material.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct KeyStore {
    keys: HashMap<String, String>,
}

impl KeyStore {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            keys: entries
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_lowercase(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, identity: &str) -> Option<&str> {
        self.keys.get(&identity.to_lowercase()).map(String::as_str)
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Keys stay out of logs.
        let mut identities: Vec<_> = self.identities().collect();
        identities.sort_unstable();
        f.debug_struct("KeyStore")
            .field("identities", &identities)
            .finish_non_exhaustive()
    }
}
