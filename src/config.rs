use std::{
    collections::HashMap,
    net::SocketAddr,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::{
    auth::{KeyStore, Verifier},
    crypto::{decode_key, KEY_LENGTH},
};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Malformed bind IP: '{0}'. Make sure you entered a valid IP.")]
    MalformedBindIp(String),
    #[error("Malformed signing key entry: '{0}'. Expected 'id=base64key'.")]
    MalformedSigningKeyEntry(String),
    #[error("Signing key for '{0}' is configured more than once.")]
    DuplicateSigningKeyIdentity(String),
    #[error("Signing key for '{0}' must be a base64 string decoding to 32 bytes.")]
    MalformedSigningKey(String),
    #[error("Could not read signing keys file: '{}'.", .0.display())]
    UnreadableSigningKeysFile(PathBuf, #[source] std::io::Error),
    #[error("Malformed signing keys file: '{}'. Expected a JSON object of id to base64 key.", .0.display())]
    MalformedSigningKeysFile(PathBuf, #[source] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct Config {
    telemetry_url: Option<String>,
    signing_keys: HashMap<String, String>,
    signing_keys_file: Option<PathBuf>,
    default_sender: Option<String>,
    bind_ip: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            telemetry_url: env_to_str("TH_TELEMETRY_URL"),
            signing_keys: env_to_signing_keys("TH_SIGNING_KEYS")?,
            signing_keys_file: env_to_str("TH_SIGNING_KEYS_FILE").map(PathBuf::from),
            default_sender: env_to_str("TH_DEFAULT_SENDER"),
            bind_ip: env_to_str("TH_BIND_IP").unwrap_or_else(|| "127.0.0.1:3000".into()),
        })
    }

    pub fn empty() -> Self {
        Self {
            telemetry_url: None,
            signing_keys: HashMap::new(),
            signing_keys_file: None,
            default_sender: None,
            bind_ip: "".into(),
        }
    }

    pub fn telemetry_url(&self) -> Option<&str> {
        self.telemetry_url.as_deref()
    }

    pub fn default_sender(&self) -> Option<&str> {
        self.default_sender.as_deref()
    }

    pub fn bind_ip(&self) -> &str {
        &self.bind_ip
    }

    pub fn set_telemetry_url<T: Into<String>>(&mut self, value: T) {
        self.telemetry_url = Some(value.into());
    }

    pub fn set_signing_keys(&mut self, conf: &str) -> Result<(), ConfigError> {
        self.signing_keys = parse_signing_keys(conf)?;
        Ok(())
    }

    pub fn set_signing_keys_file<T: Into<PathBuf>>(&mut self, value: T) {
        self.signing_keys_file = Some(value.into());
    }

    pub fn set_default_sender<T: Into<String>>(&mut self, value: T) {
        self.default_sender = Some(value.into()).filter(|s| !s.is_empty());
    }

    pub fn set_bind_ip<T: Into<String>>(&mut self, value: T) {
        self.bind_ip = value.into();
    }

    pub fn validate_configuration(&self) -> Result<(), ConfigError> {
        let _ = SocketAddr::from_str(&self.bind_ip)
            .map_err(|_| ConfigError::MalformedBindIp(self.bind_ip.clone()))?;

        self.load_key_store().map(|_| ())
    }

    /// Build the key table from the keys file then the inline entries.
    /// Inline entries win over file entries for the same identity.
    pub fn load_key_store(&self) -> Result<KeyStore, ConfigError> {
        let mut keys = match &self.signing_keys_file {
            Some(path) => read_signing_keys_file(path)?,
            None => HashMap::new(),
        };

        for (identity, key) in &self.signing_keys {
            keys.insert(identity.to_lowercase(), key.clone());
        }

        for (identity, key) in &keys {
            match decode_key(key) {
                Ok(bytes) if bytes.len() == KEY_LENGTH => {}
                _ => return Err(ConfigError::MalformedSigningKey(identity.clone())),
            }
        }

        Ok(KeyStore::new(keys))
    }

    pub fn build_verifier(&self) -> Result<Verifier, ConfigError> {
        let verifier = Verifier::new(self.load_key_store()?);

        Ok(match self.default_sender() {
            Some(sender) => verifier.with_default_sender(sender),
            None => verifier,
        })
    }
}

fn env_to_str(env_key: &str) -> Option<String> {
    std::env::var(env_key).ok().filter(|s| !s.is_empty())
}

fn env_to_signing_keys(env_key: &str) -> Result<HashMap<String, String>, ConfigError> {
    match env_to_str(env_key) {
        Some(value) => parse_signing_keys(&value),
        None => Ok(HashMap::new()),
    }
}

/// Parse an inline signing key table.
/// Syntax is like that:
///
/// ```text
/// contoso=vqF0En+Z0ucuRTM/01o2GuhMH3hKKk/N2bOmlM31zaA=,fabrikam=QgyNSToQjf4p6+YzDpjKks1/tXeJQ7FhVHqRwTnugVI=
/// ```
///
/// Only the first `=` of each entry separates the identity from the key.
fn parse_signing_keys(conf: &str) -> Result<HashMap<String, String>, ConfigError> {
    let entries = conf
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((identity, key)) if !identity.trim().is_empty() && !key.trim().is_empty() => {
                Ok((identity.trim().to_owned(), key.trim().to_owned()))
            }
            _ => Err(ConfigError::MalformedSigningKeyEntry(
                entry.split('=').next().unwrap_or_default().to_owned(),
            )),
        })
        .collect::<Result<Vec<_>, _>>()?;

    lowercase_identities(entries)
}

/// Identities differing only by case would collide once lowercased.
fn lowercase_identities<I>(entries: I) -> Result<HashMap<String, String>, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut keys = HashMap::new();
    for (identity, key) in entries {
        let identity = identity.to_lowercase();
        if keys.contains_key(&identity) {
            return Err(ConfigError::DuplicateSigningKeyIdentity(identity));
        }
        keys.insert(identity, key);
    }

    Ok(keys)
}

fn read_signing_keys_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::UnreadableSigningKeysFile(path.to_path_buf(), e))?;
    let keys: HashMap<String, String> = serde_json::from_str(&contents)
        .map_err(|e| ConfigError::MalformedSigningKeysFile(path.to_path_buf(), e))?;

    lowercase_identities(keys)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;

    const CONTOSO_KEY: &str = "vqF0En+Z0ucuRTM/01o2GuhMH3hKKk/N2bOmlM31zaA=";
    const FABRIKAM_KEY: &str = "QgyNSToQjf4p6+YzDpjKks1/tXeJQ7FhVHqRwTnugVI=";

    fn create_test_config() -> Config {
        let mut config = Config::empty();
        config.set_bind_ip("127.0.0.1:3000");
        config
    }

    #[test]
    fn test_parse_signing_keys() {
        let keys =
            parse_signing_keys(&format!("Contoso={},fabrikam={}", CONTOSO_KEY, FABRIKAM_KEY))
                .unwrap();

        assert_eq!(keys.len(), 2);
        assert_eq!(keys["contoso"], CONTOSO_KEY);
        assert_eq!(keys["fabrikam"], FABRIKAM_KEY);
    }

    #[test]
    fn test_parse_signing_keys_malformed_entry() {
        assert_matches!(
            parse_signing_keys("contoso"),
            Err(ConfigError::MalformedSigningKeyEntry(id)) if id == "contoso"
        );
        assert_matches!(
            parse_signing_keys("=abc"),
            Err(ConfigError::MalformedSigningKeyEntry(_))
        );
        assert_eq!(parse_signing_keys("").unwrap().len(), 0);
    }

    #[test]
    fn test_validate_configuration() {
        let mut config = create_test_config();
        config
            .set_signing_keys(&format!("contoso={}", CONTOSO_KEY))
            .unwrap();
        assert_matches!(config.validate_configuration(), Ok(()));

        config.set_bind_ip("nope");
        assert_matches!(
            config.validate_configuration(),
            Err(ConfigError::MalformedBindIp(_))
        );
    }

    #[test]
    fn test_short_key_is_rejected() {
        let mut config = create_test_config();
        // 16 bytes only
        config
            .set_signing_keys("contoso=AAAAAAAAAAAAAAAAAAAAAA==")
            .unwrap();

        let err = config.validate_configuration().unwrap_err();
        assert_matches!(&err, ConfigError::MalformedSigningKey(id) if id == "contoso");
        assert!(!err.to_string().contains("AAAA"));
    }

    #[test]
    fn test_non_base64_key_is_rejected() {
        let mut config = create_test_config();
        config.set_signing_keys("contoso=not-base64").unwrap();

        assert_matches!(
            config.load_key_store(),
            Err(ConfigError::MalformedSigningKey(_))
        );
    }

    #[test]
    fn test_signing_keys_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"Contoso": "{}", "fabrikam": "{}"}}"#,
            CONTOSO_KEY, FABRIKAM_KEY
        )
        .unwrap();

        let mut config = create_test_config();
        config.set_signing_keys_file(file.path());
        // Inline entries override the file
        config
            .set_signing_keys("fabrikam=AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=")
            .unwrap();

        let store = config.load_key_store().unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("contoso"), Some(CONTOSO_KEY));
        assert_eq!(
            store.get("fabrikam"),
            Some("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=")
        );
    }

    #[test]
    fn test_duplicate_identities_are_rejected() {
        assert_matches!(
            parse_signing_keys(&format!("contoso={},Contoso={}", CONTOSO_KEY, FABRIKAM_KEY)),
            Err(ConfigError::DuplicateSigningKeyIdentity(id)) if id == "contoso"
        );

        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("keys.json");
        std::fs::write(
            &path,
            format!(
                r#"{{"Contoso": "{}", "contoso": "{}"}}"#,
                CONTOSO_KEY, FABRIKAM_KEY
            ),
        )
        .unwrap();

        let mut config = create_test_config();
        config.set_signing_keys_file(&path);
        let err = config.load_key_store().unwrap_err();
        assert_matches!(&err, ConfigError::DuplicateSigningKeyIdentity(id) if id == "contoso");
        assert!(!err.to_string().contains(CONTOSO_KEY));
    }

    #[test]
    fn test_signing_keys_file_errors() {
        let tempdir = tempfile::tempdir().unwrap();

        let mut config = create_test_config();
        config.set_signing_keys_file(tempdir.path().join("missing.json"));
        assert_matches!(
            config.load_key_store(),
            Err(ConfigError::UnreadableSigningKeysFile(_, _))
        );

        let path = tempdir.path().join("keys.json");
        std::fs::write(&path, "[]").unwrap();
        config.set_signing_keys_file(&path);
        assert_matches!(
            config.load_key_store(),
            Err(ConfigError::MalformedSigningKeysFile(_, _))
        );
    }

    #[test]
    fn test_build_verifier_default_sender() {
        let mut config = create_test_config();
        let verifier = config.build_verifier().unwrap();
        assert_eq!(verifier.default_sender(), None);

        config.set_default_sender("delegate");
        let verifier = config.build_verifier().unwrap();
        assert_eq!(verifier.default_sender(), Some("delegate"));
    }
}
