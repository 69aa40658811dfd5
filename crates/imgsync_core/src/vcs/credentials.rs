//! Credential providers.
//!
//! Tokens never appear in the remote URL or on the command line. Network
//! commands receive an `Authorization` header through the child's
//! environment (`GIT_CONFIG_COUNT` / `GIT_CONFIG_KEY_n` / `GIT_CONFIG_VALUE_n`).

use std::env;
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

/// Errors from resolving a credential.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Environment variable '{var}' is not valid unicode")]
    NotUnicode { var: String },
}

/// Username and secret for HTTPS basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    secret: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    /// Value of the HTTP `Authorization` header.
    pub fn authorization_header(&self) -> String {
        let pair = format!("{}:{}", self.username, self.secret);
        format!("Authorization: Basic {}", STANDARD.encode(pair))
    }

    /// Environment variables that make the tool send the header.
    pub fn to_env(&self) -> Vec<(String, String)> {
        vec![
            ("GIT_CONFIG_COUNT".to_string(), "1".to_string()),
            ("GIT_CONFIG_KEY_0".to_string(), "http.extraHeader".to_string()),
            ("GIT_CONFIG_VALUE_0".to_string(), self.authorization_header()),
        ]
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Source of credentials for network commands.
pub trait CredentialProvider: Send + Sync {
    /// Resolve the credential. `Ok(None)` leaves authentication to the tool's
    /// own configuration.
    fn credential(&self) -> Result<Option<Credential>, CredentialError>;
}

/// Reads the token from an environment variable at call time.
#[derive(Debug, Clone)]
pub struct EnvCredentialProvider {
    var: String,
    username: String,
}

impl EnvCredentialProvider {
    pub fn new(var: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            username: username.into(),
        }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn credential(&self) -> Result<Option<Credential>, CredentialError> {
        match env::var(&self.var) {
            Ok(token) if token.trim().is_empty() => Ok(None),
            Ok(token) => Ok(Some(Credential::new(&self.username, token.trim()))),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => Err(CredentialError::NotUnicode {
                var: self.var.clone(),
            }),
        }
    }
}

/// Fixed credential, e.g. one injected by an embedding application.
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider(pub Credential);

impl CredentialProvider for StaticCredentialProvider {
    fn credential(&self) -> Result<Option<Credential>, CredentialError> {
        Ok(Some(self.0.clone()))
    }
}

/// Never supplies a credential.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn credential(&self) -> Result<Option<Credential>, CredentialError> {
        Ok(None)
    }
}
