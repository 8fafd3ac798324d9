use std::path::{Path, PathBuf};

use tracing::{debug, info};

pub const ACCESS_TOKEN_VAR: &str = "INATURALIST_ACCESS_TOKEN";

pub trait CredentialProvider {
    fn token(&self) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl CredentialProvider for Anonymous {
    fn token(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl CredentialProvider for StaticToken {
    fn token(&self) -> Option<String> {
        non_empty(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct EnvFileCredentials {
    path: PathBuf,
}

impl EnvFileCredentials {
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(".env"),
        }
    }

    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn from_file(&self) -> Option<String> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no .env file");
            return None;
        }
        let entries = dotenvy::from_path_iter(&self.path).ok()?;
        for entry in entries.flatten() {
            if entry.0 == ACCESS_TOKEN_VAR {
                return non_empty(&entry.1);
            }
        }
        None
    }
}

impl Default for EnvFileCredentials {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialProvider for EnvFileCredentials {
    fn token(&self) -> Option<String> {
        if let Some(token) = self.from_file() {
            info!("using access token from {}", self.path.display());
            return Some(token);
        }
        let token = std::env::var(ACCESS_TOKEN_VAR)
            .ok()
            .and_then(|value| non_empty(&value));
        if token.is_some() {
            info!("using access token from environment");
        }
        token
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
