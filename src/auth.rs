use base64::{engine::general_purpose, Engine as _};

/// Supplies the `Authorization` header value attached to every backend request.
pub trait CredentialProvider: Send + Sync {
    fn authorization(&self) -> Option<String>;
}

/// HTTP Basic credentials supplied at startup (flags or environment).
#[derive(Clone)]
pub struct BasicCredentials {
    username: String,
    password: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl CredentialProvider for BasicCredentials {
    fn authorization(&self) -> Option<String> {
        let token = general_purpose::STANDARD.encode(format!("{}:{}", self.username, self.password));
        Some(format!("Basic {token}"))
    }
}

/// Sends requests without an `Authorization` header.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn authorization(&self) -> Option<String> {
        None
    }
}
