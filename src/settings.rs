use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::auth::{BasicCredentials, CredentialProvider, NoCredentials};
use crate::shell::{FilePageStore, Page};

pub const DEFAULT_API: &str = "http://localhost:8080";

/// Resolved runtime settings for one dashboard session.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub api_base: String,
    pub credentials: Option<BasicCredentials>,
    pub state_file: PathBuf,
    pub start_page: Option<Page>,
    pub once: bool,
}

impl DashboardConfig {
    /// Build settings from raw CLI/env values. A username without a password is rejected.
    pub fn resolve(
        api: Option<String>,
        user: Option<String>,
        password: Option<String>,
        state_file: Option<PathBuf>,
        page: Option<&str>,
        once: bool,
    ) -> Result<Self> {
        let api_base = api
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| DEFAULT_API.to_string());
        if !api_base.starts_with("http://") && !api_base.starts_with("https://") {
            bail!("api base must be an http(s) URL: {api_base}");
        }

        let credentials = match (user, password) {
            (Some(u), Some(p)) => Some(BasicCredentials::new(u, p)),
            (None, None) => None,
            (Some(_), None) => bail!("--user requires --password (or SCAN_DASH_PASSWORD)"),
            (None, Some(_)) => bail!("--password requires --user (or SCAN_DASH_USER)"),
        };

        let state_file = match state_file {
            Some(p) => p,
            None => FilePageStore::default_path()?,
        };

        let start_page = page.map(str::parse::<Page>).transpose()?;

        Ok(Self {
            api_base,
            credentials,
            state_file,
            start_page,
            once,
        })
    }

    pub fn credential_provider(&self) -> Arc<dyn CredentialProvider> {
        match &self.credentials {
            Some(c) => Arc::new(c.clone()),
            None => Arc::new(NoCredentials),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> Option<PathBuf> {
        Some(PathBuf::from("/tmp/scan-dash-page"))
    }

    #[test]
    fn defaults_to_local_backend_without_auth() {
        let cfg = DashboardConfig::resolve(None, None, None, state(), None, false).unwrap();
        assert_eq!(cfg.api_base, DEFAULT_API);
        assert!(cfg.credential_provider().authorization().is_none());
        assert!(cfg.start_page.is_none());
    }

    #[test]
    fn credentials_must_come_in_pairs() {
        assert!(DashboardConfig::resolve(None, Some("admin".into()), None, state(), None, false).is_err());
        let cfg = DashboardConfig::resolve(
            Some("https://scanner.lan".into()),
            Some("admin".into()),
            Some("secret".into()),
            state(),
            Some("scans"),
            true,
        )
        .unwrap();
        assert_eq!(cfg.credential_provider().authorization().as_deref(), Some("Basic YWRtaW46c2VjcmV0"));
        assert_eq!(cfg.start_page, Some(Page::Stats));
    }

    #[test]
    fn rejects_non_http_base_and_unknown_page() {
        assert!(DashboardConfig::resolve(Some("ftp://x".into()), None, None, state(), None, false).is_err());
        assert!(DashboardConfig::resolve(None, None, None, state(), Some("about"), false).is_err());
    }
}
