use std::fmt::{self, Write as _};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::{info, warn};

use super::{render_state, PageView};
use crate::api::ScannerApi;
use crate::fetch::{loader, Fetch};
use crate::types::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    Email,
    Frequency,
    Target,
}

impl FromStr for ConfigField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" | "e-mail" => Ok(Self::Email),
            "frequency" | "scan_frequency" | "freq" => Ok(Self::Frequency),
            "target" | "network" => Ok(Self::Target),
            other => bail!("unknown config field: {other}"),
        }
    }
}

/// Editable copy of the fetched config. Frequency is kept as typed text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDraft {
    pub email: String,
    pub scan_frequency: String,
    pub target: String,
}

impl ConfigDraft {
    pub fn from_config(config: &Config) -> Self {
        Self {
            email: config.email.clone(),
            scan_frequency: config.scan_frequency.to_string(),
            target: config.target.clone(),
        }
    }

    pub fn set(&mut self, field: ConfigField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ConfigField::Email => self.email = value,
            ConfigField::Frequency => self.scan_frequency = value,
            ConfigField::Target => self.target = value,
        }
    }

    /// Full object sent on submit. No field is validated.
    pub fn to_config(&self) -> Config {
        Config {
            email: self.email.clone(),
            scan_frequency: parse_frequency(&self.scan_frequency),
            target: self.target.clone(),
        }
    }
}

/// Text to seconds with no range check. Fractions are truncated, anything else is `0`.
pub fn parse_frequency(raw: &str) -> i64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0;
    }
    if let Ok(v) = raw.parse::<i64>() {
        return v;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => v as i64,
        _ => {
            warn!(value = raw, "scan frequency is not a number, sending 0");
            0
        }
    }
}

pub struct ConfigPage {
    api: Arc<dyn ScannerApi>,
    config: Fetch<Config>,
    draft: ConfigDraft,
    mirrored: Option<Config>,
}

impl ConfigPage {
    pub fn new(api: Arc<dyn ScannerApi>) -> Self {
        let config = {
            let api = api.clone();
            Fetch::new(
                "/api/config",
                loader(move || {
                    let api = api.clone();
                    async move { anyhow::Ok(api.get_config().await?) }
                }),
            )
        };
        Self {
            api,
            config,
            draft: ConfigDraft::default(),
            mirrored: None,
        }
    }

    pub fn config(&self) -> &Fetch<Config> {
        &self.config
    }

    pub fn draft(&self) -> &ConfigDraft {
        &self.draft
    }

    /// Copy freshly fetched config into the draft. Returns true when the draft was replaced.
    pub fn sync_draft(&mut self) -> bool {
        let Some(fetched) = self.config.snapshot().data else {
            return false;
        };
        if self.mirrored.as_ref() == Some(&fetched) {
            return false;
        }
        self.draft = ConfigDraft::from_config(&fetched);
        self.mirrored = Some(fetched);
        true
    }

    pub fn set_field(&mut self, field: ConfigField, value: impl Into<String>) {
        self.sync_draft();
        self.draft.set(field, value);
    }

    /// Send the whole draft, then refetch whether or not the update was accepted.
    /// Refuses to send anything until the current config has been loaded into the draft.
    pub async fn submit(&mut self) -> Result<Config> {
        self.sync_draft();
        if self.mirrored.is_none() {
            bail!("config not loaded");
        }
        let config = self.draft.to_config();
        let outcome = self.api.update_config(&config).await;
        self.config.refetch();
        outcome?;
        info!(email = %config.email, frequency = config.scan_frequency, target = %config.target, "config updated");
        Ok(config)
    }

    fn write_body(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "System Config")?;
        writeln!(out, "  e-mail for reporting           : {}", self.draft.email)?;
        writeln!(out, "  auto-scan frequency in seconds : {}", self.draft.scan_frequency)?;
        writeln!(out, "  scanned network                : {}", self.draft.target)?;
        writeln!(out, "\n  set <email|frequency|target> <value>, then `save` to Update Config")
    }

    fn render_body(&self) -> String {
        let mut out = String::new();
        self.write_body(&mut out).map(|()| out).unwrap_or_default()
    }
}

impl PageView for ConfigPage {
    fn render(&mut self) -> String {
        self.sync_draft();
        let state = self.config.snapshot();
        render_state(&state, |_| self.render_body())
    }

    fn refetch(&self) {
        self.config.refetch();
    }
}
