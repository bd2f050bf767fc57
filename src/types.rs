use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// One execution of the scanner, as returned by `/api/scans`.
///
/// `hosts` is absent while the backend is still running the scan.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    pub id: i64,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<Host>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<Port>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub port_num: u32,
    pub protocol: String,
    pub service_name: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vulnerabilities: Option<Vec<Vulnerability>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Vulnerability {
    pub cve: String,
    pub description: String,
    pub score: String,
    pub url: String,
}

/// Scanner configuration, read and written as a whole object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    pub email: String,
    pub scan_frequency: i64,
    pub target: String,
}

/// Body of `/api/scan/run`. Only logged.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RunScanResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub scan_id: Option<i64>,
}

impl Scan {
    /// Backend timestamp, see [`parse_backend_date`].
    pub fn timestamp(&self) -> Option<PrimitiveDateTime> {
        parse_backend_date(&self.date)
    }

    pub fn hosts(&self) -> &[Host] {
        self.hosts.as_deref().unwrap_or_default()
    }

    /// Number of vulnerabilities across every host and port of this scan.
    pub fn vulnerability_count(&self) -> usize {
        self.hosts()
            .iter()
            .flat_map(Host::ports)
            .map(|p| p.vulnerabilities().len())
            .sum()
    }

    pub fn has_vulnerabilities(&self) -> bool {
        self.vulnerability_count() > 0
    }
}

impl Host {
    pub fn ports(&self) -> &[Port] {
        self.ports.as_deref().unwrap_or_default()
    }
}

impl Port {
    pub fn vulnerabilities(&self) -> &[Vulnerability] {
        self.vulnerabilities.as_deref().unwrap_or_default()
    }
}

/// Backend timestamps: `YYYY-MM-DD HH:MM:SS` (or with a `T`), else RFC 3339 normalized to UTC.
pub fn parse_backend_date(raw: &str) -> Option<PrimitiveDateTime> {
    let raw = raw.trim();
    let normalized = raw.replacen('T', " ", 1);
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    if let Ok(naive) = PrimitiveDateTime::parse(&normalized, &fmt) {
        return Some(naive);
    }
    let utc = OffsetDateTime::parse(raw, &Rfc3339).ok()?.to_offset(UtcOffset::UTC);
    Some(PrimitiveDateTime::new(utc.date(), utc.time()))
}

/// Display form `DD.MM.YYYY, HH:MM:SS`. Unparsable input is shown as-is.
pub fn format_display_date(raw: &str) -> String {
    let fmt = format_description!("[day].[month].[year], [hour]:[minute]:[second]");
    parse_backend_date(raw)
        .and_then(|dt| dt.format(&fmt).ok())
        .unwrap_or_else(|| raw.to_string())
}
