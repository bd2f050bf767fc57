use std::fmt::{self, Write as _};
use std::sync::Arc;

use tracing::{error, info};

use super::{render_state, PageView};
use crate::api::ScannerApi;
use crate::fetch::{loader, Fetch};
use crate::types::{format_display_date, Scan};

/// Latest scan by backend date. Unparsable dates sort before every parsable one.
pub fn newest_scan(scans: &[Scan]) -> Option<&Scan> {
    scans.iter().max_by_key(|s| (s.timestamp(), s.date.clone()))
}

/// Latest scan with at least one vulnerability anywhere in its host/port tree.
pub fn newest_vulnerable_scan(scans: &[Scan]) -> Option<&Scan> {
    scans
        .iter()
        .filter(|s| s.has_vulnerabilities())
        .max_by_key(|s| (s.timestamp(), s.date.clone()))
}

pub struct HomePage {
    api: Arc<dyn ScannerApi>,
    scans: Fetch<Vec<Scan>>,
    started: bool,
}

impl HomePage {
    pub fn new(api: Arc<dyn ScannerApi>) -> Self {
        let scans = {
            let api = api.clone();
            Fetch::new(
                "/api/scans",
                loader(move || {
                    let api = api.clone();
                    async move { anyhow::Ok(api.get_scans().await?) }
                }),
            )
        };
        Self {
            api,
            scans,
            started: false,
        }
    }

    pub fn scans(&self) -> &Fetch<Vec<Scan>> {
        &self.scans
    }

    pub fn started(&self) -> bool {
        self.started
    }

    /// Fire the scan trigger once. The outcome is only logged; completion is not tracked.
    pub async fn run_scan(&mut self) {
        self.started = true;
        match self.api.run_scan().await {
            Ok(resp) => info!(
                scan_id = ?resp.scan_id,
                status = resp.status.as_deref().unwrap_or(""),
                "scan triggered"
            ),
            Err(e) => error!("failed to trigger scan: {e}"),
        }
    }

    fn render_body(&self, scans: &[Scan]) -> String {
        let mut out = String::new();
        write_summary(&mut out, scans, self.started).map(|()| out).unwrap_or_default()
    }
}

fn write_summary(out: &mut impl fmt::Write, scans: &[Scan], started: bool) -> fmt::Result {
    writeln!(out, "Home")?;
    if started {
        writeln!(out, "  Scan started")?;
    } else {
        writeln!(out, "  Run Scan  (type `run`)")?;
    }

    writeln!(out, "\nLatest scan")?;
    match newest_scan(scans) {
        Some(scan) => {
            write!(out, "  #{} {}", scan.id, format_display_date(&scan.date))?;
            match &scan.hosts {
                Some(hosts) => writeln!(out, " ({} hosts)", hosts.len())?,
                None => writeln!(out, " (Scan in progress)")?,
            }
        }
        None => writeln!(out, "  No scans found")?,
    }

    writeln!(out, "\nNotifications")?;
    match newest_vulnerable_scan(scans) {
        Some(scan) => {
            writeln!(
                out,
                "  Warning! You have {} vulnerabilities in your network.",
                scan.vulnerability_count()
            )?;
            writeln!(
                out,
                "  Found by scan #{} ({}). Go to Stats page to see more details.",
                scan.id,
                format_display_date(&scan.date)
            )
        }
        None => writeln!(out, "  No vulnerabilities found."),
    }
}

impl PageView for HomePage {
    fn render(&mut self) -> String {
        let state = self.scans.snapshot();
        render_state(&state, |scans| self.render_body(scans))
    }

    fn refetch(&self) {
        self.scans.refetch();
    }
}
