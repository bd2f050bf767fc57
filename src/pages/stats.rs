use std::fmt::{self, Write as _};
use std::sync::Arc;

use super::{render_state, PageView};
use crate::api::ScannerApi;
use crate::fetch::{loader, Fetch, Loader};
use crate::types::{format_display_date, Port, Scan, Vulnerability};

/// Vulnerabilities listed per port; the rest are only counted.
pub const MAX_VULNS_PER_PORT: usize = 5;

pub fn displayed_vulnerabilities(port: &Port) -> &[Vulnerability] {
    let vulns = port.vulnerabilities();
    &vulns[..vulns.len().min(MAX_VULNS_PER_PORT)]
}

/// Scan history, or a single scan when one has been selected with [`StatsPage::show_scan`].
pub struct StatsPage {
    api: Arc<dyn ScannerApi>,
    scans: Fetch<Vec<Scan>>,
    detail: Option<Fetch<Scan>>,
}

impl StatsPage {
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
            detail: None,
        }
    }

    pub fn scans(&self) -> &Fetch<Vec<Scan>> {
        &self.scans
    }

    pub fn detail(&self) -> Option<&Fetch<Scan>> {
        self.detail.as_ref()
    }

    /// Focus one scan. Reuses the existing detail fetch so only a changed id re-requests.
    pub fn show_scan(&mut self, id: i64) {
        let source = format!("/api/scan/{id}");
        let load = scan_loader(self.api.clone(), id);
        match &mut self.detail {
            Some(detail) => detail.set_source(source, load),
            None => self.detail = Some(Fetch::new(source, load)),
        }
    }

    pub fn show_all(&mut self) {
        self.detail = None;
    }
}

fn scan_loader(api: Arc<dyn ScannerApi>, id: i64) -> Loader<Scan> {
    loader(move || {
        let api = api.clone();
        async move { anyhow::Ok(api.get_scan(id).await?) }
    })
}

/// Write one scan block: header, then hosts, ports and the truncated vulnerability list.
pub fn write_scan(out: &mut impl fmt::Write, scan: &Scan) -> fmt::Result {
    writeln!(out, "Scan #{}  {}", scan.id, format_display_date(&scan.date))?;
    let Some(hosts) = &scan.hosts else {
        return writeln!(out, "  Scan in progress");
    };
    for host in hosts {
        writeln!(out, "  {}", host.address)?;
        for port in host.ports() {
            writeln!(
                out,
                "    {}/{}  {}  {}",
                port.port_num, port.protocol, port.service_name, port.state
            )?;
            let vulns = port.vulnerabilities();
            if vulns.is_empty() {
                continue;
            }
            writeln!(out, "      {} vulnerabilities", vulns.len())?;
            for v in displayed_vulnerabilities(port) {
                writeln!(out, "        {} {}  {}", v.score, v.cve, v.url)?;
            }
        }
    }
    Ok(())
}

pub fn render_scan(scan: &Scan) -> String {
    let mut out = String::new();
    write_scan(&mut out, scan).map(|()| out).unwrap_or_default()
}

fn write_history(out: &mut impl fmt::Write, scans: &[Scan]) -> fmt::Result {
    if scans.is_empty() {
        return write!(out, "No scans found");
    }
    writeln!(out, "Scans History")?;
    for scan in scans {
        writeln!(out)?;
        write_scan(out, scan)?;
    }
    Ok(())
}

fn render_history(scans: &[Scan]) -> String {
    let mut out = String::new();
    write_history(&mut out, scans).map(|()| out).unwrap_or_default()
}

impl PageView for StatsPage {
    fn render(&mut self) -> String {
        match &self.detail {
            Some(detail) => render_state(&detail.snapshot(), render_scan),
            None => render_state(&self.scans.snapshot(), |scans| render_history(scans)),
        }
    }

    fn refetch(&self) {
        match &self.detail {
            Some(detail) => detail.refetch(),
            None => self.scans.refetch(),
        }
    }
}
