//! Current-page selection, its persistence and the navigation strip.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Home,
    Stats,
    Config,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Home, Page::Stats, Page::Config];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Stats => "Stats",
            Self::Config => "Config",
        }
    }

    /// Exact match on a persisted label.
    pub fn from_label(label: &str) -> Option<Page> {
        Self::ALL.into_iter().find(|p| p.label() == label)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lenient parse for typed input: case-insensitive, `scans` is accepted for Stats.
impl FromStr for Page {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" => Ok(Page::Home),
            "stats" | "scans" => Ok(Page::Stats),
            "config" => Ok(Page::Config),
            other => bail!("unknown page: {other}"),
        }
    }
}

/// Durable read/write of the last selected page label.
pub trait PageStore: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, label: &str) -> Result<()>;
}

/// Stores the label as a plain-text file.
#[derive(Debug, Clone)]
pub struct FilePageStore {
    path: PathBuf,
}

impl FilePageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/scan-dash/page`
    pub fn default_path() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Failed to get config directory")?
            .join("scan-dash")
            .join("page"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PageStore for FilePageStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            debug!("no saved page at {}", self.path.display());
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read saved page from {}", self.path.display()))?;
        Ok(Some(raw.trim().to_string()))
    }

    fn save(&self, label: &str) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        fs::write(&self.path, label)
            .with_context(|| format!("Failed to write saved page to {}", self.path.display()))?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryPageStore {
    value: Mutex<Option<String>>,
}

impl MemoryPageStore {
    pub fn with_value(label: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(label.into())),
        }
    }

    pub fn value(&self) -> Option<String> {
        self.value.lock().ok().and_then(|v| v.clone())
    }
}

impl PageStore for MemoryPageStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.value())
    }

    fn save(&self, label: &str) -> Result<()> {
        let mut guard = self
            .value
            .lock()
            .map_err(|_| anyhow::anyhow!("page store lock poisoned"))?;
        *guard = Some(label.to_string());
        Ok(())
    }
}

/// Holds the active page and writes every change through to the store.
pub struct Shell<S: PageStore> {
    current: Page,
    store: S,
}

impl<S: PageStore> Shell<S> {
    /// Restore the saved page, falling back to Home when nothing usable is stored.
    pub fn new(store: S) -> Self {
        let current = match store.load() {
            Ok(Some(saved)) => Page::from_label(&saved).unwrap_or_else(|| {
                debug!(%saved, "ignoring unrecognized saved page");
                Page::Home
            }),
            Ok(None) => Page::Home,
            Err(e) => {
                warn!("failed to load saved page: {e:#}");
                Page::Home
            }
        };
        Self { current, store }
    }

    pub fn current(&self) -> Page {
        self.current
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn select(&mut self, page: Page) {
        self.current = page;
        if let Err(e) = self.store.save(page.label()) {
            warn!("failed to persist page selection: {e:#}");
        }
    }

    /// `[Home]  Stats  Config` with the active label bracketed.
    pub fn render_nav(&self) -> String {
        Page::ALL
            .iter()
            .map(|p| {
                if *p == self.current {
                    format!("[{}]", p.label())
                } else {
                    format!(" {} ", p.label())
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
