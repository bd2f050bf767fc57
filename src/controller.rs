//! Top-level dashboard state: the shell, the mounted page and the typed commands that drive them.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::api::ScannerApi;
use crate::fetch::Changed;
use crate::pages::{ConfigField, ConfigPage, HomePage, PageView, StatsPage};
use crate::shell::{Page, PageStore, Shell};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(Page),
    Refresh,
    Run,
    Set(ConfigField, String),
    Save,
    Show(i64),
    All,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };
        let cmd = match word.to_ascii_lowercase().as_str() {
            "" => bail!("empty command"),
            "refresh" | "r" => Command::Refresh,
            "run" => Command::Run,
            "save" => Command::Save,
            "all" => Command::All,
            "help" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            "open" | "go" => Command::Open(rest.parse()?),
            "show" => {
                let id = rest
                    .parse::<i64>()
                    .with_context(|| format!("invalid scan id: {rest}"))?;
                Command::Show(id)
            }
            "set" => {
                let (field, value) = rest
                    .split_once(char::is_whitespace)
                    .map(|(f, v)| (f, v.trim()))
                    .unwrap_or((rest, ""));
                Command::Set(field.parse()?, value.to_string())
            }
            other => match other.parse::<Page>() {
                Ok(page) if rest.is_empty() => Command::Open(page),
                _ => bail!("unknown command: {line}"),
            },
        };
        Ok(cmd)
    }
}

pub const HELP: &str = "\
commands:
  home | stats | config      switch page (also: open <page>)
  refresh                    re-request the current page's data
  run                        trigger a scan (Home)
  show <id> | all            one scan / whole history (Stats)
  set <field> <value>        edit email, frequency or target (Config)
  save                       submit the config draft (Config)
  help | quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The page currently mounted. Switching pages drops the old one and mounts a fresh one,
/// so every visit issues its own requests.
pub enum ActivePage {
    Home(HomePage),
    Stats(StatsPage),
    Config(ConfigPage),
}

impl ActivePage {
    pub fn mount(page: Page, api: Arc<dyn ScannerApi>) -> Self {
        match page {
            Page::Home => Self::Home(HomePage::new(api)),
            Page::Stats => Self::Stats(StatsPage::new(api)),
            Page::Config => Self::Config(ConfigPage::new(api)),
        }
    }

    pub fn view(&mut self) -> &mut dyn PageView {
        match self {
            Self::Home(p) => p as &mut dyn PageView,
            Self::Stats(p) => p,
            Self::Config(p) => p,
        }
    }

    /// Resolves on the next state change of the request the page is showing.
    pub fn changed(&self) -> Changed {
        match self {
            Self::Home(p) => p.scans().changed(),
            Self::Stats(p) => match p.detail() {
                Some(detail) => detail.changed(),
                None => p.scans().changed(),
            },
            Self::Config(p) => p.config().changed(),
        }
    }

    /// Wait for the page's in-flight request, if any.
    pub async fn settled(&self) {
        match self {
            Self::Home(p) => {
                p.scans().settled().await;
            }
            Self::Stats(p) => match p.detail() {
                Some(detail) => {
                    detail.settled().await;
                }
                None => {
                    p.scans().settled().await;
                }
            },
            Self::Config(p) => {
                p.config().settled().await;
            }
        }
    }
}

pub struct Controller<S: PageStore> {
    api: Arc<dyn ScannerApi>,
    shell: Shell<S>,
    active: ActivePage,
    notice: Option<String>,
}

impl<S: PageStore> Controller<S> {
    pub fn new(api: Arc<dyn ScannerApi>, store: S) -> Self {
        let shell = Shell::new(store);
        let active = ActivePage::mount(shell.current(), api.clone());
        Self {
            api,
            shell,
            active,
            notice: None,
        }
    }

    pub fn shell(&self) -> &Shell<S> {
        &self.shell
    }

    pub fn current(&self) -> Page {
        self.shell.current()
    }

    pub fn active(&self) -> &ActivePage {
        &self.active
    }

    pub fn open(&mut self, page: Page) {
        self.shell.select(page);
        self.active = ActivePage::mount(page, self.api.clone());
        info!(page = page.label(), "page opened");
    }

    pub async fn settled(&self) {
        self.active.settled().await;
    }

    /// See [`ActivePage::changed`]. Take this before rendering so no update is missed.
    pub fn changed(&self) -> Changed {
        self.active.changed()
    }

    /// Navigation strip, the active page and the last command's notice.
    /// The notice stays until the next command, so redraws keep it.
    pub fn render(&mut self) -> String {
        let mut out = self.shell.render_nav();
        out.push_str("\n\n");
        out.push_str(self.active.view().render().trim_end());
        out.push('\n');
        if let Some(notice) = &self.notice {
            out.push('\n');
            out.push_str(notice);
            out.push('\n');
        }
        out
    }

    pub async fn dispatch(&mut self, command: Command) -> Result<Flow> {
        self.notice = None;
        match command {
            Command::Open(page) => self.open(page),
            Command::Refresh => self.active.view().refetch(),
            Command::Help => self.notice = Some(HELP.to_string()),
            Command::Quit => return Ok(Flow::Quit),
            Command::Run => match &mut self.active {
                ActivePage::Home(home) => home.run_scan().await,
                _ => bail!("`run` is only available on the Home page"),
            },
            Command::Show(id) => match &mut self.active {
                ActivePage::Stats(stats) => stats.show_scan(id),
                _ => bail!("`show` is only available on the Stats page"),
            },
            Command::All => match &mut self.active {
                ActivePage::Stats(stats) => stats.show_all(),
                _ => bail!("`all` is only available on the Stats page"),
            },
            Command::Set(field, value) => match &mut self.active {
                ActivePage::Config(config) => config.set_field(field, value),
                _ => bail!("`set` is only available on the Config page"),
            },
            Command::Save => match &mut self.active {
                ActivePage::Config(config) => {
                    config.submit().await?;
                    self.notice = Some("Config updated".to_string());
                }
                _ => bail!("`save` is only available on the Config page"),
            },
        }
        Ok(Flow::Continue)
    }
}
