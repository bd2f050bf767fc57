use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

use scan_dash::api::HttpScannerApi;
use scan_dash::controller::{Command, Controller, Flow};
use scan_dash::logging;
use scan_dash::settings::DashboardConfig;
use scan_dash::shell::{FilePageStore, PageStore};

/// scan-dash — terminal dashboard for a network vulnerability scanner backend.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "scan-dash",
    version,
    about = "Terminal dashboard for a network vulnerability scanner backend.",
    long_about = None
)]
struct Cli {
    /// Backend base URL.
    #[arg(long, env = "SCAN_DASH_API")]
    api: Option<String>,

    /// Basic-auth username for the backend.
    #[arg(long, env = "SCAN_DASH_USER")]
    user: Option<String>,

    /// Basic-auth password for the backend.
    #[arg(long, env = "SCAN_DASH_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// File holding the last opened page. Defaults to the user config directory.
    #[arg(long = "state-file")]
    state_file: Option<PathBuf>,

    /// Page to open (home, stats, config). Overrides the saved page.
    #[arg(long)]
    page: Option<String>,

    /// Print the page once its data has loaded, then exit.
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Default log level when RUST_LOG is unset.
    #[arg(long = "log-level", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level)?;

    let config = DashboardConfig::resolve(
        cli.api,
        cli.user,
        cli.password,
        cli.state_file,
        cli.page.as_deref(),
        cli.once,
    )?;

    eprintln!("scan-dash configuration:");
    eprintln!("  api          : {}", config.api_base);
    eprintln!(
        "  user         : {}",
        config
            .credentials
            .as_ref()
            .map(|c| c.username())
            .unwrap_or("<none>")
    );
    eprintln!("  state_file   : {}", config.state_file.display());

    let api = Arc::new(HttpScannerApi::new(
        config.api_base.clone(),
        config.credential_provider(),
    ));
    let store = FilePageStore::new(config.state_file.clone());
    let mut controller = Controller::new(api, store);
    if let Some(page) = config.start_page {
        controller.open(page);
    }

    if config.once {
        controller.settled().await;
        print!("{}", controller.render());
        return Ok(());
    }

    run_interactive(&mut controller).await
}

async fn run_interactive<S: PageStore>(controller: &mut Controller<S>) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let changed = controller.changed();
        let screen = format!("\n{}\n> ", controller.render());
        stdout.write_all(screen.as_bytes()).await?;
        stdout.flush().await?;

        // Redraw as soon as the page's request lands; typed input is not lost on redraw.
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = changed => continue,
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(c) => c,
            Err(e) => {
                stdout.write_all(format!("{e} (type `help`)\n").as_bytes()).await?;
                continue;
            }
        };
        match controller.dispatch(command).await {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => {
                error!("{e:#}");
                stdout.write_all(format!("Error: {e}\n").as_bytes()).await?;
            }
        }
    }

    info!("bye");
    Ok(())
}
