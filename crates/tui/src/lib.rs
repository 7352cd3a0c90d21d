mod app;
mod async_ops;
mod theme;
mod ui;
mod views;

use std::io::stdout;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use app::App;
use async_ops::{Completion, Dispatch};
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use harvest_api_client::{ApiClient, ReqwestTransport};
use harvest_core::{Controller, FileStore};
use harvest_runtime_config::ClientConfig;
use ratatui::prelude::*;
use tracing::{debug, info};

/// Startup overrides taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub server_url: Option<String>,
    pub config_path: Option<PathBuf>,
}

/// Resolve the config file location and load it, applying `--server`.
pub fn load_config(options: &RunOptions) -> Result<(ClientConfig, PathBuf)> {
    let path = match options.config_path {
        Some(ref path) => path.clone(),
        None => harvest_runtime_config::default_config_path()?,
    };
    let mut config = harvest_runtime_config::load_from(&path)?;
    if let Some(ref url) = options.server_url {
        config.server.url = url.clone();
        config.normalize();
    }
    Ok((config, path))
}

/// Launch the TUI.
pub fn run(options: RunOptions) -> Result<()> {
    let (config, config_path) = load_config(&options)?;
    info!(
        server = %config.server.url,
        config = %config_path.display(),
        "starting harvest-tui"
    );

    let client = ApiClient::new(&config.server.url, config.server.timeout())
        .context("failed to build the API client")?;
    let store_path = config.session_store_path()?;
    let controller = Controller::new(client, Box::new(FileStore::open(store_path)));
    let mut app = App::new(controller, config.server.url.clone());

    let rt = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;

    // Terminal setup
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app, &rt);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App<ReqwestTransport>,
    rt: &tokio::runtime::Runtime,
) -> Result<()> {
    let (tx, rx) = mpsc::channel::<Completion>();

    loop {
        // ── Apply finished requests ──────────────────────────────────
        while let Ok(completion) = rx.try_recv() {
            app.apply_command_result(completion);
        }

        // ── Start due work ───────────────────────────────────────────
        app.tick();
        if let Some(dispatch) = app.take_pending() {
            spawn_command(rt, app.controller.client().clone(), dispatch, tx.clone());
        }

        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.handle_key(key) {
                break;
            }
            if let Some(dispatch) = app.take_pending() {
                spawn_command(rt, app.controller.client().clone(), dispatch, tx.clone());
            }
        }
    }
    info!("harvest-tui exiting");
    Ok(())
}

fn spawn_command(
    rt: &tokio::runtime::Runtime,
    client: ApiClient<ReqwestTransport>,
    dispatch: Dispatch,
    tx: mpsc::Sender<Completion>,
) {
    let Dispatch { epoch, command } = dispatch;
    debug!(command = command.name(), epoch, "spawning request");
    rt.spawn(async move {
        let result = async_ops::execute(command, &client).await;
        // The loop may already be gone on quit.
        let _ = tx.send(Completion { epoch, result });
    });
}

/// Render the effective config as TOML, for `harvest-tui config`.
pub fn show_config(options: &RunOptions) -> Result<String> {
    let (config, path) = load_config(options)?;
    let body = harvest_runtime_config::to_toml(&config).context("failed to render config")?;
    Ok(format!("# {}\n{body}", path.display()))
}

/// Write the default config to `path` (or the default location) unless it
/// already exists. Returns the path written.
pub fn init_config(path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => harvest_runtime_config::default_config_path()?,
    };
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    harvest_runtime_config::save_to(&ClientConfig::default(), &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_flag_overrides_file_and_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvest.toml");
        std::fs::write(&path, "[server]\nurl = \"http://file:1\"\n").unwrap();

        let (config, resolved) = load_config(&RunOptions {
            server_url: Some("https://api.example.org/".into()),
            config_path: Some(path.clone()),
        })
        .unwrap();

        assert_eq!(resolved, path);
        assert_eq!(config.server.url, "https://api.example.org");
    }

    #[test]
    fn init_config_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("harvest.toml");

        assert_eq!(init_config(Some(&path)).unwrap(), path);
        let (config, _) = load_config(&RunOptions {
            server_url: None,
            config_path: Some(path.clone()),
        })
        .unwrap();
        assert_eq!(config, ClientConfig::default());

        assert!(init_config(Some(&path)).is_err());
    }
}
