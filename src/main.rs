// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-MermaidUI-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of MermaidUI and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! MermaidUI CLI entrypoint.
//!
//! By default this runs the terminal UI and, in the background, serves the HTTP gateway at
//! `http://127.0.0.1:<port>/` (also under `/api`) and MCP over streamable HTTP at `/mcp`.
//!
//! `serve` runs only the gateway, `mcp` speaks MCP over stdio, and `export` writes one diagram
//! to a file. `--remote` points the UI (or `export`) at another running gateway instead of the
//! local database.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use axum::Router;
use clap::{Parser, Subcommand};
use rmcp::transport::{
    streamable_http_server::session::local::LocalSessionManager, StreamableHttpServerConfig,
    StreamableHttpService,
};
use tokio::runtime::Runtime;
use tokio::sync::Mutex;

use mermaid_ui::client::{DiagramApi, HttpClient};
use mermaid_ui::commands::{save_export, Commands, FixedPath};
use mermaid_ui::config::AppConfig;
use mermaid_ui::export::chrome::ChromeDriver;
use mermaid_ui::export::{ExportFormat, ExportService, Exporter, MermaidTheme};
use mermaid_ui::logging::{init_logging, LogFormat, LogTarget};
use mermaid_ui::mcp::MermaidMcp;
use mermaid_ui::model::DiagramId;
use mermaid_ui::preview::PreviewWorker;
use mermaid_ui::store::Store;
use mermaid_ui::tui::{self, TuiOptions};
use mermaid_ui::ui::UiState;

#[derive(Debug, Parser)]
#[command(name = "mermaid-ui", version, about = "Manage, edit and export Mermaid diagrams")]
struct Cli {
    /// SQLite database file (overrides DATABASE_PATH).
    #[arg(long, value_name = "PATH", global = true)]
    db: Option<PathBuf>,

    /// Gateway port; 0 picks an ephemeral port.
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Use a running gateway instead of the local database.
    #[arg(long, value_name = "URL", global = true)]
    remote: Option<String>,

    /// Log filter, e.g. `debug` or `mermaid_ui=trace` (overrides MERMAID_UI_LOG).
    #[arg(long, value_name = "FILTER", global = true)]
    log_level: Option<String>,

    /// compact, pretty or json.
    #[arg(long, value_name = "FORMAT", default_value = "compact", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
enum Command {
    /// Serve the HTTP gateway until interrupted.
    Serve,
    /// Serve MCP over stdio.
    Mcp,
    /// Export the saved version of a diagram.
    Export {
        diagram: DiagramId,
        format: ExportFormat,
        /// Output path; defaults to `<diagram name>.<ext>` in the current directory.
        #[arg(long, short)]
        out: Option<PathBuf>,
        #[arg(long, default_value = "default")]
        theme: MermaidTheme,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("mermaid-ui: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env(cli.db.clone(), cli.port)?;

    let log_target = match cli.command {
        None => LogTarget::File(config.log_path()),
        Some(_) => LogTarget::Stderr,
    };
    init_logging(cli.log_level.as_deref(), cli.log_format, &log_target)?;
    tracing::info!(
        database = %config.database_path.display(),
        port = config.port,
        remote = cli.remote.as_deref().unwrap_or("-"),
        "starting mermaid-ui"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let exporter = build_exporter(&config);

    match cli.command {
        None => run_tui(&runtime, &config, exporter, cli.remote),
        Some(Command::Serve) => {
            reject_remote(cli.remote.as_deref(), "serve")?;
            let commands = open_commands(&config, exporter, &runtime)?;
            runtime.block_on(serve_gateway(&config, mermaid_ui::gateway::router(commands)))
        }
        Some(Command::Mcp) => {
            reject_remote(cli.remote.as_deref(), "mcp")?;
            let commands = open_commands(&config, exporter, &runtime)?;
            runtime.block_on(MermaidMcp::new(commands).serve_stdio())?;
            Ok(())
        }
        Some(Command::Export { diagram, format, out, theme }) => {
            let api: Arc<dyn DiagramApi> = match cli.remote {
                Some(url) => Arc::new(HttpClient::new(url)),
                None => Arc::new(open_commands(&config, exporter, &runtime)?),
            };
            export_to_file(api.as_ref(), diagram, format, theme, out)
        }
    }
}

fn reject_remote(remote: Option<&str>, command: &str) -> anyhow::Result<()> {
    if remote.is_some() {
        bail!("--remote cannot be combined with `{command}`");
    }
    Ok(())
}

fn build_exporter(config: &AppConfig) -> Arc<dyn Exporter> {
    let driver = ChromeDriver::new(config.chrome.clone()).with_extra_args(config.chrome_args.clone());
    Arc::new(
        ExportService::new(driver)
            .with_timeout(config.export_timeout)
            .with_script_src(config.mermaid_script.clone()),
    )
}

fn open_commands(
    config: &AppConfig,
    exporter: Arc<dyn Exporter>,
    runtime: &Runtime,
) -> anyhow::Result<Commands> {
    let store = Store::open(&config.database_path).with_context(|| {
        format!("failed to initialize store at {}", config.database_path.display())
    })?;
    Ok(Commands::new(Arc::new(store), exporter, runtime.handle().clone()))
}

async fn serve_gateway(config: &AppConfig, app: Router) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.port))
        .await
        .with_context(|| format!("failed to bind 127.0.0.1:{}", config.port))?;
    mermaid_ui::gateway::serve(listener, app, async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("interrupted, shutting down");
    })
    .await?;
    Ok(())
}

fn export_to_file(
    api: &dyn DiagramApi,
    id: DiagramId,
    format: ExportFormat,
    theme: MermaidTheme,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let diagram = api.get_diagram(id)?;
    let artifact = api.export_diagram(id, format, theme, None)?;
    let path = out.unwrap_or_else(|| PathBuf::from(artifact.file_name(&diagram.name)));
    if let Some(written) = save_export(&mut FixedPath(path), &artifact, &diagram.name)? {
        println!("{}", written.display());
    }
    Ok(())
}

fn run_tui(
    runtime: &Runtime,
    config: &AppConfig,
    exporter: Arc<dyn Exporter>,
    remote: Option<String>,
) -> anyhow::Result<()> {
    let ui_state = Arc::new(Mutex::new(UiState::default()));
    let preview = match PreviewWorker::spawn(exporter.clone(), runtime.handle().clone()) {
        Ok(worker) => Some(worker),
        Err(err) => {
            tracing::warn!(error = %err, "live preview disabled");
            None
        }
    };
    let options = TuiOptions {
        preview,
        ui_state: Some(ui_state.clone()),
        preferences_path: Some(config.preferences_path()),
    };

    let (api, local): (Arc<dyn DiagramApi>, Option<Commands>) = match remote {
        Some(url) => {
            tracing::info!(%url, "using remote gateway");
            (Arc::new(HttpClient::new(url)), None)
        }
        None => {
            let commands = open_commands(config, exporter, runtime)?;
            (Arc::new(commands.clone()), Some(commands))
        }
    };

    runtime.block_on(async move {
        let server = StreamableHttpServerConfig {
            stateful_mode: true,
            ..StreamableHttpServerConfig::default()
        };
        let shutdown = server.cancellation_token.clone();

        let server_handle = match local {
            Some(commands) => {
                let mcp = MermaidMcp::new_with_ui_state(commands.clone(), Some(ui_state.clone()));
                let mcp_service = StreamableHttpService::new(
                    move || Ok(mcp.clone()),
                    Arc::new(LocalSessionManager::default()),
                    server,
                );
                let app = mermaid_ui::gateway::router(commands).nest_service("/mcp", mcp_service);
                match tokio::net::TcpListener::bind(("127.0.0.1", config.port)).await {
                    Ok(listener) => {
                        let stop = shutdown.clone();
                        Some(tokio::spawn(async move {
                            let served = mermaid_ui::gateway::serve(listener, app, async move {
                                stop.cancelled().await;
                            });
                            if let Err(err) = served.await {
                                tracing::error!(error = %err, "gateway stopped");
                            }
                        }))
                    }
                    Err(err) => {
                        tracing::warn!(port = config.port, error = %err, "gateway disabled");
                        None
                    }
                }
            }
            None => None,
        };

        let tui_result = tokio::task::spawn_blocking(move || {
            tui::run(api, options).map_err(|err| err.to_string())
        })
        .await;

        shutdown.cancel();
        if let Some(handle) = server_handle {
            let _ = handle.await;
        }

        match tui_result.context("terminal UI panicked")? {
            Ok(()) => Ok(()),
            Err(message) => bail!("terminal UI failed: {message}"),
        }
    })
}
