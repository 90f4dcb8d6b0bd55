use std::io::{self, BufRead, Write};
use std::sync::Arc;

use lyceed::{build_router, ipc, AppConfig, DataService, HttpState};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout belongs to the sidecar protocol
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn run_stdio(config: AppConfig) {
    let mut state = ipc::AppState::new(config);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            Err(e) => ipc::bad_json(e.to_string()),
        };
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}

fn banner(config: &AppConfig) {
    info!("LYCÉE PASCAL NJÈRÈ IV - SYSTÈME DE GESTION");
    info!("serveur démarré sur http://{}", config.bind_addr);
    info!(
        data_dir = %config.data_dir.display(),
        public_dir = %config.public_dir.display(),
        matricule = config.matricule.name(),
        write_access = ?config.write_access,
        "base de données JSON initialisée"
    );
    info!("pour arrêter le serveur: CTRL+C");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("arrêt du serveur");
}

async fn run_http(config: AppConfig) -> anyhow::Result<()> {
    let service = Arc::new(DataService::from_config(&config));
    for spec in service.collections().iter() {
        service.store().ensure(spec.name)?;
    }
    let app = build_router(HttpState::new(service, &config), config.max_body_bytes);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("bind {} failed: {e}", config.bind_addr))?;
    banner(&config);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("server failed: {e}"))
}

fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(config.log_json);

    if std::env::args().skip(1).any(|a| a == "--stdio") {
        run_stdio(config);
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_http(config))
}
