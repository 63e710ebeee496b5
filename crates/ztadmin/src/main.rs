mod cli;

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ztadmin::error::StartupError;
use ztadmin::state::AppState;
use ztadmin_config::{DashboardConfig, config_path};

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_json);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, json: bool) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    let path = cli.config.unwrap_or_else(config_path);
    let config_err = |source| StartupError::Config {
        path: path.display().to_string(),
        source,
    };

    let mut config = DashboardConfig::load(Some(&path)).map_err(config_err)?;
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    if cli.print_config {
        print!("{}", config.to_toml().map_err(config_err)?);
        return Ok(());
    }

    tokio::fs::create_dir_all(&config.data_dir)
        .await
        .map_err(|source| StartupError::DataDir {
            path: config.data_dir.display().to_string(),
            source,
        })?;

    let state = Arc::new(AppState::new(&config, &config.data_dir));
    let app = ztadmin::build_router(state);

    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|source| StartupError::Bind {
            addr: config.bind,
            source,
        })?;
    info!(
        addr = %config.bind,
        data_dir = %config.data_dir.display(),
        controller = %config.controller.address,
        "dashboard listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
}
