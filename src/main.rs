use anyhow::Result;
use axum::Router;
use config::Config;
use ewh_dr_controller::{api, config, controller, telemetry};
use telemetry::init_tracing;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cfg = Config::load()?;
    let guard = init_tracing(&cfg.logging.path)?;
    info!(log_path = %cfg.logging.path.display(), mode = ?cfg.transport.mode, "configuration loaded");

    let app_state = match controller::AppState::new(cfg.clone()).await {
        Ok(state) => state,
        Err(e) if e.is_fatal_transport() => {
            error!(error = %e, "failed to open transport");
            drop(guard);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let app: Router = api::router(app_state.clone(), &cfg);
    let addr = cfg.server.socket_addr()?;

    if cfg.server.host == "0.0.0.0" {
        warn!("DR control surface bound to 0.0.0.0 and reachable from the network");
    }

    info!(%addr, "starting water heater DR controller");

    controller::spawn_controller_tasks(app_state.clone(), &cfg);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
