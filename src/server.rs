//! Server initialization and startup logic for FormHand.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use formhand_api::{create_router, AppState};
use formhand_config::Config;
use formhand_engine::{ActionEngine, CommandSink, InjectorLink, MotionEngine, ProbeClient, StateStore};

/// Initialize tracing with console output.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .init();
}

/// Run the coordinator in the foreground until a shutdown signal arrives.
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting FormHand v{}", env!("CARGO_PKG_VERSION"));

    let stop = Arc::new(AtomicBool::new(false));

    // Device absence is fatal here: nothing else works without the Injector.
    let link = InjectorLink::open(&config.serial, stop.clone())?;
    let sink: Arc<dyn CommandSink> = Arc::new(link);

    let store = Arc::new(StateStore::new());
    let probe = Arc::new(ProbeClient::new(store.clone()));
    let engine = ActionEngine::new(
        store.clone(),
        probe.clone(),
        sink.clone(),
        &config.motion,
        stop.clone(),
    );
    let motion = Arc::new(MotionEngine::new(store.clone(), sink, &config.motion));

    let state = Arc::new(AppState::new(store, probe, engine, motion));
    let router = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Control plane listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(stop))
        .await?;

    info!("Shutdown complete");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM and raise the emergency stop so in-flight
/// loops drain without writing further.
async fn shutdown_signal(stop: Arc<AtomicBool>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl-C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => warn!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
    stop.store(true, Ordering::SeqCst);
}
