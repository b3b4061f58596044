use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use stage_store::{
    background_task::start_eviction_task,
    db::postgres::resolve_backend,
    graceful_shutdown::shutdown_signal,
    middlewares::auth::AuthMiddleware,
    routes::configure_routes,
    settings::AppConfig, AppState
};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match AppConfig::new() {
        Ok(cfg) => {
            tracing::info!("Loaded configuration: {:?}", cfg);
            cfg
        },
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let backend = resolve_backend(&config.database).await;

    let app_state = web::Data::new(AppState::new(&config, backend));

    let server_addr = format!("{}:{}", config.host, config.port);

    tracing::info!(
        "🚀 Starting Stage Store v{} on {} ({} backend)",
        env!("CARGO_PKG_VERSION"),
        server_addr,
        app_state.backend.name()
    );

    if let Some(every) = config.storage.cleanup_interval() {
        tokio::spawn(start_eviction_task(
            app_state.asset_handler.clone(),
            config.storage.max_asset_size_mb,
            every,
        ));
    }

    let server_state = app_state.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(server_state.clone())
            .wrap(NormalizePath::trim())
            .wrap(AuthMiddleware)
            .wrap(TracingLogger::default())
            .configure(configure_routes)
    })
    .workers(config.worker_count)
    .bind(server_addr)?
    .run();

    let handle = server.handle();

    tokio::select! {
        res = server => res,
        signal = shutdown_signal() => {
            tracing::warn!(?signal, "🛑 Shutdown signal received, draining in-flight requests...");
            handle.stop(true).await;
            Ok(())
        },
    }
}
