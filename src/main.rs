//! Main entry point for the digital platform server.
//!
//! Loads configuration from the environment (and `.env`), initializes tracing,
//! builds the shared state and serves the REST API until Ctrl-C.

use actix_web::{App, HttpServer, web};
use anyhow::Context;
use digital_platform::{
    AppState, Settings, configure_routes, get_subscriber, init_subscriber,
    telemetry::RequestLoggingMiddleware,
};
use dotenv::dotenv;
use tracing_actix_web::TracingLogger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let subscriber = get_subscriber(
        "digital_platform".to_string(),
        "info,actix_web=info,sqlx=warn".to_string(),
        std::io::stdout,
    );
    init_subscriber(subscriber)?;

    let settings = Settings::from_env().context("failed to load configuration")?;
    let bind = (settings.host.clone(), settings.port);
    let app_state = AppState::new(settings)
        .await
        .context("failed to initialize application state")?;

    tracing::info!(host = %bind.0, port = bind.1, "Starting server");

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(RequestLoggingMiddleware::new())
            .wrap(TracingLogger::default())
            .configure(configure_routes)
    })
    .bind(bind)?
    .run();

    let srv_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Shutdown signal received");
            srv_handle.stop(true).await;
        }
        res = server_task => {
            match res {
                Ok(Err(e)) => tracing::error!(error = %e, "Server stopped with error"),
                Err(e) => tracing::error!(error = %e, "Server task failed"),
                Ok(Ok(())) => {}
            }
        }
    }

    Ok(())
}
