use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use palour_backend::{
    api, config,
    mail::{LogMailer, Mailer, SmtpMailer},
    store::PgStore,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (dev convenience)
    let _ = dotenvy::dotenv();

    // Tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::Config::from_env()?;

    // Database pool + migrations
    let store = PgStore::connect(&cfg.database_url, 20).await?;
    tracing::info!("Database connected and migrations applied");

    let mailer: Arc<dyn Mailer> = match &cfg.smtp {
        Some(smtp) => {
            tracing::info!("Sending invite emails via SMTP relay {}:{}", smtp.host, smtp.port);
            Arc::new(
                SmtpMailer::new(smtp, &cfg.email_from, &cfg.app_base_url)
                    .context("failed to configure SMTP mailer")?,
            )
        }
        None => {
            tracing::warn!("SMTP_HOST not set, invite emails will only be logged");
            Arc::new(LogMailer::new(&cfg.app_base_url))
        }
    };

    let state = AppState {
        store: Arc::new(store),
        mailer,
        jwt_secret: cfg.jwt_secret.clone(),
    };

    // Token routes are reachable without a session; limit guessing per peer IP.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(10)
            .finish()
            .context("invalid rate limit configuration")?,
    );
    let governor_limiter = governor_conf.limiter().clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        loop {
            ticker.tick().await;
            governor_limiter.retain_recent();
        }
    });

    // CORS
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .allow_origin(
            cfg.cors_origins
                .iter()
                .filter_map(|o| o.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        );

    let app = api::router(state.clone())
        .merge(api::token_routes(state).layer(GovernorLayer {
            config: governor_conf,
        }))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    tracing::info!("Listening on {}", cfg.listen_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
