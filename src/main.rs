//! Electech Commerce - storefront backend service

use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use electech_commerce::config::Config;
use electech_commerce::routes;
use electech_commerce::services::{email::Mailer, payments::PaymentsClient};
use electech_commerce::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, order events disabled");
                None
            }
        },
        None => None,
    };

    let mailer = match &config.smtp {
        Some(smtp) => Some(Mailer::new(smtp)?),
        None => {
            tracing::info!("SMTP not configured, confirmation email disabled");
            None
        }
    };

    let payments = PaymentsClient::new(&config.gateway);
    let addr = config.bind_addr();
    let state = AppState { db, config, payments, mailer, nats };
    let app = routes::router(state);

    tracing::info!("🚀 Electech commerce listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}
