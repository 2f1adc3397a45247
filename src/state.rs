//! Shared application state, passed to every handler.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::domain::events::OrderEvent;
use crate::services::email::Mailer;
use crate::services::payments::PaymentsClient;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub payments: PaymentsClient,
    pub mailer: Option<Mailer>,
    pub nats: Option<async_nats::Client>,
}

impl AppState {
    /// Publish order events to NATS, best-effort. Failures are logged and
    /// never affect the request outcome.
    pub async fn publish_events(&self, events: Vec<OrderEvent>) {
        let Some(nats) = &self.nats else { return };
        for event in events {
            let subject = event.subject();
            match serde_json::to_vec(&event) {
                Ok(payload) => {
                    if let Err(e) = nats.publish(subject.to_string(), payload.into()).await {
                        tracing::warn!(subject, error = %e, "Failed to publish order event");
                    }
                }
                Err(e) => tracing::warn!(subject, error = %e, "Failed to encode order event"),
            }
        }
    }
}
