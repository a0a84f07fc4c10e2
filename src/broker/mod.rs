//! NGSI-LD context broker client.
//!
//! Create-or-patch upsert semantics: POST the full entity, and on conflict
//! PATCH only its attributes to the attribute-update endpoint. Batch pushes
//! run sequentially and accumulate per-entity outcomes; one failed entity
//! never aborts the rest.

use crate::config::BrokerConfig;
use crate::entity::Entity;
use anyhow::{anyhow, Context, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE, LINK};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

const NGSI_LD_CONTENT_TYPE: &str = "application/ld+json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Aggregate result of a batch push. Failures are recorded per entity.
#[derive(Debug, Default)]
pub struct PushReport {
    pub succeeded: usize,
    pub failures: Vec<(String, String)>,
}

impl PushReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// HTTP client for one context broker.
pub struct BrokerClient {
    http: reqwest::Client,
    config: BrokerConfig,
}

impl BrokerClient {
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Wait for the broker to answer its version endpoint.
    ///
    /// Bounded retry count with a fixed delay; this is the only boundary
    /// that retries. Once the broker is ready, per-entity failures are
    /// recorded, not retried.
    pub async fn wait_until_ready(&self) -> Result<()> {
        let url = format!("{}/version", self.config.url);
        info!(broker = %self.config.url, "Waiting for context broker");

        for attempt in 1..=self.config.max_retries {
            match self.http.get(&url).timeout(PROBE_TIMEOUT).send().await {
                Ok(response) if response.status().is_success() => {
                    info!(attempt, "Context broker is ready");
                    return Ok(());
                }
                Ok(response) => {
                    warn!(
                        attempt,
                        max = self.config.max_retries,
                        status = %response.status(),
                        "Broker not ready"
                    );
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max = self.config.max_retries,
                        error = %e,
                        "Broker not reachable"
                    );
                }
            }
            tokio::time::sleep(Duration::from_secs(self.config.retry_delay_seconds)).await;
        }

        Err(anyhow!(
            "Broker at {} not ready after {} attempts",
            self.config.url,
            self.config.max_retries
        ))
    }

    /// Create the entity, or patch its attributes when it already exists.
    pub async fn upsert(&self, entity: &Entity) -> Result<()> {
        let mut document = serde_json::to_value(entity).context("Failed to serialize entity")?;
        if entity.context.is_none() {
            document["@context"] = Value::String(self.config.context_url.clone());
        }

        debug!(entity_id = %entity.id, "Creating entity on broker");
        let response = self
            .http
            .post(format!("{}/ngsi-ld/v1/entities", self.config.url))
            .header(CONTENT_TYPE, NGSI_LD_CONTENT_TYPE)
            .header(ACCEPT, NGSI_LD_CONTENT_TYPE)
            .timeout(REQUEST_TIMEOUT)
            .body(document.to_string())
            .send()
            .await
            .context("Failed to send create request")?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status == StatusCode::CONFLICT {
            self.patch_attributes(entity).await
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(anyhow!(
                "Create failed for {} with status {}: {}",
                entity.id,
                status,
                body
            ))
        }
    }

    /// PATCH the non-identifying attributes of an existing entity. The
    /// context document reference carries over as a JSON-LD link header.
    async fn patch_attributes(&self, entity: &Entity) -> Result<()> {
        let attrs =
            serde_json::to_value(&entity.attributes).context("Failed to serialize attributes")?;
        let link = format!(
            "<{}>; rel=\"http://www.w3.org/ns/json-ld#context\"; type=\"application/ld+json\"",
            self.config.context_url
        );

        debug!(entity_id = %entity.id, "Entity exists, patching attributes");
        let response = self
            .http
            .patch(format!(
                "{}/ngsi-ld/v1/entities/{}/attrs",
                self.config.url, entity.id
            ))
            .header(CONTENT_TYPE, "application/json")
            .header(LINK, link)
            .timeout(REQUEST_TIMEOUT)
            .body(attrs.to_string())
            .send()
            .await
            .context("Failed to send patch request")?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(anyhow!(
                "Patch failed for {} with status {}: {}",
                entity.id,
                status,
                body
            ))
        }
    }

    /// Push a batch of entities one at a time, accumulating per-entity
    /// outcomes. Never fails the batch for a single entity.
    pub async fn push_all(&self, entities: &[Entity]) -> PushReport {
        let mut report = PushReport::default();
        for entity in entities {
            match self.upsert(entity).await {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    warn!(entity_id = %entity.id, error = %e, "Entity upsert failed");
                    report.failures.push((entity.id.clone(), e.to_string()));
                }
            }
        }
        info!(
            succeeded = report.succeeded,
            failed = report.failed(),
            "Batch push complete"
        );
        report
    }
}
