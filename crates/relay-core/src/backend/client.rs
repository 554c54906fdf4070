use std::{sync::Arc, time::Duration};

use serde_json::Value;
use tokio::time::sleep;

use crate::{
    config::{Config, Endpoints},
    errors::BackendError,
    Result,
};

use super::transport::{BackendRequest, HttpTransport, ReqwestTransport, TransportError};

/// Attempt budget and exponential backoff base.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt` (1-based): `backoff * 2^(attempt-1)`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Backend API client with retries and error classification.
///
/// Timeouts, transport errors and 5xx are retried until the budget runs out;
/// auth errors, other 4xx and unparsable success bodies fail immediately.
pub struct BackendClient {
    transport: Arc<dyn HttpTransport>,
    retry: RetryPolicy,
    endpoints: Endpoints,
}

impl BackendClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        retry: RetryPolicy,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            transport,
            retry,
            endpoints,
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(&cfg.api_url, &cfg.api_token, cfg.request_timeout)?;
        Ok(Self::new(
            Arc::new(transport),
            RetryPolicy {
                attempts: cfg.retry_count,
                backoff: cfg.retry_backoff,
            },
            cfg.endpoints.clone(),
        ))
    }

    pub async fn execute(&self, req: BackendRequest) -> std::result::Result<Value, BackendError> {
        let attempts = self.retry.attempts.max(1);
        let path = req.path.as_str();

        for attempt in 1..=attempts {
            let failure = match self.transport.send(&req).await {
                Err(TransportError::Timeout) => {
                    tracing::warn!(attempt, path, "backend timeout");
                    BackendError::Timeout
                }
                Err(TransportError::Connect(reason)) => {
                    tracing::warn!(attempt, path, error = %reason, "backend request error");
                    BackendError::Unavailable {
                        status: None,
                        reason: format!("connection error: {reason}"),
                    }
                }
                Ok(resp) if resp.status >= 500 => {
                    tracing::warn!(status = resp.status, attempt, path, "backend server error");
                    BackendError::Unavailable {
                        status: Some(resp.status),
                        reason: format!("server error {}", resp.status),
                    }
                }
                Ok(resp) if resp.status == 401 || resp.status == 403 => {
                    return Err(BackendError::Auth {
                        status: resp.status,
                    });
                }
                Ok(resp) if (400..500).contains(&resp.status) => {
                    return Err(BackendError::Client {
                        status: resp.status,
                    });
                }
                Ok(resp) => {
                    return serde_json::from_slice(&resp.body)
                        .map_err(|e| BackendError::BadResponse(e.to_string()));
                }
            };

            if attempt >= attempts {
                return Err(failure);
            }
            sleep(self.retry.delay(attempt)).await;
        }

        Err(BackendError::Unavailable {
            status: None,
            reason: "request failed after retries".to_string(),
        })
    }

    pub async fn start(
        &self,
        payload: Value,
        partner_id: Option<&str>,
    ) -> std::result::Result<Value, BackendError> {
        self.execute(
            BackendRequest::post(&self.endpoints.start)
                .with_body(payload)
                .with_partner(partner_id),
        )
        .await
    }

    pub async fn sync_user(
        &self,
        payload: Value,
        partner_id: Option<&str>,
    ) -> std::result::Result<Value, BackendError> {
        self.execute(
            BackendRequest::post(&self.endpoints.user_sync)
                .with_body(payload)
                .with_partner(partner_id),
        )
        .await
    }

    pub async fn menu(
        &self,
        query: Vec<(String, String)>,
        partner_id: Option<&str>,
    ) -> std::result::Result<Value, BackendError> {
        self.execute(
            BackendRequest::get(&self.endpoints.menu)
                .with_query(query)
                .with_partner(partner_id),
        )
        .await
    }

    pub async fn action(
        &self,
        payload: Value,
        partner_id: Option<&str>,
    ) -> std::result::Result<Value, BackendError> {
        self.execute(
            BackendRequest::post(&self.endpoints.action)
                .with_body(payload)
                .with_partner(partner_id),
        )
        .await
    }

    pub async fn resolve_partner(&self) -> std::result::Result<Value, BackendError> {
        self.execute(BackendRequest::get(&self.endpoints.partner)).await
    }
}
