//! Failover and retry across an endpoint set

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use graphdb_domain::constants::{SERVICE_UNAVAILABLE, UNAUTHORIZED};
use graphdb_domain::{ClientConfig, Endpoint, EndpointSet, GraphDbError, RequestDescriptor, Result};
use tracing::{debug, warn};

use super::ports::{HttpResponse, HttpTransport, TransportFactory};

/// Per-endpoint retry budget and failure classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    retry_count: u32,
    retriable_statuses: BTreeSet<u16>,
    base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(graphdb_domain::constants::DEFAULT_RETRY_COUNT)
    }
}

impl RetryPolicy {
    /// Retry `retry_count` times per endpoint on 503 or no response
    pub fn new(retry_count: u32) -> Self {
        Self {
            retry_count,
            retriable_statuses: BTreeSet::from([SERVICE_UNAVAILABLE]),
            base_backoff: Duration::ZERO,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            retry_count: config.retry_count,
            retriable_statuses: config.retriable_statuses.clone(),
            base_backoff: config.retry_backoff,
        }
    }

    #[must_use]
    pub fn with_retriable_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.retriable_statuses = statuses.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, base: Duration) -> Self {
        self.base_backoff = base;
        self
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Initial attempt plus retries
    pub fn attempts_per_endpoint(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }

    pub fn is_retriable_status(&self, status: u16) -> bool {
        self.retriable_statuses.contains(&status)
    }

    /// Map an error status to the error surfaced for it.
    pub fn classify(&self, endpoint: &Endpoint, status: u16, body: String) -> GraphDbError {
        let endpoint = endpoint.to_string();
        if self.is_retriable_status(status) {
            GraphDbError::ServiceBusy { endpoint, status }
        } else if status == UNAUTHORIZED {
            GraphDbError::Unauthorized { endpoint, body }
        } else {
            GraphDbError::Status { endpoint, status, body }
        }
    }

    fn backoff_delay(&self, retry_number: u32) -> Duration {
        let shift = retry_number.saturating_sub(1).min(8);
        self.base_backoff.saturating_mul(1u32 << shift)
    }

    async fn sleep_with_backoff(&self, retry_number: u32) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    async fn into_error(&self, response: HttpResponse) -> GraphDbError {
        let endpoint = response.endpoint().clone();
        let status = response.status();
        let body = match response.bytes().await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => String::new(),
        };
        self.classify(&endpoint, status, body)
    }
}

/// Runs one logical request against successive endpoints.
///
/// Each endpoint gets `retry_count + 1` attempts while failures are
/// retriable. A non-retriable error status abandons the endpoint at once.
/// The cursor over endpoints is local to each `execute` call, so concurrent
/// calls never influence each other's endpoint choice.
pub struct RetryingExecutor {
    bindings: Vec<Arc<dyn HttpTransport>>,
    policy: RetryPolicy,
}

impl RetryingExecutor {
    /// Bind one transport per endpoint.
    ///
    /// # Errors
    /// Propagates binding failures from the factory.
    pub fn new(
        endpoints: &EndpointSet,
        factory: &dyn TransportFactory,
        policy: RetryPolicy,
    ) -> Result<Self> {
        let bindings =
            endpoints.iter().map(|endpoint| factory.bind(endpoint)).collect::<Result<Vec<_>>>()?;
        Self::from_bindings(bindings, policy)
    }

    /// # Errors
    /// Returns `GraphDbError::Config` if `bindings` is empty.
    pub fn from_bindings(
        bindings: Vec<Arc<dyn HttpTransport>>,
        policy: RetryPolicy,
    ) -> Result<Self> {
        if bindings.is_empty() {
            return Err(GraphDbError::Config("executor needs at least one endpoint".into()));
        }
        Ok(Self { bindings, policy })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Endpoints in failover order
    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.bindings.iter().map(|binding| binding.endpoint())
    }

    /// Execute a request, calling `build` once per attempt.
    ///
    /// Any status below 400 is returned as-is. When every endpoint is
    /// exhausted the last observed failure is returned.
    ///
    /// # Errors
    /// `Transport`, `ServiceBusy`, `Unauthorized` or `Status` from the last
    /// attempt made.
    pub async fn execute<F>(&self, build: F) -> Result<HttpResponse>
    where
        F: Fn() -> RequestDescriptor + Send + Sync,
    {
        let attempts = self.policy.attempts_per_endpoint();
        let mut last_error = None;

        for binding in &self.bindings {
            let endpoint = binding.endpoint();

            for attempt in 1..=attempts {
                let request = build();
                debug!(
                    %endpoint,
                    attempt,
                    method = %request.method(),
                    path = request.path(),
                    "sending request"
                );

                let error = match binding.send(request).await {
                    Ok(response) if response.status() < 400 => {
                        debug!(%endpoint, attempt, status = response.status(), "request succeeded");
                        return Ok(response);
                    }
                    Ok(response) => self.policy.into_error(response).await,
                    Err(error) => error,
                };

                let retriable = error.is_retriable();
                warn!(%endpoint, attempt, retriable, error = %error, "request attempt failed");
                last_error = Some(error);

                if !retriable {
                    break;
                }
                if attempt < attempts {
                    self.policy.sleep_with_backoff(attempt).await;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            GraphDbError::Config("executor has no endpoints to attempt".into())
        }))
    }
}
