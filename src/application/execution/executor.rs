//! Resilient executor - The four-layer wrapper around tool invocation.
//!
//! Layers apply outside-in on the request path:
//! bulkhead → timeout → circuit breaker → retry → tool handler.
//!
//! Retries happen only for idempotent tools and never for open circuits or
//! cancellation. A handler panic is contained and counted as a failure.
//! Cacheable tools are served from the optional cache before bulkhead
//! admission; a hit touches no resilience state.

use futures::FutureExt;
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::domain::tool::Tool;
use crate::ports::{Cache, ToolContext, ToolOutput};

use super::{BreakerConfig, BreakerState, Bulkhead, CircuitBreaker, ExecutorError, RetryPolicy};

/// Configuration for the resilient executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Process-wide cap on in-flight tool executions.
    pub max_concurrent: usize,
    /// Bounded wait for a bulkhead slot before failing.
    pub bulkhead_wait: Duration,
    /// Per-invocation timeout covering all attempts.
    pub default_timeout: Duration,
    /// Consecutive failures before a tool's circuit opens.
    pub circuit_breaker_threshold: u32,
    /// Time an open circuit waits before probing recovery.
    pub circuit_breaker_reset_timeout: Duration,
    /// Total attempts for idempotent tools, including the first.
    pub retry_max_attempts: u32,
    /// Delay before the first retry; doubles each retry.
    pub retry_initial_delay: Duration,
    /// Ceiling for the doubled retry delays.
    pub retry_max_delay: Duration,
    /// Time-to-live for cached tool results; no expiry when absent.
    pub cache_ttl: Option<Duration>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            bulkhead_wait: Duration::from_secs(5),
            default_timeout: Duration::from_secs(30),
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_timeout: Duration::from_secs(30),
            retry_max_attempts: 3,
            retry_initial_delay: Duration::from_millis(100),
            retry_max_delay: Duration::from_secs(30),
            cache_ttl: None,
        }
    }
}

/// Observer of per-attempt outcomes inside one invocation.
///
/// The engine uses this to ledger intermediate attempts of a retried call.
pub trait ExecutionObserver: Send + Sync {
    /// Called when `next_attempt - 1` failed and another attempt will run.
    fn on_retry(&self, tool: &str, next_attempt: u32, error: &ExecutorError);
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl ExecutionObserver for NoopObserver {
    fn on_retry(&self, _tool: &str, _next_attempt: u32, _error: &ExecutorError) {}
}

/// What one invocation did, alongside its result.
#[derive(Debug)]
pub struct ExecutionReport {
    /// The tool's output, or the error that ended the invocation.
    pub result: Result<ToolOutput, ExecutorError>,
    /// Observed wall-clock duration.
    pub duration: Duration,
    /// Handler attempts performed; zero on a cache hit.
    pub attempts: u32,
    /// True if more than one attempt ran.
    pub retried: bool,
    /// True if the result came from the cache.
    pub cache_hit: bool,
}

/// Wraps single tool invocations with bulkhead, timeout, circuit breaker,
/// and retry. One executor may be shared by multiple engines when the host
/// wants shared limits across runs.
pub struct ResilientExecutor {
    bulkhead: Bulkhead,
    breaker: CircuitBreaker,
    retry: RetryPolicy,
    default_timeout: Duration,
    cache: Option<Arc<dyn Cache>>,
    cache_ttl: Option<Duration>,
}

impl ResilientExecutor {
    /// Creates an executor from configuration.
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            bulkhead: Bulkhead::new(config.max_concurrent, config.bulkhead_wait),
            breaker: CircuitBreaker::new(BreakerConfig {
                failure_threshold: config.circuit_breaker_threshold,
                reset_timeout: config.circuit_breaker_reset_timeout,
            }),
            retry: RetryPolicy {
                max_attempts: config.retry_max_attempts.max(1),
                initial_delay: config.retry_initial_delay,
                max_delay: config.retry_max_delay,
            },
            default_timeout: config.default_timeout,
            cache: None,
            cache_ttl: config.cache_ttl,
        }
    }

    /// Attaches a result cache for cacheable tools.
    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Returns the circuit state for a tool.
    pub fn breaker_state(&self, tool: &str) -> BreakerState {
        self.breaker.state(tool)
    }

    /// Number of currently free bulkhead slots.
    pub fn available_slots(&self) -> usize {
        self.bulkhead.available()
    }

    /// Invokes a tool through the full resilience stack.
    pub async fn invoke(
        &self,
        tool: &Tool,
        input: JsonValue,
        ctx: &ToolContext,
        observer: &dyn ExecutionObserver,
    ) -> ExecutionReport {
        let started = Instant::now();
        let name = tool.name().to_string();

        if tool.annotations().cacheable {
            if let Some(hit) = self.cache_lookup(&name, &input).await {
                tracing::debug!(tool = %name, "tool result served from cache");
                return ExecutionReport {
                    result: Ok(ToolOutput::new(hit)),
                    duration: started.elapsed(),
                    attempts: 0,
                    retried: false,
                    cache_hit: true,
                };
            }
        }

        let permit = match self.bulkhead.acquire(&ctx.cancellation).await {
            Ok(permit) => permit,
            Err(error) => {
                return ExecutionReport {
                    result: Err(error),
                    duration: started.elapsed(),
                    attempts: 0,
                    retried: false,
                    cache_hit: false,
                }
            }
        };

        let attempts = AtomicU32::new(0);
        let inner = self.run_attempts(tool, &input, ctx, observer, &attempts);
        let result = tokio::select! {
            _ = ctx.cancellation.cancelled() => Err(ExecutorError::Cancelled),
            timed = tokio::time::timeout(self.default_timeout, inner) => match timed {
                Ok(result) => result,
                Err(_) => {
                    self.breaker.record_failure(&name);
                    Err(ExecutorError::Timeout {
                        tool: name.clone(),
                        millis: self.default_timeout.as_millis() as u64,
                    })
                }
            },
        };
        drop(permit);

        if tool.annotations().cacheable {
            if let Ok(output) = &result {
                self.cache_store(&name, &input, &output.content).await;
            }
        }

        let attempts = attempts.load(Ordering::Relaxed);
        ExecutionReport {
            result,
            duration: started.elapsed(),
            attempts,
            retried: attempts > 1,
            cache_hit: false,
        }
    }

    /// Circuit-breaker check plus the retry loop around single attempts.
    async fn run_attempts(
        &self,
        tool: &Tool,
        input: &JsonValue,
        ctx: &ToolContext,
        observer: &dyn ExecutionObserver,
        attempts: &AtomicU32,
    ) -> Result<ToolOutput, ExecutorError> {
        let name = tool.name();
        let mut attempt: u32 = 1;
        loop {
            self.breaker.check(name)?;
            attempts.store(attempt, Ordering::Relaxed);

            match self.attempt_once(tool, input, ctx).await {
                Ok(output) => {
                    self.breaker.record_success(name);
                    return Ok(output);
                }
                Err(error) => {
                    if !matches!(error, ExecutorError::Cancelled) {
                        self.breaker.record_failure(name);
                    }
                    let may_retry = tool.annotations().idempotent
                        && error.is_retryable()
                        && self.retry.allows_another(attempt);
                    if !may_retry {
                        return Err(error);
                    }
                    tracing::debug!(
                        tool = name,
                        attempt,
                        error = %error,
                        "retrying idempotent tool"
                    );
                    observer.on_retry(name, attempt + 1, &error);
                    let delay = self.retry.delay_before_retry(attempt);
                    tokio::select! {
                        _ = ctx.cancellation.cancelled() => return Err(ExecutorError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// One handler call with panic containment and cancellation.
    async fn attempt_once(
        &self,
        tool: &Tool,
        input: &JsonValue,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ExecutorError> {
        let handler = tool.handler().handle(ctx, input.clone());
        let contained = AssertUnwindSafe(handler).catch_unwind();
        tokio::select! {
            _ = ctx.cancellation.cancelled() => Err(ExecutorError::Cancelled),
            caught = contained => match caught {
                Ok(Ok(output)) => Ok(output),
                Ok(Err(tool_error)) => Err(ExecutorError::Tool(tool_error)),
                Err(panic) => Err(ExecutorError::Panicked {
                    tool: tool.name().to_string(),
                    message: panic_message(&panic),
                }),
            },
        }
    }

    async fn cache_lookup(&self, tool: &str, input: &JsonValue) -> Option<JsonValue> {
        let cache = self.cache.as_ref()?;
        match cache.get(&cache_key(tool, input)).await {
            Ok(hit) => hit,
            Err(error) => {
                tracing::warn!(tool, %error, "cache lookup failed; treating as miss");
                None
            }
        }
    }

    async fn cache_store(&self, tool: &str, input: &JsonValue, output: &JsonValue) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        if let Err(error) = cache
            .set(&cache_key(tool, input), output.clone(), self.cache_ttl)
            .await
        {
            tracing::warn!(tool, %error, "cache store failed");
        }
    }
}

/// Cache key: tool name plus a digest of the input document.
fn cache_key(tool: &str, input: &JsonValue) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.to_string().as_bytes());
    format!("{}:{:x}", tool, hasher.finalize())
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
