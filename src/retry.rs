//! Retry loop and the policy deciding when another attempt is made.

use std::{error::Error as StdError, fmt, sync::Arc, time::Duration};

use reqwest::{Method, Request, Response, StatusCode, Url};
use tokio::time::sleep;

use crate::{
    error::{AttemptError, BoxError},
    transport::Transport,
    ClientOptions,
};

/// Transport error as seen by a [`RetryPredicate`].
pub type TransportErrorRef<'a> = &'a (dyn StdError + Send + Sync + 'static);

type PredicateFn = dyn Fn(&RetryContext<'_>, Option<&Response>, Option<TransportErrorRef<'_>>) -> RetryDecision
    + Send
    + Sync;

/// Information about the attempt that just completed.
#[derive(Clone, Copy, Debug)]
pub struct RetryContext<'a> {
    attempt: usize,
    method: &'a Method,
    url: &'a Url,
}

impl<'a> RetryContext<'a> {
    pub fn new(attempt: usize, method: &'a Method, url: &'a Url) -> Self {
        Self {
            attempt,
            method,
            url,
        }
    }

    /// 1-based number of the attempt that just completed.
    pub fn attempt(&self) -> usize {
        self.attempt
    }

    pub fn method(&self) -> &Method {
        self.method
    }

    pub fn url(&self) -> &Url {
        self.url
    }
}

/// Result of evaluating a [`RetryPredicate`].
#[derive(Debug, Default)]
pub struct RetryDecision {
    /// Whether another attempt should be made.
    pub retry: bool,
    /// Error reported in place of the attempt's own transport error.
    pub error: Option<BoxError>,
}

impl RetryDecision {
    pub fn stop() -> Self {
        Self::default()
    }

    pub fn retry() -> Self {
        Self {
            retry: true,
            error: None,
        }
    }

    /// Attaches an error that becomes the outcome's cause.
    pub fn with_error(mut self, error: impl Into<BoxError>) -> Self {
        self.error = Some(error.into());
        self
    }
}

impl From<bool> for RetryDecision {
    fn from(retry: bool) -> Self {
        Self { retry, error: None }
    }
}

/// Caller-supplied function deciding, after each attempt, whether to retry.
#[derive(Clone)]
pub struct RetryPredicate(Arc<PredicateFn>);

impl RetryPredicate {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&RetryContext<'_>, Option<&Response>, Option<TransportErrorRef<'_>>) -> RetryDecision
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// Never retries, whatever the status code or transport error.
    ///
    /// This is the default. Retrying every 5xx would drain and discard the
    /// response body that callers need to see what went wrong, so retries
    /// are strictly opt-in.
    pub fn never() -> Self {
        Self::new(|_, _, _| RetryDecision::stop())
    }

    /// Retries when the attempt failed at the transport level.
    pub fn on_transport_error() -> Self {
        Self::new(|_, _, error| RetryDecision::from(error.is_some()))
    }

    /// Retries when the response status is one of `statuses`.
    pub fn on_status<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = StatusCode>,
    {
        let statuses: Vec<StatusCode> = statuses.into_iter().collect();
        Self::new(move |_, response, _| {
            RetryDecision::from(response.is_some_and(|r| statuses.contains(&r.status())))
        })
    }

    pub fn check(
        &self,
        ctx: &RetryContext<'_>,
        response: Option<&Response>,
        error: Option<TransportErrorRef<'_>>,
    ) -> RetryDecision {
        (self.0)(ctx, response, error)
    }
}

impl fmt::Debug for RetryPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RetryPredicate(..)")
    }
}

/// What one attempt, or a whole retry loop, produced.
#[derive(Debug, Default)]
pub struct AttemptOutcome {
    pub response: Option<Response>,
    pub error: Option<BoxError>,
}

/// Final outcome of [`RetryExecutor::execute`] and the number of attempts made.
#[derive(Debug)]
pub struct Execution {
    pub outcome: AttemptOutcome,
    pub attempts: usize,
}

/// Attempt limit, backoff window and predicate.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub wait_min: Duration,
    pub wait_max: Duration,
    pub predicate: RetryPredicate,
}

impl RetryPolicy {
    pub fn from_options(options: &ClientOptions) -> Self {
        Self {
            max_retries: options.max_retries,
            wait_min: options.retry_wait_min,
            wait_max: options.retry_wait_max,
            predicate: options.retry_predicate.clone(),
        }
    }

    /// Wait before the attempt following attempt number `attempt`.
    ///
    /// Doubles from `wait_min` and is clamped to `wait_max`; a window with
    /// `wait_max < wait_min` collapses to `wait_min`.
    pub fn backoff(&self, attempt: usize) -> Duration {
        let exp = attempt.saturating_sub(1).min(31) as u32;
        let ceiling = self.wait_max.max(self.wait_min);
        self.wait_min.saturating_mul(1u32 << exp).min(ceiling)
    }
}

/// Runs attempts against a [`Transport`] until the policy says stop.
#[derive(Clone)]
pub struct RetryExecutor {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RetryExecutor {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn execute(&self, request: Request) -> Execution {
        let method = request.method().clone();
        let url = request.url().clone();
        let mut current = request;
        let mut attempts = 0usize;

        loop {
            let replay = current.try_clone();
            attempts += 1;

            let (response, error) = match self.transport.attempt(current).await {
                Ok(response) => (Some(response), None),
                Err(error) => (None, Some(error)),
            };

            let ctx = RetryContext::new(attempts, &method, &url);
            let decision = self
                .policy
                .predicate
                .check(&ctx, response.as_ref(), error.as_deref());

            if !decision.retry {
                let outcome = match (response, decision.error.or(error)) {
                    (response, None) => AttemptOutcome {
                        response,
                        error: None,
                    },
                    (Some(response), Some(error)) => AttemptOutcome {
                        response: Some(response),
                        error: Some(error),
                    },
                    (None, Some(error)) => AttemptOutcome {
                        response: None,
                        error: Some(giving_up(&method, &url, attempts, Some(error))),
                    },
                };
                return Execution { outcome, attempts };
            }

            if attempts > self.policy.max_retries {
                #[cfg(feature = "tracing")]
                tracing::warn!(%method, %url, attempts, "giving up on request");

                let cause = decision.error.or(error);
                return Execution {
                    outcome: AttemptOutcome {
                        response,
                        error: Some(giving_up(&method, &url, attempts, cause)),
                    },
                    attempts,
                };
            }

            let Some(next) = replay else {
                #[cfg(feature = "tracing")]
                tracing::warn!(%method, %url, attempts, "request body is not replayable");

                return Execution {
                    outcome: AttemptOutcome {
                        response,
                        error: Some(Box::new(AttemptError::BodyNotReplayable {
                            method: method.to_string(),
                            url: redact_url(&url),
                            attempts,
                        })),
                    },
                    attempts,
                };
            };

            if let Some(response) = response {
                drain_body(response).await;
            }

            let delay = self.policy.backoff(attempts);

            #[cfg(feature = "tracing")]
            tracing::debug!(
                %method,
                %url,
                attempt = attempts,
                "retrying request after {} ms",
                delay.as_millis()
            );

            sleep(delay).await;
            current = next;
        }
    }
}

fn giving_up(method: &Method, url: &Url, attempts: usize, cause: Option<BoxError>) -> BoxError {
    let method = method.to_string();
    let url = redact_url(url);
    match cause {
        Some(source) => Box::new(AttemptError::GivingUpAfter {
            method,
            url,
            attempts,
            source,
        }),
        None => Box::new(AttemptError::GivingUp {
            method,
            url,
            attempts,
        }),
    }
}

/// Hides the password component of a URL before it lands in an error.
fn redact_url(url: &Url) -> String {
    if url.password().is_none() {
        return url.to_string();
    }
    let mut redacted = url.clone();
    // set_password only fails for URLs that cannot carry credentials.
    let _ = redacted.set_password(Some("xxxxx"));
    redacted.to_string()
}

/// Reads and discards a response body so its connection can be reused.
async fn drain_body(response: Response) {
    if let Err(_err) = response.bytes().await {
        #[cfg(feature = "tracing")]
        tracing::debug!("error draining response body before retry: {}", _err);
    }
}
