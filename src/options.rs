use std::time::Duration;

use crate::{dump::DumpLogger, retry::RetryPredicate};

/// Configures connection limits, retry behavior and request dumps.
///
/// Start from [`ClientOptions::default`] and chain `with_*` calls; each one
/// sets a single field. Once handed to a client the options are read-only.
#[derive(Clone, Debug)]
pub struct ClientOptions {
    /// Maximum idle (keep-alive) connections across all hosts.
    ///
    /// Kept for callers that size pools themselves; the bundled `reqwest`
    /// transport has no global idle limit.
    pub max_idle_connections: Option<usize>,
    /// Maximum idle (keep-alive) connections kept per host.
    pub max_idle_connections_per_host: Option<usize>,
    /// Limit on total connections per host. Passed through unchanged.
    pub max_connections_per_host: Option<usize>,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Lower bound of the wait between attempts.
    pub retry_wait_min: Duration,
    /// Upper bound of the wait between attempts.
    pub retry_wait_max: Duration,
    /// Decides after every attempt whether another one is made.
    pub retry_predicate: RetryPredicate,
    /// Receives a wire dump of each outgoing request.
    pub dump_logger: Option<DumpLogger>,
    /// Whether request dumps include the body.
    pub dump_body: bool,
    /// Per-attempt timeout.
    pub timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            max_idle_connections: None,
            max_idle_connections_per_host: None,
            max_connections_per_host: None,
            max_retries: 0,
            retry_wait_min: Duration::from_secs(1),
            retry_wait_max: Duration::from_secs(30),
            retry_predicate: RetryPredicate::never(),
            dump_logger: None,
            dump_body: false,
            timeout: None,
        }
    }
}

impl ClientOptions {
    pub fn with_max_idle_connections(mut self, n: usize) -> Self {
        self.max_idle_connections = Some(n);
        self
    }

    pub fn with_max_idle_connections_per_host(mut self, n: usize) -> Self {
        self.max_idle_connections_per_host = Some(n);
        self
    }

    pub fn with_max_connections_per_host(mut self, n: usize) -> Self {
        self.max_connections_per_host = Some(n);
        self
    }

    /// Sets the number of retries; `0` means exactly one attempt.
    pub fn with_max_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    pub fn with_retry_wait_min(mut self, wait: Duration) -> Self {
        self.retry_wait_min = wait;
        self
    }

    pub fn with_retry_wait_max(mut self, wait: Duration) -> Self {
        self.retry_wait_max = wait;
        self
    }

    /// Replaces the default never-retry predicate.
    pub fn with_retry_predicate(mut self, predicate: RetryPredicate) -> Self {
        self.retry_predicate = predicate;
        self
    }

    /// Installs a request dump logger, optionally including request bodies.
    pub fn with_dump_logger(mut self, logger: DumpLogger, dump_body: bool) -> Self {
        self.dump_logger = Some(logger);
        self.dump_body = dump_body;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
