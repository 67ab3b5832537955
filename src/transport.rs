use async_trait::async_trait;
use reqwest::{Request, Response};

use crate::{error::BoxError, ClientOptions};

/// Performs a single network attempt.
///
/// Implemented for [`reqwest::Client`]; tests and callers with their own
/// stack can plug in anything else.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn attempt(&self, request: Request) -> Result<Response, BoxError>;
}

#[async_trait]
impl Transport for reqwest::Client {
    async fn attempt(&self, request: Request) -> Result<Response, BoxError> {
        self.execute(request).await.map_err(Into::into)
    }
}

/// Builds the `reqwest` client used by [`HttpClient::new`](crate::HttpClient::new).
pub(crate) fn build_client(options: &ClientOptions) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = options.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(max_idle) = options.max_idle_connections_per_host {
        builder = builder.pool_max_idle_per_host(max_idle);
    }
    builder.build()
}
