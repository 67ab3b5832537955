use std::{fmt, sync::Arc};

use reqwest::{Request, Response};
use serde::de::DeserializeOwned;

use crate::{
    dump::RequestDumper,
    resolve::{BodyReader, JsonResponse, ResponseResolver},
    retry::{Execution, RetryExecutor, RetryPolicy},
    transport::{self, Transport},
    ClientOptions, Result,
};

/// HTTP client with opt-in retries and uniform error reporting.
///
/// Cloning is cheap; clones share the connection pool and configuration.
#[derive(Clone)]
pub struct HttpClient {
    options: Arc<ClientOptions>,
    executor: RetryExecutor,
    resolver: ResponseResolver,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Creates a client backed by a `reqwest` connection pool.
    ///
    /// Fails only when the underlying client cannot be built (for example when
    /// the TLS backend cannot initialize).
    pub fn new(options: ClientOptions) -> reqwest::Result<Self> {
        let http = transport::build_client(&options)?;
        Ok(Self::with_transport(options, http))
    }

    /// Creates a client that performs attempts through `transport`.
    pub fn with_transport<T>(options: ClientOptions, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        let executor = RetryExecutor::new(Arc::new(transport), RetryPolicy::from_options(&options));
        let resolver = ResponseResolver::new(&options);
        Self {
            options: Arc::new(options),
            executor,
            resolver,
        }
    }

    /// Replaces the reader used to capture error bodies and read JSON bodies.
    pub fn with_body_reader<R>(mut self, reader: R) -> Self
    where
        R: BodyReader + 'static,
    {
        self.resolver = self.resolver.with_body_reader(Arc::new(reader));
        self
    }

    /// Replaces the serializer that produces request dumps.
    pub fn with_request_dumper<D>(mut self, dumper: D) -> Self
    where
        D: RequestDumper + 'static,
    {
        self.resolver = self.resolver.with_request_dumper(Arc::new(dumper));
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Sends `request` and returns the response with its body unread.
    ///
    /// Responses with status `>= 400` are turned into
    /// [`HttpError::UnsuccessfulResponse`](crate::HttpError::UnsuccessfulResponse) carrying the full body.
    pub async fn send(&self, request: Request) -> Result<Response> {
        let (url, execution) = self.run(request).await;
        self.resolver.resolve(&url, execution.outcome).await
    }

    /// Sends `request` and decodes a successful response body as JSON.
    pub async fn send_and_decode_json<T>(
        &self,
        request: Request,
    ) -> Result<JsonResponse<T>>
    where
        T: DeserializeOwned,
    {
        let (url, execution) = self.run(request).await;
        self.resolver.resolve_json(&url, execution.outcome).await
    }

    async fn run(&self, request: Request) -> (String, Execution) {
        let url = request.url().to_string();
        self.resolver.dump_request(&request);
        let execution = self.executor.execute(request).await;

        #[cfg(feature = "tracing")]
        tracing::debug!(url = %url, attempts = execution.attempts, "request finished");

        (url, execution)
    }
}
