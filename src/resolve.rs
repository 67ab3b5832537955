use std::{fmt, sync::Arc};

use async_trait::async_trait;
use reqwest::{header::HeaderMap, Request, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    dump::{DumpLogger, RequestDumper, WireDumper},
    error::{BoxError, HttpError, NoResponse},
    retry::AttemptOutcome,
    ClientOptions,
};

/// Reads a response body to the end. Dropping the response closes it.
#[async_trait]
pub trait BodyReader: Send + Sync {
    async fn read_all(&self, response: Response) -> Result<Vec<u8>, BoxError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ReqwestBodyReader;

#[async_trait]
impl BodyReader for ReqwestBodyReader {
    async fn read_all(&self, response: Response) -> Result<Vec<u8>, BoxError> {
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

/// Successful response whose body was decoded as JSON.
#[derive(Clone, Debug)]
pub struct JsonResponse<T> {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub value: T,
}

impl<T> JsonResponse<T> {
    pub fn into_inner(self) -> T {
        self.value
    }
}

/// Turns the final attempt outcome into a response or an [`HttpError`], and
/// dumps outgoing requests when a dump logger is configured.
#[derive(Clone)]
pub struct ResponseResolver {
    body_reader: Arc<dyn BodyReader>,
    dumper: Arc<dyn RequestDumper>,
    dump_logger: Option<DumpLogger>,
    dump_body: bool,
}

impl fmt::Debug for ResponseResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseResolver")
            .field("dump_logger", &self.dump_logger)
            .field("dump_body", &self.dump_body)
            .finish_non_exhaustive()
    }
}

impl ResponseResolver {
    pub fn new(options: &ClientOptions) -> Self {
        Self {
            body_reader: Arc::new(ReqwestBodyReader),
            dumper: Arc::new(WireDumper),
            dump_logger: options.dump_logger.clone(),
            dump_body: options.dump_body,
        }
    }

    pub fn with_body_reader(mut self, reader: Arc<dyn BodyReader>) -> Self {
        self.body_reader = reader;
        self
    }

    pub fn with_request_dumper(mut self, dumper: Arc<dyn RequestDumper>) -> Self {
        self.dumper = dumper;
        self
    }

    /// Hands a wire dump of `request` to the dump logger, if one is set.
    ///
    /// Dumping is best effort: serialization failures are dropped.
    pub fn dump_request(&self, request: &Request) {
        let Some(logger) = &self.dump_logger else {
            return;
        };
        match self.dumper.dump(request, self.dump_body) {
            Ok(dump) => logger.log(&dump),
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("skipping request dump: {}", _err);
            }
        }
    }

    /// Returns the response with its body untouched, or the structured error.
    pub async fn resolve(&self, url: &str, outcome: AttemptOutcome) -> crate::Result<Response> {
        self.classify(url, outcome).await
    }

    /// Like [`resolve`](Self::resolve), then reads and decodes the body as `T`.
    pub async fn resolve_json<T>(
        &self,
        url: &str,
        outcome: AttemptOutcome,
    ) -> crate::Result<JsonResponse<T>>
    where
        T: DeserializeOwned,
    {
        let response = self.classify(url, outcome).await?;
        let status = response.status();
        let headers = response.headers().clone();

        let body = self
            .body_reader
            .read_all(response)
            .await
            .map_err(|cause| HttpError::BodyRead {
                url: url.to_owned(),
                status: status.as_u16(),
                cause,
            })?;

        let value = serde_json::from_slice(&body).map_err(|cause| HttpError::Decode {
            url: url.to_owned(),
            status: status.as_u16(),
            cause,
        })?;

        Ok(JsonResponse {
            status,
            headers,
            value,
        })
    }

    async fn classify(&self, url: &str, outcome: AttemptOutcome) -> crate::Result<Response> {
        let AttemptOutcome { response, error } = outcome;
        match (response, error) {
            (Some(response), error) if is_unsuccessful(response.status()) => {
                Err(self.unsuccessful(url, response, error).await)
            }
            (Some(response), None) => Ok(response),
            (_, Some(cause)) => Err(HttpError::Transport {
                url: url.to_owned(),
                cause,
            }),
            (None, None) => Err(HttpError::Transport {
                url: url.to_owned(),
                cause: Box::new(NoResponse),
            }),
        }
    }

    async fn unsuccessful(
        &self,
        url: &str,
        response: Response,
        error: Option<BoxError>,
    ) -> HttpError {
        let status = response.status().as_u16();
        match self.body_reader.read_all(response).await {
            Ok(body) => HttpError::UnsuccessfulResponse {
                url: url.to_owned(),
                status,
                body,
                cause: error,
            },
            Err(cause) => HttpError::BodyRead {
                url: url.to_owned(),
                status,
                cause,
            },
        }
    }
}

fn is_unsuccessful(status: StatusCode) -> bool {
    status.as_u16() >= 400
}
