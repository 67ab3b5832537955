//! HTTP/1.1 wire dumps of outgoing requests, for diagnostics.

use std::{fmt, io::Write, sync::Arc};

use reqwest::{header, Method, Request};

use crate::error::BoxError;

/// Receives request dumps.
#[derive(Clone)]
pub struct DumpLogger(Arc<dyn Fn(&[u8]) + Send + Sync>);

impl DumpLogger {
    pub fn new<F>(logger: F) -> Self
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        Self(Arc::new(logger))
    }

    /// Emits dumps as `tracing` debug events.
    #[cfg(feature = "tracing")]
    pub fn tracing() -> Self {
        Self::new(|dump| tracing::debug!("request dump:\n{}", String::from_utf8_lossy(dump)))
    }

    pub fn log(&self, dump: &[u8]) {
        (self.0)(dump)
    }
}

impl fmt::Debug for DumpLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DumpLogger(..)")
    }
}

/// Serializes a request for a [`DumpLogger`].
pub trait RequestDumper: Send + Sync {
    fn dump(&self, request: &Request, include_body: bool) -> Result<Vec<u8>, BoxError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("request url has no host")]
    MissingHost,
    #[error("request body is a stream and cannot be dumped")]
    StreamingBody,
    #[error("writing dump: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes requests the way they go out on an HTTP/1.1 connection: request
/// line, `Host`, headers, `Content-Length` when known, blank line, body.
///
/// The dump is taken before the request reaches `reqwest::Client`, so headers
/// the client adds on send (`accept`, `accept-encoding`, `user-agent`) do not
/// appear. Set them on the request to have them dumped.
#[derive(Clone, Copy, Debug, Default)]
pub struct WireDumper;

impl WireDumper {
    fn write(&self, request: &Request, include_body: bool) -> Result<Vec<u8>, DumpError> {
        let url = request.url();
        let host = url.host_str().ok_or(DumpError::MissingHost)?;
        let body = request.body();
        let body_bytes = body.and_then(|body| body.as_bytes());
        if include_body && body.is_some() && body_bytes.is_none() {
            return Err(DumpError::StreamingBody);
        }

        let mut out = Vec::new();
        write!(out, "{} {}", request.method(), url.path())?;
        if let Some(query) = url.query() {
            write!(out, "?{query}")?;
        }
        out.extend_from_slice(b" HTTP/1.1\r\n");

        match request.headers().get(header::HOST) {
            Some(value) => {
                out.extend_from_slice(b"Host: ");
                out.extend_from_slice(value.as_bytes());
                out.extend_from_slice(b"\r\n");
            }
            None => match url.port() {
                Some(port) => write!(out, "Host: {host}:{port}\r\n")?,
                None => write!(out, "Host: {host}\r\n")?,
            },
        }

        for (name, value) in request.headers() {
            if *name == header::HOST {
                continue;
            }
            write!(out, "{}: ", name.as_str())?;
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }

        if !request.headers().contains_key(header::CONTENT_LENGTH) {
            match body_bytes {
                Some(bytes) => write!(out, "Content-Length: {}\r\n", bytes.len())?,
                None if body.is_none() && expects_body(request.method()) => {
                    out.extend_from_slice(b"Content-Length: 0\r\n")
                }
                None => {}
            }
        }
        out.extend_from_slice(b"\r\n");

        if include_body {
            if let Some(bytes) = body_bytes {
                out.extend_from_slice(bytes);
            }
        }
        Ok(out)
    }
}

impl RequestDumper for WireDumper {
    fn dump(&self, request: &Request, include_body: bool) -> Result<Vec<u8>, BoxError> {
        self.write(request, include_body).map_err(Into::into)
    }
}

fn expects_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}
