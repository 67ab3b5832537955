use std::{borrow::Cow, error::Error as StdError};

/// Boxed error used for transport failures and caller-supplied retry errors.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Error returned by [`HttpClient`](crate::HttpClient) when a request fails.
///
/// Every variant renders the same way, so logs stay comparable whatever the
/// failure kind:
///
/// ```text
/// request to <url> failed. httpStatus: [ <code|no status> ] responseBody: [ <body> ] error: [ <cause|<nil>> ]
/// ```
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The final response carried a status code `>= 400`.
    #[error(
        "request to {url} failed. httpStatus: [ {status} ] responseBody: [ {} ] error: [ {} ]",
        String::from_utf8_lossy(.body),
        cause_or_nil(.cause)
    )]
    UnsuccessfulResponse {
        url: String,
        status: u16,
        /// Response body exactly as received.
        body: Vec<u8>,
        /// Transport or retry-predicate error reported alongside the response.
        #[source]
        cause: Option<BoxError>,
    },
    /// Reading a response body failed.
    #[error(
        "request to {url} failed. httpStatus: [ {status} ] responseBody: [  ] error: [ parsing response: {cause} ]"
    )]
    BodyRead {
        url: String,
        status: u16,
        #[source]
        cause: BoxError,
    },
    /// A success response body could not be decoded as JSON.
    #[error(
        "request to {url} failed. httpStatus: [ {status} ] responseBody: [  ] error: [ decoding response: {cause} ]"
    )]
    Decode {
        url: String,
        status: u16,
        #[source]
        cause: serde_json::Error,
    },
    /// No usable response: connection failure, timeout, or retries exhausted.
    #[error(
        "request to {url} failed. httpStatus: [ no status ] responseBody: [  ] error: [ {cause} ]"
    )]
    Transport {
        url: String,
        #[source]
        cause: BoxError,
    },
}

fn cause_or_nil(cause: &Option<BoxError>) -> Cow<'_, str> {
    match cause {
        Some(cause) => Cow::Owned(cause.to_string()),
        None => Cow::Borrowed("<nil>"),
    }
}

impl HttpError {
    /// Target URL of the failed request.
    pub fn url(&self) -> &str {
        match self {
            Self::UnsuccessfulResponse { url, .. }
            | Self::BodyRead { url, .. }
            | Self::Decode { url, .. }
            | Self::Transport { url, .. } => url,
        }
    }

    /// HTTP status of the final response, `None` when no response arrived.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnsuccessfulResponse { status, .. }
            | Self::BodyRead { status, .. }
            | Self::Decode { status, .. } => Some(*status),
            Self::Transport { .. } => None,
        }
    }

    /// Captured response body bytes, empty when none was read.
    pub fn body_bytes(&self) -> &[u8] {
        match self {
            Self::UnsuccessfulResponse { body, .. } => body,
            _ => &[],
        }
    }

    /// Captured response body as text. Invalid UTF-8 is replaced with
    /// `U+FFFD`; use [`body_bytes`](Self::body_bytes) for the exact bytes.
    pub fn body(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.body_bytes())
    }

    /// Underlying cause, if any.
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            Self::UnsuccessfulResponse { cause, .. } => cause.as_deref(),
            Self::BodyRead { cause, .. } | Self::Transport { cause, .. } => Some(&**cause),
            Self::Decode { cause, .. } => Some(cause),
        }
    }

    /// Returns `true` when the server answered with a status `>= 400`.
    pub fn is_unsuccessful_response(&self) -> bool {
        matches!(self, Self::UnsuccessfulResponse { .. })
    }
}

/// Errors produced by the retry executor itself.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    /// The retry loop stopped without a usable outcome.
    #[error("{method} {url} giving up after {attempts} attempt(s)")]
    GivingUp {
        method: String,
        url: String,
        attempts: usize,
    },
    /// Same as [`AttemptError::GivingUp`], wrapping the last underlying error.
    #[error("{method} {url} giving up after {attempts} attempt(s): {source}")]
    GivingUpAfter {
        method: String,
        url: String,
        attempts: usize,
        source: BoxError,
    },
    /// A retry was requested but the request body is a stream that was
    /// already consumed by the previous attempt.
    #[error("{method} {url} cannot be retried after {attempts} attempt(s): request body is not replayable")]
    BodyNotReplayable {
        method: String,
        url: String,
        attempts: usize,
    },
}

/// Marker cause used when an outcome carries neither response nor error.
#[derive(Debug, thiserror::Error)]
#[error("no response received")]
pub struct NoResponse;
