use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{
    header::{HeaderValue, CONTENT_TYPE},
    Method, Request, Url,
};

use crate::{wire::ParseDocumentRequest, ClientOptions, HttpClient, HttpError, Resume};

/// Error type returned by [`ResumeParsingClient`].
#[derive(Debug, thiserror::Error)]
pub enum RpsError {
    /// Missing or empty configuration value.
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("token is not a valid header value")]
    InvalidToken,
    /// The underlying HTTP client could not be built.
    #[error("building http client: {0}")]
    Build(reqwest::Error),
    #[error("marshalling parse document request: {0}")]
    Marshal(serde_json::Error),
    #[error("performing request: {0}")]
    Http(HttpError),
}

/// Client for the Resume Parsing Service `/api/parse` endpoint.
#[derive(Clone)]
pub struct ResumeParsingClient {
    http: HttpClient,
    parse_url: Url,
    token: HeaderValue,
}

impl fmt::Debug for ResumeParsingClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResumeParsingClient")
            .field("parse_url", &self.parse_url.as_str())
            .field("token", &"<redacted>")
            .field("http", &self.http)
            .finish()
    }
}

impl ResumeParsingClient {
    /// Creates a client for the service at `base_url`, authenticating with
    /// the `token` header.
    pub fn new(
        token: impl AsRef<str>,
        base_url: impl AsRef<str>,
        options: ClientOptions,
    ) -> Result<Self, RpsError> {
        let http = HttpClient::new(options).map_err(RpsError::Build)?;
        Self::with_http_client(token, base_url, http)
    }

    /// Creates a client on top of an existing [`HttpClient`].
    pub fn with_http_client(
        token: impl AsRef<str>,
        base_url: impl AsRef<str>,
        http: HttpClient,
    ) -> Result<Self, RpsError> {
        let parse_url = parse_endpoint(base_url.as_ref())?;
        let mut token =
            HeaderValue::from_str(token.as_ref().trim()).map_err(|_| RpsError::InvalidToken)?;
        token.set_sensitive(true);
        Ok(Self {
            http,
            parse_url,
            token,
        })
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `RPS_TOKEN`: service access token
    /// - `RPS_BASE_URL`: service base URL (e.g. `https://rps.example.com`)
    ///
    /// Returns an error if either variable is missing or empty.
    pub fn from_env(options: ClientOptions) -> Result<Self, RpsError> {
        let token = std::env::var("RPS_TOKEN")
            .map_err(|_| RpsError::Config("missing RPS_TOKEN environment variable".to_owned()))?;
        let base_url = std::env::var("RPS_BASE_URL").map_err(|_| {
            RpsError::Config("missing RPS_BASE_URL environment variable".to_owned())
        })?;
        if token.trim().is_empty() {
            return Err(RpsError::Config("RPS_TOKEN is set but empty".to_owned()));
        }
        if base_url.trim().is_empty() {
            return Err(RpsError::Config("RPS_BASE_URL is set but empty".to_owned()));
        }
        Self::new(token, base_url, options)
    }

    pub fn parse_url(&self) -> &Url {
        &self.parse_url
    }

    /// Sends a resume document for parsing and returns the parsed data.
    pub async fn parse_document(&self, file_contents: &[u8]) -> Result<Resume, RpsError> {
        let payload = ParseDocumentRequest {
            base64_data: STANDARD.encode(file_contents),
        };
        let body = serde_json::to_vec(&payload).map_err(RpsError::Marshal)?;

        let mut request = Request::new(Method::POST, self.parse_url.clone());
        let headers = request.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("token", self.token.clone());
        *request.body_mut() = Some(body.into());

        let response = self
            .http
            .send_and_decode_json::<Resume>(request)
            .await
            .map_err(RpsError::Http)?;
        Ok(response.into_inner())
    }
}

fn parse_endpoint(base_url: &str) -> Result<Url, RpsError> {
    let trimmed = base_url.trim().trim_end_matches('/');
    Url::parse(&format!("{trimmed}/api/parse")).map_err(|err| RpsError::InvalidBaseUrl {
        url: base_url.to_owned(),
        reason: err.to_string(),
    })
}
