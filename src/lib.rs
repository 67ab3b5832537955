//! `resume-parsing-client` is an async HTTP client with opt-in retries and a
//! single structured error, plus a client for the Resume Parsing Service
//! built on top of it.
//!
//! - [`HttpClient::send`] returns the response with its body unread.
//! - [`HttpClient::send_and_decode_json`] decodes a JSON body into any
//!   `DeserializeOwned` type.
//! - [`ResumeParsingClient::parse_document`] posts a document to `/api/parse`.
//!
//! Retries never happen unless a [`RetryPredicate`] asks for them: the
//! default predicate is [`RetryPredicate::never`].

mod client;
mod dump;
mod error;
mod options;
mod resolve;
mod retry;
mod rps;
mod transport;
mod types;
mod wire;

pub use client::HttpClient;
pub use dump::{DumpError, DumpLogger, RequestDumper, WireDumper};
pub use error::{AttemptError, BoxError, HttpError, NoResponse};
pub use options::ClientOptions;
pub use resolve::{BodyReader, JsonResponse, ReqwestBodyReader, ResponseResolver};
pub use retry::{
    AttemptOutcome, Execution, RetryContext, RetryDecision, RetryExecutor, RetryPolicy,
    RetryPredicate, TransportErrorRef,
};
pub use rps::{ResumeParsingClient, RpsError};
pub use transport::Transport;
pub use types::{Education, Location, PhoneNumber, Position, Resume, SocialUrl, Skill};

pub type Result<T> = std::result::Result<T, HttpError>;
