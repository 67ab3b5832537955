use std::time::Duration;

use reqwest::StatusCode;
use resume_parsing_client::{
    ClientOptions, DumpLogger, ResumeParsingClient, RetryDecision, RetryPredicate,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sampleResume.docx".to_owned());
    let contents = std::fs::read(&path)?;

    let retry_if_internal_server_error = RetryPredicate::new(|_ctx, response, _error| {
        RetryDecision::from(
            response.is_some_and(|r| r.status() == StatusCode::INTERNAL_SERVER_ERROR),
        )
    });
    let request_dump_logger = DumpLogger::new(|dump| {
        println!("dump: {}", String::from_utf8_lossy(dump));
    });

    let options = ClientOptions::default()
        .with_max_retries(4)
        .with_retry_wait_min(Duration::from_secs(1))
        .with_retry_wait_max(Duration::from_secs(5))
        .with_retry_predicate(retry_if_internal_server_error)
        .with_dump_logger(request_dump_logger, true);

    let token = std::env::var("RPS_TOKEN")?;
    let base_url = std::env::var("RPS_BASE_URL")?;
    let client = ResumeParsingClient::new(token, base_url, options)?;

    let resume = client.parse_document(&contents).await?;
    println!("resume: {resume:#?}");
    Ok(())
}
