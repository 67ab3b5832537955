use resume_parsing_client::{ClientOptions, ResumeParsingClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sampleResume.docx".to_owned());
    let contents = std::fs::read(&path)?;

    let client = ResumeParsingClient::from_env(ClientOptions::default())?;
    let resume = client.parse_document(&contents).await?;

    println!("resume: {resume:#?}");
    Ok(())
}
