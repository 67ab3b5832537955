use serde::Serialize;

/// Body of `POST /api/parse`.
#[derive(Debug, Serialize)]
pub struct ParseDocumentRequest {
    pub base64_data: String,
}
