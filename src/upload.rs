use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;

use crate::error::Error;

/// Credentials for the ERP backend. Passed explicitly to every call instead of
/// being read from process-wide state.
#[derive(Clone, Debug)]
pub struct Session {
    pub base_url: String,
    pub token: String,
}

impl Session {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Session {
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    url: Option<String>,
    message: Option<String>,
}

/// Upload a rendered order and return the URL the backend stored it under.
pub fn upload_pdf(session: &Session, file_name: &str, bytes: Vec<u8>) -> Result<String, Error> {
    let part = Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str("application/pdf")?;
    let form = Form::new().part("file", part);

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()?;
    let response = client
        .post(session.endpoint("orden-compra/upload-pdf"))
        .bearer_auth(&session.token)
        .multipart(form)
        .send()?;

    let status = response.status();
    if !status.is_success() {
        let message = response.json::<UploadResponse>().ok().and_then(|b| b.message);
        return Err(Error::Upload(message.unwrap_or_else(|| format!("HTTP {status}"))));
    }
    let body: UploadResponse = response
        .json()
        .map_err(|e| Error::Upload(format!("unexpected response: {e}")))?;
    let url = body
        .url
        .ok_or_else(|| Error::Upload("response has no url".into()))?;
    log::info!("Uploaded {file_name} → {url}");
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_slashes() {
        let s = Session::new("https://erp.example.com/api/", "t");
        assert_eq!(
            s.endpoint("/orden-compra/upload-pdf"),
            "https://erp.example.com/api/orden-compra/upload-pdf"
        );
    }
}
