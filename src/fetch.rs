//! PDF download and text extraction

use anyhow::Result;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::HitasError;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; HitasIndexUpdater/1.0)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Blocking HTTP client for the city's PDF files
pub struct PdfClient {
    client: reqwest::blocking::Client,
}

impl PdfClient {
    pub fn new() -> Result<Self> {
        // hel.fi has served incomplete certificate chains; verification stays off
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(Self { client })
    }

    /// Fetch the raw bytes at `url`, treating non-2xx statuses as errors
    pub fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, HitasError> {
        let wrap = |source: reqwest::Error| HitasError::Download {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .send()
            .map_err(wrap)?
            .error_for_status()
            .map_err(wrap)?;

        let bytes = response.bytes().map_err(wrap)?;
        Ok(bytes.to_vec())
    }

    /// Download a PDF, logging and returning None on failure
    pub fn download(&self, url: &str, label: &str) -> Option<Vec<u8>> {
        println!("Downloading {} PDF from {}...", label, url);

        match self.fetch(url) {
            Ok(bytes) => {
                println!("{} PDF downloaded successfully ({} bytes)", label, bytes.len());
                Some(bytes)
            }
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    /// Download a PDF and return the text of each page
    pub fn download_pages(&self, url: &str, label: &str) -> Option<Vec<String>> {
        let bytes = self.download(url, label)?;
        pdf_pages(&bytes)
    }
}

/// Extract the text of every page of an in-memory PDF
pub fn extract_pages(bytes: &[u8]) -> std::result::Result<Vec<String>, HitasError> {
    pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| HitasError::PdfText(e.to_string()))
}

/// Like [`extract_pages`], but logs the failure and returns None
pub fn pdf_pages(bytes: &[u8]) -> Option<Vec<String>> {
    match extract_pages(bytes) {
        Ok(pages) => {
            debug!("extracted text from {} pages", pages.len());
            Some(pages)
        }
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_pages_rejects_garbage() {
        let result = extract_pages(b"this is not a pdf");
        assert!(matches!(result, Err(HitasError::PdfText(_))));
        assert!(pdf_pages(b"still not a pdf").is_none());
    }

    #[test]
    fn test_client_builds() {
        assert!(PdfClient::new().is_ok());
    }
}
