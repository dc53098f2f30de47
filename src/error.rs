use thiserror::Error;

/// Domain errors raised while fetching and parsing the HITAS sources.
#[derive(Error, Debug)]
pub enum HitasError {
    /// A date string was not a valid `YYYY-MM-DD` calendar date.
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// The HTTP request failed or returned a non-success status.
    #[error("Failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The PDF could not be opened or its text could not be extracted.
    #[error("Failed to extract text from PDF: {0}")]
    PdfText(String),

    /// A required index table came out of the parser empty.
    #[error("No data parsed for {0}")]
    MissingIndex(&'static str),
}
