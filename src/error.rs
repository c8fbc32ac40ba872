//! Error types for pdfannotate library.

use std::fmt;
use std::io;
use thiserror::Error;

use crate::fetch::DigestAlgorithm;

/// Result type alias for pdfannotate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while fetching or annotating a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The PDF engine failed to open or save the document.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// A required PDF object is missing.
    #[error("Missing required object: {0}")]
    MissingObject(String),

    /// The configuration contains an invalid value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The configuration file is not valid JSON or has the wrong shape.
    #[error("Configuration parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A gateway template expanded to something that is not a URL.
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Transport error while downloading content.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered the download with a non-success status.
    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// Every gateway failed its existence check.
    #[error("All {} gateways failed: {}", .0.len(), FailureList(.0))]
    GatewayExhausted(Vec<GatewayFailure>),

    /// The downloaded bytes do not hash to the expected digest.
    #[error("Downloaded {algorithm} {computed} does not match {expected}")]
    Checksum {
        algorithm: DigestAlgorithm,
        computed: String,
        expected: String,
    },

    /// Label rules whose start page does not increase (strict mode only).
    #[error("Label rules out of page order at positions {0:?}")]
    LabelOrder(Vec<usize>),
}

/// One failed gateway probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayFailure {
    /// URL that was probed.
    pub url: String,
    /// Why the probe did not count as a success.
    pub reason: String,
}

impl fmt::Display for GatewayFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.url, self.reason)
    }
}

struct FailureList<'a>(&'a [GatewayFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::Pdf(err.to_string()),
        }
    }
}
