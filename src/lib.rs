//! # pdfannotate
//!
//! Fetch a PDF from IPFS HTTP gateways, verify it against a known checksum,
//! and rewrite its page labels from a JSON configuration file.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfannotate::annotate_file;
//!
//! fn main() -> pdfannotate::Result<()> {
//!     // Downloads into books/original/ on first run, then writes books/<filename>
//!     let report = annotate_file("books/config.json")?;
//!     println!("{} labels on {} pages", report.label_count, report.page_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Pieces
//!
//! - [`fetch::GatewayResolver`]: tries gateways in order until one has the content
//! - [`fetch::ChecksummingFetcher`]: streaming download with MD5 (or SHA-256) verification
//! - [`label::build`]: label rules to page label table, order preserved
//! - [`Annotator`]: cache, fetch, label, save

pub mod annotate;
pub mod config;
pub mod document;
pub mod error;
pub mod fetch;
pub mod label;

// Re-export commonly used types
pub use annotate::{working_directory, AnnotateReport, Annotator, Source, Stage, CACHE_DIR};
pub use config::{AnnotateConfig, LabelEntry};
pub use document::{LabelDocument, PdfDocument};
pub use error::{Error, GatewayFailure, Result};
pub use fetch::{
    ChecksummingFetcher, Destination, DigestAlgorithm, FetchOptions, FetchRequest, Fetched,
    GatewayResolver,
};
pub use label::{LabelRule, NumberingStyle, PageLabelTable};

use std::path::Path;

/// Annotate the document described by a configuration file.
///
/// The configuration file's directory is the working directory: the source
/// is cached in `original/` below it and the result is written next to it.
///
/// # Example
///
/// ```no_run
/// use pdfannotate::annotate_file;
///
/// let report = annotate_file("config.json").unwrap();
/// println!("Wrote {}", report.output_path.display());
/// ```
pub fn annotate_file<P: AsRef<Path>>(config_path: P) -> Result<AnnotateReport> {
    annotate_file_with_options(config_path, FetchOptions::default())
}

/// Annotate with custom fetch options.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use pdfannotate::{annotate_file_with_options, FetchOptions};
///
/// let options = FetchOptions::new().with_timeout(Duration::from_secs(120));
/// let report = annotate_file_with_options("config.json", options).unwrap();
/// ```
pub fn annotate_file_with_options<P: AsRef<Path>>(
    config_path: P,
    options: FetchOptions,
) -> Result<AnnotateReport> {
    let config_path = config_path.as_ref();
    let config = AnnotateConfig::from_path(config_path)?;
    let dir = working_directory(config_path);
    Annotator::new(options)?.run(&config, &dir)
}

/// Preview the label each listed page would receive, without touching
/// the network or any document.
///
/// # Example
///
/// ```
/// use pdfannotate::{preview_labels, AnnotateConfig};
///
/// let config = AnnotateConfig::from_json_str(r#"{
///     "ipfs_cid": "bafy", "source_md5sum": "00", "filename": "a.pdf",
///     "labels": {"front": {"startpage": 0, "style": "r"},
///                "body": {"startpage": 4, "style": "D"}}
/// }"#).unwrap();
///
/// let labels = preview_labels(&config, &[0, 3, 4]);
/// assert_eq!(labels[1], (3, Some("iv".to_string())));
/// assert_eq!(labels[2], (4, Some("1".to_string())));
/// ```
pub fn preview_labels(config: &AnnotateConfig, pages: &[u32]) -> Vec<(u32, Option<String>)> {
    let table = label::build(config.rules());
    pages
        .iter()
        .map(|&page| (page, table.label_for(page)))
        .collect()
}
