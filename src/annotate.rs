//! Fetch, label and save: the annotation pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::AnnotateConfig;
use crate::document::{LabelDocument, PdfDocument};
use crate::error::{Error, Result};
use crate::fetch::{ChecksummingFetcher, FetchOptions};
use crate::label::{build, PageLabelTable};

/// Subdirectory of the working directory holding downloaded sources.
pub const CACHE_DIR: &str = "original";

/// The source document bytes and where they came from.
#[derive(Debug)]
pub struct Source {
    pub bytes: Vec<u8>,
    /// Cached copy under `original/`
    pub path: PathBuf,
    /// True when the cached copy was reused without network access
    pub cache_hit: bool,
}

/// Steps of [`Annotator::run_with_progress`], reported before each starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reusing the cache or downloading the source
    Materialize,
    /// Opening the document and attaching the label table
    ApplyLabels,
    /// Writing the annotated document
    Save,
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotateReport {
    pub cache_hit: bool,
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub page_count: usize,
    pub label_count: usize,
}

/// Drives one annotation: materialize the source, apply labels, save.
pub struct Annotator {
    fetcher: ChecksummingFetcher,
    strict_order: bool,
}

impl Annotator {
    /// Create an annotator with its own connection pool.
    pub fn new(options: FetchOptions) -> Result<Self> {
        Ok(Self {
            fetcher: ChecksummingFetcher::new(options)?,
            strict_order: false,
        })
    }

    /// Reject label rules whose start pages do not increase.
    pub fn with_strict_order(mut self, strict: bool) -> Self {
        self.strict_order = strict;
        self
    }

    pub fn fetcher(&self) -> &ChecksummingFetcher {
        &self.fetcher
    }

    /// Path of the cached source for `config` under `dir`.
    pub fn cache_path(config: &AnnotateConfig, dir: &Path) -> PathBuf {
        dir.join(CACHE_DIR).join(&config.filename)
    }

    /// Path of the annotated output for `config` under `dir`.
    pub fn output_path(config: &AnnotateConfig, dir: &Path) -> PathBuf {
        dir.join(&config.filename)
    }

    /// Return the source bytes, downloading them only on a cache miss.
    ///
    /// A cached file is trusted as-is. A download is verified against the
    /// configured checksum before anything is written to the cache.
    pub fn materialize_source(&self, config: &AnnotateConfig, dir: &Path) -> Result<Source> {
        let cache_dir = dir.join(CACHE_DIR);
        fs::create_dir_all(&cache_dir)?;
        let path = Self::cache_path(config, dir);

        if path.exists() {
            log::info!("Using cached source {}", path.display());
            let bytes = fs::read(&path)?;
            return Ok(Source {
                bytes,
                path,
                cache_hit: true,
            });
        }

        log::info!(
            "Cache miss for {}, fetching {}",
            path.display(),
            config.content_identifier
        );
        let url = self
            .fetcher
            .resolver()?
            .resolve(&config.content_identifier, None)?;
        let bytes = self
            .fetcher
            .fetch_to_memory(url, Some(&config.expected_checksum))?
            .into_inner();
        write_atomically(&path, &bytes)?;

        Ok(Source {
            bytes,
            path,
            cache_hit: false,
        })
    }

    /// Build the label table from `config` and attach it to `doc`.
    pub fn apply_labels<D: LabelDocument>(
        &self,
        doc: &mut D,
        config: &AnnotateConfig,
    ) -> Result<PageLabelTable> {
        let table = build(config.rules());

        let out_of_order = table.out_of_order();
        if !out_of_order.is_empty() {
            if self.strict_order {
                return Err(Error::LabelOrder(out_of_order));
            }
            for &i in &out_of_order {
                log::warn!(
                    "Label {:?} starts at page {} which does not follow the previous rule",
                    config.labels[i].key,
                    config.labels[i].rule.start_page
                );
            }
        }

        let page_count = doc.page_count();
        for entry in &config.labels {
            if entry.rule.start_page as usize >= page_count {
                log::warn!(
                    "Label {:?} starts at page {} but the document has {} pages",
                    entry.key,
                    entry.rule.start_page,
                    page_count
                );
            }
        }

        doc.set_page_labels(&table)?;
        Ok(table)
    }

    /// Run the whole pipeline with `dir` as working directory.
    pub fn run(&self, config: &AnnotateConfig, dir: &Path) -> Result<AnnotateReport> {
        self.run_with_progress(config, dir, |_| {})
    }

    /// Like [`run`](Self::run), calling `on_stage` as each step begins.
    pub fn run_with_progress<F>(
        &self,
        config: &AnnotateConfig,
        dir: &Path,
        mut on_stage: F,
    ) -> Result<AnnotateReport>
    where
        F: FnMut(Stage),
    {
        on_stage(Stage::Materialize);
        let source = self.materialize_source(config, dir)?;

        on_stage(Stage::ApplyLabels);
        let mut doc = PdfDocument::load_bytes(&source.bytes)?;
        let table = self.apply_labels(&mut doc, config)?;

        on_stage(Stage::Save);
        let output_path = Self::output_path(config, dir);
        doc.save_to_path(&output_path)?;
        log::info!("Wrote {}", output_path.display());

        Ok(AnnotateReport {
            cache_hit: source.cache_hit,
            source_path: source.path,
            output_path,
            page_count: doc.page_count(),
            label_count: table.len(),
        })
    }
}

/// Write `bytes` to a sibling temp file, then rename it over `path`.
///
/// A reader never sees a partially written `path`.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    let tmp = path.with_file_name(name);

    if let Err(e) = fs::write(&tmp, bytes).and_then(|_| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// Working directory for a configuration file: its parent, or `.`.
pub fn working_directory(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
