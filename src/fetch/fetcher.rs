//! Streaming downloads with checksum verification.

use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

use reqwest::blocking::{Client, Response};
use reqwest::Url;

use crate::error::{Error, Result};

use super::digest::{copy_with_digest, ExpectedDigest};
use super::gateway::GatewayResolver;
use super::options::{FetchOptions, DEFAULT_CHUNK_SIZE};

/// Upper bound on the buffer reserved up front for an in-memory download.
const MAX_PREALLOC: usize = DEFAULT_CHUNK_SIZE * 16;

/// Where a download is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Collect the body in memory.
    Memory,
    /// Stream the body into a file (created or truncated).
    File(PathBuf),
}

/// A single download.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    pub expected_digest: Option<String>,
    pub destination: Destination,
}

impl FetchRequest {
    /// Download `url` into memory.
    pub fn to_memory(url: Url) -> Self {
        Self {
            url,
            expected_digest: None,
            destination: Destination::Memory,
        }
    }

    /// Download `url` into the file at `path`.
    pub fn to_file(url: Url, path: impl Into<PathBuf>) -> Self {
        Self {
            url,
            expected_digest: None,
            destination: Destination::File(path.into()),
        }
    }

    /// Require the body to hash to `digest` (hex, any case).
    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.expected_digest = Some(digest.into());
        self
    }
}

/// Outcome of a successful download.
#[derive(Debug)]
pub enum Fetched {
    /// Body bytes, positioned at the start.
    Memory(Cursor<Vec<u8>>),
    /// Body written to this path.
    File(PathBuf),
}

impl Fetched {
    /// Take the in-memory buffer, if this was a memory download.
    pub fn into_memory(self) -> Option<Cursor<Vec<u8>>> {
        match self {
            Fetched::Memory(cursor) => Some(cursor),
            Fetched::File(_) => None,
        }
    }
}

/// HTTP downloader holding one connection pool for its whole lifetime.
pub struct ChecksummingFetcher {
    client: Client,
    options: FetchOptions,
}

impl ChecksummingFetcher {
    /// Build a fetcher (and its connection pool) from options.
    pub fn new(options: FetchOptions) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(options.user_agent.clone())
            .timeout(options.timeout);
        if let Some(timeout) = options.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if !options.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;
        Ok(Self { client, options })
    }

    /// Fetcher with default options.
    pub fn with_defaults() -> Result<Self> {
        Self::new(FetchOptions::default())
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// The shared HTTP client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// A gateway resolver that reuses this fetcher's connection pool.
    pub fn resolver(&self) -> Result<GatewayResolver> {
        GatewayResolver::from_options(self.client.clone(), &self.options)
    }

    /// Perform a download described by `request`.
    pub fn fetch(&self, request: &FetchRequest) -> Result<Fetched> {
        let digest = request.expected_digest.as_deref();
        match &request.destination {
            Destination::Memory => {
                let cursor = self.fetch_to_memory(request.url.clone(), digest)?;
                Ok(Fetched::Memory(cursor))
            }
            Destination::File(path) => {
                self.fetch_to_file(request.url.clone(), digest, path)?;
                Ok(Fetched::File(path.clone()))
            }
        }
    }

    /// Download into memory, returning a cursor at position 0.
    pub fn fetch_to_memory(&self, url: Url, digest: Option<&str>) -> Result<Cursor<Vec<u8>>> {
        let mut response = self.get(&url)?;
        // Content-Length is only a hint; the server controls it.
        let capacity = response
            .content_length()
            .and_then(|len| usize::try_from(len).ok())
            .unwrap_or(0)
            .min(MAX_PREALLOC);
        let mut buf = Vec::with_capacity(capacity);
        let copied = self.stream(&mut response, &mut buf, digest)?;
        log::info!("Downloaded {} bytes from {}", copied, url);
        Ok(Cursor::new(buf))
    }

    /// Download into the file at `path` (created or truncated).
    ///
    /// A checksum failure leaves the written file in place.
    pub fn fetch_to_file(&self, url: Url, digest: Option<&str>, path: &Path) -> Result<()> {
        let mut response = self.get(&url)?;
        let mut out = BufWriter::new(File::create(path)?);
        let copied = self.stream(&mut response, &mut out, digest)?;
        log::info!("Downloaded {} bytes from {} to {}", copied, url, path.display());
        Ok(())
    }

    fn get(&self, url: &Url) -> Result<Response> {
        log::debug!("GET {}", url);
        let response = self.client.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    fn stream<W: Write>(
        &self,
        response: &mut Response,
        out: &mut W,
        digest: Option<&str>,
    ) -> Result<u64> {
        let expected = digest.map(|hex| ExpectedDigest {
            algorithm: self.options.digest_algorithm,
            hex,
        });
        copy_with_digest(response, out, self.options.chunk_size, expected)
    }
}
