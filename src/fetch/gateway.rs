//! Gateway resolution: turn a content identifier into a reachable URL.

use std::fmt;

use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};

use crate::error::{Error, GatewayFailure, Result};

use super::options::{FetchOptions, CID_PLACEHOLDER};

/// A gateway URL pattern containing the `{cid}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayTemplate(String);

impl GatewayTemplate {
    /// Validate a template string.
    pub fn parse(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains(CID_PLACEHOLDER) {
            return Err(Error::Config(format!(
                "gateway template {:?} has no {} placeholder",
                template, CID_PLACEHOLDER
            )));
        }
        Ok(Self(template))
    }

    /// Substitute the identifier and append the optional path.
    pub fn render(&self, cid: &str, path: Option<&str>) -> String {
        let mut url = self.0.replace(CID_PLACEHOLDER, cid);
        if let Some(path) = path.filter(|p| !p.is_empty()) {
            if url.ends_with('/') {
                url.push_str(path.trim_start_matches('/'));
            } else {
                url.push_str(path);
            }
        }
        url
    }

    /// Render and parse into a [`Url`].
    pub fn url(&self, cid: &str, path: Option<&str>) -> Result<Url> {
        let raw = self.render(cid, path);
        Url::parse(&raw).map_err(|e| Error::InvalidUrl {
            url: raw,
            reason: e.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GatewayTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Probes gateways in order until one reports the content as present.
pub struct GatewayResolver {
    client: Client,
    templates: Vec<GatewayTemplate>,
}

impl GatewayResolver {
    /// Create a resolver sharing an existing connection pool.
    pub fn new(client: Client, templates: Vec<GatewayTemplate>) -> Self {
        Self { client, templates }
    }

    /// Create a resolver from the gateway list in `options`.
    pub fn from_options(client: Client, options: &FetchOptions) -> Result<Self> {
        let templates = options
            .gateways
            .iter()
            .map(|g| GatewayTemplate::parse(g.as_str()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(client, templates))
    }

    /// The templates, in probing order.
    pub fn templates(&self) -> &[GatewayTemplate] {
        &self.templates
    }

    /// Return the URL of the first gateway whose HEAD request answers 200.
    ///
    /// Redirects are followed and the final URL is returned. Failures of
    /// individual gateways are collected; only when every gateway fails is
    /// [`Error::GatewayExhausted`] returned.
    pub fn resolve(&self, cid: &str, path: Option<&str>) -> Result<Url> {
        let mut failures = Vec::with_capacity(self.templates.len());

        for template in &self.templates {
            let url = match template.url(cid, path) {
                Ok(url) => url,
                Err(e) => {
                    log::warn!("Skipping gateway {}: {}", template, e);
                    failures.push(GatewayFailure {
                        url: template.render(cid, path),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            log::debug!("Probing {}", url);
            match self.client.head(url.clone()).send() {
                Ok(response) if response.status() == StatusCode::OK => {
                    let resolved = response.url().clone();
                    log::info!("Resolved {} via {}", cid, resolved);
                    return Ok(resolved);
                }
                Ok(response) => {
                    log::warn!("Gateway {} answered {}", url, response.status());
                    failures.push(GatewayFailure {
                        url: url.to_string(),
                        reason: format!("status {}", response.status().as_u16()),
                    });
                }
                Err(e) => {
                    log::warn!("Gateway {} failed: {}", url, e);
                    failures.push(GatewayFailure {
                        url: url.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(Error::GatewayExhausted(failures))
    }
}
