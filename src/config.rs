//! Annotation configuration file.
//!
//! ```json
//! {
//!   "ipfs_cid": "bafy...",
//!   "source_md5sum": "ABCD...1234",
//!   "filename": "doc.pdf",
//!   "labels": {
//!     "front": { "startpage": 0, "prefix": "", "style": "r", "firstpagenum": 1 },
//!     "body":  { "startpage": 10, "prefix": "", "style": "D", "firstpagenum": 1 }
//!   }
//! }
//! ```
//!
//! The `labels` object is read in the order its keys appear in the file.

use std::fmt;
use std::fs;
use std::path::{Component, Path};

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};
use crate::label::LabelRule;

/// A named label rule, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEntry {
    /// Key of the rule in the `labels` object
    pub key: String,
    pub rule: LabelRule,
}

/// Everything needed to fetch and annotate one document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnnotateConfig {
    /// Content identifier of the source PDF
    #[serde(rename = "ipfs_cid")]
    pub content_identifier: String,

    /// Expected digest of the source PDF (hex, any case)
    #[serde(rename = "source_md5sum")]
    pub expected_checksum: String,

    /// File name used for both the cached source and the output
    pub filename: String,

    /// Label rules in file order
    #[serde(default, deserialize_with = "ordered_labels")]
    pub labels: Vec<LabelEntry>,
}

impl AnnotateConfig {
    /// Load and validate a configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading configuration from {}", path.display());
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse and validate a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: AnnotateConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.content_identifier.trim().is_empty() {
            return Err(Error::Config("ipfs_cid is empty".to_string()));
        }
        validate_filename(&self.filename)?;
        for entry in &self.labels {
            if entry.rule.first_page_number == 0 {
                return Err(Error::Config(format!(
                    "label {:?}: firstpagenum must be at least 1",
                    entry.key
                )));
            }
        }
        Ok(())
    }

    /// The label rules in file order.
    pub fn rules(&self) -> impl Iterator<Item = &LabelRule> {
        self.labels.iter().map(|entry| &entry.rule)
    }
}

/// The filename must name a file directly inside the working directory.
fn validate_filename(filename: &str) -> Result<()> {
    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(Error::Config(format!(
            "filename {:?} must be a plain file name",
            filename
        ))),
    }
}

fn ordered_labels<'de, D>(deserializer: D) -> std::result::Result<Vec<LabelEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedLabels;

    impl<'de> Visitor<'de> for OrderedLabels {
        type Value = Vec<LabelEntry>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object mapping label names to label rules")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries: Vec<LabelEntry> = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, rule)) = map.next_entry::<String, LabelRule>()? {
                // A repeated key keeps its first position and its last value
                match entries.iter_mut().find(|e| e.key == key) {
                    Some(existing) => {
                        log::warn!("Label {:?} is defined more than once; using the last one", key);
                        existing.rule = rule;
                    }
                    None => entries.push(LabelEntry { key, rule }),
                }
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(OrderedLabels)
}
