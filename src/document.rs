//! PDF document abstraction layer.
//!
//! Provides a trait-based interface for the few document operations the
//! annotator needs, isolating the concrete PDF library (lopdf) from the
//! label logic.

use std::io::Read;
use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, StringFormat};

use crate::error::{Error, Result};
use crate::label::{NumberingStyle, PageLabelStyle, PageLabelTable};

/// Key of the page label number tree in the document catalog.
pub const PAGE_LABELS_KEY: &[u8] = b"PageLabels";

const MAX_TREE_DEPTH: usize = 32;

/// Capabilities the annotator needs from a document engine.
pub trait LabelDocument {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Read the current page label table, if the document has one.
    fn page_labels(&self) -> Result<Option<PageLabelTable>>;

    /// Replace the page label table, stored as an indirect object
    /// referenced from the document catalog.
    fn set_page_labels(&mut self, table: &PageLabelTable) -> Result<()>;

    /// Write the document to `path`.
    fn save_to_path(&mut self, path: &Path) -> Result<()>;

    /// The label a viewer shows for the 0-based page `index`.
    fn page_label(&self, index: u32) -> Result<Option<String>> {
        Ok(self.page_labels()?.and_then(|table| table.label_for(index)))
    }
}

/// Concrete [`LabelDocument`] backed by `lopdf::Document`.
pub struct PdfDocument {
    doc: LopdfDocument,
}

impl PdfDocument {
    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let doc = LopdfDocument::load(path)?;
        Ok(Self { doc })
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        Ok(Self { doc })
    }

    /// Load from a reader.
    pub fn load_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::load_bytes(&data)
    }

    /// Wrap an already loaded `lopdf::Document`.
    pub fn from_lopdf(doc: LopdfDocument) -> Self {
        Self { doc }
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// Serialize the document into memory.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.doc.save_to(&mut out)?;
        Ok(out)
    }

    fn catalog_id(&self) -> Result<ObjectId> {
        let root = self
            .doc
            .trailer
            .get(b"Root")
            .map_err(|_| Error::MissingObject("Root".to_string()))?;
        Ok(root.as_reference()?)
    }

    fn catalog(&self) -> Result<&Dictionary> {
        let id = self.catalog_id()?;
        Ok(self.doc.get_object(id)?.as_dict()?)
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> Result<&'a Object> {
        match obj {
            Object::Reference(id) => Ok(self.doc.get_object(*id)?),
            other => Ok(other),
        }
    }

    fn read_number_tree(
        &self,
        node: &Dictionary,
        table: &mut PageLabelTable,
        depth: usize,
    ) -> Result<()> {
        if depth > MAX_TREE_DEPTH {
            return Err(Error::Pdf("page label tree is nested too deeply".to_string()));
        }

        if let Ok(nums) = node.get(b"Nums") {
            let nums = self.resolve(nums)?.as_array()?;
            for pair in nums.chunks(2) {
                let [key, value] = pair else {
                    return Err(Error::Pdf("odd-length /Nums array".to_string()));
                };
                let start = self.resolve(key)?.as_i64()?;
                let start = u32::try_from(start)
                    .map_err(|_| Error::Pdf(format!("invalid page label start {}", start)))?;
                let style = self.resolve(value)?.as_dict()?;
                table.push(start, style_from_dictionary(style));
            }
        }

        if let Ok(kids) = node.get(b"Kids") {
            for kid in self.resolve(kids)?.as_array()? {
                let kid = self.resolve(kid)?.as_dict()?;
                self.read_number_tree(kid, table, depth + 1)?;
            }
        }

        Ok(())
    }
}

impl LabelDocument for PdfDocument {
    fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    fn page_labels(&self) -> Result<Option<PageLabelTable>> {
        let catalog = self.catalog()?;
        let tree = match catalog.get(PAGE_LABELS_KEY) {
            Ok(obj) => self.resolve(obj)?.as_dict()?,
            Err(_) => return Ok(None),
        };
        let mut table = PageLabelTable::new();
        self.read_number_tree(tree, &mut table, 0)?;
        Ok(Some(table))
    }

    fn set_page_labels(&mut self, table: &PageLabelTable) -> Result<()> {
        let tree = Object::Dictionary(table_to_dictionary(table));
        let catalog_id = self.catalog_id()?;

        let existing = self
            .doc
            .get_object(catalog_id)?
            .as_dict()?
            .get(PAGE_LABELS_KEY)
            .ok()
            .and_then(|obj| obj.as_reference().ok());

        let labels_id = match existing {
            Some(id) => {
                self.doc.objects.insert(id, tree);
                id
            }
            None => self.doc.add_object(tree),
        };
        log::debug!(
            "Page label table with {} entries stored as object {:?}",
            table.len(),
            labels_id
        );

        self.doc
            .get_object_mut(catalog_id)?
            .as_dict_mut()?
            .set(PAGE_LABELS_KEY, Object::Reference(labels_id));
        Ok(())
    }

    fn save_to_path(&mut self, path: &Path) -> Result<()> {
        self.doc.save(path)?;
        Ok(())
    }
}

/// Encode a page label table as a `/Nums` number tree dictionary.
pub fn table_to_dictionary(table: &PageLabelTable) -> Dictionary {
    let mut nums = Vec::with_capacity(table.len() * 2);
    for entry in table.entries() {
        let mut style = Dictionary::new();
        if let Some(s) = entry.style.style {
            style.set("S", Object::Name(s.pdf_name().as_bytes().to_vec()));
        }
        style.set("St", Object::Integer(i64::from(entry.style.first_page_number)));
        style.set("P", encode_text_string(&entry.style.prefix));

        nums.push(Object::Integer(i64::from(entry.start_page)));
        nums.push(Object::Dictionary(style));
    }

    let mut tree = Dictionary::new();
    tree.set("Nums", Object::Array(nums));
    tree
}

fn style_from_dictionary(dict: &Dictionary) -> PageLabelStyle {
    let style = dict
        .get(b"S")
        .ok()
        .and_then(|o| o.as_name().ok())
        .and_then(NumberingStyle::from_pdf_name);
    let first_page_number = dict
        .get(b"St")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(1);
    let prefix = match dict.get(b"P") {
        Ok(Object::String(bytes, _)) => decode_text_string(bytes),
        _ => String::new(),
    };
    PageLabelStyle {
        style,
        first_page_number,
        prefix,
    }
}

/// Encode a PDF text string: literal bytes for ASCII, UTF-16BE with BOM otherwise.
pub fn encode_text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text.as_bytes().to_vec());
    }
    let mut bytes = Vec::with_capacity(2 + text.len() * 2);
    bytes.extend_from_slice(&[0xFE, 0xFF]);
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Literal)
}

/// Decode a PDF text string.
pub fn decode_text_string(bytes: &[u8]) -> String {
    // Try UTF-16BE first (BOM marker)
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Fallback: Latin-1
    bytes.iter().map(|&b| b as char).collect()
}
