// Outbound request bodies sent to the external API

use serde_json::Value;

use crate::api_client::ClientError;

/// Fields that only matter to the browser-facing routes and are never forwarded
pub const INTERNAL_FIELDS: [&str; 2] = ["_token", "_method"];

/// Whether a field is an internal routing field
pub fn is_internal_field(name: &str) -> bool {
    INTERNAL_FIELDS.contains(&name)
}

/// Body of an upstream request
#[derive(Debug, Clone, Default)]
pub enum OutboundBody {
    #[default]
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
    Multipart(OutboundForm),
}

/// A file attached to a multipart request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Multipart payload collected from a browser submission
///
/// File fields named `name[]` (and the bare `gallery` field) are re-indexed as
/// `name[0]`, `name[1]`, ... in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundForm {
    fields: Vec<(String, String)>,
    files: Vec<FilePart>,
    indexes: Vec<(String, usize)>,
}

impl OutboundForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field; internal routing fields are dropped
    pub fn push_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if is_internal_field(&name) {
            return;
        }
        self.fields.push((name, value.into()));
    }

    /// Add a file; empty file inputs (no name and no content) are skipped
    pub fn push_file(
        &mut self,
        name: &str,
        file_name: impl Into<String>,
        content_type: Option<String>,
        bytes: Vec<u8>,
    ) {
        let file_name = file_name.into();
        if file_name.is_empty() && bytes.is_empty() {
            return;
        }

        let field = match indexed_base(name) {
            Some(base) => {
                let index = self.next_index(base);
                format!("{}[{}]", base, index)
            }
            None => name.to_string(),
        };

        self.files.push(FilePart {
            field,
            file_name,
            content_type,
            bytes,
        });
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn files(&self) -> &[FilePart] {
        &self.files
    }

    fn next_index(&mut self, base: &str) -> usize {
        match self.indexes.iter_mut().find(|(name, _)| name == base) {
            Some((_, next)) => {
                let index = *next;
                *next += 1;
                index
            }
            None => {
                self.indexes.push((base.to_string(), 1));
                0
            }
        }
    }

    /// Convert into a reqwest multipart form
    pub fn into_reqwest(self) -> Result<reqwest::multipart::Form, ClientError> {
        let mut form = reqwest::multipart::Form::new();

        for (name, value) in self.fields {
            form = form.text(name, value);
        }

        for file in self.files {
            let mut part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name);
            if let Some(content_type) = file.content_type {
                part = part
                    .mime_str(&content_type)
                    .map_err(|e| ClientError::InvalidBody(e.to_string()))?;
            }
            form = form.part(file.field, part);
        }

        Ok(form)
    }
}

fn indexed_base(name: &str) -> Option<&str> {
    if let Some(base) = name.strip_suffix("[]") {
        return Some(base);
    }
    if name == "gallery" {
        return Some(name);
    }
    None
}
