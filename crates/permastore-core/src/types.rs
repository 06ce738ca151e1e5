use serde::{Deserialize, Serialize};
use std::fmt;

/// A name/value pair attached to a stored transaction.
///
/// Tags are ordered and names may repeat; both are caller-supplied
/// plaintext here (wire encoding is the network client's concern).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Serialize tags for external consumption: a JSON array of
/// `{name, value}` objects, order preserved.
pub fn tags_to_json(tags: &[Tag]) -> crate::Result<String> {
    Ok(serde_json::to_string(tags)?)
}

/// Outcome of a (possibly partial) upload pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Transaction identifier, stable from the moment the transaction
    /// is signed; it never changes across resume.
    pub id: String,
    /// Chunks confirmed so far.
    pub chunks_sent: usize,
    /// Total chunks in the transaction.
    pub total_chunks: usize,
}

impl UploadReceipt {
    pub fn is_complete(&self) -> bool {
        self.chunks_sent >= self.total_chunks
    }
}
