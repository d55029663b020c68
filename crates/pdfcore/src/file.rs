use std::fmt;
use std::sync::Arc;

/// A document flowing through the graph.
///
/// Cloning copies the name but only bumps the reference count on the
/// content, so fan-out never duplicates document bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct PdfFile {
    pub name: String,
    content: Arc<[u8]>,
}

impl PdfFile {
    pub fn new(name: impl Into<String>, content: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// A file with empty content; handy when only names matter
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn content_handle(&self) -> Arc<[u8]> {
        Arc::clone(&self.content)
    }

    pub fn shares_content_with(&self, other: &PdfFile) -> bool {
        Arc::ptr_eq(&self.content, &other.content)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn append_suffix(&mut self, suffix: &str) {
        self.name.push_str(suffix);
    }
}

impl fmt::Debug for PdfFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfFile")
            .field("name", &self.name)
            .field("bytes", &self.content.len())
            .finish()
    }
}

/// Names of a list of files, in order
pub fn file_names(files: &[PdfFile]) -> Vec<String> {
    files.iter().map(|f| f.name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_content_but_not_names() {
        let original = PdfFile::new("a.pdf", b"%PDF-1.7".to_vec());
        let mut copy = original.clone();
        copy.append_suffix("_turned");

        assert_eq!(original.name, "a.pdf");
        assert_eq!(copy.name, "a.pdf_turned");
        assert!(copy.shares_content_with(&original));
    }
}
