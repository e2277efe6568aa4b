//! Front-end document provider.
//!
//! The host serves two pre-built byte blobs verbatim: the plain front-end
//! document and an inspector-enabled variant. They are typically compiled
//! artifacts loaded from disk at startup; built-in placeholders keep the
//! binary runnable without any files.

use std::path::Path;

/// Placeholder served when no plain document file is configured.
const BUILT_IN_PLAIN: &str = "<!DOCTYPE html>\n<html><head><title>volatile-host</title></head>\
<body><p>No front-end document configured.</p></body></html>\n";

/// Placeholder served when no inspector document file is configured.
const BUILT_IN_INSPECTOR: &str = "<!DOCTYPE html>\n<html><head><title>volatile-host \
(inspector)</title></head><body><p>No inspector document configured.</p></body></html>\n";

/// The two variants of the served front-end document.
#[derive(Debug, Clone)]
pub struct FrontendDocuments {
    plain: Vec<u8>,
    inspector: Vec<u8>,
}

impl FrontendDocuments {
    /// Creates a provider from in-memory blobs.
    pub fn new(plain: impl Into<Vec<u8>>, inspector: impl Into<Vec<u8>>) -> Self {
        FrontendDocuments {
            plain: plain.into(),
            inspector: inspector.into(),
        }
    }

    /// Creates a provider serving the built-in placeholders.
    pub fn built_in() -> Self {
        FrontendDocuments::new(BUILT_IN_PLAIN, BUILT_IN_INSPECTOR)
    }

    /// Loads both variants from files.
    pub fn from_files(plain: &Path, inspector: &Path) -> std::io::Result<Self> {
        Ok(FrontendDocuments {
            plain: std::fs::read(plain)?,
            inspector: std::fs::read(inspector)?,
        })
    }

    /// The plain front-end document.
    pub fn plain(&self) -> &[u8] {
        &self.plain
    }

    /// The inspector-enabled variant.
    pub fn inspector(&self) -> &[u8] {
        &self.inspector
    }
}

impl Default for FrontendDocuments {
    fn default() -> Self {
        FrontendDocuments::built_in()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_variants_differ() {
        let docs = FrontendDocuments::built_in();
        assert_ne!(docs.plain(), docs.inspector());
    }

    #[test]
    fn loads_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let plain_path = dir.path().join("index.html");
        let inspector_path = dir.path().join("inspector.html");
        std::fs::write(&plain_path, "<html>plain</html>").unwrap();
        std::fs::write(&inspector_path, "<html>inspector</html>").unwrap();

        let docs = FrontendDocuments::from_files(&plain_path, &inspector_path).unwrap();
        assert_eq!(docs.plain(), b"<html>plain</html>");
        assert_eq!(docs.inspector(), b"<html>inspector</html>");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.html");
        assert!(FrontendDocuments::from_files(&missing, &missing).is_err());
    }
}
