//! Transport for layout documents.
//!
//! The editor only needs to fetch and persist XML by id; how that happens
//! (HTTP, files, a test double) is up to the [`LayoutStore`] implementation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

pub trait LayoutStore {
    fn fetch_template(&self, id: &str) -> Result<String, StoreError>;
    fn persist_template(&self, id: &str, xml: &str) -> Result<(), StoreError>;
    fn fetch_page(&self, id: &str) -> Result<String, StoreError>;
    fn persist_page(&self, id: &str, xml: &str) -> Result<(), StoreError>;
}

const TEMPLATES_DIR: &str = "templates";
const PAGES_DIR: &str = "pages";

/// Stores documents as `templates/<id>.xml` and `pages/<id>.xml` below a
/// root directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, dir: &str, id: &str) -> Result<PathBuf, StoreError> {
        let valid = !id.is_empty()
            && id != "."
            && id != ".."
            && !id.contains(['/', '\\'])
            && !id.contains('\0');
        if !valid {
            return Err(StoreError::InvalidId(id.to_owned()));
        }
        Ok(self.root.join(dir).join(format!("{id}.xml")))
    }

    fn read(&self, dir: &'static str, kind: &'static str, id: &str) -> Result<String, StoreError> {
        let path = self.path(dir, id)?;
        match fs::read_to_string(&path) {
            Ok(xml) => {
                tracing::debug!(path = %path.display(), bytes = xml.len(), "fetched {kind}");
                Ok(xml)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound {
                kind,
                id: id.to_owned(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, dir: &str, id: &str, xml: &str) -> Result<(), StoreError> {
        let path = self.path(dir, id)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, xml)?;
        tracing::debug!(path = %path.display(), bytes = xml.len(), "persisted document");
        Ok(())
    }
}

impl LayoutStore for DirStore {
    fn fetch_template(&self, id: &str) -> Result<String, StoreError> {
        self.read(TEMPLATES_DIR, "template", id)
    }

    fn persist_template(&self, id: &str, xml: &str) -> Result<(), StoreError> {
        self.write(TEMPLATES_DIR, id, xml)
    }

    fn fetch_page(&self, id: &str) -> Result<String, StoreError> {
        self.read(PAGES_DIR, "page", id)
    }

    fn persist_page(&self, id: &str, xml: &str) -> Result<(), StoreError> {
        self.write(PAGES_DIR, id, xml)
    }
}
