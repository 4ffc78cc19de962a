//! Editing sessions: a layout tree together with the document(s) it was
//! loaded from, so saving can splice the tree back into them.

use crate::error::{CodecError, SessionError};
use crate::layout::{EditMode, LayoutTree};
use crate::overlay::{PageOverlay, merge_page};
use crate::store::LayoutStore;
use crate::xml::{self, Document, PlaceholderIds};

/// Editing session of a template.
#[derive(Debug, Clone)]
pub struct TemplateSession {
    document: Document,
    tree: LayoutTree,
}

impl TemplateSession {
    pub fn load(xml: &str) -> Result<Self, CodecError> {
        let (document, tree) = xml::parse_template(xml)?;
        tracing::debug!(regions = tree.len(), "loaded template");
        Ok(Self { document, tree })
    }

    pub fn open(store: &impl LayoutStore, id: &str) -> Result<Self, SessionError> {
        let xml = store.fetch_template(id)?;
        Ok(Self::load(&xml)?)
    }

    /// Replace the session with a freshly loaded document. On failure the
    /// current tree and document are kept.
    pub fn reload(&mut self, xml: &str) -> Result<(), CodecError> {
        *self = Self::load(xml)?;
        Ok(())
    }

    pub fn tree(&self) -> &LayoutTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut LayoutTree {
        &mut self.tree
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The document to send on save. Placeholder widget ids are left out so
    /// the server assigns real ones.
    pub fn to_xml(&self) -> Result<String, CodecError> {
        xml::serialize_template(&self.tree, &self.document, PlaceholderIds::Strip)
    }

    pub fn save(&self, store: &impl LayoutStore, id: &str) -> Result<(), SessionError> {
        let xml = self.to_xml()?;
        store.persist_template(id, &xml)?;
        tracing::debug!(template_id = id, "saved template");
        Ok(())
    }
}

/// Editing session of a page layered on its template.
#[derive(Debug, Clone)]
pub struct PageSession {
    page: Document,
    template: Document,
    tree: LayoutTree,
}

impl PageSession {
    /// Build the page's tree: the template's layout with the page's stored
    /// overrides merged on top.
    pub fn load(page_xml: &str, template_xml: &str) -> Result<Self, CodecError> {
        let page = Document::parse(page_xml)?;
        let branches = xml::read_page_branches(&page)?;
        let template = Document::parse(template_xml)?;
        let mut tree = xml::template_tree(&template, EditMode::Page)?;
        merge_page(&mut tree, &branches)?;
        tracing::debug!(
            regions = tree.len(),
            overrides = branches.regions.len(),
            "loaded page"
        );
        Ok(Self {
            page,
            template,
            tree,
        })
    }

    /// Fetch a page and then the template it names.
    pub fn open(store: &impl LayoutStore, page_id: &str) -> Result<Self, SessionError> {
        let page_xml = store.fetch_page(page_id)?;
        let page = Document::parse(&page_xml)?;
        let template_id = xml::page_template_id(&page)
            .ok_or(CodecError::MissingElement {
                parent: "Page",
                element: "templateId",
            })?
            .to_owned();
        let template_xml = store.fetch_template(&template_id)?;
        Ok(Self::load(&page_xml, &template_xml)?)
    }

    pub fn tree(&self) -> &LayoutTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut LayoutTree {
        &mut self.tree
    }

    pub fn overlay(&self) -> Option<&PageOverlay> {
        self.tree.overlay()
    }

    pub fn page_document(&self) -> &Document {
        &self.page
    }

    pub fn template_document(&self) -> &Document {
        &self.template
    }

    pub fn template_id(&self) -> Option<&str> {
        xml::page_template_id(&self.page)
    }

    /// The page document to send on save, holding only the overridden
    /// branches.
    pub fn to_xml(&self) -> Result<String, CodecError> {
        xml::serialize_page(&self.tree, &self.page, PlaceholderIds::Strip)
    }

    pub fn save(&self, store: &impl LayoutStore, page_id: &str) -> Result<(), SessionError> {
        let xml = self.to_xml()?;
        store.persist_page(page_id, &xml)?;
        tracing::debug!(page_id, "saved page");
        Ok(())
    }
}
