//! Conversion between server XML documents and [`crate::layout::LayoutTree`].

mod codec;
pub mod dom;
pub mod schema;

pub use codec::{
    DocumentKind, PageBranches, PlaceholderIds, blank_page, blank_template, document_kind,
    page_template_id, parse_template, read_page_branches, serialize_page, serialize_template,
    splice_page, splice_template, template_tree,
};
pub(crate) use codec::{build_region, observe_items, place_widget, widget_from_item};
pub use dom::{Document, Element};
