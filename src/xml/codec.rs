use std::collections::BTreeSet;

use super::dom::{Document, Element};
use super::schema::{
    self, REGION, REGION_WIDGET_ASSOCIATIONS, RegionNode, RegionWidgetEntry, WidgetItem,
};
use crate::error::CodecError;
use crate::layout::{EditMode, LayoutTree, Region, RegionId, Widget, WidgetId};

pub const TEMPLATE_ROOT: &str = "Template";
pub const PAGE_ROOT: &str = "Page";
pub const REGION_TREE: &str = "regionTree";
pub const REGION_BRANCHES: &str = "regionBranches";
pub const REGIONS: &str = "regions";
pub const TEMPLATE_ID: &str = "templateId";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Template,
    Page,
}

pub fn document_kind(doc: &Document) -> Result<DocumentKind, CodecError> {
    match doc.root.name.as_str() {
        TEMPLATE_ROOT => Ok(DocumentKind::Template),
        PAGE_ROOT => Ok(DocumentKind::Page),
        other => Err(CodecError::UnexpectedRoot(other.to_owned())),
    }
}

fn expect_kind(doc: &Document, kind: DocumentKind) -> Result<(), CodecError> {
    if document_kind(doc)? == kind {
        Ok(())
    } else {
        Err(CodecError::UnexpectedRoot(doc.root.name.clone()))
    }
}

/// How widget ids that were generated locally are written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderIds {
    /// Write every id as-is.
    Keep,
    /// Drop the `<id>` of placeholder widgets so the server assigns one.
    Strip,
}

/// Parse a template document into the document itself (kept for splicing on
/// save) and its layout tree.
pub fn parse_template(xml: &str) -> Result<(Document, LayoutTree), CodecError> {
    let doc = Document::parse(xml)?;
    let tree = template_tree(&doc, EditMode::Template)?;
    Ok((doc, tree))
}

/// Build the layout tree of a parsed template document.
///
/// The region tree is built first so every widget association can be
/// resolved against it by id.
pub fn template_tree(doc: &Document, mode: EditMode) -> Result<LayoutTree, CodecError> {
    expect_kind(doc, DocumentKind::Template)?;
    let region_tree = doc.root.child(REGION_TREE).ok_or(CodecError::MissingElement {
        parent: TEMPLATE_ROOT,
        element: REGION_TREE,
    })?;

    let root = region_tree
        .child(REGION)
        .map(RegionNode::from_element)
        .transpose()?;
    let associations = region_tree
        .child(REGION_WIDGET_ASSOCIATIONS)
        .map(schema::read_associations)
        .transpose()?
        .unwrap_or_default();

    let mut tree = LayoutTree::new(mode);
    if let Some(root) = &root {
        build_region(&mut tree, root, None, false)?;
    }

    observe_items(&mut tree, &associations);
    let mut seen = BTreeSet::new();
    for entry in &associations {
        for item in &entry.items {
            let widget = widget_from_item(&mut tree, item);
            if !seen.insert(widget.id().clone()) {
                return Err(CodecError::DuplicateWidget(widget.id().clone()));
            }
            place_widget(&mut tree, &entry.region_id, widget)?;
        }
    }

    tracing::debug!(
        regions = tree.len(),
        widgets = seen.len(),
        "parsed template layout"
    );
    Ok(tree)
}

/// Attach `node` and its descendants below `parent` (or as the root).
pub(crate) fn build_region(
    tree: &mut LayoutTree,
    node: &RegionNode,
    parent: Option<&RegionId>,
    page_level: bool,
) -> Result<(), CodecError> {
    let mut region = node.to_region();
    region.page_level_addition = page_level;
    let id = region.id().clone();
    if !tree.attach_loaded(region, parent) {
        return Err(CodecError::DuplicateRegion(id));
    }
    for child in &node.children {
        build_region(tree, child, Some(&id), page_level)?;
    }
    Ok(())
}

pub(crate) fn observe_items(tree: &mut LayoutTree, entries: &[RegionWidgetEntry]) {
    for item in entries.iter().flat_map(|entry| entry.items.iter()) {
        if let Some(id) = &item.id {
            tree.observe_widget_id(id);
        }
    }
}

/// Turn a `widgetItem` into a widget, minting a placeholder id when the item
/// has none. Call [`observe_items`] for the whole document first.
pub(crate) fn widget_from_item(tree: &mut LayoutTree, item: &WidgetItem) -> Widget {
    let id = match &item.id {
        Some(id) => WidgetId::new(id.clone()),
        None => tree.next_widget_id(),
    };
    Widget::new(id, item.definition_id.clone()).with_extra(item.extra.clone())
}

pub(crate) fn place_widget(
    tree: &mut LayoutTree,
    region_id: &str,
    mut widget: Widget,
) -> Result<(), CodecError> {
    let region = tree
        .region_mut(region_id)
        .ok_or_else(|| CodecError::UnknownRegion(region_id.into()))?;
    if region.is_container() {
        return Err(CodecError::WidgetsOnContainer(region.id().clone()));
    }
    widget.owner = Some(region.id().clone());
    region.widgets.push(widget);
    Ok(())
}

/// Snapshot of the subtree rooted at `id`.
fn region_node(tree: &LayoutTree, id: &RegionId) -> Option<RegionNode> {
    let region = tree.find_region(id.as_str())?;
    let mut node = RegionNode::from_region(region);
    node.children = region
        .children()
        .iter()
        .filter_map(|child| region_node(tree, child))
        .collect();
    Some(node)
}

fn associations<'a>(
    regions: impl IntoIterator<Item = &'a Region>,
    ids: PlaceholderIds,
) -> Vec<RegionWidgetEntry> {
    regions
        .into_iter()
        .filter(|region| !region.widgets().is_empty())
        .map(|region| RegionWidgetEntry {
            region_id: region.id().to_string(),
            items: region
                .widgets()
                .iter()
                .map(|widget| {
                    let mut item = WidgetItem::from_widget(widget);
                    if ids == PlaceholderIds::Strip && widget.is_placeholder() {
                        item.id = None;
                    }
                    item
                })
                .collect(),
        })
        .collect()
}

/// Replace the region tree and widget associations of a template document
/// with those of `tree`. Everything else in the document is left alone.
pub fn splice_template(
    tree: &LayoutTree,
    doc: &mut Document,
    ids: PlaceholderIds,
) -> Result<(), CodecError> {
    expect_kind(doc, DocumentKind::Template)?;
    let region_tree = doc
        .root
        .child_mut(REGION_TREE)
        .ok_or(CodecError::MissingElement {
            parent: TEMPLATE_ROOT,
            element: REGION_TREE,
        })?;

    let root = tree
        .root_id()
        .and_then(|root| region_node(tree, root))
        .map(|node| vec![node.to_element()])
        .unwrap_or_default();
    region_tree.replace_children(REGION, root);

    let entries = associations(tree.regions(), ids);
    region_tree.replace_children(
        REGION_WIDGET_ASSOCIATIONS,
        vec![schema::write_associations(&entries)],
    );
    Ok(())
}

/// Serialize `tree` into a copy of the template document it was loaded from.
pub fn serialize_template(
    tree: &LayoutTree,
    doc: &Document,
    ids: PlaceholderIds,
) -> Result<String, CodecError> {
    let mut doc = doc.clone();
    splice_template(tree, &mut doc, ids)?;
    doc.to_xml_string()
}

/// A template document holding only its id and an empty region tree.
pub fn blank_template(id: &str) -> Document {
    Document::new(
        Element::new(TEMPLATE_ROOT)
            .with_child(Element::text_element("id", id))
            .with_child(Element::new(REGION_TREE)),
    )
}

/// A page document layered on `template_id`, without overrides.
pub fn blank_page(id: &str, template_id: &str) -> Document {
    Document::new(
        Element::new(PAGE_ROOT)
            .with_child(Element::text_element("id", id))
            .with_child(Element::text_element(TEMPLATE_ID, template_id))
            .with_child(Element::new(REGION_BRANCHES)),
    )
}

/// Region overrides and widget placements stored in a page document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageBranches {
    pub regions: Vec<RegionNode>,
    pub associations: Vec<RegionWidgetEntry>,
}

/// Read the `regionBranches` of a page. A page without one has no overrides.
pub fn read_page_branches(doc: &Document) -> Result<PageBranches, CodecError> {
    expect_kind(doc, DocumentKind::Page)?;
    let Some(branches) = doc.root.child(REGION_BRANCHES) else {
        return Ok(PageBranches::default());
    };
    let regions = branches
        .child(REGIONS)
        .map(|regions| {
            regions
                .children_named(REGION)
                .map(RegionNode::from_element)
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?
        .unwrap_or_default();
    let associations = branches
        .child(REGION_WIDGET_ASSOCIATIONS)
        .map(schema::read_associations)
        .transpose()?
        .unwrap_or_default();
    Ok(PageBranches {
        regions,
        associations,
    })
}

/// Id of the template a page document is layered on.
pub fn page_template_id(doc: &Document) -> Option<&str> {
    doc.root.child_text(TEMPLATE_ID).filter(|id| !id.is_empty())
}

/// Write the page's overridden regions and their widgets into the
/// `regionBranches` of a page document.
pub fn splice_page(
    tree: &LayoutTree,
    doc: &mut Document,
    ids: PlaceholderIds,
) -> Result<(), CodecError> {
    expect_kind(doc, DocumentKind::Page)?;
    let anchors = tree
        .overlay()
        .map(|overlay| overlay.top_level_overrides(tree))
        .unwrap_or_default();

    let mut nodes = Vec::with_capacity(anchors.len());
    let mut covered = Vec::new();
    for anchor in &anchors {
        if let Some(node) = region_node(tree, anchor.id()) {
            nodes.push(node.to_element());
        }
        tree.collect_subtree(anchor.id(), &mut covered);
    }
    let entries = associations(covered, ids);

    let branches = doc.root.ensure_child(REGION_BRANCHES);
    let mut regions = Element::new(REGIONS);
    regions.children = nodes;
    branches.replace_children(REGIONS, vec![regions]);
    branches.replace_children(
        REGION_WIDGET_ASSOCIATIONS,
        vec![schema::write_associations(&entries)],
    );
    Ok(())
}

/// Serialize the page overrides of `tree` into a copy of the page document.
pub fn serialize_page(
    tree: &LayoutTree,
    doc: &Document,
    ids: PlaceholderIds,
) -> Result<String, CodecError> {
    let mut doc = doc.clone();
    splice_page(tree, &mut doc, ids)?;
    doc.to_xml_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{InsertDirection, Orientation};
    use indoc::indoc;

    const TEMPLATE: &str = indoc! {r#"
        <?xml version="1.0" encoding="UTF-8"?>
        <Template>
          <id>101</id>
          <name>Home</name>
          <cssOverride>.x { color: red }</cssOverride>
          <regionTree>
            <region>
              <regionId>container</regionId>
              <templateCode class="perc-region perc-horizontal"/>
              <region>
                <regionId>temp-region-4</regionId>
                <templateCode class="perc-region" style="width: 200px"/>
              </region>
              <region>
                <regionId>temp-region-7</regionId>
                <templateCode class="perc-region"/>
              </region>
            </region>
            <regionWidgetAssociations>
              <regionWidget>
                <regionId>temp-region-4</regionId>
                <widgetItems>
                  <widgetItem>
                    <id>501</id>
                    <definitionId>percRawHtml</definitionId>
                    <name>Banner</name>
                  </widgetItem>
                  <widgetItem>
                    <id>pseudo-widget-id-3</id>
                    <definitionId>percImage</definitionId>
                  </widgetItem>
                </widgetItems>
              </regionWidget>
            </regionWidgetAssociations>
          </regionTree>
        </Template>
    "#};

    #[test]
    fn parses_regions_then_widgets() {
        let (_, tree) = parse_template(TEMPLATE).unwrap();
        let root = tree.root().unwrap();
        assert_eq!(root.id(), "container");
        assert_eq!(root.orientation(), Orientation::Horizontal);
        assert_eq!(root.children().len(), 2);

        let owner = tree.find_region_owning_widget("501").unwrap();
        assert_eq!(owner.id(), "temp-region-4");
        let ids: Vec<&str> = owner.widgets().iter().map(|w| w.id().as_str()).collect();
        assert_eq!(ids, vec!["501", "pseudo-widget-id-3"]);
        assert_eq!(owner.widgets()[0].extra().len(), 1);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn counters_continue_after_loaded_ids() {
        let (_, mut tree) = parse_template(TEMPLATE).unwrap();
        let split = tree
            .add_region("temp-region-7", InsertDirection::North)
            .unwrap()
            .unwrap();
        assert_eq!(split.inserted, "temp-region-8");
        assert_eq!(tree.new_widget("d").id(), "pseudo-widget-id-4");
    }

    #[test]
    fn missing_region_tree_fails_load() {
        let err = parse_template("<Template><id>1</id></Template>").unwrap_err();
        assert_eq!(
            err,
            CodecError::MissingElement {
                parent: TEMPLATE_ROOT,
                element: REGION_TREE
            }
        );
        assert!(matches!(
            parse_template("<Other/>"),
            Err(CodecError::UnexpectedRoot(_))
        ));
        assert!(parse_template("<Template><regionTree>").is_err());
    }

    #[test]
    fn association_to_unknown_region_fails_load() {
        let xml = indoc! {r#"
            <Template><regionTree>
              <region><regionId>r</regionId></region>
              <regionWidgetAssociations><regionWidget>
                <regionId>ghost</regionId>
                <widgetItems><widgetItem><definitionId>d</definitionId></widgetItem></widgetItems>
              </regionWidget></regionWidgetAssociations>
            </regionTree></Template>
        "#};
        assert_eq!(
            parse_template(xml).unwrap_err(),
            CodecError::UnknownRegion("ghost".into())
        );
    }

    #[test]
    fn widgets_on_a_container_fail_load() {
        let xml = indoc! {r#"
            <Template><regionTree>
              <region><regionId>r</regionId>
                <region><regionId>a</regionId></region>
                <region><regionId>b</regionId></region>
              </region>
              <regionWidgetAssociations><regionWidget>
                <regionId>r</regionId>
                <widgetItems><widgetItem><definitionId>d</definitionId></widgetItem></widgetItems>
              </regionWidget></regionWidgetAssociations>
            </regionTree></Template>
        "#};
        assert_eq!(
            parse_template(xml).unwrap_err(),
            CodecError::WidgetsOnContainer("r".into())
        );
    }

    #[test]
    fn duplicate_widget_ids_fail_load() {
        let xml = indoc! {r#"
            <Template><regionTree>
              <region><regionId>r</regionId>
                <region><regionId>a</regionId></region>
                <region><regionId>b</regionId></region>
              </region>
              <regionWidgetAssociations>
                <regionWidget>
                  <regionId>a</regionId>
                  <widgetItems><widgetItem><id>9</id><definitionId>d</definitionId></widgetItem></widgetItems>
                </regionWidget>
                <regionWidget>
                  <regionId>b</regionId>
                  <widgetItems><widgetItem><id>9</id><definitionId>d</definitionId></widgetItem></widgetItems>
                </regionWidget>
              </regionWidgetAssociations>
            </regionTree></Template>
        "#};
        assert_eq!(
            parse_template(xml).unwrap_err(),
            CodecError::DuplicateWidget("9".into())
        );
    }

    #[test]
    fn blank_documents_escape_their_ids() {
        let xml = blank_template("a<b&c").to_xml_string().unwrap();
        let (doc, tree) = parse_template(&xml).unwrap();
        assert!(tree.is_empty());
        assert_eq!(doc.root.child_text("id"), Some("a<b&c"));

        let xml = blank_page("p&1", "t<2").to_xml_string().unwrap();
        let page = Document::parse(&xml).unwrap();
        assert_eq!(page_template_id(&page), Some("t<2"));
        assert_eq!(read_page_branches(&page).unwrap(), PageBranches::default());
    }

    #[test]
    fn duplicate_region_ids_fail_load() {
        let xml = indoc! {r#"
            <Template><regionTree>
              <region><regionId>r</regionId>
                <region><regionId>a</regionId></region>
                <region><regionId>a</regionId></region>
              </region>
            </regionTree></Template>
        "#};
        assert_eq!(
            parse_template(xml).unwrap_err(),
            CodecError::DuplicateRegion("a".into())
        );
    }

    #[test]
    fn splice_preserves_unmodelled_elements() {
        let (doc, mut tree) = parse_template(TEMPLATE).unwrap();
        tree.remove_region("temp-region-7").unwrap();
        let xml = serialize_template(&tree, &doc, PlaceholderIds::Keep).unwrap();
        let written = Document::parse(&xml).unwrap();

        assert_eq!(written.root.child_text("cssOverride"), Some(".x { color: red }"));
        let names: Vec<&str> = written.root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "cssOverride", "regionTree"]);

        let (_, reparsed) = parse_template(&xml).unwrap();
        assert_eq!(reparsed.to_string(), tree.to_string());
        assert!(reparsed.find_region("temp-region-7").is_none());
    }

    #[test]
    fn strip_drops_placeholder_ids_only() {
        let (doc, tree) = parse_template(TEMPLATE).unwrap();
        let xml = serialize_template(&tree, &doc, PlaceholderIds::Strip).unwrap();
        assert!(xml.contains("<id>501</id>"));
        assert!(!xml.contains("pseudo-widget-id-3"));
        assert!(xml.contains("<definitionId>percImage</definitionId>"));
    }

    #[test]
    fn empty_tree_serializes_without_root_region() {
        let (doc, mut tree) = parse_template(TEMPLATE).unwrap();
        tree.remove_region("container").unwrap();
        let xml = serialize_template(&tree, &doc, PlaceholderIds::Keep).unwrap();
        let (_, reparsed) = parse_template(&xml).unwrap();
        assert!(reparsed.is_empty());
    }
}
