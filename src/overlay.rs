//! Page-level overrides of a template layout.
//!
//! A page starts from its template's tree and may only rework regions the
//! template marked `overridable` (its *anchors*), including anything the
//! page itself added beneath them. The overlay remembers which anchors and
//! widgets the page touched so saving writes back exactly those branches.

use std::collections::BTreeSet;

use crate::error::CodecError;
use crate::layout::{LayoutTree, Region, RegionId, Style, WidgetId};
use crate::xml::schema::RegionNode;
use crate::xml::{PageBranches, build_region, observe_items, place_widget, widget_from_item};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageOverlay {
    regions: BTreeSet<RegionId>,
    widgets: BTreeSet<WidgetId>,
}

impl PageOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_region_overridden(&self, id: &str) -> bool {
        self.regions.contains(id)
    }

    pub fn is_widget_overridden(&self, id: &str) -> bool {
        self.widgets.contains(id)
    }

    pub fn overridden_regions(&self) -> impl Iterator<Item = &RegionId> {
        self.regions.iter()
    }

    pub fn overridden_widgets(&self) -> impl Iterator<Item = &WidgetId> {
        self.widgets.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty() && self.widgets.is_empty()
    }

    pub(crate) fn mark_region(&mut self, id: RegionId) {
        if self.regions.insert(id.clone()) {
            tracing::debug!(region_id = %id, "region overridden by page");
        }
    }

    pub(crate) fn mark_widget(&mut self, id: WidgetId) {
        self.widgets.insert(id);
    }

    pub(crate) fn forget_widget(&mut self, id: &WidgetId) {
        self.widgets.remove(id);
    }

    /// Overridden regions still in `tree` that have no overridden ancestor,
    /// in depth-first order. These are the branches a page save writes.
    pub fn top_level_overrides<'a>(&self, tree: &'a LayoutTree) -> Vec<&'a Region> {
        let mut out = Vec::new();
        let Some(root) = tree.root_id() else {
            return out;
        };
        self.collect_top_level(tree, root, &mut out);
        out
    }

    fn collect_top_level<'a>(
        &self,
        tree: &'a LayoutTree,
        id: &RegionId,
        out: &mut Vec<&'a Region>,
    ) {
        let Some(region) = tree.find_region(id.as_str()) else {
            return;
        };
        if self.regions.contains(id) {
            out.push(region);
            return;
        }
        for child in region.children() {
            self.collect_top_level(tree, child, out);
        }
    }
}

/// Lay a page's stored overrides onto `tree`, a page-mode tree built from the
/// page's template.
///
/// Branches naming a region the template does not offer for override are
/// skipped, as are page regions whose ids the template now uses and widget
/// placements outside overridable leaf regions: the template may have
/// changed since the page was saved.
pub(crate) fn merge_page(tree: &mut LayoutTree, branches: &PageBranches) -> Result<(), CodecError> {
    for node in &branches.regions {
        let Some(anchor) = tree.find_region(&node.id) else {
            tracing::warn!(region_id = %node.id, "page override for unknown region skipped");
            continue;
        };
        if !anchor.is_overridable() || anchor.is_page_level_addition() {
            tracing::warn!(region_id = %node.id, "page override for locked region skipped");
            continue;
        }
        let anchor_id = anchor.id().clone();
        clear_region(tree, &anchor_id);
        if let Some(region) = tree.region_mut(anchor_id.as_str()) {
            region.orientation = node.orientation;
            region.style = Style::parse_inline(&node.style);
            region.classes = node.classes.clone();
        }
        for child in &node.children {
            if let Some(taken) = first_taken_id(tree, child) {
                tracing::warn!(
                    region_id = %node.id,
                    conflicting = taken,
                    "page region clashing with template region skipped"
                );
                continue;
            }
            build_region(tree, child, Some(&anchor_id), true)?;
        }
        if let Some(overlay) = tree.overlay.as_mut() {
            overlay.mark_region(anchor_id);
        }
    }

    observe_items(tree, &branches.associations);
    for entry in &branches.associations {
        let Some(anchor) = tree.anchor_of(&entry.region_id) else {
            tracing::warn!(
                region_id = %entry.region_id,
                "page widgets for non-overridable region skipped"
            );
            continue;
        };
        if tree
            .find_region(&entry.region_id)
            .is_some_and(|region| region.is_container())
        {
            tracing::warn!(
                region_id = %entry.region_id,
                "page widgets for region that now holds sub-regions skipped"
            );
            continue;
        }
        let overridden = tree
            .overlay
            .as_ref()
            .is_some_and(|overlay| overlay.is_region_overridden(anchor.as_str()));
        if !overridden {
            // The page replaces the template's widgets of this region.
            if let Some(region) = tree.region_mut(&entry.region_id) {
                region.widgets.clear();
            }
            if let Some(overlay) = tree.overlay.as_mut() {
                overlay.mark_region(anchor);
            }
        }
        for item in &entry.items {
            let widget = widget_from_item(tree, item);
            let widget_id = widget.id().clone();
            if tree.find_region_owning_widget(widget_id.as_str()).is_some() {
                tracing::warn!(widget_id = %widget_id, "duplicate page widget skipped");
                continue;
            }
            place_widget(tree, &entry.region_id, widget)?;
            if let Some(overlay) = tree.overlay.as_mut() {
                overlay.mark_widget(widget_id);
            }
        }
    }

    tracing::debug!(
        branches = branches.regions.len(),
        placements = branches.associations.len(),
        "merged page overrides"
    );
    Ok(())
}

/// An id in `node`'s subtree that is already in `tree` or repeated within
/// the subtree.
fn first_taken_id<'a>(tree: &LayoutTree, node: &'a RegionNode) -> Option<&'a str> {
    fn walk<'a>(
        tree: &LayoutTree,
        node: &'a RegionNode,
        seen: &mut BTreeSet<&'a str>,
    ) -> Option<&'a str> {
        if tree.contains_region(&node.id) || !seen.insert(node.id.as_str()) {
            return Some(node.id.as_str());
        }
        node.children.iter().find_map(|child| walk(tree, child, seen))
    }
    walk(tree, node, &mut BTreeSet::new())
}

/// Drop every sub-region and widget of `id`, leaving it an empty leaf.
fn clear_region(tree: &mut LayoutTree, id: &RegionId) {
    let children = match tree.region_mut(id.as_str()) {
        Some(region) => {
            region.widgets.clear();
            std::mem::take(&mut region.children)
        }
        None => return,
    };
    for child in &children {
        tree.purge(child);
    }
}
