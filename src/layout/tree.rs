use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::{Orientation, Region, RegionId, Widget, WidgetId};
use crate::constants::{PAGE_REGION_PREFIX, PLACEHOLDER_WIDGET_PREFIX, TEMPLATE_REGION_PREFIX};
use crate::error::LayoutError;
use crate::overlay::PageOverlay;

/// Whether the tree belongs to a template or to a page layered over one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Template,
    Page,
}

impl EditMode {
    pub fn region_prefix(self) -> &'static str {
        match self {
            EditMode::Template => TEMPLATE_REGION_PREFIX,
            EditMode::Page => PAGE_REGION_PREFIX,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct IdCounters {
    next_region: u64,
    next_widget: u64,
}

fn numeric_suffix(id: &str, prefix: &str) -> Option<u64> {
    id.strip_prefix(prefix)?.parse::<u64>().ok()
}

/// The region/widget tree of one editing session.
///
/// Regions live in an arena keyed by id; parent and child links are ids, so
/// the structure never forms ownership cycles.
#[derive(Debug, Clone)]
pub struct LayoutTree {
    pub(crate) regions: BTreeMap<RegionId, Region>,
    pub(crate) root: Option<RegionId>,
    mode: EditMode,
    counters: IdCounters,
    pub(crate) overlay: Option<PageOverlay>,
}

impl LayoutTree {
    pub fn new(mode: EditMode) -> Self {
        Self {
            regions: BTreeMap::new(),
            root: None,
            mode,
            counters: IdCounters::default(),
            overlay: match mode {
                EditMode::Template => None,
                EditMode::Page => Some(PageOverlay::new()),
            },
        }
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn root_id(&self) -> Option<&RegionId> {
        self.root.as_ref()
    }

    pub fn root(&self) -> Option<&Region> {
        self.root.as_ref().and_then(|id| self.regions.get(id))
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of regions in the tree.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Page override bookkeeping; `None` when editing a template.
    pub fn overlay(&self) -> Option<&PageOverlay> {
        self.overlay.as_ref()
    }

    /// Return the root id, creating an empty vertical root first if the tree
    /// has none (fresh template, or after the last region was removed).
    pub fn create_root(&mut self) -> RegionId {
        if let Some(root) = &self.root {
            return root.clone();
        }
        let id = self.next_region_id();
        let mut region = Region::new(id.clone(), Orientation::Vertical);
        region.page_level_addition = self.mode == EditMode::Page;
        self.regions.insert(id.clone(), region);
        self.root = Some(id.clone());
        tracing::debug!(region_id = %id, "created root region");
        id
    }

    pub fn find_region(&self, id: &str) -> Option<&Region> {
        self.regions.get(id)
    }

    pub fn contains_region(&self, id: &str) -> bool {
        self.regions.contains_key(id)
    }

    /// Depth-first search for the region holding `widget_id`. A region's own
    /// widgets are checked before its children are visited.
    pub fn find_region_owning_widget(&self, widget_id: &str) -> Option<&Region> {
        fn walk<'a>(tree: &'a LayoutTree, id: &RegionId, widget_id: &str) -> Option<&'a Region> {
            let region = tree.regions.get(id)?;
            debug_assert!(
                region.widgets.is_empty() || region.children.is_empty(),
                "region {id} holds widgets and sub-regions"
            );
            if region.widget_position(widget_id).is_some() {
                return Some(region);
            }
            region
                .children
                .iter()
                .find_map(|child| walk(tree, child, widget_id))
        }

        walk(self, self.root.as_ref()?, widget_id)
    }

    pub fn find_widget(&self, widget_id: &str) -> Option<&Widget> {
        let region = self.find_region_owning_widget(widget_id)?;
        region.widgets.iter().find(|widget| widget.id() == widget_id)
    }

    /// All regions in depth-first pre-order starting at the root.
    pub fn regions(&self) -> Vec<&Region> {
        let mut out = Vec::with_capacity(self.regions.len());
        if let Some(root) = &self.root {
            self.collect_subtree(root, &mut out);
        }
        out
    }

    /// All widgets in the order a depth-first walk meets them.
    pub fn widgets(&self) -> Vec<&Widget> {
        self.regions()
            .into_iter()
            .flat_map(|region| region.widgets.iter())
            .collect()
    }

    pub(crate) fn collect_subtree<'a>(&'a self, id: &RegionId, out: &mut Vec<&'a Region>) {
        let Some(region) = self.regions.get(id) else {
            return;
        };
        out.push(region);
        for child in &region.children {
            self.collect_subtree(child, out);
        }
    }

    /// Build a detached widget with a fresh placeholder id.
    pub fn new_widget(&mut self, definition_id: impl Into<String>) -> Widget {
        Widget::new(self.next_widget_id(), definition_id)
    }

    /// Whether `id` may be mutated: any existing region of a template, or a
    /// region under an overridable template region of a page.
    pub fn is_editable(&self, id: &str) -> bool {
        match self.mode {
            EditMode::Template => self.regions.contains_key(id),
            EditMode::Page => self.anchor_of(id).is_some(),
        }
    }

    /// Nearest ancestor-or-self that is a template region the page may
    /// override.
    pub(crate) fn anchor_of(&self, id: &str) -> Option<RegionId> {
        let mut current = self.regions.get(id);
        while let Some(region) = current {
            if region.overridable && !region.page_level_addition {
                return Some(region.id.clone());
            }
            current = region.parent.as_ref().and_then(|p| self.regions.get(p));
        }
        None
    }

    /// Gate a mutation of `id`. In page mode the region must sit under an
    /// overridable template region, which gets recorded as overridden.
    pub(crate) fn authorize(&mut self, id: &RegionId) -> Result<(), LayoutError> {
        self.authorize_all(&[id])
    }

    /// Gate a mutation touching every region in `ids`. Nothing is recorded
    /// unless all of them are editable.
    pub(crate) fn authorize_all(&mut self, ids: &[&RegionId]) -> Result<(), LayoutError> {
        if self.mode == EditMode::Template {
            return Ok(());
        }
        let anchors = ids
            .iter()
            .map(|id| {
                self.anchor_of(id.as_str())
                    .ok_or_else(|| LayoutError::NotOverridable((*id).clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(overlay) = self.overlay.as_mut() {
            for anchor in anchors {
                overlay.mark_region(anchor);
            }
        }
        Ok(())
    }

    pub(crate) fn record_widget(&mut self, id: &WidgetId) {
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.mark_widget(id.clone());
        }
    }

    pub(crate) fn next_region_id(&mut self) -> RegionId {
        let prefix = self.mode.region_prefix();
        loop {
            let id = RegionId::new(format!("{}{}", prefix, self.counters.next_region));
            self.counters.next_region += 1;
            if !self.regions.contains_key(id.as_str()) {
                return id;
            }
        }
    }

    pub(crate) fn next_widget_id(&mut self) -> WidgetId {
        loop {
            let id = WidgetId::new(format!(
                "{}{}",
                PLACEHOLDER_WIDGET_PREFIX, self.counters.next_widget
            ));
            self.counters.next_widget += 1;
            if self.find_region_owning_widget(id.as_str()).is_none() {
                return id;
            }
        }
    }

    /// Keep generated region ids clear of a loaded id in this tree's
    /// namespace.
    pub(crate) fn observe_region_id(&mut self, id: &str) {
        if let Some(n) = numeric_suffix(id, self.mode.region_prefix()) {
            self.counters.next_region = self.counters.next_region.max(n + 1);
        }
    }

    pub(crate) fn observe_widget_id(&mut self, id: &str) {
        if let Some(n) = numeric_suffix(id, PLACEHOLDER_WIDGET_PREFIX) {
            self.counters.next_widget = self.counters.next_widget.max(n + 1);
        }
    }

    pub(crate) fn region_mut(&mut self, id: &str) -> Option<&mut Region> {
        self.regions.get_mut(id)
    }

    /// Insert a loaded region under `parent`, or as the root when `parent`
    /// is `None`. Returns `false` if the id is already taken.
    pub(crate) fn attach_loaded(&mut self, mut region: Region, parent: Option<&RegionId>) -> bool {
        if self.regions.contains_key(region.id.as_str()) {
            return false;
        }
        self.observe_region_id(region.id.as_str());
        region.parent = parent.cloned();
        let id = region.id.clone();
        match parent.and_then(|p| self.regions.get_mut(p.as_str())) {
            Some(parent) => parent.children.push(id.clone()),
            None => self.root = Some(id.clone()),
        }
        self.regions.insert(id, region);
        true
    }

    /// Remove `id` and all of its descendants from the arena and return the
    /// detached top region. The caller unlinks it from its parent.
    pub(crate) fn purge(&mut self, id: &RegionId) -> Option<Region> {
        let region = self.regions.remove(id.as_str())?;
        for child in &region.children {
            self.purge(child);
        }
        if let Some(overlay) = self.overlay.as_mut() {
            for widget in &region.widgets {
                overlay.forget_widget(widget.id());
            }
        }
        Some(region)
    }

    /// Check every structural invariant of the tree.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let Some(root_id) = &self.root else {
            if self.regions.is_empty() {
                return Ok(());
            }
            return Err(LayoutError::Corrupt(format!(
                "{} regions without a root",
                self.regions.len()
            )));
        };
        let root = self
            .regions
            .get(root_id.as_str())
            .ok_or_else(|| LayoutError::Corrupt(format!("root `{root_id}` is missing")))?;
        if root.parent.is_some() {
            return Err(LayoutError::Corrupt(format!("root `{root_id}` has a parent")));
        }

        let mut seen_widgets: BTreeSet<&WidgetId> = BTreeSet::new();
        let mut visited = 0usize;
        let mut stack = vec![root_id];
        while let Some(id) = stack.pop() {
            let region = self
                .regions
                .get(id.as_str())
                .ok_or_else(|| LayoutError::Corrupt(format!("child `{id}` is missing")))?;
            visited += 1;
            if !region.children.is_empty() && !region.widgets.is_empty() {
                return Err(LayoutError::Corrupt(format!(
                    "region `{id}` holds sub-regions and widgets"
                )));
            }
            for widget in &region.widgets {
                if widget.owner.as_ref() != Some(id) {
                    return Err(LayoutError::Corrupt(format!(
                        "widget `{}` does not name `{id}` as its owner",
                        widget.id()
                    )));
                }
                if !seen_widgets.insert(widget.id()) {
                    return Err(LayoutError::Corrupt(format!(
                        "widget `{}` is placed twice",
                        widget.id()
                    )));
                }
            }
            for child in &region.children {
                let parent = self.regions.get(child.as_str()).and_then(|c| c.parent.as_ref());
                if parent != Some(id) {
                    return Err(LayoutError::Corrupt(format!(
                        "child `{child}` does not point back at `{id}`"
                    )));
                }
                stack.push(child);
            }
        }
        if visited != self.regions.len() {
            return Err(LayoutError::Corrupt(format!(
                "{} regions are unreachable from the root",
                self.regions.len() - visited
            )));
        }
        Ok(())
    }
}

impl fmt::Display for LayoutTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_region(
            tree: &LayoutTree,
            f: &mut fmt::Formatter<'_>,
            id: &RegionId,
            depth: usize,
        ) -> fmt::Result {
            let Some(region) = tree.regions.get(id.as_str()) else {
                return Ok(());
            };
            write!(f, "{:indent$}{} {}", "", region.id, region.orientation, indent = depth * 2)?;
            if region.overridable {
                write!(f, " +overridable")?;
            }
            if region.page_level_addition {
                write!(f, " +page")?;
            }
            writeln!(f)?;
            for widget in &region.widgets {
                writeln!(
                    f,
                    "{:indent$}widget {} {}",
                    "",
                    widget.id(),
                    widget.definition_id(),
                    indent = (depth + 1) * 2
                )?;
            }
            for child in &region.children {
                write_region(tree, f, child, depth + 1)?;
            }
            Ok(())
        }

        match &self.root {
            Some(root) => write_region(self, f, root, 0),
            None => writeln!(f, "(empty)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_root_is_idempotent_and_prefixed() {
        let mut tree = LayoutTree::new(EditMode::Template);
        let root = tree.create_root();
        assert_eq!(root, "temp-region-0");
        assert_eq!(tree.create_root(), root);
        assert_eq!(tree.len(), 1);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn observed_ids_push_counters_forward() {
        let mut tree = LayoutTree::new(EditMode::Page);
        tree.observe_region_id("page-region-9");
        tree.observe_region_id("temp-region-40");
        tree.observe_widget_id("pseudo-widget-id-4");
        assert_eq!(tree.next_region_id(), "page-region-10");
        assert_eq!(tree.next_widget_id(), "pseudo-widget-id-5");
    }

    #[test]
    fn validate_flags_unreachable_regions() {
        let mut tree = LayoutTree::new(EditMode::Template);
        tree.create_root();
        let stray = RegionId::from("stray");
        tree.regions
            .insert(stray.clone(), Region::new(stray, Orientation::Vertical));
        assert!(matches!(tree.validate(), Err(LayoutError::Corrupt(_))));
    }

    #[test]
    fn empty_tree_displays_placeholder() {
        let tree = LayoutTree::new(EditMode::Template);
        assert_eq!(tree.to_string(), "(empty)\n");
        assert!(tree.find_region("anything").is_none());
        assert!(tree.find_region_owning_widget("w").is_none());
    }
}
