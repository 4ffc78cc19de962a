//! Structural edits of a [`LayoutTree`]: splitting, collapsing, reordering
//! and resizing regions, and placing widgets.
//!
//! Every operation leaves the tree valid when it returns, whether it
//! succeeded or not. Entry points the UI may call with an id that has just
//! gone stale answer `Ok(None)` instead of failing.

use super::{
    EditMode, InsertDirection, LayoutTree, Orientation, Region, RegionId, StyleProperty, Widget,
};
use crate::constants::MIN_REGION_SIZE_PX;
use crate::error::LayoutError;

/// Outcome of [`LayoutTree::add_region`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSplit {
    /// The split region, now a container.
    pub target: RegionId,
    /// The new empty region.
    pub inserted: RegionId,
    /// Region created to hold the target's previous content: the widget
    /// carrier of a leaf split, or the wrapper of re-oriented children.
    pub moved_into: Option<RegionId>,
}

impl LayoutTree {
    fn new_region(&mut self, orientation: Orientation) -> Region {
        let id = self.next_region_id();
        let mut region = Region::new(id, orientation);
        region.page_level_addition = self.mode() == EditMode::Page;
        region
    }

    /// Split `target` to carve out a new empty region on `direction`'s side.
    pub fn add_region(
        &mut self,
        target: &str,
        direction: InsertDirection,
    ) -> Result<Option<RegionSplit>, LayoutError> {
        let Some(region) = self.regions.get(target) else {
            tracing::debug!(region_id = target, "add_region: no such region");
            return Ok(None);
        };
        let target_id = region.id.clone();
        let old_orientation = region.orientation;
        let is_container = region.is_container();
        self.authorize(&target_id)?;

        let split = direction.orientation();
        let append = direction.appends();
        let mut inserted = self.new_region(Orientation::Vertical);
        inserted.parent = Some(target_id.clone());
        let inserted_id = inserted.id.clone();

        let moved_into = if is_container {
            let wrapper_id = if old_orientation != split {
                let mut wrapper = self.new_region(old_orientation);
                wrapper.parent = Some(target_id.clone());
                let wrapper_id = wrapper.id.clone();
                let children = match self.regions.get_mut(target_id.as_str()) {
                    Some(target) => std::mem::take(&mut target.children),
                    None => Vec::new(),
                };
                for child in &children {
                    if let Some(child) = self.regions.get_mut(child.as_str()) {
                        child.parent = Some(wrapper_id.clone());
                    }
                }
                wrapper.children = children;
                self.regions.insert(wrapper_id.clone(), wrapper);
                if let Some(target) = self.regions.get_mut(target_id.as_str()) {
                    target.children.push(wrapper_id.clone());
                }
                Some(wrapper_id)
            } else {
                None
            };
            if let Some(target) = self.regions.get_mut(target_id.as_str()) {
                if append {
                    target.children.push(inserted_id.clone());
                } else {
                    target.children.insert(0, inserted_id.clone());
                }
            }
            wrapper_id
        } else {
            let mut carrier = self.new_region(old_orientation);
            carrier.parent = Some(target_id.clone());
            let carrier_id = carrier.id.clone();
            let widgets = match self.regions.get_mut(target_id.as_str()) {
                Some(target) => std::mem::take(&mut target.widgets),
                None => Vec::new(),
            };
            carrier.widgets = widgets
                .into_iter()
                .map(|mut widget| {
                    widget.owner = Some(carrier_id.clone());
                    widget
                })
                .collect();
            self.regions.insert(carrier_id.clone(), carrier);
            if let Some(target) = self.regions.get_mut(target_id.as_str()) {
                target.children = if append {
                    vec![carrier_id.clone(), inserted_id.clone()]
                } else {
                    vec![inserted_id.clone(), carrier_id.clone()]
                };
            }
            Some(carrier_id)
        };

        self.regions.insert(inserted_id.clone(), inserted);
        if let Some(target) = self.regions.get_mut(target_id.as_str()) {
            target.orientation = split;
            target.overridable = true;
        }

        tracing::debug!(
            region_id = %target_id,
            inserted = %inserted_id,
            %direction,
            "split region"
        );
        debug_assert!(self.validate().is_ok());
        Ok(Some(RegionSplit {
            target: target_id,
            inserted: inserted_id,
            moved_into,
        }))
    }

    /// Remove `id` and its subtree.
    ///
    /// Removing the root empties the tree. When the parent is left with a
    /// single child, that child is dissolved into the parent: its children
    /// or widgets move up, its style is merged over the parent's, the parent
    /// turns vertical, and it keeps its id.
    pub fn remove_region(&mut self, id: &str) -> Result<Option<Region>, LayoutError> {
        let Some(region) = self.regions.get(id) else {
            tracing::debug!(region_id = id, "remove_region: no such region");
            return Ok(None);
        };
        let region_id = region.id.clone();

        let Some(parent_id) = region.parent.clone() else {
            self.authorize(&region_id)?;
            let removed = self.purge(&region_id);
            self.regions.clear();
            self.root = None;
            tracing::debug!(region_id = %region_id, "removed root region");
            return Ok(removed);
        };
        self.authorize(&parent_id)?;

        let siblings = self
            .regions
            .get(parent_id.as_str())
            .map(|parent| parent.children.clone())
            .unwrap_or_default();
        if let Some(parent) = self.regions.get_mut(parent_id.as_str()) {
            parent.children.retain(|child| *child != region_id);
        }
        let removed = self.purge(&region_id);

        if siblings.len() == 2 {
            let survivor = siblings.into_iter().find(|child| *child != region_id);
            if let Some(survivor) = survivor {
                self.collapse_into_parent(&parent_id, &survivor);
            }
        }

        tracing::debug!(region_id = %region_id, parent = %parent_id, "removed region");
        debug_assert!(self.validate().is_ok());
        Ok(removed)
    }

    /// Dissolve `child`, the only remaining child of `parent_id`, into the
    /// parent.
    fn collapse_into_parent(&mut self, parent_id: &RegionId, child: &RegionId) {
        let Some(sibling) = self.regions.remove(child.as_str()) else {
            return;
        };
        for grandchild in &sibling.children {
            if let Some(grandchild) = self.regions.get_mut(grandchild.as_str()) {
                grandchild.parent = Some(parent_id.clone());
            }
        }
        let Some(parent) = self.regions.get_mut(parent_id.as_str()) else {
            return;
        };
        parent.children = sibling.children;
        parent.widgets = sibling
            .widgets
            .into_iter()
            .map(|mut widget| {
                widget.owner = Some(parent_id.clone());
                widget
            })
            .collect();
        parent.orientation = Orientation::Vertical;
        parent.style.merge_from(&sibling.style);
        tracing::debug!(region_id = %parent_id, dissolved = %child, "collapsed region");
    }

    /// Move `moved` next to its sibling `target`.
    pub fn move_region(
        &mut self,
        moved: &str,
        target: &str,
        insert_before: bool,
    ) -> Result<(), LayoutError> {
        let target_region = self
            .regions
            .get(target)
            .ok_or_else(|| LayoutError::RegionNotFound(target.into()))?;
        let moved_region = self
            .regions
            .get(moved)
            .ok_or_else(|| LayoutError::RegionNotFound(moved.into()))?;
        let parent_id = match (&target_region.parent, &moved_region.parent) {
            (Some(a), Some(b)) if a == b => a.clone(),
            _ => {
                return Err(LayoutError::NotSiblings {
                    moved: moved.into(),
                    target: target.into(),
                });
            }
        };
        if moved == target {
            return Ok(());
        }
        let Some(parent) = self.regions.get(parent_id.as_str()) else {
            return Err(LayoutError::RegionNotFound(parent_id));
        };
        let mut index = parent.child_position(target).unwrap_or(0);
        if !insert_before {
            index += 1;
        }
        if parent.child_position(moved).is_some_and(|from| from < index) {
            index -= 1;
        }
        self.order_sub_region(moved, index)
    }

    /// Reinsert `moved` at `index` within its current parent's children.
    /// `index` is interpreted after `moved` has been taken out and is
    /// clamped to the end.
    pub fn order_sub_region(&mut self, moved: &str, index: usize) -> Result<(), LayoutError> {
        let parent_id = self
            .regions
            .get(moved)
            .ok_or_else(|| LayoutError::RegionNotFound(moved.into()))?
            .parent
            .clone()
            .ok_or_else(|| LayoutError::NotSiblings {
                moved: moved.into(),
                target: moved.into(),
            })?;
        self.authorize(&parent_id)?;
        let Some(parent) = self.regions.get_mut(parent_id.as_str()) else {
            return Err(LayoutError::RegionNotFound(parent_id));
        };
        let Some(from) = parent.child_position(moved) else {
            return Err(LayoutError::Corrupt(format!(
                "`{moved}` is missing from its parent's children"
            )));
        };
        let child = parent.children.remove(from);
        let index = index.min(parent.children.len());
        parent.children.insert(index, child);
        tracing::debug!(region_id = moved, from, to = index, "reordered region");
        Ok(())
    }

    /// Place `widget` at the front or back of `region`'s widget list.
    pub fn add_widget(
        &mut self,
        mut widget: Widget,
        region: &str,
        append: bool,
    ) -> Result<(), LayoutError> {
        let target = self
            .regions
            .get(region)
            .ok_or_else(|| LayoutError::RegionNotFound(region.into()))?;
        if !target.is_widget_allowed() {
            return Err(LayoutError::CannotAddWidget(target.id.clone()));
        }
        if self.find_region_owning_widget(widget.id().as_str()).is_some() {
            return Err(LayoutError::DuplicateWidget(widget.id().clone()));
        }
        let region_id = target.id.clone();
        self.authorize(&region_id)?;
        self.observe_widget_id(widget.id().as_str());
        self.record_widget(widget.id());

        widget.owner = Some(region_id.clone());
        let widget_id = widget.id().clone();
        if let Some(target) = self.regions.get_mut(region_id.as_str()) {
            target.overridable = true;
            if append {
                target.widgets.push(widget);
            } else {
                target.widgets.insert(0, widget);
            }
        }
        tracing::debug!(region_id = %region_id, widget_id = %widget_id, "added widget");
        Ok(())
    }

    /// Take a widget out of the layout. The emptied region stays as an empty
    /// leaf.
    pub fn remove_widget(&mut self, widget_id: &str) -> Result<Option<Widget>, LayoutError> {
        let Some(owner) = self.find_region_owning_widget(widget_id) else {
            tracing::debug!(widget_id, "remove_widget: no such widget");
            return Ok(None);
        };
        let owner_id = owner.id.clone();
        self.authorize(&owner_id)?;
        let Some(owner) = self.regions.get_mut(owner_id.as_str()) else {
            return Ok(None);
        };
        let Some(index) = owner.widget_position(widget_id) else {
            return Ok(None);
        };
        let mut widget = owner.widgets.remove(index);
        widget.owner = None;
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.forget_widget(widget.id());
        }
        tracing::debug!(region_id = %owner_id, widget_id, "removed widget");
        Ok(Some(widget))
    }

    /// Move a widget from `from` into `to` at `position` (clamped). Returns
    /// the index it landed on, or `None` if either region or the widget is
    /// gone.
    pub fn order_widget(
        &mut self,
        widget_id: &str,
        from: &str,
        to: &str,
        position: usize,
    ) -> Result<Option<usize>, LayoutError> {
        let (Some(source), Some(dest)) = (self.regions.get(from), self.regions.get(to)) else {
            tracing::debug!(widget_id, from, to, "order_widget: no such region");
            return Ok(None);
        };
        let Some(index) = source.widget_position(widget_id) else {
            tracing::debug!(widget_id, from, "order_widget: widget not in source region");
            return Ok(None);
        };
        if !dest.is_widget_allowed() {
            return Err(LayoutError::CannotAddWidget(dest.id.clone()));
        }
        let (from_id, to_id) = (source.id.clone(), dest.id.clone());
        self.authorize_all(&[&from_id, &to_id])?;

        let Some(source) = self.regions.get_mut(from_id.as_str()) else {
            return Ok(None);
        };
        let mut widget = source.widgets.remove(index);
        widget.owner = Some(to_id.clone());
        let moved_id = widget.id().clone();
        let Some(dest) = self.regions.get_mut(to_id.as_str()) else {
            return Err(LayoutError::Corrupt(format!("region `{to_id}` vanished")));
        };
        let position = position.min(dest.widgets.len());
        dest.widgets.insert(position, widget);
        dest.overridable = true;
        self.record_widget(&moved_id);

        tracing::debug!(widget_id, from, to, position, "moved widget");
        debug_assert!(self.validate().is_ok());
        Ok(Some(position))
    }

    /// Set the spatial size of `id`: its width inside a horizontal parent
    /// (or at the root), its height inside a vertical one.
    ///
    /// The size is clamped to at least [`MIN_REGION_SIZE_PX`] and, when the
    /// parent declares a pixel value for the same property, to at most that.
    pub fn resize_region(&mut self, id: &str, size_px: u32) -> Result<Option<u32>, LayoutError> {
        let Some(region) = self.regions.get(id) else {
            return Ok(None);
        };
        let region_id = region.id.clone();
        let parent = region.parent.as_ref().and_then(|p| self.regions.get(p.as_str()));
        let property = match parent.map(|p| p.orientation) {
            Some(Orientation::Vertical) => StyleProperty::Height,
            Some(Orientation::Horizontal) | None => StyleProperty::Width,
        };
        let max = parent
            .and_then(|p| p.style.pixels(&property))
            .unwrap_or(u32::MAX)
            .max(MIN_REGION_SIZE_PX);
        let applied = size_px.clamp(MIN_REGION_SIZE_PX, max);
        self.authorize(&region_id)?;

        if let Some(region) = self.regions.get_mut(region_id.as_str()) {
            region.style.set(property.clone(), format!("{}px", applied));
        }
        tracing::debug!(region_id = %region_id, %property, applied, "resized region");
        Ok(Some(applied))
    }

    /// Write one style property of `id`. Returns `false` for unknown ids.
    pub fn set_style(
        &mut self,
        id: &str,
        property: StyleProperty,
        value: impl Into<String>,
    ) -> Result<bool, LayoutError> {
        let Some(region) = self.regions.get(id) else {
            return Ok(false);
        };
        let region_id = region.id.clone();
        self.authorize(&region_id)?;
        if let Some(region) = self.regions.get_mut(region_id.as_str()) {
            region.style.set(property, value);
        }
        Ok(true)
    }
}
