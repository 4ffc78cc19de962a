//! Typed mirror of the `region` / `regionWidget` / `widgetItem` elements.
//!
//! Documents are read into these structs in one pass and only then mapped
//! onto a [`crate::layout::LayoutTree`]; writing goes the opposite way.

use super::dom::Element;
use crate::constants::{HORIZONTAL_CLASS, REGION_CLASS};
use crate::error::CodecError;
use crate::layout::{Orientation, Region, RegionId, Style, Widget};

pub const REGION: &str = "region";
pub const REGION_ID: &str = "regionId";
pub const OVERRIDABLE: &str = "overridable";
pub const TEMPLATE_CODE: &str = "templateCode";
pub const REGION_WIDGET_ASSOCIATIONS: &str = "regionWidgetAssociations";
pub const REGION_WIDGET: &str = "regionWidget";
pub const WIDGET_ITEMS: &str = "widgetItems";
pub const WIDGET_ITEM: &str = "widgetItem";
pub const WIDGET_ID: &str = "id";
pub const DEFINITION_ID: &str = "definitionId";

/// One `region` element and its nested regions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegionNode {
    pub id: String,
    pub overridable: bool,
    pub orientation: Orientation,
    /// Marker classes other than the orientation flag and `perc-region`.
    pub classes: Vec<String>,
    pub style: String,
    pub children: Vec<RegionNode>,
}

impl RegionNode {
    pub fn from_element(element: &Element) -> Result<Self, CodecError> {
        let id = element
            .child_text(REGION_ID)
            .filter(|id| !id.is_empty())
            .ok_or(CodecError::MissingElement {
                parent: REGION,
                element: REGION_ID,
            })?
            .to_owned();
        let overridable = element
            .child_text(OVERRIDABLE)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));

        let mut orientation = Orientation::Vertical;
        let mut classes = Vec::new();
        let mut style = String::new();
        if let Some(code) = element.child(TEMPLATE_CODE) {
            for class in code.attr("class").unwrap_or_default().split_whitespace() {
                match class {
                    HORIZONTAL_CLASS => orientation = Orientation::Horizontal,
                    REGION_CLASS => {}
                    other => classes.push(other.to_owned()),
                }
            }
            style = code.attr("style").unwrap_or_default().to_owned();
        }

        let children = element
            .children_named(REGION)
            .map(RegionNode::from_element)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id,
            overridable,
            orientation,
            classes,
            style,
            children,
        })
    }

    pub fn to_element(&self) -> Element {
        let mut class = String::from(REGION_CLASS);
        if self.orientation == Orientation::Horizontal {
            class.push(' ');
            class.push_str(HORIZONTAL_CLASS);
        }
        for extra in &self.classes {
            class.push(' ');
            class.push_str(extra);
        }
        let mut code = Element::new(TEMPLATE_CODE).with_attr("class", class);
        if !self.style.is_empty() {
            code = code.with_attr("style", self.style.clone());
        }

        let mut element =
            Element::new(REGION).with_child(Element::text_element(REGION_ID, self.id.clone()));
        if self.overridable {
            element = element.with_child(Element::text_element(OVERRIDABLE, "true"));
        }
        element = element.with_child(code);
        for child in &self.children {
            element = element.with_child(child.to_element());
        }
        element
    }

    /// The region this node describes, without links or widgets.
    pub fn to_region(&self) -> Region {
        let mut region = Region::new(RegionId::new(self.id.clone()), self.orientation);
        region.overridable = self.overridable;
        region.classes = self.classes.clone();
        region.style = Style::parse_inline(&self.style);
        region
    }

    /// Snapshot of `region` without its children.
    pub fn from_region(region: &Region) -> Self {
        Self {
            id: region.id().to_string(),
            overridable: region.is_overridable(),
            orientation: region.orientation(),
            classes: region.classes().to_vec(),
            style: region.style().to_inline(),
            children: Vec::new(),
        }
    }
}

/// A `widgetItem` element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WidgetItem {
    /// Missing for widgets the server has not assigned an id yet.
    pub id: Option<String>,
    pub definition_id: String,
    /// Every other child element, preserved verbatim.
    pub extra: Vec<Element>,
}

impl WidgetItem {
    pub fn from_element(element: &Element) -> Result<Self, CodecError> {
        let definition_id = element
            .child_text(DEFINITION_ID)
            .ok_or(CodecError::MissingElement {
                parent: WIDGET_ITEM,
                element: DEFINITION_ID,
            })?
            .to_owned();
        let id = element
            .child_text(WIDGET_ID)
            .filter(|id| !id.is_empty())
            .map(str::to_owned);
        let extra = element
            .children
            .iter()
            .filter(|c| c.name != WIDGET_ID && c.name != DEFINITION_ID)
            .cloned()
            .collect();
        Ok(Self {
            id,
            definition_id,
            extra,
        })
    }

    pub fn to_element(&self) -> Element {
        let mut element = Element::new(WIDGET_ITEM);
        if let Some(id) = &self.id {
            element = element.with_child(Element::text_element(WIDGET_ID, id.clone()));
        }
        element = element.with_child(Element::text_element(
            DEFINITION_ID,
            self.definition_id.clone(),
        ));
        element.children.extend(self.extra.iter().cloned());
        element
    }

    pub fn from_widget(widget: &Widget) -> Self {
        Self {
            id: Some(widget.id().to_string()),
            definition_id: widget.definition_id().to_owned(),
            extra: widget.extra().to_vec(),
        }
    }
}

/// A `regionWidget` element: the widgets placed in one region, in order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegionWidgetEntry {
    pub region_id: String,
    pub items: Vec<WidgetItem>,
}

impl RegionWidgetEntry {
    pub fn from_element(element: &Element) -> Result<Self, CodecError> {
        let region_id = element
            .child_text(REGION_ID)
            .ok_or(CodecError::MissingElement {
                parent: REGION_WIDGET,
                element: REGION_ID,
            })?
            .to_owned();
        let items = element
            .child(WIDGET_ITEMS)
            .map(|items| {
                items
                    .children_named(WIDGET_ITEM)
                    .map(WidgetItem::from_element)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();
        Ok(Self { region_id, items })
    }

    pub fn to_element(&self) -> Element {
        let mut items = Element::new(WIDGET_ITEMS);
        items.children = self.items.iter().map(WidgetItem::to_element).collect();
        Element::new(REGION_WIDGET)
            .with_child(Element::text_element(REGION_ID, self.region_id.clone()))
            .with_child(items)
    }
}

/// Read every `regionWidget` of a `regionWidgetAssociations` element.
pub fn read_associations(element: &Element) -> Result<Vec<RegionWidgetEntry>, CodecError> {
    element
        .children_named(REGION_WIDGET)
        .map(RegionWidgetEntry::from_element)
        .collect()
}

pub fn write_associations(entries: &[RegionWidgetEntry]) -> Element {
    let mut element = Element::new(REGION_WIDGET_ASSOCIATIONS);
    element.children = entries.iter().map(RegionWidgetEntry::to_element).collect();
    element
}
