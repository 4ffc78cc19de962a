use super::{RegionId, WidgetId};
use crate::constants::PLACEHOLDER_WIDGET_PREFIX;
use crate::xml::dom::Element;

/// Content placeholder placed inside a leaf region.
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    id: WidgetId,
    definition_id: String,
    pub(crate) owner: Option<RegionId>,
    extra: Vec<Element>,
}

impl Widget {
    pub fn new(id: impl Into<WidgetId>, definition_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            definition_id: definition_id.into(),
            owner: None,
            extra: Vec::new(),
        }
    }

    /// Attach opaque `widgetItem` children (name, properties, ...) that are
    /// written back unchanged.
    pub fn with_extra(mut self, extra: Vec<Element>) -> Self {
        self.extra = extra;
        self
    }

    pub fn id(&self) -> &WidgetId {
        &self.id
    }

    pub fn definition_id(&self) -> &str {
        &self.definition_id
    }

    /// Region currently holding the widget, `None` while detached.
    pub fn owner(&self) -> Option<&RegionId> {
        self.owner.as_ref()
    }

    pub fn extra(&self) -> &[Element] {
        &self.extra
    }

    /// Whether the id was generated locally and never persisted.
    pub fn is_placeholder(&self) -> bool {
        is_placeholder_id(self.id.as_str())
    }
}

pub(crate) fn is_placeholder_id(id: &str) -> bool {
    id.strip_prefix(PLACEHOLDER_WIDGET_PREFIX)
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_ids_need_numeric_suffix() {
        assert!(Widget::new("pseudo-widget-id-7", "percRawHtml").is_placeholder());
        assert!(!Widget::new("pseudo-widget-id-", "percRawHtml").is_placeholder());
        assert!(!Widget::new("pseudo-widget-id-x1", "percRawHtml").is_placeholder());
        assert!(!Widget::new("1042", "percRawHtml").is_placeholder());
    }
}
