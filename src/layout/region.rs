use std::collections::BTreeMap;
use std::fmt;

use super::{Orientation, RegionId, Widget};

/// Style property names the editor knows about. Anything else is carried
/// through verbatim as [`StyleProperty::Other`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleProperty {
    Width,
    Height,
    Padding,
    Margin,
    Other(String),
}

impl StyleProperty {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "width" => StyleProperty::Width,
            "height" => StyleProperty::Height,
            "padding" => StyleProperty::Padding,
            "margin" => StyleProperty::Margin,
            _ => StyleProperty::Other(name.trim().to_owned()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            StyleProperty::Width => "width",
            StyleProperty::Height => "height",
            StyleProperty::Padding => "padding",
            StyleProperty::Margin => "margin",
            StyleProperty::Other(name) => name,
        }
    }
}

impl fmt::Display for StyleProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque per-region style bag. Values are never interpreted except by
/// resize clamping, which reads pixel sizes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    props: BTreeMap<StyleProperty, String>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an inline declaration list such as `width: 200px; padding: 4px`.
    /// Malformed declarations are skipped. A `;` inside parentheses or quotes
    /// (`url(data:image/png;base64,...)`) belongs to the value.
    pub fn parse_inline(text: &str) -> Self {
        let mut style = Style::new();
        for decl in split_declarations(text) {
            let Some((name, value)) = decl.split_once(':') else {
                continue;
            };
            let (name, value) = (name.trim(), value.trim());
            if name.is_empty() || value.is_empty() {
                continue;
            }
            style.set(StyleProperty::parse(name), value);
        }
        style
    }

    pub fn to_inline(&self) -> String {
        self.props
            .iter()
            .map(|(prop, value)| format!("{}: {}", prop, value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn get(&self, prop: &StyleProperty) -> Option<&str> {
        self.props.get(prop).map(String::as_str)
    }

    pub fn set(&mut self, prop: StyleProperty, value: impl Into<String>) {
        self.props.insert(prop, value.into());
    }

    pub fn remove(&mut self, prop: &StyleProperty) -> Option<String> {
        self.props.remove(prop)
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StyleProperty, &str)> {
        self.props.iter().map(|(k, v)| (k, v.as_str()))
    }

    /// Copy every property of `other` over `self`. Conflicting values are
    /// overwritten, not merged.
    pub fn merge_from(&mut self, other: &Style) {
        for (prop, value) in &other.props {
            self.props.insert(prop.clone(), value.clone());
        }
    }

    /// Read `prop` as a whole pixel size (`"120px"` or `"120"`).
    pub fn pixels(&self, prop: &StyleProperty) -> Option<u32> {
        let raw = self.get(prop)?.trim();
        let digits = raw.strip_suffix("px").unwrap_or(raw).trim();
        digits.parse::<f64>().ok().and_then(|v| {
            if v.is_finite() && v >= 0.0 {
                Some(v.round() as u32)
            } else {
                None
            }
        })
    }
}

/// A node of the layout tree.
///
/// Holds either child regions or widgets, never both. Child regions are
/// referenced by id; the owning [`super::LayoutTree`] keeps the nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub(crate) id: RegionId,
    pub(crate) orientation: Orientation,
    pub(crate) parent: Option<RegionId>,
    pub(crate) children: Vec<RegionId>,
    pub(crate) widgets: Vec<Widget>,
    pub(crate) style: Style,
    pub(crate) classes: Vec<String>,
    pub(crate) overridable: bool,
    pub(crate) page_level_addition: bool,
}

impl Region {
    pub(crate) fn new(id: RegionId, orientation: Orientation) -> Self {
        Self {
            id,
            orientation,
            parent: None,
            children: Vec::new(),
            widgets: Vec::new(),
            style: Style::new(),
            classes: Vec::new(),
            overridable: false,
            page_level_addition: false,
        }
    }

    pub fn id(&self) -> &RegionId {
        &self.id
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn parent(&self) -> Option<&RegionId> {
        self.parent.as_ref()
    }

    pub fn children(&self) -> &[RegionId] {
        &self.children
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Extra CSS classes of the region marker, excluding the orientation flag.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn is_overridable(&self) -> bool {
        self.overridable
    }

    pub fn is_page_level_addition(&self) -> bool {
        self.page_level_addition
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_container(&self) -> bool {
        !self.children.is_empty()
    }

    /// A region accepts widgets only while it has no sub-regions.
    pub fn is_widget_allowed(&self) -> bool {
        self.children.is_empty()
    }

    pub fn child_position(&self, id: &str) -> Option<usize> {
        self.children.iter().position(|child| child == id)
    }

    pub fn widget_position(&self, id: &str) -> Option<usize> {
        self.widgets.iter().position(|widget| widget.id() == id)
    }
}

/// Split on `;` outside parentheses and quoted strings.
fn split_declarations(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                out.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&text[start..]);
    out
}
