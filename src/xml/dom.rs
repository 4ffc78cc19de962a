//! Minimal owned XML element tree over `quick-xml`.
//!
//! Keeps element order, attributes and text so that documents can be read,
//! partially rewritten and written back. Comments and processing
//! instructions are dropped. Text interleaved with child elements is
//! concatenated onto the parent.

use std::io::Cursor;

use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::CodecError;

/// An XML element with its attributes, text and child elements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Element holding only `text`.
    pub fn text_element(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text of the first child called `name`.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.trim())
    }

    /// Return the child called `name`, appending an empty one if missing.
    pub fn ensure_child(&mut self, name: &str) -> &mut Element {
        let index = match self.children.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                self.children.push(Element::new(name));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    /// Replace every child called `name` with `replacement`. The new
    /// elements take the position of the first old one, or go at the end
    /// when there was none.
    pub fn replace_children(&mut self, name: &str, replacement: Vec<Element>) {
        let at = self.children.iter().position(|c| c.name == name);
        self.children.retain(|c| c.name != name);
        let at = at.unwrap_or(self.children.len()).min(self.children.len());
        self.children.splice(at..at, replacement);
    }

    fn from_start(start: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Self, CodecError> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| CodecError::Malformed(e.to_string()))?
            .to_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| CodecError::Malformed(e.to_string()))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| CodecError::Malformed(e.to_string()))?
                .to_owned();
            let value = attr
                .decode_and_unescape_value(reader.decoder())
                .map_err(|e| CodecError::Malformed(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }

    fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<(), CodecError> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        if self.children.is_empty() && self.text.is_empty() {
            return write_event(writer, Event::Empty(start));
        }
        write_event(writer, Event::Start(start))?;
        if !self.text.is_empty() {
            write_event(writer, Event::Text(BytesText::new(&self.text)))?;
        }
        for child in &self.children {
            child.write_to(writer)?;
        }
        write_event(writer, Event::End(BytesEnd::new(self.name.as_str())))
    }
}

fn write_event<W: std::io::Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), CodecError> {
    writer
        .write_event(event)
        .map_err(|e| CodecError::Write(e.to_string()))
}

/// Resolve a general entity reference to its character value.
fn resolve_entity(raw: &str) -> Result<String, CodecError> {
    if let Some(resolved) = resolve_xml_entity(raw) {
        return Ok(resolved.into());
    }
    if let Some(rest) = raw.strip_prefix('#') {
        let code = match rest.strip_prefix('x').or_else(|| rest.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => rest.parse::<u32>(),
        }
        .map_err(|_| CodecError::Malformed(format!("invalid numeric entity: &{};", raw)))?;
        let ch = char::from_u32(code)
            .ok_or_else(|| CodecError::Malformed(format!("invalid code point: {}", code)))?;
        return Ok(ch.to_string());
    }
    Err(CodecError::Malformed(format!("unknown entity: &{};", raw)))
}

fn attach(
    stack: &mut [Element],
    mut element: Element,
    root: &mut Option<Element>,
) -> Result<(), CodecError> {
    // Whitespace between child elements is formatting, not content.
    if !element.children.is_empty() && element.text.trim().is_empty() {
        element.text.clear();
    }
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_none() {
        *root = Some(element);
    } else {
        return Err(CodecError::MultipleRoots);
    }
    Ok(())
}

/// A parsed XML document: the root element plus whether it carried an XML
/// declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub root: Element,
    pub declaration: bool,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self {
            root,
            declaration: true,
        }
    }

    pub fn parse(xml: &str) -> Result<Self, CodecError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;
        let mut declaration = false;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| CodecError::Malformed(e.to_string()))?;
            match event {
                Event::Start(ref e) => {
                    stack.push(Element::from_start(e, &reader)?);
                }
                Event::Empty(ref e) => {
                    let element = Element::from_start(e, &reader)?;
                    attach(&mut stack, element, &mut root)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or(CodecError::UnbalancedTags)?;
                    attach(&mut stack, element, &mut root)?;
                }
                Event::Text(e) => {
                    let text = e
                        .decode()
                        .map_err(|err| CodecError::Malformed(err.to_string()))?;
                    match stack.last_mut() {
                        Some(current) => current.text.push_str(&text),
                        None if text.trim().is_empty() => {}
                        None => {
                            return Err(CodecError::Malformed(
                                "text outside the root element".to_string(),
                            ));
                        }
                    }
                }
                Event::CData(e) => {
                    if let Some(current) = stack.last_mut() {
                        let text = std::str::from_utf8(e.as_ref())
                            .map_err(|err| CodecError::Malformed(err.to_string()))?;
                        current.text.push_str(text);
                    }
                }
                Event::GeneralRef(e) => {
                    if let Some(current) = stack.last_mut() {
                        let raw = e
                            .decode()
                            .map_err(|err| CodecError::Malformed(err.to_string()))?;
                        current.text.push_str(&resolve_entity(&raw)?);
                    }
                }
                Event::Decl(_) => declaration = true,
                Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
        }

        if !stack.is_empty() {
            return Err(CodecError::UnbalancedTags);
        }
        let root = root.ok_or(CodecError::Empty)?;
        Ok(Self { root, declaration })
    }

    /// Serialize with two-space indentation.
    pub fn to_xml_string(&self) -> Result<String, CodecError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        if self.declaration {
            write_event(
                &mut writer,
                Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
            )?;
        }
        self.root.write_to(&mut writer)?;
        let bytes = writer.into_inner().into_inner();
        String::from_utf8(bytes).map_err(|e| CodecError::Write(e.to_string()))
    }
}
