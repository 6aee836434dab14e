//! TETML element tree
//!
//! Reads the extraction engine's XML into a small owned tree. Element names
//! map onto a closed `ElementKind`; anything the builder does not classify
//! (annotations, glyphs, resources, ...) becomes `Ignored` and its subtree is
//! skipped while reading.

use crate::error::{LayoutError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Tet,
    Document,
    DocInfo,
    Pages,
    Page,
    Content,
    Para,
    Box,
    Line,
    Word,
    Text,
    Table,
    Row,
    Cell,
    Bookmarks,
    Bookmark,
    Title,
    /// Informational elements: Annotations, Encryption, Fields, Graphics,
    /// Resources, JavaScripts, Glyph, Metadata, Options, ...
    Ignored(String),
}

impl ElementKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "TET" => ElementKind::Tet,
            "Document" => ElementKind::Document,
            "DocInfo" => ElementKind::DocInfo,
            "Pages" => ElementKind::Pages,
            "Page" => ElementKind::Page,
            "Content" => ElementKind::Content,
            "Para" => ElementKind::Para,
            "Box" => ElementKind::Box,
            "Line" => ElementKind::Line,
            "Word" => ElementKind::Word,
            "Text" => ElementKind::Text,
            "Table" => ElementKind::Table,
            "Row" => ElementKind::Row,
            "Cell" => ElementKind::Cell,
            "Bookmarks" => ElementKind::Bookmarks,
            "Bookmark" => ElementKind::Bookmark,
            "Title" => ElementKind::Title,
            other => ElementKind::Ignored(other.to_string()),
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, ElementKind::Ignored(_))
    }

    /// XML element name
    pub fn name(&self) -> &str {
        match self {
            ElementKind::Tet => "TET",
            ElementKind::Document => "Document",
            ElementKind::DocInfo => "DocInfo",
            ElementKind::Pages => "Pages",
            ElementKind::Page => "Page",
            ElementKind::Content => "Content",
            ElementKind::Para => "Para",
            ElementKind::Box => "Box",
            ElementKind::Line => "Line",
            ElementKind::Word => "Word",
            ElementKind::Text => "Text",
            ElementKind::Table => "Table",
            ElementKind::Row => "Row",
            ElementKind::Cell => "Cell",
            ElementKind::Bookmarks => "Bookmarks",
            ElementKind::Bookmark => "Bookmark",
            ElementKind::Title => "Title",
            ElementKind::Ignored(name) => name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    pub kind: ElementKind,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    /// Character data directly inside this element
    pub text: String,
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            attributes: Vec::new(),
            children: Vec::new(),
            text: String::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Numeric attribute; absent is `None`, present but not a number is fatal.
    pub fn f32_attribute(&self, element: &'static str, name: &'static str) -> Result<Option<f32>> {
        match self.attribute(name) {
            None => Ok(None),
            Some(value) => value
                .trim()
                .parse::<f32>()
                .map(Some)
                .map_err(|_| LayoutError::InvalidAttribute {
                    element,
                    attribute: name,
                    value: value.to_string(),
                }),
        }
    }

    pub fn u32_attribute(&self, element: &'static str, name: &'static str) -> Result<Option<u32>> {
        match self.attribute(name) {
            None => Ok(None),
            Some(value) => value
                .trim()
                .parse::<u32>()
                .map(Some)
                .map_err(|_| LayoutError::InvalidAttribute {
                    element,
                    attribute: name,
                    value: value.to_string(),
                }),
        }
    }

    pub fn children_of_kind<'a>(
        &'a self,
        kind: &'a ElementKind,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| &child.kind == kind)
    }

    pub fn child(&self, kind: &ElementKind) -> Option<&Element> {
        self.children.iter().find(|child| &child.kind == kind)
    }

    pub fn has_child(&self, kind: &ElementKind) -> bool {
        self.child(kind).is_some()
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).to_string();
    let mut element = Element::new(ElementKind::from_name(&name));
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
        let value = attr.unescape_value()?.to_string();
        element.attributes.push((key, value));
    }
    Ok(element)
}

/// Parse TETML into its root element.
pub fn parse_tetml(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    // Open elements, innermost last
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut skipped = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let element = element_from_start(&start)?;
                if element.kind.is_ignored() {
                    reader.read_to_end(start.name())?;
                    skipped += 1;
                    continue;
                }
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                if element.kind.is_ignored() {
                    skipped += 1;
                    continue;
                }
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::End(_) => {
                // quick-xml checks end-tag names, so the stack cannot be empty here
                if let Some(element) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => root = Some(element),
                    }
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(data.into_inner().as_ref()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    log::debug!("TETML read complete, {skipped} informational subtrees skipped");

    root.ok_or(LayoutError::MissingElement {
        parent: "TETML",
        child: "Document",
    })
}
