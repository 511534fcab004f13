//! SIP Server status document.
//!
//! The `/serverx` page is an XML tree. It is parsed once per scrape into a
//! small owned [`Element`] tree, and required locations are then resolved
//! through [`NodePath`] constants with typed accessors. Every lookup failure
//! surfaces as a [`MappingError`] naming the path.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{MappingError, ParseError};

/// A location in the status document, relative to some element.
///
/// Steps are separated by `/`. A step may carry a single attribute predicate,
/// e.g. `sipTrunkStatistics[@id="sipTrunkTable"]`. The first matching child is
/// taken at each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodePath(&'static str);

impl NodePath {
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    fn steps(&self) -> impl Iterator<Item = Step<'static>> {
        self.0.split('/').filter(|s| !s.is_empty()).map(Step::parse)
    }
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// One path step: an element name plus an optional `[@attr="value"]` filter.
#[derive(Debug, Clone, Copy)]
struct Step<'a> {
    name: &'a str,
    predicate: Option<(&'a str, &'a str)>,
}

impl<'a> Step<'a> {
    fn parse(step: &'a str) -> Self {
        let Some((name, rest)) = step.split_once('[') else {
            return Self {
                name: step,
                predicate: None,
            };
        };

        let predicate = rest
            .strip_suffix(']')
            .and_then(|p| p.strip_prefix('@'))
            .and_then(|p| p.split_once('='))
            .map(|(attr, value)| (attr, value.trim_matches(|c: char| c == '"' || c == '\'')));

        Self { name, predicate }
    }

    fn matches(&self, element: &Element) -> bool {
        if element.name != self.name {
            return false;
        }
        match self.predicate {
            Some((attr, value)) => element.attr(attr) == Some(value),
            None => true,
        }
    }
}

/// An element of the status document.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, ParseError> {
        let name = std::str::from_utf8(start.name().as_ref())?.to_string();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Character data directly inside this element, with surrounding
    /// whitespace removed.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter()
    }

    /// Direct children with the given element name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Resolve a path relative to this element.
    pub fn find(&self, path: NodePath) -> Option<&Element> {
        let mut current = self;
        for step in path.steps() {
            current = current.children.iter().find(|c| step.matches(c))?;
        }
        Some(current)
    }

    /// Resolve a required path.
    pub fn node(&self, path: NodePath) -> Result<&Element, MappingError> {
        self.find(path)
            .ok_or_else(|| MappingError::MissingNode(path.to_string()))
    }

    /// Text of a required node.
    pub fn text_at(&self, path: NodePath) -> Result<&str, MappingError> {
        self.node(path).map(Element::text)
    }

    /// Numeric value of a required node.
    pub fn number_at(&self, path: NodePath) -> Result<f64, MappingError> {
        let text = self.text_at(path)?;
        text.parse::<f64>()
            .map_err(|_| MappingError::InvalidNumber {
                path: path.to_string(),
                value: text.to_string(),
            })
    }

    /// Boolean value of a required node: `"1"` is true, anything else false.
    pub fn flag_at(&self, path: NodePath) -> Result<bool, MappingError> {
        self.text_at(path).map(|t| t == "1")
    }

    /// A required attribute of a required node.
    pub fn attr_at(&self, path: NodePath, attribute: &str) -> Result<&str, MappingError> {
        self.node(path)?
            .attr(attribute)
            .ok_or_else(|| MappingError::MissingAttribute {
                path: path.to_string(),
                attribute: attribute.to_string(),
            })
    }
}

/// A parsed `/serverx` response.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusDocument {
    root: Element,
}

impl StatusDocument {
    /// Parse a status document. Any well-formedness problem is an error.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let xml = std::str::from_utf8(bytes)?;
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(Element::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Element::from_start(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(end) => {
                    let element = stack.pop().ok_or_else(|| {
                        ParseError::UnexpectedEnd(
                            String::from_utf8_lossy(end.name().as_ref()).into_owned(),
                        )
                    })?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&text.unescape()?);
                    }
                }
                Event::CData(cdata) => {
                    if let Some(top) = stack.last_mut() {
                        let raw = cdata.into_inner();
                        top.text.push_str(std::str::from_utf8(&raw)?);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.pop() {
            return Err(ParseError::Unclosed(open.name));
        }

        root.map(|root| Self { root }).ok_or(ParseError::NoRoot)
    }

    pub fn root(&self) -> &Element {
        &self.root
    }
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => return Err(ParseError::MultipleRoots),
        None => *root = Some(element),
    }
    Ok(())
}
