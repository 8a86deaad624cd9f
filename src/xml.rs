use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{ConvertError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

#[derive(Debug, Clone)]
pub struct Document {
    pub root: Element,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Concatenated text of the element and all its descendants.
    pub fn string_value(&self) -> String {
        fn collect(elem: &Element, out: &mut String) {
            for child in &elem.children {
                match child {
                    XmlNode::Text(t) => out.push_str(t),
                    XmlNode::Element(e) => collect(e, out),
                }
            }
        }
        let mut out = String::new();
        collect(self, &mut out);
        out
    }
}

/// Parse an XML document into an owned tree.
///
/// Comments, the XML declaration, doctypes, and processing instructions are
/// skipped; whitespace-only text nodes are dropped.
pub fn parse_str(input: &str) -> Result<Document> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                stack.push(element_from_start(&start)?);
            }
            Event::Empty(start) => {
                let elem = element_from_start(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Element(elem)),
                    None => place_root(&mut root, elem)?,
                }
            }
            Event::End(_) => {
                let elem = stack
                    .pop()
                    .ok_or_else(|| ConvertError::Parse("unbalanced closing tag".into()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Element(elem)),
                    None => place_root(&mut root, elem)?,
                }
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|err| ConvertError::Parse(err.to_string()))?;
                if !text.trim().is_empty() {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Text(text.into_owned()));
                    }
                }
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::Text(text));
                }
            }
            Event::Eof => break,
            // Decl, Comment, PI, DocType carry nothing the transform needs.
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ConvertError::Parse("unclosed element at end of input".into()));
    }
    root.map(|root| Document { root })
        .ok_or_else(|| ConvertError::Parse("document has no root element".into()))
}

fn place_root(root: &mut Option<Element>, elem: Element) -> Result<()> {
    if root.is_some() {
        return Err(ConvertError::Parse("multiple root elements".into()));
    }
    *root = Some(elem);
    Ok(())
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| ConvertError::Parse(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| ConvertError::Parse(err.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
    })
}
