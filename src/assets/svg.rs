//! Mutable vector-markup tree.
//!
//! Templates are parsed into an ordered [`Document`] of [`Node`]s, mutated
//! through [`NodePath`]s, and written back out without re-indenting, so
//! every node the pipeline does not touch survives byte-for-byte.

use quick_xml::escape::{escape, partial_escape, resolve_predefined_entity};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::{error::SyncError, Result};


#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    Decl(String),
    Pi(String),
    DocType(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute in place, appending it if absent.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    /// Concatenated text and CDATA content of the direct children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                Node::Text(t) | Node::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace all non-element content with a single text or CDATA node.
    ///
    /// Child elements are kept, and the new content takes the position of
    /// the first replaced node (or the front when there was none).
    pub fn replace_content(&mut self, content: Node) {
        let at = self
            .children
            .iter()
            .position(|c| matches!(c, Node::Text(_) | Node::CData(_)))
            .unwrap_or(0);
        self.children
            .retain(|c| !matches!(c, Node::Text(_) | Node::CData(_)));
        let at = at.min(self.children.len());
        self.children.insert(at, content);
    }

    fn nth_child_mut(&mut self, name: &str, index: usize) -> Option<&mut Element> {
        self.children
            .iter_mut()
            .filter_map(|c| match c {
                Node::Element(e) if e.name == name => Some(e),
                _ => None,
            })
            .nth(index)
    }
}

/// A parsed markup document: prolog, root element and anything after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl Document {
    /// Parse `markup`. Entities declared in the DOCTYPE internal subset are
    /// expanded along with the predefined ones.
    pub fn parse(markup: &str) -> Result<Self> {
        let mut reader = Reader::from_str(markup);
        let mut stack: Vec<Element> = Vec::new();
        let mut top: Vec<Node> = Vec::new();
        let mut entities: HashMap<String, String> = HashMap::new();

        loop {
            let pos = reader.buffer_position();
            let event = reader.read_event().map_err(|e| SyncError::TemplateParse {
                message: format!("at byte {pos}: {e}"),
            })?;

            let node = match event {
                Event::Start(e) => {
                    stack.push(element_from(&e, &entities)?);
                    continue;
                }
                Event::End(_) => match stack.pop() {
                    Some(element) => Node::Element(element),
                    None => {
                        return Err(SyncError::TemplateParse {
                            message: format!("unexpected closing tag at byte {pos}"),
                        })
                    }
                },
                Event::Empty(e) => Node::Element(element_from(&e, &entities)?),
                Event::Text(e) => Node::Text(
                    e.unescape_with(|name| resolve_entity(&entities, name))
                        .map_err(|err| SyncError::TemplateParse {
                            message: format!("at byte {pos}: {err}"),
                        })?
                        .into_owned(),
                ),
                Event::CData(e) => Node::CData(utf8(&e)?),
                Event::Comment(e) => Node::Comment(utf8(&e)?),
                Event::Decl(e) => Node::Decl(utf8(&e)?),
                Event::PI(e) => Node::Pi(utf8(&e)?),
                Event::DocType(e) => {
                    let decl = utf8(&e)?;
                    entities.extend(doctype_entities(&decl));
                    Node::DocType(decl)
                }
                Event::Eof => break,
                #[allow(unreachable_patterns)]
                _ => continue,
            };

            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => top.push(node),
            }
        }

        if let Some(open) = stack.last() {
            return Err(SyncError::TemplateParse {
                message: format!("unclosed <{}>", open.name),
            });
        }

        let doc = Self { nodes: top };
        if doc.root().is_none() {
            return Err(SyncError::TemplateParse {
                message: "document has no root element".to_string(),
            });
        }
        Ok(doc)
    }

    pub fn root(&self) -> Option<&Element> {
        self.nodes.iter().find_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn root_mut(&mut self) -> Option<&mut Element> {
        self.nodes.iter_mut().find_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Resolve `path` below the root element.
    pub fn get(&self, path: &NodePath) -> Result<&Element> {
        let mut current = self
            .root()
            .ok_or_else(|| SyncError::template_shape(path.to_string(), "no root element"))?;
        for (depth, segment) in path.segments.iter().enumerate() {
            let matches: Vec<&Element> = current
                .children
                .iter()
                .filter_map(|c| match c {
                    Node::Element(e) if e.name == segment.name => Some(e),
                    _ => None,
                })
                .collect();
            current = segment
                .select(&matches)
                .map_err(|reason| SyncError::template_shape(path.prefix(depth + 1), reason))?;
        }
        Ok(current)
    }

    /// Mutable counterpart of [`Document::get`].
    pub fn get_mut(&mut self, path: &NodePath) -> Result<&mut Element> {
        // Validate (and produce precise errors) with the shared walk first.
        self.get(path)?;
        let mut current = self
            .root_mut()
            .ok_or_else(|| SyncError::template_shape(path.to_string(), "no root element"))?;
        for (depth, segment) in path.segments.iter().enumerate() {
            current = current
                .nth_child_mut(&segment.name, segment.index.unwrap_or(0))
                .ok_or_else(|| {
                    SyncError::template_shape(path.prefix(depth + 1), "node disappeared")
                })?;
        }
        Ok(current)
    }

    pub fn read(&self, path: &NodePath, target: Target) -> Result<String> {
        let element = self.get(path)?;
        match target {
            Target::Text | Target::CData => Ok(element.text()),
            Target::Attribute(name) => element.attribute(name).map(str::to_string).ok_or_else(|| {
                SyncError::template_shape(path.to_string(), format!("missing attribute {name}"))
            }),
        }
    }

    pub fn write(&mut self, path: &NodePath, target: Target, value: impl Into<String>) -> Result<()> {
        let element = self.get_mut(path)?;
        let value = value.into();
        match target {
            Target::Text => element.replace_content(Node::Text(value)),
            Target::CData => element.replace_content(Node::CData(value)),
            Target::Attribute(name) => element.set_attribute(name, value),
        }
        Ok(())
    }

    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            write_node(&mut out, node);
        }
        out
    }
}

impl FromStr for Document {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markup())
    }
}

/// Which part of an element a binding reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Text,
    CData,
    Attribute(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub name: String,
    /// Position among same-named siblings. `None` requires exactly one.
    pub index: Option<usize>,
}

impl PathSegment {
    fn select<'a>(&self, matches: &[&'a Element]) -> std::result::Result<&'a Element, String> {
        match self.index {
            None if matches.len() == 1 => Ok(matches[0]),
            None => Err(format!(
                "expected exactly one <{}>, found {}",
                self.name,
                matches.len()
            )),
            Some(i) => matches.get(i).copied().ok_or_else(|| {
                format!("no <{}>[{i}], found {}", self.name, matches.len())
            }),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}[{i}]", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Slash-separated element path relative to the root, e.g.
/// `g[4]/g[3]/text[0]/tspan`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath {
    pub segments: Vec<PathSegment>,
}

impl NodePath {
    fn prefix(&self, len: usize) -> String {
        self.segments[..len]
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl FromStr for NodePath {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SyncError::InvalidPath {
            path: s.to_string(),
        };

        let mut segments = Vec::new();
        for raw in s.split('/') {
            let raw = raw.trim();
            let (name, index) = match raw.split_once('[') {
                Some((name, rest)) => {
                    let digits = rest.strip_suffix(']').ok_or_else(invalid)?;
                    (name, Some(digits.parse::<usize>().map_err(|_| invalid())?))
                }
                None => (raw, None),
            };
            if name.is_empty() || name.contains(']') {
                return Err(invalid());
            }
            segments.push(PathSegment {
                name: name.to_string(),
                index,
            });
        }
        Ok(Self { segments })
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix(self.segments.len()))
    }
}

fn utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| SyncError::TemplateParse {
        message: e.to_string(),
    })
}

fn resolve_entity<'e>(entities: &'e HashMap<String, String>, name: &str) -> Option<&'e str> {
    resolve_predefined_entity(name).or_else(|| entities.get(name).map(String::as_str))
}

/// General entities declared in a DOCTYPE internal subset, e.g.
/// `<!ENTITY ns_svg "http://www.w3.org/2000/svg">`.
fn doctype_entities(decl: &str) -> Vec<(String, String)> {
    const OPEN: &str = "<!ENTITY";

    let mut out = Vec::new();
    let mut rest = decl;
    while let Some(at) = rest.find(OPEN) {
        rest = rest[at + OPEN.len()..].trim_start();
        // Parameter entities only matter inside the DTD itself.
        if rest.starts_with('%') {
            continue;
        }
        let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let (name, tail) = rest.split_at(name_end);
        let tail = tail.trim_start();
        let Some(quote) = tail.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            rest = tail;
            continue;
        };
        let body = &tail[1..];
        let Some(end) = body.find(quote) else {
            break;
        };
        out.push((name.to_string(), body[..end].to_string()));
        rest = &body[end + 1..];
    }
    out
}

fn element_from(start: &BytesStart<'_>, entities: &HashMap<String, String>) -> Result<Element> {
    let mut element = Element::new(utf8(start.name().as_ref())?);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| SyncError::TemplateParse {
            message: e.to_string(),
        })?;
        let key = utf8(attr.key.as_ref())?;
        let value = attr
            .unescape_value_with(|name| resolve_entity(entities, name))
            .map_err(|e| SyncError::TemplateParse {
                message: e.to_string(),
            })?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Element(e) => write_element(out, e),
        Node::Text(t) => out.push_str(&partial_escape(t.as_str())),
        Node::CData(t) => {
            out.push_str("<![CDATA[");
            out.push_str(&t.replace("]]>", "]]]]><![CDATA[>"));
            out.push_str("]]>");
        }
        Node::Comment(t) => {
            out.push_str("<!--");
            out.push_str(t);
            out.push_str("-->");
        }
        Node::Decl(t) | Node::Pi(t) => {
            out.push_str("<?");
            out.push_str(t);
            out.push_str("?>");
        }
        Node::DocType(t) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(t.trim_start());
            out.push('>');
        }
    }
}

fn write_element(out: &mut String, e: &Element) {
    out.push('<');
    out.push_str(&e.name);
    for (k, v) in &e.attributes {
        out.push(' ');
        out.push_str(k);
        out.push_str("=\"");
        out.push_str(&escape(v.as_str()));
        out.push('"');
    }
    if e.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &e.children {
        write_node(out, child);
    }
    out.push_str("</");
    out.push_str(&e.name);
    out.push('>');
}
