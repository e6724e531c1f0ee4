//! Minimal element tree built from quick-xml events.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::CodecError;

/// An element with prefixes stripped from its name and attribute names.
#[derive(Debug, Default)]
pub(crate) struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// Parse a document and return its root element.
    pub fn parse(data: &[u8]) -> Result<XmlNode, CodecError> {
        let mut reader = Reader::from_reader(data);
        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    stack.push(Self::open(&start)?);
                }
                Event::Empty(start) => {
                    let node = Self::open(&start)?;
                    Self::attach(&mut stack, &mut root, node);
                }
                Event::End(_) => {
                    let node = stack.pop().ok_or_else(|| CodecError::Xml {
                        message: "unbalanced closing tag".to_string(),
                    })?;
                    Self::attach(&mut stack, &mut root, node);
                }
                Event::Text(text) => {
                    if let Some(node) = stack.last_mut() {
                        node.text.push_str(&text.unescape()?);
                    }
                }
                Event::CData(data) => {
                    if let Some(node) = stack.last_mut() {
                        node.text.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(CodecError::Xml {
                message: format!("unclosed element <{}>", stack[stack.len() - 1].name),
            });
        }

        root.ok_or(CodecError::EmptyDocument)
    }

    fn open(start: &BytesStart<'_>) -> Result<XmlNode, CodecError> {
        let mut node = XmlNode {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            ..XmlNode::default()
        };

        for attribute in start.attributes() {
            let attribute = attribute?;
            if attribute.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
            let value = attribute.unescape_value()?.into_owned();
            node.attributes.push((key, value));
        }

        Ok(node)
    }

    fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => {
                if root.is_none() {
                    *root = Some(node);
                }
            }
        }
    }

    /// Attribute value by local name, or `""`.
    pub fn attr(&self, name: &str) -> &str {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }

    /// Boolean attribute; only `true` and `1` count as set.
    pub fn attr_bool(&self, name: &str) -> bool {
        matches!(self.attr(name), "true" | "1")
    }

    /// First child with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Text of the first child with the given local name, or `""`.
    pub fn child_text(&self, name: &str) -> &str {
        self.child(name).map(|child| child.text.as_str()).unwrap_or("")
    }

    /// All children with the given local name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }
}
