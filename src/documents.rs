//! XML document handling
//!
//! This module turns schema files into an element tree with resolved
//! namespaces and source positions. It is intentionally small: schema
//! documents only need elements, attributes and (documentation) text.

use crate::error::{Diagnostic, Position, Result};
use crate::limits::Limits;
use crate::namespaces::{NamespaceContext, QName};
use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// XML Element in the document tree
#[derive(Debug, Clone)]
pub struct Element {
    /// Element qualified name
    pub qname: QName,
    /// Element attributes keyed by their lexical name, in source order
    pub attributes: IndexMap<String, String>,
    /// Text content (if any)
    pub text: Option<String>,
    /// Child elements
    pub children: Vec<Element>,
    /// In-scope namespace bindings for this element
    pub namespaces: NamespaceContext,
    /// Position of the start tag
    pub position: Position,
}

impl Element {
    /// Create a new element
    pub fn new(qname: QName) -> Self {
        Self {
            qname,
            attributes: IndexMap::new(),
            text: None,
            children: Vec::new(),
            namespaces: NamespaceContext::new(),
            position: Position::default(),
        }
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.qname.local_name
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.qname.namespace.as_deref()
    }

    /// Get an attribute value by lexical name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Append text content
    pub fn push_text(&mut self, text: &str) {
        match self.text {
            Some(ref mut existing) => existing.push_str(text),
            None => self.text = Some(text.to_string()),
        }
    }

    /// Find child elements by local name
    pub fn find_children(&self, local_name: &str) -> Vec<&Element> {
        self.children
            .iter()
            .filter(|e| e.local_name() == local_name)
            .collect()
    }

    /// First child element with the given local name
    pub fn find_child(&self, local_name: &str) -> Option<&Element> {
        self.children.iter().find(|e| e.local_name() == local_name)
    }

    /// All descendant text, concatenated in document order
    pub fn deep_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(ref text) = self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }
}

/// XML Document representation
#[derive(Debug)]
pub struct Document {
    /// Root element of the document
    pub root: Option<Element>,
}

impl Document {
    /// Parse an XML document from a string with default limits
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml, None, &Limits::default())
    }

    /// Parse an XML document, attributing errors to `location`
    pub fn parse(xml: &str, location: Option<&str>, limits: &Limits) -> Result<Self> {
        let at = |message: String, offset: usize| {
            let mut diag = Diagnostic::parse(message).with_position(Position::from_offset(xml, offset));
            if let Some(loc) = location {
                diag = diag.with_location(loc);
            }
            diag
        };

        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut root: Option<Element> = None;
        let mut element_stack: Vec<Element> = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let end = reader.buffer_position();
                    let start = end.saturating_sub(e.len() + 2);
                    let parent_ns = element_stack.last().map(|p| &p.namespaces);
                    let element = Self::parse_element(&e, parent_ns, Position::from_offset(xml, start))
                        .map_err(|d| at(d.message, start))?;
                    if root.is_some() && element_stack.is_empty() {
                        return Err(at("Content after the root element".to_string(), start).into());
                    }
                    element_stack.push(element);
                    limits
                        .check_xml_depth(element_stack.len())
                        .map_err(|e| at(e.to_string(), start))?;
                }
                Ok(Event::End(_)) => {
                    if let Some(current) = element_stack.pop() {
                        if let Some(parent) = element_stack.last_mut() {
                            parent.add_child(current);
                        } else {
                            root = Some(current);
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    let end = reader.buffer_position();
                    let start = end.saturating_sub(e.len() + 3);
                    let parent_ns = element_stack.last().map(|p| &p.namespaces);
                    let element = Self::parse_element(&e, parent_ns, Position::from_offset(xml, start))
                        .map_err(|d| at(d.message, start))?;
                    if let Some(parent) = element_stack.last_mut() {
                        parent.add_child(element);
                    } else if root.is_some() {
                        return Err(at("Content after the root element".to_string(), start).into());
                    } else {
                        root = Some(element);
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = e
                            .unescape()
                            .map_err(|err| at(format!("Failed to unescape text: {}", err), reader.buffer_position()))?;
                        if !text.trim().is_empty() {
                            current.push_text(&text);
                        }
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        current.push_text(&String::from_utf8_lossy(&e));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(at(format!("Malformed XML: {}", e), reader.buffer_position()).into());
                }
                _ => {} // Ignore other events (comments, processing instructions, etc.)
            }
        }

        if let Some(open) = element_stack.last() {
            return Err(at(
                format!("Unexpected end of document: element '{}' is not closed", open.local_name()),
                xml.len(),
            )
            .into());
        }

        if root.is_none() {
            return Err(at("Document has no root element".to_string(), 0).into());
        }

        Ok(Document { root })
    }

    /// Parse element from BytesStart event
    fn parse_element(
        start: &BytesStart,
        parent_ns: Option<&NamespaceContext>,
        position: Position,
    ) -> std::result::Result<Element, Diagnostic> {
        let name_bytes = start.name();
        let name = std::str::from_utf8(name_bytes.as_ref())
            .map_err(|e| Diagnostic::parse(format!("Invalid element name: {}", e)))?
            .to_string();

        let mut namespaces = parent_ns.cloned().unwrap_or_default();
        let mut attributes = IndexMap::new();

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Diagnostic::parse(format!("Failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Diagnostic::parse(format!("Invalid attribute name: {}", e)))?
                .to_string();

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Diagnostic::parse(format!("Failed to unescape attribute value: {}", e)))?
                .to_string();

            if attr_name == "xmlns" {
                namespaces.set_default_namespace(attr_value);
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                namespaces.add_prefix(prefix, attr_value);
            } else {
                attributes.insert(attr_name, attr_value);
            }
        }

        let qname = namespaces.resolve(&name)?;

        Ok(Element {
            qname,
            attributes,
            text: None,
            children: Vec::new(),
            namespaces,
            position,
        })
    }

    /// Get the root element
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_parse_simple_xml() {
        let xml = r#"<root><child>text</child></root>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root.unwrap();
        assert_eq!(root.local_name(), "root");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].local_name(), "child");
        assert_eq!(root.children[0].text.as_deref(), Some("text"));
    }

    #[test]
    fn test_parse_with_attributes_in_order() {
        let xml = r#"<root b="2" a="1"><child/></root>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root.unwrap();
        assert_eq!(root.get_attribute("a"), Some("1"));
        let keys: Vec<_> = root.attributes.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_namespaces_are_inherited_and_resolved() {
        let xml = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns="urn:d">
            <xs:element name="a"/>
            <plain/>
        </xs:schema>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root.unwrap();
        assert_eq!(root.namespace(), Some("http://www.w3.org/2001/XMLSchema"));
        assert_eq!(root.children[0].namespace(), Some("http://www.w3.org/2001/XMLSchema"));
        assert_eq!(root.children[0].namespaces.get_default_namespace(), Some("urn:d"));
        assert_eq!(root.children[1].namespace(), Some("urn:d"));
    }

    #[test]
    fn test_positions_are_recorded() {
        let xml = "<root>\n  <child/>\n  <other></other>\n</root>";
        let doc = Document::from_string(xml).unwrap();
        let root = doc.root.unwrap();
        assert_eq!(root.position, Position::new(1, 1));
        assert_eq!(root.children[0].position, Position::new(2, 3));
        assert_eq!(root.children[1].position, Position::new(3, 3));
    }

    #[test]
    fn test_mismatched_end_tag_is_parse_error() {
        let xml = "<root>\n<a></b>\n</root>";
        let err = Document::parse(xml, Some("bad.xsd"), &Limits::default()).unwrap_err();
        match err {
            Error::Parse(diag) => {
                assert_eq!(diag.location.as_deref(), Some("bad.xsd"));
                assert_eq!(diag.position.map(|p| p.line), Some(2));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_unclosed_root_is_parse_error() {
        let err = Document::from_string("<root><a/>").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_unknown_prefix_is_parse_error() {
        let err = Document::from_string("<x:root/>").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_depth_limit() {
        let mut limits = Limits::default();
        limits.max_xml_depth = 2;
        let err = Document::parse("<a><b><c/></b></a>", None, &limits);
        assert!(err.is_ok());
        let err = Document::parse("<a><b><c></c></b></a>", None, &limits).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_deep_text() {
        let xml = "<doc><p>One</p><p>Two<![CDATA[ & more]]></p></doc>";
        let doc = Document::from_string(xml).unwrap();
        assert_eq!(doc.root.unwrap().deep_text(), "OneTwo & more");
    }
}
