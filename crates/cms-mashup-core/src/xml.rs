//! Minimal XML tree and XML → JSON conversion.
//!
//! Only the subset of XML the CMS endpoints emit is modelled: elements,
//! attributes, text and CDATA. Declarations, comments, processing
//! instructions and doctypes are skipped on read and never written.
//!
//! The JSON shape follows the conventions of the `xml2js` parser that CMS
//! consumers commonly rely on:
//!
//! - the root element is kept as the single top-level key
//! - child elements are always collected into arrays
//! - attributes live under `$`, text mixed with children under `_`
//! - an element with neither attributes nor children becomes its text

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Value};

/// Key used for attributes in converted JSON.
pub const ATTRIBUTE_KEY: &str = "$";

/// Key used for text content of elements that also carry children or attributes.
pub const TEXT_KEY: &str = "_";

/// A node inside an [`XmlElement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// Nested element
    Element(XmlElement),
    /// Unescaped character data
    Text(String),
}

/// An XML element with its attributes and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Qualified tag name, including any namespace prefix
    pub name: String,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Child nodes in document order
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an empty element.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse a document and return its root element.
    ///
    /// Returns `Ok(None)` when the input holds no element at all.
    ///
    /// # Errors
    ///
    /// Returns error if the document is not well-formed.
    pub fn parse(xml: &str) -> Result<Option<Self>, XmlError> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    return Err(XmlError::Malformed {
                        position: reader.buffer_position(),
                        message: e.to_string(),
                    })
                }
            };

            match event {
                Event::Start(start) => stack.push(element_from_start(&start)?),
                Event::Empty(start) => {
                    let element = element_from_start(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(end) => {
                    let mut element = stack.pop().ok_or_else(|| {
                        XmlError::UnexpectedEnd(String::from_utf8_lossy(end.name().as_ref()).into())
                    })?;
                    element.drop_layout_whitespace();
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| XmlError::Malformed {
                        position: reader.buffer_position(),
                        message: e.to_string(),
                    })?;
                    push_text(&mut stack, &text)?;
                }
                Event::CData(data) => {
                    let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    push_text(&mut stack, &text)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(XmlError::Unclosed(open.name.clone()));
        }

        Ok(root)
    }

    /// First direct child element with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.child_elements().find(|e| e.name == name)
    }

    /// Mutable access to the first direct child element with the given name.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.children.iter_mut().find_map(|node| match node {
            XmlNode::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    /// All direct child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Mutable iterator over direct child elements with the given name.
    pub fn children_named_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut XmlElement> + 'a {
        self.children.iter_mut().filter_map(move |node| match node {
            XmlNode::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    /// Concatenated direct text content.
    #[must_use]
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.children.clear();
        if !text.is_empty() {
            self.children.push(XmlNode::Text(text));
        }
    }

    /// Serialize without declaration or indentation.
    ///
    /// # Errors
    ///
    /// Returns error if the writer fails.
    pub fn to_xml_string(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new(Vec::new());
        self.write_to(&mut writer)?;
        String::from_utf8(writer.into_inner()).map_err(|e| XmlError::Write(e.to_string()))
    }

    fn write_to(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), XmlError> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        write_event(writer, Event::Start(start))?;

        for child in &self.children {
            match child {
                XmlNode::Element(e) => e.write_to(writer)?,
                XmlNode::Text(t) => {
                    write_event(writer, Event::Text(BytesText::from_escaped(partial_escape(t))))?;
                }
            }
        }

        write_event(writer, Event::End(BytesEnd::new(self.name.as_str())))
    }

    /// Indentation between child elements is not content.
    fn drop_layout_whitespace(&mut self) {
        if self.child_elements().next().is_some() {
            self.children
                .retain(|node| !matches!(node, XmlNode::Text(t) if t.trim().is_empty()));
        }
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), XmlError> {
    writer
        .write_event(event)
        .map_err(|e| XmlError::Write(e.to_string()))
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement, XmlError> {
    let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError::Attribute(e.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError::Attribute(e.to_string()))?;
        element.attributes.push((
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            value.into_owned(),
        ));
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(element));
    } else if root.is_some() {
        return Err(XmlError::MultipleRoots(element.name));
    } else {
        *root = Some(element);
    }
    Ok(())
}

fn push_text(stack: &mut [XmlElement], text: &str) -> Result<(), XmlError> {
    let Some(parent) = stack.last_mut() else {
        if text.trim().is_empty() {
            return Ok(());
        }
        return Err(XmlError::TextOutsideRoot);
    };

    if let Some(XmlNode::Text(previous)) = parent.children.last_mut() {
        previous.push_str(text);
    } else {
        parent.children.push(XmlNode::Text(text.to_string()));
    }
    Ok(())
}

/// Parse XML into JSON, renaming every tag through `tag_name`.
///
/// An empty document converts to `Value::Null`.
///
/// # Errors
///
/// Returns error if the document is not well-formed.
///
/// # Examples
///
/// ```
/// use cms_mashup_core::xml_to_json;
///
/// let json = xml_to_json("<a:root><a:id>7</a:id></a:root>", |n| n.replacen("a:", "", 1)).unwrap();
/// assert_eq!(json["root"]["id"][0], "7");
/// ```
pub fn xml_to_json<F>(xml: &str, tag_name: F) -> Result<Value, XmlError>
where
    F: Fn(&str) -> String,
{
    let Some(root) = XmlElement::parse(xml)? else {
        return Ok(Value::Null);
    };

    let mut document = Map::new();
    document.insert(tag_name(&root.name), element_to_json(&root, &tag_name));
    Ok(Value::Object(document))
}

fn element_to_json<F>(element: &XmlElement, tag_name: &F) -> Value
where
    F: Fn(&str) -> String,
{
    let text = element.text();
    let has_children = element.child_elements().next().is_some();

    if element.attributes.is_empty() && !has_children {
        return Value::String(text);
    }

    let mut object = Map::new();

    if !element.attributes.is_empty() {
        let attributes = element
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        object.insert(ATTRIBUTE_KEY.to_string(), Value::Object(attributes));
    }

    if !text.trim().is_empty() {
        object.insert(TEXT_KEY.to_string(), Value::String(text));
    }

    for child in element.child_elements() {
        let entry = object
            .entry(tag_name(&child.name))
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = entry {
            items.push(element_to_json(child, tag_name));
        }
    }

    Value::Object(object)
}

/// Errors that can occur while reading or writing XML.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum XmlError {
    /// The reader rejected the input
    #[error("malformed XML at byte {position}: {message}")]
    Malformed {
        /// Byte offset reported by the reader
        position: usize,
        /// Reader error message
        message: String,
    },
    /// An attribute could not be decoded
    #[error("invalid attribute: {0}")]
    Attribute(String),
    /// Closing tag without a matching opening tag
    #[error("unexpected closing tag </{0}>")]
    UnexpectedEnd(String),
    /// Document ended inside an element
    #[error("unclosed element <{0}>")]
    Unclosed(String),
    /// A second top-level element was found
    #[error("multiple root elements, second is <{0}>")]
    MultipleRoots(String),
    /// Character data outside the root element
    #[error("text outside of root element")]
    TextOutsideRoot,
    /// Serialization failed
    #[error("XML write error: {0}")]
    Write(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keep(name: &str) -> String {
        name.to_string()
    }

    #[test]
    fn parse_nested_elements() {
        let root = XmlElement::parse("<a><b>1</b><b>2</b><c x=\"y\"/></a>")
            .unwrap()
            .unwrap();
        assert_eq!(root.name, "a");
        assert_eq!(root.child_elements().count(), 3);
        assert_eq!(root.child("b").unwrap().text(), "1");
        assert_eq!(root.child("c").unwrap().attributes[0], ("x".into(), "y".into()));
    }

    #[test]
    fn parse_skips_declaration_and_layout() {
        let xml = "<?xml version=\"1.0\"?>\n<a>\n  <b>text</b>\n</a>\n";
        let root = XmlElement::parse(xml).unwrap().unwrap();
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.to_xml_string().unwrap(), "<a><b>text</b></a>");
    }

    #[test]
    fn parse_empty_document() {
        assert_eq!(XmlElement::parse("").unwrap(), None);
        assert_eq!(XmlElement::parse("  \n").unwrap(), None);
    }

    #[test]
    fn parse_rejects_mismatched_tags() {
        assert!(XmlElement::parse("<a><b>x</a>").is_err());
    }

    #[test]
    fn parse_rejects_unclosed() {
        assert!(XmlElement::parse("<a><b>x</b>").is_err());
    }

    #[test]
    fn parse_rejects_plain_text() {
        assert!(XmlElement::parse("service unavailable").is_err());
    }

    #[test]
    fn parse_rejects_second_root() {
        assert!(matches!(
            XmlElement::parse("<a/><b/>"),
            Err(XmlError::MultipleRoots(name)) if name == "b"
        ));
    }

    #[test]
    fn text_is_unescaped_and_reescaped() {
        let root = XmlElement::parse("<a>x &amp; y &lt; z</a>").unwrap().unwrap();
        assert_eq!(root.text(), "x & y < z");
        assert_eq!(root.to_xml_string().unwrap(), "<a>x &amp; y &lt; z</a>");
    }

    #[test]
    fn cdata_becomes_text() {
        let root = XmlElement::parse("<a><![CDATA[<raw>]]></a>").unwrap().unwrap();
        assert_eq!(root.text(), "<raw>");
    }

    #[test]
    fn set_text_replaces_children() {
        let mut root = XmlElement::parse("<a><b/>old</a>").unwrap().unwrap();
        root.set_text("new");
        assert_eq!(root.to_xml_string().unwrap(), "<a>new</a>");
        root.set_text("");
        assert_eq!(root.to_xml_string().unwrap(), "<a></a>");
    }

    #[test]
    fn json_groups_children_into_arrays() {
        let json = xml_to_json("<r><i>1</i><i>2</i><j>3</j></r>", keep).unwrap();
        assert_eq!(json, json!({"r": {"i": ["1", "2"], "j": ["3"]}}));
    }

    #[test]
    fn json_attributes_and_mixed_text() {
        let json = xml_to_json("<r id=\"9\">hello<i/></r>", keep).unwrap();
        assert_eq!(json, json!({"r": {"$": {"id": "9"}, "_": "hello", "i": [""]}}));
    }

    #[test]
    fn json_tag_processor_applies_to_every_tag() {
        let json = xml_to_json(
            "<auth:info><auth:id>x</auth:id></auth:info>",
            |n: &str| n.replacen("auth:", "", 1),
        )
        .unwrap();
        assert_eq!(json, json!({"info": {"id": ["x"]}}));
    }

    #[test]
    fn json_empty_document_is_null() {
        assert_eq!(xml_to_json("", keep).unwrap(), Value::Null);
    }
}
