//! Owned XML element tree and element-scoped decoding
//!
//! Worksheet parts carry far more markup than the row engine models. Cell
//! children such as `<f>`, `<is>` and `<extLst>` are kept as [`XmlElement`]
//! trees so they survive a parse/serialize cycle untouched.

use crate::error::{ExcelError, Result};
use crate::xml_writer::XmlWriter;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{BufRead, Write};

/// An element with its attributes and children, in document order
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XmlElement {
    /// Qualified name as written (`"t"`, `"x14:foo"`)
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

/// Child of an [`XmlElement`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        XmlElement {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Name without namespace prefix
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    /// Look up an attribute by its qualified name
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Concatenated direct text children
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            if let XmlNode::Text(t) = child {
                out.push_str(t);
            }
        }
        out
    }

    /// Visible text of a rich-text container (`<si>`, `<is>`)
    ///
    /// Concatenates `<t>` runs, directly or inside `<r>`. Phonetic runs
    /// (`<rPh>`) are not part of the displayed string and are skipped.
    pub fn rich_text(&self) -> String {
        let mut out = String::new();
        collect_rich_text(self, &mut out);
        out
    }
}

fn collect_rich_text(element: &XmlElement, out: &mut String) {
    for child in &element.children {
        if let XmlNode::Element(el) = child {
            match el.local_name() {
                "t" => out.push_str(&el.text()),
                "r" => collect_rich_text(el, out),
                _ => {}
            }
        }
    }
}

/// Qualified name of a start tag as an owned string
pub(crate) fn element_name(start: &BytesStart) -> Result<String> {
    Ok(std::str::from_utf8(start.name().as_ref())?.to_string())
}

/// All attributes of a start tag, unescaped, in document order
pub(crate) fn read_attributes(start: &BytesStart) -> Result<Vec<(String, String)>> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let value = attr
            .unescape_value()
            .map_err(quick_xml::Error::from)?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(attributes)
}

/// Value of the attribute whose qualified name is exactly `key`
pub(crate) fn attribute_value(start: &BytesStart, key: &[u8]) -> Result<Option<String>> {
    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key {
            let value = attr.unescape_value().map_err(quick_xml::Error::from)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Value of the first attribute whose local name is `local`
pub(crate) fn attribute_by_local_name(start: &BytesStart, local: &[u8]) -> Result<Option<String>> {
    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == local {
            let value = attr.unescape_value().map_err(quick_xml::Error::from)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Decode the element opened by `start` into an owned tree
///
/// `empty` is true when `start` came from a self-closing tag; the reader is
/// then left untouched. Otherwise the reader is advanced past the matching
/// end tag.
pub(crate) fn read_element<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    empty: bool,
) -> Result<XmlElement> {
    let root = XmlElement {
        name: element_name(start)?,
        attributes: read_attributes(start)?,
        children: Vec::new(),
    };
    if empty {
        return Ok(root);
    }

    let mut stack = vec![root];
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => stack.push(XmlElement {
                name: element_name(&e)?,
                attributes: read_attributes(&e)?,
                children: Vec::new(),
            }),
            Event::Empty(e) => {
                let child = XmlElement {
                    name: element_name(&e)?,
                    attributes: read_attributes(&e)?,
                    children: Vec::new(),
                };
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::Element(child));
                }
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(quick_xml::Error::from)?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::Text(text.into_owned()));
                }
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c).into_owned();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::Text(text));
                }
            }
            Event::End(_) => {
                if let Some(done) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XmlNode::Element(done)),
                        None => return Ok(done),
                    }
                }
            }
            Event::Eof => {
                let name = stack.first().map(|e| e.name.clone()).unwrap_or_default();
                return Err(ExcelError::ReadError(format!(
                    "unexpected end of XML inside <{}>",
                    name
                )));
            }
            _ => {}
        }
        buf.clear();
    }
}

/// Serialize an element tree
pub(crate) fn write_element<W: Write>(writer: &mut XmlWriter<W>, element: &XmlElement) -> Result<()> {
    writer.start_element(&element.name)?;
    for (key, value) in &element.attributes {
        writer.attribute(key, value)?;
    }
    if element.children.is_empty() {
        return writer.close_empty_tag();
    }
    writer.close_start_tag()?;
    for child in &element.children {
        match child {
            XmlNode::Element(el) => write_element(writer, el)?,
            XmlNode::Text(text) => writer.write_escaped(text)?,
        }
    }
    writer.end_element(&element.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> XmlElement {
        let mut reader = Reader::from_reader(xml.as_bytes());
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf).unwrap() {
                Event::Start(e) => {
                    let e = e.into_owned();
                    return read_element(&mut reader, &e, false).unwrap();
                }
                Event::Empty(e) => {
                    let e = e.into_owned();
                    return read_element(&mut reader, &e, true).unwrap();
                }
                Event::Eof => panic!("no element"),
                _ => {}
            }
            buf.clear();
        }
    }

    #[test]
    fn test_rich_text_skips_phonetic_runs() {
        let el = parse(
            "<si><r><rPr><b/></rPr><t>Hello</t></r><r><t xml:space=\"preserve\"> World</t></r>\
             <rPh sb=\"0\" eb=\"1\"><t>ハロー</t></rPh></si>",
        );
        assert_eq!(el.rich_text(), "Hello World");
    }

    #[test]
    fn test_entities_are_unescaped() {
        let el = parse("<is><t>a &amp; b &lt;c&gt;</t></is>");
        assert_eq!(el.rich_text(), "a & b <c>");
    }

    #[test]
    fn test_element_roundtrip() {
        let el = parse("<f t=\"shared\" ref=\"A1:A3\" si=\"0\">SUM(B1:B2)&amp;\"x\"</f>");
        assert_eq!(el.attribute("t"), Some("shared"));
        assert_eq!(el.text(), "SUM(B1:B2)&\"x\"");

        let mut out = Vec::new();
        let mut writer = XmlWriter::new(&mut out);
        write_element(&mut writer, &el).unwrap();
        writer.flush().unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<f t=\"shared\" ref=\"A1:A3\" si=\"0\">SUM(B1:B2)&amp;&quot;x&quot;</f>"
        );
    }

    #[test]
    fn test_empty_element() {
        let el = parse("<extLst/>");
        assert_eq!(el.local_name(), "extLst");
        assert!(el.children.is_empty());
    }
}
