//! Shared strings table lookup

use crate::error::Result;
use crate::xml::read_element;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Part names tried, in order, when loading the table
pub const SHARED_STRINGS_PARTS: [&str; 2] = ["xl/sharedStrings.xml", "xl/SharedStrings.xml"];

/// Document-wide table of deduplicated strings, addressed by index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharedStringTable {
    strings: Vec<String>,
}

impl SharedStringTable {
    /// Parse `xl/sharedStrings.xml`
    ///
    /// Each `<si>` contributes its visible text: plain `<t>` content or the
    /// concatenated runs of a rich string.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        let mut buf = Vec::new();
        let mut strings = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) if e.local_name().as_ref() == b"si" => {
                    let si = read_element(&mut reader, &e, false)?;
                    strings.push(si.rich_text());
                }
                Event::Empty(e) if e.local_name().as_ref() == b"si" => {
                    strings.push(String::new());
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(SharedStringTable { strings })
    }

    pub fn from_strings<I, S>(strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SharedStringTable {
            strings: strings.into_iter().map(Into::into).collect(),
        }
    }

    /// String at `index`, if the table is that long
    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shared_strings() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="4" uniqueCount="4">
<si><t>Hello</t></si>
<si><r><t>Rich</t></r><r><rPr><b/></rPr><t xml:space="preserve"> text</t></r></si>
<si/>
<si><t>A &amp; B</t></si>
</sst>"#;
        let sst = SharedStringTable::parse(xml.as_bytes()).unwrap();

        assert_eq!(sst.len(), 4);
        assert_eq!(sst.get(0), Some("Hello"));
        assert_eq!(sst.get(1), Some("Rich text"));
        assert_eq!(sst.get(2), Some(""));
        assert_eq!(sst.get(3), Some("A & B"));
        assert_eq!(sst.get(4), None);
    }

    #[test]
    fn test_empty_table() {
        let sst = SharedStringTable::parse(b"").unwrap();
        assert!(sst.is_empty());
    }
}
