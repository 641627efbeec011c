//! Output side of worksheet flushing
//!
//! `write_worksheet` streams rows, cells and merged regions through an
//! `XmlWriter`. Markup kept verbatim from the source part, such as the
//! prolog before `<sheetData>` and trailing elements like `<pageSetup>`,
//! goes through `write_raw` untouched; everything built from the row model
//! is escaped on the way out.

use crate::error::Result;
use std::io::Write;

/// Pending bytes are handed to the sink once the buffer grows past this
const SPILL_THRESHOLD: usize = 4096;

/// Buffered writer for worksheet markup
///
/// Rows and cells produce many short writes; they collect in a buffer that
/// spills into the sink in chunks.
pub struct XmlWriter<W: Write> {
    sink: W,
    pending: Vec<u8>,
}

impl<W: Write> XmlWriter<W> {
    pub fn new(sink: W) -> Self {
        XmlWriter {
            sink,
            pending: Vec::with_capacity(2 * SPILL_THRESHOLD),
        }
    }

    /// Append bytes as they are, e.g. a preserved prolog or trailing element
    #[inline]
    pub fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.pending.extend_from_slice(data);
        self.spill_if_full()
    }

    #[inline]
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.write_raw(s.as_bytes())
    }

    /// Open a start tag (`<name`); finish it with `close_start_tag` or `close_empty_tag`
    #[inline]
    pub fn start_element(&mut self, name: &str) -> Result<()> {
        self.write_raw(b"<")?;
        self.write_str(name)
    }

    #[inline]
    pub fn end_element(&mut self, name: &str) -> Result<()> {
        self.write_raw(b"</")?;
        self.write_str(name)?;
        self.write_raw(b">")
    }

    /// ` name="value"` with the value escaped
    #[inline]
    pub fn attribute(&mut self, name: &str, value: &str) -> Result<()> {
        self.write_raw(b" ")?;
        self.write_str(name)?;
        self.write_raw(b"=\"")?;
        self.write_escaped(value)?;
        self.write_raw(b"\"")
    }

    /// Numeric attribute such as a row number or style index
    #[inline]
    pub fn attribute_u32(&mut self, name: &str, value: u32) -> Result<()> {
        let mut digits = itoa::Buffer::new();
        self.write_raw(b" ")?;
        self.write_str(name)?;
        self.write_raw(b"=\"")?;
        self.write_str(digits.format(value))?;
        self.write_raw(b"\"")
    }

    #[inline]
    pub fn close_start_tag(&mut self) -> Result<()> {
        self.write_raw(b">")
    }

    #[inline]
    pub fn close_empty_tag(&mut self) -> Result<()> {
        self.write_raw(b"/>")
    }

    /// `<name>text</name>`, e.g. a cell's `<v>`
    pub fn text_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.start_element(name)?;
        self.close_start_tag()?;
        self.write_escaped(text)?;
        self.end_element(name)
    }

    /// Cell values and attribute text; the five predefined entities are escaped
    #[inline]
    pub fn write_escaped(&mut self, text: &str) -> Result<()> {
        for byte in text.bytes() {
            match byte {
                b'&' => self.pending.extend_from_slice(b"&amp;"),
                b'<' => self.pending.extend_from_slice(b"&lt;"),
                b'>' => self.pending.extend_from_slice(b"&gt;"),
                b'"' => self.pending.extend_from_slice(b"&quot;"),
                b'\'' => self.pending.extend_from_slice(b"&apos;"),
                _ => self.pending.push(byte),
            }
        }
        self.spill_if_full()
    }

    fn spill_if_full(&mut self) -> Result<()> {
        if self.pending.len() > SPILL_THRESHOLD {
            self.spill()?;
        }
        Ok(())
    }

    fn spill(&mut self) -> Result<()> {
        if !self.pending.is_empty() {
            self.sink.write_all(&self.pending)?;
            self.pending.clear();
        }
        Ok(())
    }

    /// Hand everything written so far to the sink
    pub fn flush(&mut self) -> Result<()> {
        self.spill()?;
        self.sink.flush()?;
        Ok(())
    }
}
