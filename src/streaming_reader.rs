//! Streaming row reader over serialized worksheet XML
//!
//! The reader never builds the worksheet model. It walks the part bytes with a
//! pull parser and produces one row of display strings per call.
//!
//! **How rows are counted:**
//! - Opening the reader runs one pre-scan over the XML to find the highest
//!   declared row number; that is how many rows the iterator yields
//! - Rows that are not declared in the XML come back as empty rows
//! - Missing cells inside a row come back as empty strings
//!
//! **Error policy:**
//! - [`Rows::columns`] fails on a malformed row number or cell reference
//! - Tokenizer errors end the stream; they are reported by [`Rows::error`]
//! - [`Workbook::get_rows`] stops at the first failure and keeps what it has

use crate::coordinates::cell_name_to_coordinates;
use crate::error::{ExcelError, Result};
use crate::types::{CellData, CellType};
use crate::workbook::Workbook;
use crate::worksheet_xml::{parse_row_number, read_cell};
use crate::xml::attribute_value;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Forward-only iterator over the rows of one worksheet
///
/// Created by [`Workbook::rows`]. Call [`Rows::next_row`] to advance, then
/// [`Rows::columns`] for the cell values of the current row. `Rows` is also an
/// [`Iterator`] that yields `Result<Vec<String>>` per row.
///
/// # Example
///
/// ```no_run
/// use excelrows::Workbook;
///
/// let mut workbook = Workbook::open("data.xlsx")?;
/// let mut rows = workbook.rows("Sheet1")?;
/// while rows.next_row() {
///     let columns = rows.columns()?;
///     println!("{:?}", columns);
/// }
/// if let Some(err) = rows.error() {
///     eprintln!("stopped early: {}", err);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Rows<'a> {
    workbook: &'a Workbook,
    sheet: String,
    decoder: Reader<&'a [u8]>,
    buf: Vec<u8>,
    err: Option<ExcelError>,
    /// Logical row the caller is on, 1-based once `next_row` ran
    cur_row: u32,
    /// Highest row number declared in the XML
    total_row: u32,
    /// Rows up to this number were already answered by a read-ahead
    stash_row: u32,
    /// Number of the last `<row>` start tag seen, for rows without `r`
    last_row: u32,
    /// The read-ahead row was self-closing and has no cells to read
    stash_empty: bool,
}

impl<'a> Rows<'a> {
    pub(crate) fn new(workbook: &'a Workbook, sheet: &str, xml: &'a [u8]) -> Result<Self> {
        let total_row = count_rows(xml)?;
        log::debug!("streaming sheet '{}' with {} rows", sheet, total_row);

        Ok(Rows {
            workbook,
            sheet: sheet.to_string(),
            decoder: Reader::from_reader(xml),
            buf: Vec::new(),
            err: None,
            cur_row: 0,
            total_row,
            stash_row: 0,
            last_row: 0,
            stash_empty: false,
        })
    }

    /// Name of the sheet being read
    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// Number of rows the iterator yields
    pub fn total_rows(&self) -> u32 {
        self.total_row
    }

    /// Advance to the next row; false once past the last declared row
    pub fn next_row(&mut self) -> bool {
        self.cur_row += 1;
        self.cur_row <= self.total_row
    }

    /// Error that ended the token stream, if any
    pub fn error(&self) -> Option<&ExcelError> {
        self.err.as_ref()
    }

    /// Cell values of the current row
    ///
    /// Skipped columns are returned as empty strings. A row that is not
    /// declared in the XML gives an empty vector.
    pub fn columns(&mut self) -> Result<Vec<String>> {
        let mut columns = Vec::new();
        if self.stash_row >= self.cur_row || self.err.is_some() {
            return Ok(columns);
        }
        if self.stash_empty {
            self.stash_empty = false;
            return Ok(columns);
        }

        let mut cell_col = 0u32;
        loop {
            self.buf.clear();
            let event = match self.decoder.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(err) => {
                    self.err = Some(err.into());
                    return Ok(columns);
                }
            };

            match event {
                Event::Start(e) if e.local_name().as_ref() == b"row" => {
                    let number = row_number(&e, self.last_row)?;
                    self.last_row = number;
                    if number > self.cur_row {
                        self.stash_row = number - 1;
                        return Ok(columns);
                    }
                }
                Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                    let number = row_number(&e, self.last_row)?;
                    self.last_row = number;
                    if number > self.cur_row {
                        self.stash_row = number - 1;
                        self.stash_empty = true;
                    }
                    return Ok(columns);
                }
                Event::Start(e) if e.local_name().as_ref() == b"c" => {
                    match read_cell(&mut self.decoder, &e, false) {
                        Ok(cell) => push_value(self.workbook, &mut columns, &mut cell_col, &cell)?,
                        Err(err) => {
                            self.err = Some(err);
                            return Ok(columns);
                        }
                    }
                }
                Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                    match read_cell(&mut self.decoder, &e, true) {
                        Ok(cell) => push_value(self.workbook, &mut columns, &mut cell_col, &cell)?,
                        Err(err) => {
                            self.err = Some(err);
                            return Ok(columns);
                        }
                    }
                }
                Event::End(e) if e.local_name().as_ref() == b"row" => return Ok(columns),
                Event::Eof => return Ok(columns),
                _ => {}
            }
        }
    }
}

impl Iterator for Rows<'_> {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.next_row() {
            return None;
        }
        if let Some(err) = self.err.take() {
            self.cur_row = self.total_row;
            return Some(Err(err));
        }
        // a tokenizer error recorded mid-row discards the partial row
        match self.columns().and_then(|columns| match self.err.take() {
            Some(err) => Err(err),
            None => Ok(columns),
        }) {
            Ok(columns) => Some(Ok(columns)),
            Err(err) => {
                self.cur_row = self.total_row;
                Some(Err(err))
            }
        }
    }
}

fn row_number(start: &quick_xml::events::BytesStart, previous: u32) -> Result<u32> {
    match attribute_value(start, b"r")? {
        Some(value) => parse_row_number(&value),
        None => previous
            .checked_add(1)
            .ok_or(ExcelError::InvalidRowNumber(previous)),
    }
}

/// Pad `columns` up to the cell's column and append its display value
fn push_value(
    workbook: &Workbook,
    columns: &mut Vec<String>,
    cell_col: &mut u32,
    cell: &CellData,
) -> Result<()> {
    *cell_col = if cell.reference.is_empty() {
        *cell_col + 1
    } else {
        cell_name_to_coordinates(&cell.reference)?.0
    };
    while (columns.len() as u32) + 1 < *cell_col {
        columns.push(String::new());
    }
    columns.push(cell_value(workbook, cell));
    Ok(())
}

/// Display string of a cell
///
/// Shared-string cells resolve through the shared-string table; an index
/// that is not in the table falls back to the raw value. Every result goes
/// through the cell's number format.
pub(crate) fn cell_value(workbook: &Workbook, cell: &CellData) -> String {
    let raw = cell.raw_value();
    match &cell.cell_type {
        Some(CellType::SharedString) if !raw.is_empty() => {
            let shared = raw
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|idx| workbook.shared_strings().get(idx));
            match shared {
                Some(text) => workbook.formatted_value(cell.style, text),
                None => workbook.formatted_value(cell.style, raw),
            }
        }
        Some(CellType::InlineString) => match &cell.inline_string {
            Some(is) => workbook.formatted_value(cell.style, &is.rich_text()),
            None => workbook.formatted_value(cell.style, raw),
        },
        _ => workbook.formatted_value(cell.style, raw),
    }
}

/// Highest declared row number
///
/// Rows without `r` count as the row after the previous one. Tokenizer
/// errors end the scan quietly; a row number that does not parse fails it.
fn count_rows(xml: &[u8]) -> Result<u32> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut row = 0u32;
    let mut total = 0u32;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"row" => {
                row = row_number(&e, row)?;
                total = total.max(row);
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(total)
}

impl Workbook {
    /// Open a streaming reader over `sheet`
    ///
    /// A loaded worksheet is flushed first, so the reader sees every edit
    /// made so far. The reader borrows the workbook; edits resume once it
    /// is dropped.
    pub fn rows(&mut self, sheet: &str) -> Result<Rows<'_>> {
        let part = self.sheet_part(sheet)?;
        self.flush_part(&part)?;

        let workbook: &Workbook = self;
        let xml = workbook
            .package()
            .read_part(&part)
            .ok_or_else(|| ExcelError::PartNotFound(part.clone()))?;
        Rows::new(workbook, sheet, xml)
    }

    /// All rows of `sheet` as display strings
    ///
    /// Best effort: reading stops at the first row that fails and the rows
    /// collected so far are returned. Only a failure to open the reader is
    /// an error.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use excelrows::Workbook;
    ///
    /// let mut workbook = Workbook::open("data.xlsx")?;
    /// for row in workbook.get_rows("Sheet1")? {
    ///     println!("{}", row.join("\t"));
    /// }
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn get_rows(&mut self, sheet: &str) -> Result<Vec<Vec<String>>> {
        let mut rows = self.rows(sheet)?;
        let mut results = Vec::with_capacity(64);
        while rows.next_row() {
            match rows.columns() {
                // a row cut short by a tokenizer error is left out
                Ok(columns) => match rows.error() {
                    Some(err) => {
                        log::debug!("get_rows stopped on '{}': {}", sheet, err);
                        break;
                    }
                    None => results.push(columns),
                },
                Err(err) => {
                    log::debug!("get_rows stopped on '{}': {}", sheet, err);
                    break;
                }
            }
        }
        Ok(results)
    }
}
