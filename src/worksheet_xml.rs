//! Worksheet part parsing and serialization
//!
//! Only `<sheetData>` and `<mergeCells>` are modelled. Everything before
//! `<sheetData>` is kept as raw bytes, and every other top-level element after
//! it is kept verbatim, so a parse/serialize cycle leaves unrelated markup
//! alone.

use crate::coordinates::coordinates_to_cell_name;
use crate::error::{ExcelError, Result};
use crate::types::{CellData, CellType, MergeCell, RowData, TrailingElement, Worksheet};
use crate::xml::{attribute_value, read_attributes, read_element, write_element};
use crate::xml_writer::XmlWriter;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{BufRead, Write};

/// Header written for worksheets that were created from nothing
const WORKSHEET_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">";

/// Elements that the schema places between `</sheetData>` and `<mergeCells>`
const MERGE_CELLS_PREDECESSORS: &[&str] = &[
    "sheetCalcPr",
    "sheetProtection",
    "protectedRanges",
    "scenarios",
    "autoFilter",
    "sortState",
    "dataConsolidate",
    "customSheetViews",
];

/// Parse a worksheet part
pub fn parse_worksheet(xml: &[u8]) -> Result<Worksheet> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();
    let mut ws = Worksheet::default();
    let mut depth = 0usize;
    let mut seen_sheet_data = false;

    loop {
        let pos = reader.buffer_position() as usize;
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let local = e.local_name().as_ref().to_vec();
                if depth == 1 && !seen_sheet_data && local == b"sheetData" {
                    ws.prolog = xml[..pos].to_vec();
                    seen_sheet_data = true;
                    read_sheet_data(&mut reader, &mut ws.rows)?;
                } else if depth == 1 && seen_sheet_data {
                    if local == b"mergeCells" {
                        ws.merge_cells = read_merge_cells(&mut reader)?;
                    } else {
                        reader.read_to_end_into(e.name(), &mut skip_buf)?;
                        skip_buf.clear();
                        let end = reader.buffer_position() as usize;
                        ws.trailing.push(TrailingElement {
                            local_name: String::from_utf8_lossy(&local).into_owned(),
                            raw: xml[pos..end].to_vec(),
                        });
                    }
                } else {
                    depth += 1;
                }
            }
            Event::Empty(e) => {
                let local = e.local_name().as_ref().to_vec();
                if depth == 1 && !seen_sheet_data && local == b"sheetData" {
                    ws.prolog = xml[..pos].to_vec();
                    seen_sheet_data = true;
                } else if depth == 1 && seen_sheet_data && local != b"mergeCells" {
                    let end = reader.buffer_position() as usize;
                    ws.trailing.push(TrailingElement {
                        local_name: String::from_utf8_lossy(&local).into_owned(),
                        raw: xml[pos..end].to_vec(),
                    });
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    if !seen_sheet_data {
                        ws.prolog = xml[..pos].to_vec();
                    }
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    ws.sort_rows();
    Ok(ws)
}

fn read_sheet_data<R: BufRead>(reader: &mut Reader<R>, rows: &mut Vec<RowData>) -> Result<()> {
    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();
    let mut last_number = 0u32;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"row" => {
                let mut row = read_row_attributes(&e, last_number)?;
                read_row_cells(reader, &mut row)?;
                last_number = row.number;
                rows.push(row);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                let row = read_row_attributes(&e, last_number)?;
                last_number = row.number;
                rows.push(row);
            }
            Event::Start(e) => {
                reader.read_to_end_into(e.name(), &mut skip_buf)?;
                skip_buf.clear();
            }
            Event::End(_) => return Ok(()),
            Event::Eof => {
                return Err(ExcelError::ReadError(
                    "unexpected end of XML inside <sheetData>".to_string(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }
}

/// Parse a `<row>` start tag; a missing `r` means the row after `previous`
fn read_row_attributes(start: &BytesStart, previous: u32) -> Result<RowData> {
    let mut row = RowData::new(previous);
    let mut number = None;
    for (key, value) in read_attributes(start)? {
        match key.as_str() {
            "r" => number = Some(parse_row_number(&value)?),
            "ht" => row.height = value.parse().unwrap_or_default(),
            "customHeight" => row.custom_height = parse_bool(&value),
            "hidden" => row.hidden = parse_bool(&value),
            "outlineLevel" => row.outline_level = value.parse().unwrap_or_default(),
            _ => row.extra_attributes.push((key, value)),
        }
    }
    row.number = match number {
        Some(number) => number,
        None => previous
            .checked_add(1)
            .ok_or(ExcelError::InvalidRowNumber(previous))?,
    };
    Ok(row)
}

fn read_row_cells<R: BufRead>(reader: &mut Reader<R>, row: &mut RowData) -> Result<()> {
    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();
    let mut last_col = 0u32;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"c" => {
                let cell = read_cell(reader, &e, false)?;
                last_col = push_cell(row, cell, last_col)?;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                let cell = read_cell(reader, &e, true)?;
                last_col = push_cell(row, cell, last_col)?;
            }
            Event::Start(e) => {
                reader.read_to_end_into(e.name(), &mut skip_buf)?;
                skip_buf.clear();
            }
            Event::End(_) => return Ok(()),
            Event::Eof => {
                return Err(ExcelError::ReadError(
                    "unexpected end of XML inside <row>".to_string(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }
}

/// Append `cell`, giving it a reference when the XML omitted one
fn push_cell(row: &mut RowData, mut cell: CellData, last_col: u32) -> Result<u32> {
    let col = if cell.reference.is_empty() {
        let col = last_col + 1;
        cell.reference = coordinates_to_cell_name(col, row.number)?;
        col
    } else {
        cell.column()?
    };
    row.cells.push(cell);
    Ok(col)
}

/// Decode one `<c>` element, including its children
///
/// The reference is left empty when the element has no `r` attribute.
pub(crate) fn read_cell<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    empty: bool,
) -> Result<CellData> {
    let element = read_element(reader, start, empty)?;
    let mut cell = CellData::default();

    for (key, value) in element.attributes {
        match key.as_str() {
            "r" => cell.reference = value,
            "t" => cell.cell_type = Some(CellType::from_attribute(&value)),
            "s" => cell.style = value.parse().unwrap_or_default(),
            _ => cell.extra_attributes.push((key, value)),
        }
    }

    for child in element.children {
        if let crate::xml::XmlNode::Element(el) = child {
            match el.local_name() {
                "v" => cell.value = Some(el.text()),
                "f" => cell.formula = Some(el),
                "is" => cell.inline_string = Some(el),
                _ => cell.extra_children.push(el),
            }
        }
    }
    Ok(cell)
}

fn read_merge_cells<R: BufRead>(reader: &mut Reader<R>) -> Result<Vec<MergeCell>> {
    let mut buf = Vec::new();
    let mut merges = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                if e.local_name().as_ref() == b"mergeCell" {
                    if let Some(reference) = attribute_value(&e, b"ref")? {
                        merges.push(MergeCell::new(reference));
                    }
                }
                depth += 1;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"mergeCell" => {
                if let Some(reference) = attribute_value(&e, b"ref")? {
                    merges.push(MergeCell::new(reference));
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    return Ok(merges);
                }
                depth -= 1;
            }
            Event::Eof => {
                return Err(ExcelError::ReadError(
                    "unexpected end of XML inside <mergeCells>".to_string(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }
}

/// Parse a row number attribute
pub(crate) fn parse_row_number(value: &str) -> Result<u32> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| ExcelError::InvalidRowAttribute(value.to_string()))
}

fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true")
}

/// Serialize a worksheet back into part bytes
pub fn write_worksheet(ws: &Worksheet, capacity: usize) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(capacity);
    {
        let mut writer = XmlWriter::new(&mut output);

        if ws.prolog.is_empty() {
            writer.write_str(WORKSHEET_HEADER)?;
        } else {
            writer.write_raw(&ws.prolog)?;
        }

        let mut rows = ws.rows.iter().filter(|r| !r.is_blank()).peekable();
        if rows.peek().is_none() {
            writer.write_str("<sheetData/>")?;
        } else {
            writer.write_str("<sheetData>")?;
            for row in rows {
                write_row(&mut writer, row)?;
            }
            writer.end_element("sheetData")?;
        }

        let merge_at = ws
            .trailing
            .iter()
            .rposition(|el| MERGE_CELLS_PREDECESSORS.contains(&el.local_name.as_str()))
            .map(|idx| idx + 1)
            .unwrap_or(0);
        for (idx, el) in ws.trailing.iter().enumerate() {
            if idx == merge_at {
                write_merge_cells(&mut writer, &ws.merge_cells)?;
            }
            writer.write_raw(&el.raw)?;
        }
        if merge_at >= ws.trailing.len() {
            write_merge_cells(&mut writer, &ws.merge_cells)?;
        }

        writer.end_element("worksheet")?;
        writer.flush()?;
    }
    Ok(output)
}

fn write_row<W: Write>(writer: &mut XmlWriter<W>, row: &RowData) -> Result<()> {
    writer.start_element("row")?;
    writer.attribute_u32("r", row.number)?;
    for (key, value) in &row.extra_attributes {
        writer.attribute(key, value)?;
    }
    if row.height != 0.0 {
        writer.attribute("ht", &row.height.to_string())?;
    }
    if row.hidden {
        writer.attribute("hidden", "1")?;
    }
    if row.custom_height {
        writer.attribute("customHeight", "1")?;
    }
    if row.outline_level > 0 {
        writer.attribute_u32("outlineLevel", u32::from(row.outline_level))?;
    }

    let mut cells = row.cells.iter().filter(|c| !c.is_placeholder()).peekable();
    if cells.peek().is_none() {
        return writer.close_empty_tag();
    }
    writer.close_start_tag()?;
    for cell in cells {
        write_cell(writer, cell)?;
    }
    writer.end_element("row")
}

fn write_cell<W: Write>(writer: &mut XmlWriter<W>, cell: &CellData) -> Result<()> {
    writer.start_element("c")?;
    writer.attribute("r", &cell.reference)?;
    if cell.style != 0 {
        writer.attribute_u32("s", cell.style)?;
    }
    if let Some(cell_type) = &cell.cell_type {
        writer.attribute("t", cell_type.as_str())?;
    }
    for (key, value) in &cell.extra_attributes {
        writer.attribute(key, value)?;
    }

    let has_children = cell.formula.is_some()
        || cell.value.is_some()
        || cell.inline_string.is_some()
        || !cell.extra_children.is_empty();
    if !has_children {
        return writer.close_empty_tag();
    }
    writer.close_start_tag()?;
    if let Some(formula) = &cell.formula {
        write_element(writer, formula)?;
    }
    if let Some(value) = &cell.value {
        writer.text_element("v", value)?;
    }
    if let Some(inline) = &cell.inline_string {
        write_element(writer, inline)?;
    }
    for child in &cell.extra_children {
        write_element(writer, child)?;
    }
    writer.end_element("c")
}

fn write_merge_cells<W: Write>(writer: &mut XmlWriter<W>, merges: &[MergeCell]) -> Result<()> {
    if merges.is_empty() {
        return Ok(());
    }
    writer.start_element("mergeCells")?;
    writer.attribute_u32("count", merges.len() as u32)?;
    writer.close_start_tag()?;
    for merge in merges {
        writer.start_element("mergeCell")?;
        writer.attribute("ref", &merge.reference)?;
        writer.close_empty_tag()?;
    }
    writer.end_element("mergeCells")
}
