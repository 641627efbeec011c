//! Cell coordinate helpers
//!
//! Conversions between 1-based `(column, row)` pairs and A1-style references
//! (`"A1"`, `"AA15"`, `"C2:D2"`). Absolute markers (`$`) are accepted on input
//! and never produced on output.

use crate::error::{ExcelError, Result};

/// Highest column number in a worksheet (`XFD`)
pub const MAX_COLUMNS: u32 = 16_384;

/// Highest row number in a worksheet
pub const MAX_ROWS: u32 = 1_048_576;

/// Convert a column name to its 1-based number (`"A"` -> 1, `"AA"` -> 27)
pub fn column_name_to_number(name: &str) -> Result<u32> {
    if name.is_empty() {
        return Err(ExcelError::InvalidCell(format!(
            "empty column name in '{}'",
            name
        )));
    }

    let mut col = 0u32;
    for ch in name.chars() {
        if !ch.is_ascii_alphabetic() {
            return Err(ExcelError::InvalidCell(name.to_string()));
        }
        col = col * 26 + (ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        if col > MAX_COLUMNS {
            return Err(ExcelError::InvalidCell(format!(
                "column '{}' exceeds {}",
                name, MAX_COLUMNS
            )));
        }
    }
    Ok(col)
}

/// Convert a 1-based column number to its name (1 -> `"A"`, 27 -> `"AA"`)
pub fn column_number_to_name(col: u32) -> Result<String> {
    if col == 0 || col > MAX_COLUMNS {
        return Err(ExcelError::InvalidCell(format!(
            "column number {} out of range",
            col
        )));
    }

    let mut result = String::new();
    let mut n = col;
    while n > 0 {
        let rem = (n - 1) % 26;
        result.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    Ok(result)
}

/// Split a cell reference into 1-based `(column, row)`
///
/// ```
/// use excelrows::coordinates::cell_name_to_coordinates;
///
/// assert_eq!(cell_name_to_coordinates("C15").unwrap(), (3, 15));
/// assert_eq!(cell_name_to_coordinates("$AA$2").unwrap(), (27, 2));
/// ```
pub fn cell_name_to_coordinates(cell: &str) -> Result<(u32, u32)> {
    let stripped: String = cell.chars().filter(|c| *c != '$').collect();
    let split = stripped
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| ExcelError::InvalidCell(cell.to_string()))?;
    let (letters, digits) = stripped.split_at(split);

    let col = column_name_to_number(letters)
        .map_err(|_| ExcelError::InvalidCell(cell.to_string()))?;
    let row: u32 = digits
        .parse()
        .map_err(|_| ExcelError::InvalidCell(cell.to_string()))?;
    if row == 0 || row > MAX_ROWS {
        return Err(ExcelError::InvalidCell(cell.to_string()));
    }
    Ok((col, row))
}

/// Build a cell reference from 1-based `(column, row)`
pub fn coordinates_to_cell_name(col: u32, row: u32) -> Result<String> {
    if row == 0 || row > MAX_ROWS {
        return Err(ExcelError::InvalidCell(format!(
            "row number {} out of range",
            row
        )));
    }
    let mut name = column_number_to_name(col)?;
    let mut buf = itoa::Buffer::new();
    name.push_str(buf.format(row));
    Ok(name)
}

/// Parse an area reference into `[x1, y1, x2, y2]` with `x1 <= x2`, `y1 <= y2`
///
/// A single cell reference is treated as a one-cell area.
pub fn area_ref_to_coordinates(area: &str) -> Result<[u32; 4]> {
    let (from, to) = area.split_once(':').unwrap_or((area, area));
    let (x1, y1) = cell_name_to_coordinates(from)?;
    let (x2, y2) = cell_name_to_coordinates(to)?;
    Ok([x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2)])
}

/// Build an area reference (`"C2:D2"`) from `[x1, y1, x2, y2]`
pub fn coordinates_to_area_ref(coordinates: &[u32; 4]) -> Result<String> {
    let [x1, y1, x2, y2] = *coordinates;
    let from = coordinates_to_cell_name(x1, y1)?;
    let to = coordinates_to_cell_name(x2, y2)?;
    Ok(format!("{}:{}", from, to))
}
