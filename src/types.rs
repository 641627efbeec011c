//! In-memory worksheet model
//!
//! A worksheet keeps only the rows and cells that are declared in its XML.
//! Rows are ordered by ascending row number; cells inside a row are ordered
//! by column once [`Worksheet::densify`] has run. Anything that needs
//! positional cell access must densify first.

use crate::coordinates::{area_ref_to_coordinates, cell_name_to_coordinates, coordinates_to_cell_name};
use crate::error::Result;
use crate::xml::XmlElement;

/// Height reported for rows without an explicit height
pub const DEFAULT_ROW_HEIGHT: f64 = 20.0;

/// Value type of a cell (`t` attribute)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellType {
    /// `s`: value is an index into the shared-string table
    SharedString,
    /// `str`: string result of a formula
    FormulaString,
    /// `inlineStr`: text stored in an `<is>` child
    InlineString,
    /// `n`
    Number,
    /// `b`
    Boolean,
    /// `e`
    Error,
    /// `d`: ISO 8601 date
    Date,
    /// Any other value, kept verbatim
    Other(String),
}

impl CellType {
    /// Parse the `t` attribute value
    pub fn from_attribute(value: &str) -> Self {
        match value {
            "s" => CellType::SharedString,
            "str" => CellType::FormulaString,
            "inlineStr" => CellType::InlineString,
            "n" => CellType::Number,
            "b" => CellType::Boolean,
            "e" => CellType::Error,
            "d" => CellType::Date,
            other => CellType::Other(other.to_string()),
        }
    }

    /// The `t` attribute value
    pub fn as_str(&self) -> &str {
        match self {
            CellType::SharedString => "s",
            CellType::FormulaString => "str",
            CellType::InlineString => "inlineStr",
            CellType::Number => "n",
            CellType::Boolean => "b",
            CellType::Error => "e",
            CellType::Date => "d",
            CellType::Other(s) => s,
        }
    }
}

/// A `<c>` element
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellData {
    /// Cell reference such as `"A15"`
    pub reference: String,
    pub cell_type: Option<CellType>,
    /// Style index (`s`), 0 when absent
    pub style: u32,
    /// Raw `<v>` text
    pub value: Option<String>,
    pub formula: Option<XmlElement>,
    pub inline_string: Option<XmlElement>,
    /// Attributes other than `r`, `t` and `s` (`cm`, `vm`, `ph`)
    pub extra_attributes: Vec<(String, String)>,
    /// Children other than `<v>`, `<f>` and `<is>` (`<extLst>`)
    pub extra_children: Vec<XmlElement>,
}

impl CellData {
    /// Placeholder cell carrying only a reference
    pub fn new(reference: impl Into<String>) -> Self {
        CellData {
            reference: reference.into(),
            ..Default::default()
        }
    }

    /// Raw value, empty when there is no `<v>`
    pub fn raw_value(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }

    /// 1-based column number taken from the reference
    pub fn column(&self) -> Result<u32> {
        cell_name_to_coordinates(&self.reference).map(|(col, _)| col)
    }

    /// True when the cell holds nothing beyond its reference
    pub fn is_placeholder(&self) -> bool {
        self.cell_type.is_none()
            && self.style == 0
            && self.value.is_none()
            && self.formula.is_none()
            && self.inline_string.is_none()
            && self.extra_attributes.is_empty()
            && self.extra_children.is_empty()
    }
}

/// A `<row>` element
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowData {
    /// 1-based row number (`r`)
    pub number: u32,
    /// Height in points, 0 when unset
    pub height: f64,
    pub custom_height: bool,
    pub hidden: bool,
    /// Outline level, 0 for none
    pub outline_level: u8,
    pub cells: Vec<CellData>,
    /// Attributes other than the ones above (`spans`, `s`, `x14ac:dyDescent`)
    pub extra_attributes: Vec<(String, String)>,
}

impl RowData {
    pub fn new(number: u32) -> Self {
        RowData {
            number,
            ..Default::default()
        }
    }

    /// True when the row has no content and default metadata
    pub fn is_blank(&self) -> bool {
        self.height == 0.0
            && !self.custom_height
            && !self.hidden
            && self.outline_level == 0
            && self.extra_attributes.is_empty()
            && self.cells.iter().all(CellData::is_placeholder)
    }

    /// Move the row to `number`, rewriting every cell reference
    pub fn set_number(&mut self, number: u32) -> Result<()> {
        for cell in &mut self.cells {
            let col = cell.column()?;
            cell.reference = coordinates_to_cell_name(col, number)?;
        }
        self.number = number;
        Ok(())
    }
}

/// A `<mergeCell>` region
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MergeCell {
    /// Area reference such as `"C2:D2"`
    pub reference: String,
}

impl MergeCell {
    pub fn new(reference: impl Into<String>) -> Self {
        MergeCell {
            reference: reference.into(),
        }
    }

    /// `[x1, y1, x2, y2]` of the region
    pub fn coordinates(&self) -> Result<[u32; 4]> {
        area_ref_to_coordinates(&self.reference)
    }
}

/// Raw top-level element that follows `</sheetData>`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TrailingElement {
    pub(crate) local_name: String,
    pub(crate) raw: Vec<u8>,
}

/// Parsed worksheet part
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Worksheet {
    /// Bytes preceding `<sheetData>`, from the XML declaration onwards
    pub(crate) prolog: Vec<u8>,
    /// Declared rows, ascending by number
    pub rows: Vec<RowData>,
    pub merge_cells: Vec<MergeCell>,
    pub(crate) trailing: Vec<TrailingElement>,
}

impl Worksheet {
    /// Highest declared row number, 0 for an empty sheet
    pub fn row_count(&self) -> u32 {
        self.rows.last().map(|r| r.number).unwrap_or(0)
    }

    /// Position of row `number`, or where it would be inserted
    pub fn row_index(&self, number: u32) -> std::result::Result<usize, usize> {
        self.rows.binary_search_by_key(&number, |r| r.number)
    }

    pub fn row(&self, number: u32) -> Option<&RowData> {
        self.row_index(number).ok().map(|idx| &self.rows[idx])
    }

    pub fn row_mut(&mut self, number: u32) -> Option<&mut RowData> {
        match self.row_index(number) {
            Ok(idx) => Some(&mut self.rows[idx]),
            Err(_) => None,
        }
    }

    /// Row `number`, created empty when it is not declared yet
    pub fn prepare_row(&mut self, number: u32) -> &mut RowData {
        let idx = match self.row_index(number) {
            Ok(idx) => idx,
            Err(idx) => {
                self.rows.insert(idx, RowData::new(number));
                idx
            }
        };
        &mut self.rows[idx]
    }

    /// Order rows by number; declaration order is kept for equal numbers
    pub fn sort_rows(&mut self) {
        self.rows.sort_by_key(|r| r.number);
    }

    /// Fill the gaps in every row so cell `n` sits at index `n - 1`
    ///
    /// ```text
    /// <row r="15"><c r="A15"/><c r="B15"/><c r="F15"/><c r="G15"/></row>
    /// ```
    ///
    /// becomes a row with seven cells `A15..G15`, where `C15..E15` are
    /// placeholders and the original cells keep all of their content.
    /// Cost is proportional to rows times the widest row.
    pub fn densify(&mut self) -> Result<()> {
        for row in &mut self.rows {
            if row.cells.is_empty() {
                continue;
            }
            let columns = row
                .cells
                .iter()
                .map(CellData::column)
                .collect::<Result<Vec<u32>>>()?;
            let last_col = columns.iter().copied().max().unwrap_or(0);
            if row.cells.len() as u32 >= last_col {
                continue;
            }

            let mut dense = Vec::with_capacity(last_col as usize);
            for col in 1..=last_col {
                dense.push(CellData::new(coordinates_to_cell_name(col, row.number)?));
            }
            for (cell, col) in std::mem::take(&mut row.cells).into_iter().zip(columns) {
                dense[(col - 1) as usize] = cell;
            }
            row.cells = dense;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(reference: &str, style: u32, value: &str) -> CellData {
        CellData {
            reference: reference.to_string(),
            style,
            value: Some(value.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_cell_type_attribute() {
        for t in ["s", "str", "inlineStr", "n", "b", "e", "d", "x"] {
            assert_eq!(CellType::from_attribute(t).as_str(), t);
        }
        assert_eq!(CellType::from_attribute("s"), CellType::SharedString);
    }

    #[test]
    fn test_densify_fills_gaps() {
        let mut ws = Worksheet::default();
        let mut row = RowData::new(15);
        row.cells = vec![
            cell("A15", 2, "a"),
            cell("B15", 2, "b"),
            cell("F15", 1, "f"),
            cell("G15", 1, "g"),
        ];
        ws.rows.push(row);

        ws.densify().unwrap();

        let cells = &ws.rows[0].cells;
        let refs: Vec<&str> = cells.iter().map(|c| c.reference.as_str()).collect();
        assert_eq!(refs, ["A15", "B15", "C15", "D15", "E15", "F15", "G15"]);
        assert_eq!(cells[0], cell("A15", 2, "a"));
        assert_eq!(cells[1], cell("B15", 2, "b"));
        assert_eq!(cells[5], cell("F15", 1, "f"));
        assert_eq!(cells[6], cell("G15", 1, "g"));
        for placeholder in &cells[2..5] {
            assert!(placeholder.is_placeholder());
        }
    }

    #[test]
    fn test_densify_leaves_dense_rows() {
        let mut ws = Worksheet::default();
        let mut row = RowData::new(1);
        row.cells = vec![cell("A1", 0, "1"), cell("B1", 0, "2")];
        ws.rows.push(row.clone());

        ws.densify().unwrap();
        assert_eq!(ws.rows[0], row);
    }

    #[test]
    fn test_densify_rejects_bad_reference() {
        let mut ws = Worksheet::default();
        let mut row = RowData::new(1);
        row.cells = vec![cell("A1", 0, "1"), cell("??", 0, "2")];
        ws.rows.push(row.clone());

        assert!(ws.densify().is_err());
        assert_eq!(ws.rows[0], row);
    }

    #[test]
    fn test_prepare_row_keeps_order() {
        let mut ws = Worksheet::default();
        ws.prepare_row(5);
        ws.prepare_row(2);
        ws.prepare_row(9).hidden = true;
        ws.prepare_row(5).outline_level = 3;

        let numbers: Vec<u32> = ws.rows.iter().map(|r| r.number).collect();
        assert_eq!(numbers, [2, 5, 9]);
        assert_eq!(ws.row_count(), 9);
        assert_eq!(ws.row(5).unwrap().outline_level, 3);
        assert!(ws.row(9).unwrap().hidden);
        assert!(ws.row(3).is_none());
    }

    #[test]
    fn test_set_number_rewrites_references() {
        let mut row = RowData::new(2);
        row.cells = vec![cell("A2", 0, "x"), cell("C2", 0, "y")];
        row.set_number(7).unwrap();
        assert_eq!(row.number, 7);
        assert_eq!(row.cells[0].reference, "A7");
        assert_eq!(row.cells[1].reference, "C7");
    }
}
