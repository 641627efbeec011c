//! Structural row edits: insert, remove and duplicate
//!
//! Edits work on the loaded worksheet model and renumber rows, cells and
//! merged regions. Formulas and other references to moved rows are not
//! rewritten.

use crate::adjust::{adjust_rows, Shift};
use crate::coordinates::MAX_ROWS;
use crate::error::{ExcelError, Result};
use crate::merge::duplicate_merge_cells;
use crate::workbook::Workbook;

impl Workbook {
    /// Remove row `row`, moving the rows below it up by one
    ///
    /// A row past the last declared row removes nothing, but merged regions
    /// below it still move up.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use excelrows::Workbook;
    ///
    /// let mut workbook = Workbook::open("report.xlsx")?;
    /// workbook.remove_row("Sheet1", 3)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn remove_row(&mut self, sheet: &str, row: u32) -> Result<()> {
        if row < 1 {
            return Err(ExcelError::InvalidRowNumber(row));
        }
        let ws = self.worksheet_mut(sheet)?;
        if row <= ws.row_count() {
            if let Ok(idx) = ws.row_index(row) {
                ws.rows.remove(idx);
            }
        }
        log::debug!("removed row {} on '{}'", row, sheet);
        adjust_rows(ws, row, Shift::Delete)
    }

    /// Insert an empty row before `row`
    ///
    /// No row record is created; the new row exists once something is
    /// written to it.
    pub fn insert_row(&mut self, sheet: &str, row: u32) -> Result<()> {
        if row < 1 {
            return Err(ExcelError::InvalidRowNumber(row));
        }
        let ws = self.worksheet_mut(sheet)?;
        log::debug!("inserted row {} on '{}'", row, sheet);
        adjust_rows(ws, row, Shift::Insert)
    }

    /// Copy row `row` into a new row directly below it
    ///
    /// Nothing happens when there is no row below `row` to copy into.
    pub fn duplicate_row(&mut self, sheet: &str, row: u32) -> Result<()> {
        match row.checked_add(1) {
            Some(row2) => self.duplicate_row_to(sheet, row, row2),
            None => Ok(()),
        }
    }

    /// Insert a copy of row `row` at `row2`
    ///
    /// Rows from `row2` down move by one to make room. Single-row merged
    /// regions of the source row are recreated on the copy, unless `row2`
    /// lies inside another merged region.
    ///
    /// Nothing happens when `row` is past the last declared row or not
    /// declared at all, when `row2` is 0, or when `row == row2`. A `row2`
    /// past the last row a sheet can hold is an error.
    ///
    /// # Arguments
    /// * `sheet` - Sheet name
    /// * `row` - Source row, 1-based
    /// * `row2` - Target row, 1-based
    pub fn duplicate_row_to(&mut self, sheet: &str, row: u32, row2: u32) -> Result<()> {
        if row < 1 {
            return Err(ExcelError::InvalidRowNumber(row));
        }
        let ws = self.worksheet_mut(sheet)?;
        if row > ws.row_count() || row2 < 1 || row == row2 {
            return Ok(());
        }
        if row2 > MAX_ROWS {
            return Err(ExcelError::InvalidRowNumber(row2));
        }
        let mut copy = match ws.row(row) {
            Some(source) => source.clone(),
            None => return Ok(()),
        };
        copy.set_number(row2)?;

        adjust_rows(ws, row2, Shift::Insert)?;
        match ws.row_index(row2) {
            Ok(idx) => ws.rows[idx] = copy,
            Err(idx) => ws.rows.insert(idx, copy),
        }
        log::debug!("duplicated row {} to {} on '{}'", row, row2, sheet);

        duplicate_merge_cells(ws, row, row2)
    }
}

#[cfg(test)]
mod tests {
    use crate::coordinates::MAX_ROWS;
    use crate::error::ExcelError;
    use crate::package::Package;
    use crate::workbook::Workbook;

    fn workbook(sheet_data: &str, merges: &str) -> Workbook {
        let mut package = Package::new();
        package.write_part(
            "xl/workbook.xml",
            br#"<workbook><sheets><sheet name="Sheet1" r:id="rId1"/></sheets></workbook>"#.to_vec(),
        );
        package.write_part(
            "xl/_rels/workbook.xml.rels",
            br#"<Relationships><Relationship Id="rId1" Target="worksheets/sheet1.xml"/></Relationships>"#.to_vec(),
        );
        package.write_part(
            "xl/worksheets/sheet1.xml",
            format!(
                "<worksheet><sheetData>{}</sheetData>{}</worksheet>",
                sheet_data, merges
            )
            .into_bytes(),
        );
        Workbook::from_package(package).unwrap()
    }

    fn five_rows() -> Workbook {
        let data: String = (1..=5)
            .map(|n| format!(r#"<row r="{n}"><c r="A{n}"><v>{n}</v></c></row>"#))
            .collect();
        workbook(&data, "")
    }

    fn numbers(wb: &mut Workbook) -> Vec<u32> {
        wb.worksheet("Sheet1")
            .unwrap()
            .rows
            .iter()
            .map(|r| r.number)
            .collect()
    }

    #[test]
    fn test_remove_row() {
        let mut wb = five_rows();
        wb.remove_row("Sheet1", 3).unwrap();

        assert_eq!(numbers(&mut wb), [1, 2, 3, 4]);
        let ws = wb.worksheet("Sheet1").unwrap();
        assert_eq!(ws.rows[2].cells[0].reference, "A3");
        assert_eq!(ws.rows[2].cells[0].raw_value(), "4");
        assert_eq!(ws.rows[3].cells[0].raw_value(), "5");
    }

    #[test]
    fn test_remove_row_past_end() {
        let mut wb = workbook(
            r#"<row r="1"><c r="A1"><v>1</v></c></row>"#,
            r#"<mergeCells count="1"><mergeCell ref="A4:B5"/></mergeCells>"#,
        );
        wb.remove_row("Sheet1", 3).unwrap();
        assert_eq!(numbers(&mut wb), [1]);
        assert_eq!(wb.merge_cells("Sheet1").unwrap(), ["A3:B4"]);
    }

    #[test]
    fn test_insert_row() {
        let mut wb = five_rows();
        wb.insert_row("Sheet1", 2).unwrap();
        assert_eq!(numbers(&mut wb), [1, 3, 4, 5, 6]);
        assert_eq!(wb.get_rows("Sheet1").unwrap()[1], Vec::<String>::new());
    }

    #[test]
    fn test_row_zero_is_rejected() {
        let mut wb = five_rows();
        assert!(matches!(
            wb.remove_row("Sheet1", 0),
            Err(ExcelError::InvalidRowNumber(0))
        ));
        assert!(matches!(
            wb.insert_row("Sheet1", 0),
            Err(ExcelError::InvalidRowNumber(0))
        ));
        assert!(matches!(
            wb.duplicate_row_to("Sheet1", 0, 2),
            Err(ExcelError::InvalidRowNumber(0))
        ));
    }

    #[test]
    fn test_duplicate_row() {
        let mut wb = five_rows();
        wb.duplicate_row("Sheet1", 2).unwrap();

        let rows = wb.get_rows("Sheet1").unwrap();
        assert_eq!(rows, [["1"], ["2"], ["2"], ["3"], ["4"], ["5"]]);
    }

    #[test]
    fn test_duplicate_row_copy_is_independent() {
        let mut wb = five_rows();
        wb.duplicate_row_to("Sheet1", 1, 4).unwrap();
        let ws = wb.worksheet_mut("Sheet1").unwrap();
        ws.row_mut(4).unwrap().cells[0].value = Some("changed".into());

        let rows = wb.get_rows("Sheet1").unwrap();
        assert_eq!(rows[0], ["1"]);
        assert_eq!(rows[3], ["changed"]);
        assert_eq!(rows[4], ["4"]);
    }

    #[test]
    fn test_duplicate_row_noops() {
        let mut wb = workbook(
            r#"<row r="1"><c r="A1"><v>1</v></c></row><row r="3"><c r="A3"><v>3</v></c></row>"#,
            "",
        );
        wb.duplicate_row_to("Sheet1", 9, 2).unwrap();
        wb.duplicate_row_to("Sheet1", 1, 0).unwrap();
        wb.duplicate_row_to("Sheet1", 1, 1).unwrap();
        wb.duplicate_row_to("Sheet1", 2, 5).unwrap();
        assert_eq!(numbers(&mut wb), [1, 3]);
    }

    #[test]
    fn test_duplicate_last_possible_row() {
        let mut wb = five_rows();
        wb.duplicate_row("Sheet1", u32::MAX).unwrap();
        assert_eq!(numbers(&mut wb), [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_duplicate_row_to_past_sheet_end() {
        let mut wb = five_rows();
        assert!(matches!(
            wb.duplicate_row_to("Sheet1", 1, u32::MAX),
            Err(ExcelError::InvalidRowNumber(u32::MAX))
        ));
        assert!(matches!(
            wb.duplicate_row_to("Sheet1", 1, MAX_ROWS + 1),
            Err(ExcelError::InvalidRowNumber(_))
        ));
        assert_eq!(numbers(&mut wb), [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_insert_row_that_would_overflow_sheet() {
        let mut wb = workbook(
            &format!(
                r#"<row r="{a}"><c r="A{a}"><v>a</v></c></row><row r="{b}"><c r="A{b}"><v>b</v></c></row>"#,
                a = MAX_ROWS - 1,
                b = MAX_ROWS
            ),
            "",
        );
        assert!(wb.insert_row("Sheet1", MAX_ROWS - 1).is_err());

        assert_eq!(numbers(&mut wb), [MAX_ROWS - 1, MAX_ROWS]);
        let ws = wb.worksheet("Sheet1").unwrap();
        assert_eq!(ws.rows[0].cells[0].reference, format!("A{}", MAX_ROWS - 1));
        assert_eq!(ws.rows[1].cells[0].reference, format!("A{}", MAX_ROWS));
    }

    #[test]
    fn test_duplicate_row_up() {
        let mut wb = five_rows();
        wb.duplicate_row_to("Sheet1", 4, 2).unwrap();
        let rows = wb.get_rows("Sheet1").unwrap();
        assert_eq!(rows, [["1"], ["4"], ["2"], ["3"], ["4"], ["5"]]);
    }

    #[test]
    fn test_duplicate_row_to_repairs_merges() {
        let data: String = (1..=3)
            .map(|n| format!(r#"<row r="{n}"><c r="C{n}"><v>{n}</v></c></row>"#))
            .collect();
        let mut wb = workbook(
            &data,
            r#"<mergeCells count="1"><mergeCell ref="C2:D2"/></mergeCells>"#,
        );
        wb.duplicate_row_to("Sheet1", 2, 7).unwrap();

        assert_eq!(wb.merge_cells("Sheet1").unwrap(), ["C2:D2", "C7:D7"]);
        let rows = wb.get_rows("Sheet1").unwrap();
        assert_eq!(rows[1], ["", "", "2"]);
        assert_eq!(rows[6], ["", "", "2"]);
    }

    #[test]
    fn test_duplicate_into_merged_span_adds_no_merge() {
        let data: String = (1..=3)
            .map(|n| format!(r#"<row r="{n}"><c r="A{n}"><v>{n}</v></c></row>"#))
            .collect();
        let mut wb = workbook(
            &data,
            r#"<mergeCells count="2"><mergeCell ref="C2:D2"/><mergeCell ref="F6:G8"/></mergeCells>"#,
        );
        wb.duplicate_row_to("Sheet1", 2, 7).unwrap();
        assert_eq!(wb.merge_cells("Sheet1").unwrap(), ["C2:D2", "F6:G9"]);
    }
}
