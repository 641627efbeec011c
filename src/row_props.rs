//! Row height, visibility and outline level

use crate::coordinates::MAX_ROWS;
use crate::error::{ExcelError, Result};
use crate::types::{RowData, DEFAULT_ROW_HEIGHT};
use crate::workbook::Workbook;

fn check_row(row: u32) -> Result<()> {
    if row < 1 || row > MAX_ROWS {
        return Err(ExcelError::InvalidRowNumber(row));
    }
    Ok(())
}

/// Convert a row height in points to pixels, 0 for an unset height
pub fn convert_row_height_to_pixels(height: f64) -> u32 {
    if height == 0.0 {
        return 0;
    }
    (height * 4.0 / 3.0).ceil() as u32
}

impl Workbook {
    /// Set the height of `row` in points and mark it as custom
    ///
    /// # Example
    ///
    /// ```no_run
    /// use excelrows::Workbook;
    ///
    /// let mut workbook = Workbook::open("report.xlsx")?;
    /// workbook.set_row_height("Sheet1", 1, 50.0)?;
    /// assert_eq!(workbook.get_row_height("Sheet1", 1)?, 50.0);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn set_row_height(&mut self, sheet: &str, row: u32, height: f64) -> Result<()> {
        check_row(row)?;
        let record = self.worksheet_mut(sheet)?.prepare_row(row);
        record.height = height;
        record.custom_height = true;
        Ok(())
    }

    /// Height of `row` in points, the default height when it has none
    pub fn get_row_height(&mut self, sheet: &str, row: u32) -> Result<f64> {
        check_row(row)?;
        let height = self
            .row_record(sheet, row)?
            .map(|r| r.height)
            .filter(|&h| h != 0.0)
            .unwrap_or(DEFAULT_ROW_HEIGHT);
        Ok(height)
    }

    /// Height of `row` in pixels, for layout
    pub fn row_height_pixels(&mut self, sheet: &str, row: u32) -> Result<u32> {
        check_row(row)?;
        let pixels = match self.row_record(sheet, row)? {
            Some(record) if record.height != 0.0 => convert_row_height_to_pixels(record.height),
            _ => DEFAULT_ROW_HEIGHT as u32,
        };
        Ok(pixels)
    }

    pub fn set_row_visible(&mut self, sheet: &str, row: u32, visible: bool) -> Result<()> {
        check_row(row)?;
        self.worksheet_mut(sheet)?.prepare_row(row).hidden = !visible;
        Ok(())
    }

    /// Visibility of `row`; rows that are not declared are visible
    pub fn get_row_visible(&mut self, sheet: &str, row: u32) -> Result<bool> {
        check_row(row)?;
        Ok(self.row_record(sheet, row)?.map(|r| !r.hidden).unwrap_or(true))
    }

    /// Group `row` at outline `level` (1 to 7)
    pub fn set_row_outline_level(&mut self, sheet: &str, row: u32, level: u8) -> Result<()> {
        check_row(row)?;
        if !(1..=7).contains(&level) {
            return Err(ExcelError::InvalidOutlineLevel(level));
        }
        self.worksheet_mut(sheet)?.prepare_row(row).outline_level = level;
        Ok(())
    }

    /// Outline level of `row`, 0 when it is not grouped
    pub fn get_row_outline_level(&mut self, sheet: &str, row: u32) -> Result<u8> {
        check_row(row)?;
        Ok(self.row_record(sheet, row)?.map(|r| r.outline_level).unwrap_or(0))
    }

    fn row_record(&mut self, sheet: &str, row: u32) -> Result<Option<&RowData>> {
        Ok(self.worksheet(sheet)?.row(row))
    }
}
