//! Merged cell regions

use crate::coordinates::{cell_name_to_coordinates, coordinates_to_area_ref};
use crate::error::Result;
use crate::types::{MergeCell, Worksheet};
use crate::workbook::Workbook;

impl Workbook {
    /// Merge the rectangle spanned by two corner cells
    ///
    /// The corners may be given in any order. Existing regions that overlap
    /// the new one are removed first.
    ///
    /// ```no_run
    /// # use excelrows::Workbook;
    /// let mut workbook = Workbook::open("report.xlsx")?;
    /// workbook.merge_cell("Sheet1", "D3", "B1")?;
    /// assert!(workbook.merge_cells("Sheet1")?.contains(&"B1:D3".to_string()));
    /// # Ok::<(), excelrows::ExcelError>(())
    /// ```
    pub fn merge_cell(&mut self, sheet: &str, top_left: &str, bottom_right: &str) -> Result<()> {
        let (x1, y1) = cell_name_to_coordinates(top_left)?;
        let (x2, y2) = cell_name_to_coordinates(bottom_right)?;
        let rect = [x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2)];
        let ws = self.worksheet_mut(sheet)?;
        merge_region(ws, rect)
    }

    /// References of the merged regions on `sheet`
    pub fn merge_cells(&mut self, sheet: &str) -> Result<Vec<String>> {
        let ws = self.worksheet(sheet)?;
        Ok(ws.merge_cells.iter().map(|m| m.reference.clone()).collect())
    }
}

fn overlaps(a: &[u32; 4], b: &[u32; 4]) -> bool {
    a[0] <= b[2] && b[0] <= a[2] && a[1] <= b[3] && b[1] <= a[3]
}

/// Add normalized region `rect`, dropping the regions it overlaps
pub(crate) fn merge_region(ws: &mut Worksheet, rect: [u32; 4]) -> Result<()> {
    let reference = coordinates_to_area_ref(&rect)?;

    let mut kept = Vec::with_capacity(ws.merge_cells.len() + 1);
    for merge in ws.merge_cells.drain(..) {
        if !overlaps(&merge.coordinates()?, &rect) {
            kept.push(merge);
        }
    }
    kept.push(MergeCell::new(reference));
    ws.merge_cells = kept;
    Ok(())
}

/// Copy the single-row merges of `row` onto `row2` after a duplicate
///
/// Runs after rows at `row2` and below were shifted down, so a source row
/// below the target has already moved by one. Nothing is copied when `row2`
/// falls strictly inside the row span of any existing region.
pub(crate) fn duplicate_merge_cells(ws: &mut Worksheet, row: u32, row2: u32) -> Result<()> {
    let row = if row > row2 { row + 1 } else { row };

    let regions = ws
        .merge_cells
        .iter()
        .map(MergeCell::coordinates)
        .collect::<Result<Vec<_>>>()?;

    if regions.iter().any(|r| r[1] < row2 && row2 < r[3]) {
        return Ok(());
    }

    for [x1, y1, x2, y2] in regions {
        if y1 == row && y2 == row {
            merge_region(ws, [x1, row2, x2, row2])?;
        }
    }
    Ok(())
}
