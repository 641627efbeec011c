//! Row renumbering after structural edits
//!
//! Inserting or deleting a row moves every row at or below the pivot by one,
//! rewriting each cell reference, and moves the edges of merged regions with
//! them. Formulas, defined names and other references are left untouched.

use crate::coordinates::{coordinates_to_area_ref, coordinates_to_cell_name, MAX_ROWS};
use crate::error::{ExcelError, Result};
use crate::types::{MergeCell, Worksheet};

/// Direction of a row shift
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shift {
    /// A row was inserted at the pivot
    Insert,
    /// The row at the pivot was deleted
    Delete,
}

impl Shift {
    /// New number of a row at `number`, `None` when it leaves the sheet
    fn apply(self, number: u32) -> Option<u32> {
        let shifted = match self {
            Shift::Insert => number.checked_add(1)?,
            Shift::Delete => number.checked_sub(1)?,
        };
        (1..=MAX_ROWS).contains(&shifted).then_some(shifted)
    }
}

/// Shift rows and merged regions at `pivot`, then densify the result
pub(crate) fn adjust_rows(ws: &mut Worksheet, pivot: u32, shift: Shift) -> Result<()> {
    shift_row_records(ws, pivot, shift)?;
    ws.merge_cells = shift_merge_cells(&ws.merge_cells, pivot, shift)?;
    ws.densify()
}

fn shift_row_records(ws: &mut Worksheet, pivot: u32, shift: Shift) -> Result<()> {
    let start = match ws.row_index(pivot) {
        Ok(idx) | Err(idx) => idx,
    };
    // the deleted row itself is gone by now; anything still at the pivot stays
    let start = match shift {
        Shift::Delete => start + usize::from(ws.row(pivot).is_some()),
        Shift::Insert => start,
    };

    // every new reference is computed before any row is touched
    let mut renumbered = Vec::with_capacity(ws.rows.len() - start);
    for row in &ws.rows[start..] {
        let number = shift
            .apply(row.number)
            .ok_or(ExcelError::InvalidRowNumber(row.number))?;
        let references = row
            .cells
            .iter()
            .map(|cell| coordinates_to_cell_name(cell.column()?, number))
            .collect::<Result<Vec<String>>>()?;
        renumbered.push((number, references));
    }

    for (row, (number, references)) in ws.rows[start..].iter_mut().zip(renumbered) {
        row.number = number;
        for (cell, reference) in row.cells.iter_mut().zip(references) {
            cell.reference = reference;
        }
    }
    Ok(())
}

/// Shifted copy of `merges`
///
/// On delete, regions that lay entirely on the pivot row and regions that
/// shrink to a single cell are dropped.
fn shift_merge_cells(merges: &[MergeCell], pivot: u32, shift: Shift) -> Result<Vec<MergeCell>> {
    let mut shifted = Vec::with_capacity(merges.len());
    for merge in merges {
        let [x1, mut y1, x2, mut y2] = merge.coordinates()?;
        match shift {
            Shift::Insert => {
                if y1 >= pivot {
                    y1 += 1;
                }
                if y2 >= pivot {
                    y2 += 1;
                }
                if y2 > MAX_ROWS {
                    continue;
                }
            }
            Shift::Delete => {
                if y1 == pivot && y2 == pivot {
                    continue;
                }
                if y1 > pivot {
                    y1 -= 1;
                }
                if y2 >= pivot {
                    y2 -= 1;
                }
                if x1 == x2 && y1 == y2 {
                    continue;
                }
            }
        }
        shifted.push(MergeCell::new(coordinates_to_area_ref(&[x1, y1, x2, y2])?));
    }
    Ok(shifted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CellData, RowData};

    fn sheet(numbers: &[u32]) -> Worksheet {
        let mut ws = Worksheet::default();
        for &n in numbers {
            let mut row = RowData::new(n);
            row.cells.push(CellData {
                reference: format!("B{}", n),
                value: Some(n.to_string()),
                ..Default::default()
            });
            ws.rows.push(row);
        }
        ws
    }

    fn refs(merges: &[MergeCell]) -> Vec<&str> {
        merges.iter().map(|m| m.reference.as_str()).collect()
    }

    #[test]
    fn test_insert_moves_rows_at_and_below_pivot() {
        let mut ws = sheet(&[1, 3, 4]);
        adjust_rows(&mut ws, 3, Shift::Insert).unwrap();

        let numbers: Vec<u32> = ws.rows.iter().map(|r| r.number).collect();
        assert_eq!(numbers, [1, 4, 5]);
        assert_eq!(ws.rows[1].cells[1].reference, "B4");
        assert_eq!(ws.rows[1].cells[1].raw_value(), "3");
        // densified after the shift
        assert_eq!(ws.rows[1].cells[0].reference, "A4");
    }

    #[test]
    fn test_delete_pulls_rows_below_pivot_up() {
        let mut ws = sheet(&[1, 2, 4, 5]);
        ws.rows.remove(1);
        adjust_rows(&mut ws, 2, Shift::Delete).unwrap();

        let numbers: Vec<u32> = ws.rows.iter().map(|r| r.number).collect();
        assert_eq!(numbers, [1, 3, 4]);
        assert_eq!(ws.rows[2].cells[1].reference, "B4");
    }

    #[test]
    fn test_delete_past_last_row_keeps_rows() {
        let mut ws = sheet(&[1, 2]);
        adjust_rows(&mut ws, 9, Shift::Delete).unwrap();
        let numbers: Vec<u32> = ws.rows.iter().map(|r| r.number).collect();
        assert_eq!(numbers, [1, 2]);
    }

    #[test]
    fn test_insert_past_last_row_leaves_rows_untouched() {
        let mut ws = sheet(&[MAX_ROWS - 2, MAX_ROWS - 1, MAX_ROWS]);
        let before = ws.clone();

        assert!(matches!(
            adjust_rows(&mut ws, MAX_ROWS - 1, Shift::Insert),
            Err(ExcelError::InvalidRowNumber(n)) if n == MAX_ROWS
        ));
        assert_eq!(ws, before);
    }

    #[test]
    fn test_bad_cell_reference_leaves_rows_untouched() {
        let mut ws = sheet(&[1, 2, 3]);
        ws.rows[2].cells[0].reference = "??".to_string();
        let before = ws.clone();

        assert!(adjust_rows(&mut ws, 1, Shift::Insert).is_err());
        assert_eq!(ws, before);
    }

    #[test]
    fn test_insert_shifts_merges() {
        let merges = vec![
            MergeCell::new("A1:B1"),
            MergeCell::new("A2:B4"),
            MergeCell::new("C3:D3"),
            MergeCell::new("E5:F6"),
        ];
        let shifted = shift_merge_cells(&merges, 3, Shift::Insert).unwrap();
        assert_eq!(refs(&shifted), ["A1:B1", "A2:B5", "C4:D4", "E6:F7"]);
    }

    #[test]
    fn test_delete_shifts_and_drops_merges() {
        let merges = vec![
            MergeCell::new("A1:B1"),
            MergeCell::new("A2:B4"),
            MergeCell::new("C3:D3"),
            MergeCell::new("E5:F6"),
            MergeCell::new("G3:G4"),
        ];
        let shifted = shift_merge_cells(&merges, 3, Shift::Delete).unwrap();
        assert_eq!(refs(&shifted), ["A1:B1", "A2:B3", "E4:F5"]);
    }
}
