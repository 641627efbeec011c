//! # excelrows
//!
//! A row engine for XLSX worksheets: stream rows out of the worksheet XML,
//! edit row metadata, and insert, remove or duplicate rows while keeping
//! merged cells consistent.
//!
//! ## Features
//!
//! - **Streaming Read**: Rows are produced one at a time straight from the
//!   worksheet XML, with undeclared rows and cells filled in as empty values
//! - **Structural Edits**: Insert, remove and duplicate rows; cell references
//!   and merged regions move with them
//! - **Row Metadata**: Height, visibility and outline level with defaults for
//!   rows that were never written
//! - **Lossless Round Trip**: Markup the engine does not model is written
//!   back untouched
//!
//! ## Quick Start
//!
//! ### Reading rows
//!
//! ```rust,no_run
//! use excelrows::Workbook;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut workbook = Workbook::open("data.xlsx")?;
//!
//! for row in workbook.rows("Sheet1")? {
//!     let row = row?;
//!     println!("Row: {:?}", row);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Editing rows
//!
//! ```rust,no_run
//! use excelrows::Workbook;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut workbook = Workbook::open("template.xlsx")?;
//!
//! // Repeat the line-item row, keeping its merged cells
//! workbook.duplicate_row_to("Sheet1", 2, 3)?;
//! workbook.remove_row("Sheet1", 10)?;
//!
//! workbook.set_row_height("Sheet1", 1, 28.5)?;
//! workbook.set_row_outline_level("Sheet1", 3, 1)?;
//! workbook.set_row_visible("Sheet1", 4, false)?;
//!
//! workbook.save("output.xlsx")?;
//! # Ok(())
//! # }
//! ```

pub mod coordinates;
pub mod error;
pub mod format;
pub mod package;
pub mod row_props;
pub mod shared_strings;
pub mod streaming_reader;
pub mod types;
pub mod workbook;
pub mod worksheet_xml;
pub mod xml;

mod adjust;
mod merge;
mod row_edit;
mod xml_writer;

pub use error::{ExcelError, Result};
pub use package::Package;
pub use row_props::convert_row_height_to_pixels;
pub use streaming_reader::Rows;
pub use types::{CellData, CellType, MergeCell, RowData, Worksheet, DEFAULT_ROW_HEIGHT};
pub use workbook::{Options, Workbook};
