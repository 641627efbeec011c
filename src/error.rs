//! Error types for the excelrows library

use thiserror::Error;

/// Result type alias for excelrows operations
pub type Result<T> = std::result::Result<T, ExcelError>;

/// Main error type for all worksheet operations
#[derive(Error, Debug)]
pub enum ExcelError {
    /// Error occurred while reading the package
    #[error("Failed to read Excel file: {0}")]
    ReadError(String),

    /// Error occurred while writing the package
    #[error("Failed to write Excel file: {0}")]
    WriteError(String),

    /// Invalid sheet name or sheet not found
    #[error("Sheet '{sheet}' not found. Available sheets: {available}")]
    SheetNotFound { sheet: String, available: String },

    /// A required package part is missing
    #[error("Part '{0}' not found in package")]
    PartNotFound(String),

    /// Row number below 1
    #[error("Invalid row number {0}: rows start at 1")]
    InvalidRowNumber(u32),

    /// Outline level outside 1..=7
    #[error("Invalid outline level {0}: expected 1 to 7")]
    InvalidOutlineLevel(u8),

    /// Invalid cell, column or area reference
    #[error("Invalid cell reference: {0}")]
    InvalidCell(String),

    /// `<row r="...">` attribute that is not a row number
    #[error("Invalid row attribute: {0}")]
    InvalidRowAttribute(String),

    /// XML tokenizer error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute error
    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<std::str::Utf8Error> for ExcelError {
    fn from(err: std::str::Utf8Error) -> Self {
        ExcelError::ReadError(format!("Invalid UTF-8 in XML: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_not_found_message() {
        let err = ExcelError::SheetNotFound {
            sheet: "Missing".to_string(),
            available: "Sheet1, Sheet2".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Missing"));
        assert!(msg.contains("Available"));
        assert!(msg.contains("Sheet2"));
    }

    #[test]
    fn test_row_errors() {
        assert_eq!(
            ExcelError::InvalidRowNumber(0).to_string(),
            "Invalid row number 0: rows start at 1"
        );
        assert!(ExcelError::InvalidOutlineLevel(8).to_string().contains('8'));
    }
}
