//! Named-part storage for an XLSX package
//!
//! The row engine only needs "bytes of part X" and "replace part X". Parts are
//! kept in archive order so a saved file lists its entries the way the source
//! did.

use crate::error::{ExcelError, Result};
use indexmap::IndexMap;
use s_zip::{StreamingZipReader, StreamingZipWriter};
use std::path::Path;

/// In-memory set of package parts keyed by part name (`"xl/workbook.xml"`)
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: IndexMap<String, Vec<u8>>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every entry of an `.xlsx` file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_string_lossy().to_string();
        let mut archive = StreamingZipReader::open(path.as_str())
            .map_err(|e| ExcelError::ReadError(format!("Failed to open ZIP: {}", e)))?;

        let names: Vec<String> = archive
            .entries()
            .iter()
            .map(|entry| entry.name.clone())
            .filter(|name| !name.ends_with('/'))
            .collect();

        let mut parts = IndexMap::with_capacity(names.len());
        for name in names {
            let data = archive.read_entry_by_name(&name).map_err(|e| {
                ExcelError::ReadError(format!("Failed to read entry '{}': {}", name, e))
            })?;
            parts.insert(name, data);
        }

        log::debug!("opened package {} with {} parts", path, parts.len());
        Ok(Package { parts })
    }

    /// Write every part into a new `.xlsx` file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref().to_string_lossy().to_string();
        let mut writer = StreamingZipWriter::new(path.as_str())
            .map_err(|e| ExcelError::WriteError(format!("Failed to create ZIP: {}", e)))?;

        for (name, data) in &self.parts {
            writer
                .start_entry(name)
                .map_err(|e| ExcelError::WriteError(format!("Failed to add '{}': {}", name, e)))?;
            writer
                .write_data(data)
                .map_err(|e| ExcelError::WriteError(format!("Failed to write '{}': {}", name, e)))?;
        }
        writer
            .finish()
            .map_err(|e| ExcelError::WriteError(format!("Failed to finish ZIP: {}", e)))?;

        log::debug!("saved package {} with {} parts", path, self.parts.len());
        Ok(())
    }

    /// Raw bytes of part `name`
    pub fn read_part(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    /// Replace or add part `name`
    pub fn write_part(&mut self, name: impl Into<String>, data: Vec<u8>) {
        self.parts.insert(name.into(), data);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts_keep_insertion_order() {
        let mut package = Package::new();
        package.write_part("[Content_Types].xml", b"a".to_vec());
        package.write_part("xl/workbook.xml", b"b".to_vec());
        package.write_part("[Content_Types].xml", b"c".to_vec());

        let names: Vec<&str> = package.part_names().collect();
        assert_eq!(names, ["[Content_Types].xml", "xl/workbook.xml"]);
        assert_eq!(package.read_part("[Content_Types].xml"), Some(&b"c"[..]));
        assert!(package.read_part("xl/missing.xml").is_none());
        assert_eq!(package.len(), 2);
    }
}
