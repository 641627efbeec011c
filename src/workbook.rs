//! Workbook document: sheet lookup, lazily loaded worksheets and caches

use crate::error::{ExcelError, Result};
use crate::format::{NumberFormats, STYLES_PART};
use crate::package::Package;
use crate::shared_strings::{SharedStringTable, SHARED_STRINGS_PARTS};
use crate::types::Worksheet;
use crate::worksheet_xml::{parse_worksheet, write_worksheet};
use crate::xml::{attribute_by_local_name, attribute_value};
use indexmap::map::Entry;
use indexmap::IndexMap;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::cell::OnceCell;
use std::path::Path;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

/// Longest sheet name a workbook accepts
const MAX_SHEET_NAME_LENGTH: usize = 31;

/// Environment variable read by [`Options::from_env`]
pub const RAW_CELL_VALUE_ENV: &str = "EXCELROWS_RAW_CELL_VALUE";

/// Workbook options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Return raw cell text without applying number formats
    pub raw_cell_value: bool,
    /// Initial buffer size used when a worksheet is serialized
    pub xml_buffer_capacity: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            raw_cell_value: false,
            xml_buffer_capacity: 64 * 1024,
        }
    }
}

impl Options {
    /// Defaults, with `raw_cell_value` taken from `EXCELROWS_RAW_CELL_VALUE`
    pub fn from_env() -> Self {
        let raw_cell_value = std::env::var(RAW_CELL_VALUE_ENV)
            .ok()
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true"))
            .unwrap_or(false);
        Options {
            raw_cell_value,
            ..Default::default()
        }
    }
}

/// An opened workbook
///
/// Worksheets are parsed the first time an operation needs their rows and
/// stay in memory until [`Workbook::flush`] writes them back into the
/// package. The shared-string table and the cell formats are loaded once, on
/// first use.
///
/// # Example
///
/// ```no_run
/// use excelrows::Workbook;
///
/// let mut workbook = Workbook::open("report.xlsx")?;
/// workbook.duplicate_row("Sheet1", 2)?;
/// workbook.set_row_height("Sheet1", 3, 32.5)?;
/// workbook.save("report-edited.xlsx")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Workbook {
    package: Package,
    options: Options,
    /// Sheet name to worksheet part name, in workbook order
    sheets: IndexMap<String, String>,
    /// Loaded worksheets keyed by part name
    worksheets: IndexMap<String, Worksheet>,
    shared_strings: OnceCell<SharedStringTable>,
    number_formats: OnceCell<NumberFormats>,
}

impl Workbook {
    /// Open an `.xlsx` file with default options
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, Options::default())
    }

    pub fn open_with_options<P: AsRef<Path>>(path: P, options: Options) -> Result<Self> {
        let package = Package::open(path)?;
        Self::from_package_with_options(package, options)
    }

    /// Wrap an already loaded package
    pub fn from_package(package: Package) -> Result<Self> {
        Self::from_package_with_options(package, Options::default())
    }

    pub fn from_package_with_options(package: Package, options: Options) -> Result<Self> {
        let sheets = load_sheet_map(&package)?;
        log::debug!("workbook has {} sheets", sheets.len());

        Ok(Workbook {
            package,
            options,
            sheets,
            worksheets: IndexMap::new(),
            shared_strings: OnceCell::new(),
            number_formats: OnceCell::new(),
        })
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.keys().cloned().collect()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The underlying package; loaded worksheets are only reflected after `flush`
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Flush every loaded worksheet and hand back the package
    pub fn into_package(mut self) -> Result<Package> {
        self.flush()?;
        Ok(self.package)
    }

    /// Part name of `sheet`
    pub(crate) fn sheet_part(&self, sheet: &str) -> Result<String> {
        let name = trim_sheet_name(sheet);
        self.sheets
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| ExcelError::SheetNotFound {
                sheet: sheet.to_string(),
                available: self.sheet_names().join(", "),
            })
    }

    /// Parsed worksheet, loading it on first access
    ///
    /// Rows come back sorted by number and densified.
    pub fn worksheet_mut(&mut self, sheet: &str) -> Result<&mut Worksheet> {
        let part = self.sheet_part(sheet)?;
        match self.worksheets.entry(part) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let bytes = self
                    .package
                    .read_part(entry.key())
                    .ok_or_else(|| ExcelError::PartNotFound(entry.key().clone()))?;
                let mut ws = parse_worksheet(bytes)?;
                ws.densify()?;
                log::debug!("loaded {} with {} rows", entry.key(), ws.rows.len());
                Ok(entry.insert(ws))
            }
        }
    }

    pub fn worksheet(&mut self, sheet: &str) -> Result<&Worksheet> {
        self.worksheet_mut(sheet).map(|ws| &*ws)
    }

    /// Serialize every loaded worksheet back into the package
    pub fn flush(&mut self) -> Result<()> {
        for (part, ws) in &self.worksheets {
            let bytes = write_worksheet(ws, self.options.xml_buffer_capacity)?;
            log::debug!("flushed {} ({} bytes)", part, bytes.len());
            self.package.write_part(part.clone(), bytes);
        }
        Ok(())
    }

    /// Serialize worksheet part `part` if it is loaded
    pub(crate) fn flush_part(&mut self, part: &str) -> Result<()> {
        if let Some(ws) = self.worksheets.get(part) {
            let bytes = write_worksheet(ws, self.options.xml_buffer_capacity)?;
            log::debug!("flushed {} ({} bytes)", part, bytes.len());
            self.package.write_part(part.to_string(), bytes);
        }
        Ok(())
    }

    /// Flush and write the package to `path`
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.flush()?;
        self.package.save(path)
    }

    /// Shared-string table, parsed on first use
    ///
    /// A missing part gives an empty table; a part that fails to decode is
    /// logged and also treated as empty.
    pub fn shared_strings(&self) -> &SharedStringTable {
        self.shared_strings.get_or_init(|| {
            let bytes = SHARED_STRINGS_PARTS
                .iter()
                .find_map(|part| self.package.read_part(part).filter(|b| !b.is_empty()));
            match bytes {
                Some(bytes) => SharedStringTable::parse(bytes).unwrap_or_else(|e| {
                    log::warn!("xml decode error in shared strings: {}", e);
                    SharedStringTable::default()
                }),
                None => SharedStringTable::default(),
            }
        })
    }

    /// Cell formats, parsed on first use
    pub fn number_formats(&self) -> &NumberFormats {
        self.number_formats
            .get_or_init(|| match self.package.read_part(STYLES_PART) {
                Some(bytes) => NumberFormats::parse(bytes).unwrap_or_else(|e| {
                    log::warn!("xml decode error in styles: {}", e);
                    NumberFormats::default()
                }),
                None => NumberFormats::default(),
            })
    }

    /// Display string of `raw` under cell style `style`
    pub fn formatted_value(&self, style: u32, raw: &str) -> String {
        if self.options.raw_cell_value {
            return raw.to_string();
        }
        self.number_formats().format(style, raw)
    }
}

/// Sheet names are limited to 31 characters
fn trim_sheet_name(name: &str) -> String {
    name.chars().take(MAX_SHEET_NAME_LENGTH).collect()
}

/// Map sheet names to worksheet part names via the workbook relationships
fn load_sheet_map(package: &Package) -> Result<IndexMap<String, String>> {
    let workbook = package
        .read_part(WORKBOOK_PART)
        .ok_or_else(|| ExcelError::PartNotFound(WORKBOOK_PART.to_string()))?;
    let rels = package
        .read_part(WORKBOOK_RELS_PART)
        .ok_or_else(|| ExcelError::PartNotFound(WORKBOOK_RELS_PART.to_string()))?;

    let targets = read_relationship_targets(rels)?;

    let mut sheets = IndexMap::new();
    let mut reader = Reader::from_reader(workbook);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let name = attribute_value(&e, b"name")?;
                let rid = attribute_by_local_name(&e, b"id")?;
                if let (Some(name), Some(rid)) = (name, rid) {
                    match targets.get(&rid) {
                        Some(target) => {
                            sheets.insert(name, resolve_target(target));
                        }
                        None => log::warn!("sheet '{}' has no relationship {}", name, rid),
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(sheets)
}

fn read_relationship_targets(rels: &[u8]) -> Result<IndexMap<String, String>> {
    let mut targets = IndexMap::new();
    let mut reader = Reader::from_reader(rels);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let id = attribute_value(&e, b"Id")?;
                let target = attribute_value(&e, b"Target")?;
                if let (Some(id), Some(target)) = (id, target) {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(targets)
}

/// Targets are relative to `xl/` unless they start with `/`
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target.trim_start_matches("./")),
    }
}
