//! Display formatting of raw cell values
//!
//! A cell's style index selects a cell format (`<xf>` inside `<cellXfs>` of
//! `xl/styles.xml`), and that format's `numFmtId` selects how the raw value is
//! shown. Only the built-in number formats are applied; custom formats and
//! anything that does not parse as a number are returned verbatim.

use crate::error::Result;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Part holding the cell formats
pub const STYLES_PART: &str = "xl/styles.xml";

/// Style index to number format mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberFormats {
    xf_num_fmt_ids: Vec<u32>,
}

impl NumberFormats {
    /// Parse the `<cellXfs>` section of `xl/styles.xml`
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        let mut buf = Vec::new();
        let mut in_cell_xfs = false;
        let mut xf_num_fmt_ids = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = true,
                Event::End(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
                Event::Start(e) | Event::Empty(e)
                    if in_cell_xfs && e.local_name().as_ref() == b"xf" =>
                {
                    let id = crate::xml::attribute_value(&e, b"numFmtId")?
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(0);
                    xf_num_fmt_ids.push(id);
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(NumberFormats { xf_num_fmt_ids })
    }

    pub fn from_num_fmt_ids(ids: Vec<u32>) -> Self {
        NumberFormats {
            xf_num_fmt_ids: ids,
        }
    }

    /// Number format id of style `style`
    pub fn num_fmt_id(&self, style: u32) -> Option<u32> {
        self.xf_num_fmt_ids.get(style as usize).copied()
    }

    /// Display string of `raw` under style `style`
    pub fn format(&self, style: u32, raw: &str) -> String {
        if style == 0 {
            return raw.to_string();
        }
        match self.num_fmt_id(style) {
            Some(id) => apply_builtin_format(id, raw),
            None => raw.to_string(),
        }
    }
}

/// Apply built-in number format `id` to `raw`
pub fn apply_builtin_format(id: u32, raw: &str) -> String {
    let value = match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => return raw.to_string(),
    };

    match id {
        1 => int_string(value.round() as i64),
        2 => format!("{:.2}", value),
        3 => group_thousands(value.round() as i64),
        4 => {
            let cents = (value * 100.0).round() as i64;
            let sign = if cents < 0 { "-" } else { "" };
            let cents = cents.unsigned_abs();
            format!(
                "{}{}.{:02}",
                sign,
                group_thousands((cents / 100) as i64),
                cents % 100
            )
        }
        9 => format!("{}%", int_string((value * 100.0).round() as i64)),
        10 => format!("{:.2}%", value * 100.0),
        14..=22 => format_date(id, value).unwrap_or_else(|| raw.to_string()),
        _ => raw.to_string(),
    }
}

fn int_string(value: i64) -> String {
    let mut buf = itoa::Buffer::new();
    buf.format(value).to_string()
}

fn group_thousands(value: i64) -> String {
    let mut buf = itoa::Buffer::new();
    let digits = buf.format(value.unsigned_abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn format_date(id: u32, serial: f64) -> Option<String> {
    let pattern = match id {
        14 => "%m-%d-%y",
        15 => "%-d-%b-%y",
        16 => "%-d-%b",
        17 => "%b-%y",
        18 => "%-I:%M %p",
        19 => "%-I:%M:%S %p",
        20 => "%-H:%M",
        21 => "%H:%M:%S",
        22 => "%-m/%-d/%y %-H:%M",
        _ => return None,
    };
    serial_to_datetime(serial).map(|dt| dt.format(pattern).to_string())
}

/// Convert a serial date of the 1900 date system
///
/// Serial 60 is the nonexistent 1900-02-29; serials before it are shifted so
/// that serial 1 is 1900-01-01.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let mut days = serial.trunc() as i64;
    if days < 60 {
        days += 1;
    }
    let seconds = ((serial - serial.trunc()) * 86_400.0).round() as i64;

    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    epoch
        .checked_add_signed(TimeDelta::try_days(days)?)?
        .checked_add_signed(TimeDelta::try_seconds(seconds)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell_xfs() {
        let xml = r#"<styleSheet>
<cellStyleXfs count="1"><xf numFmtId="99"/></cellStyleXfs>
<cellXfs count="3"><xf numFmtId="0"/><xf numFmtId="14" applyNumberFormat="1"><alignment horizontal="left"/></xf><xf numFmtId="10"/></cellXfs>
</styleSheet>"#;
        let formats = NumberFormats::parse(xml.as_bytes()).unwrap();
        assert_eq!(formats.num_fmt_id(0), Some(0));
        assert_eq!(formats.num_fmt_id(1), Some(14));
        assert_eq!(formats.num_fmt_id(2), Some(10));
        assert_eq!(formats.num_fmt_id(3), None);

        assert_eq!(formats.format(1, "43831"), "01-01-20");
        assert_eq!(formats.format(2, "0.1234"), "12.34%");
        assert_eq!(formats.format(7, "0.1234"), "0.1234");
        assert_eq!(formats.format(0, "43831"), "43831");
    }

    #[test]
    fn test_numeric_builtins() {
        assert_eq!(apply_builtin_format(0, "1.5"), "1.5");
        assert_eq!(apply_builtin_format(1, "2.5"), "3");
        assert_eq!(apply_builtin_format(2, "3.14159"), "3.14");
        assert_eq!(apply_builtin_format(3, "1234567"), "1,234,567");
        assert_eq!(apply_builtin_format(4, "-1234.5"), "-1,234.50");
        assert_eq!(apply_builtin_format(9, "0.25"), "25%");
        assert_eq!(apply_builtin_format(49, "007"), "007");
        assert_eq!(apply_builtin_format(3, "abc"), "abc");
    }

    #[test]
    fn test_dates() {
        assert_eq!(apply_builtin_format(14, "1"), "01-01-00");
        assert_eq!(apply_builtin_format(15, "61"), "1-Mar-00");
        assert_eq!(apply_builtin_format(21, "0.75"), "18:00:00");
        assert_eq!(apply_builtin_format(22, "43831.5"), "1/1/20 12:00");
        assert_eq!(apply_builtin_format(14, "-1"), "-1");
    }
}
