//! Line level shape recognition.
//!
//! Each matcher looks at a single line (plus, for the welcome banner, whether
//! the line before it is blank). Nothing here knows about sessions or prompts;
//! see [`outline`](crate::outline) for that.

use crate::config::AbsorptionPolicy;
use crate::document::utf16_column;
use once_cell::sync::Lazy;
use regex::Regex;

/// Integers, decimals and powers of ten: `123`, `-012`, `+1.5`, `2.0E-03`.
/// `.5` and `12.` are not numbers.
const NUMBER: &str = r"[+-]?[0-9]+(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?";

/// The format `date` prints, e.g. `Wed Jan 31 01:23:45 2024`.
const CALENDAR: &str = r"(?:Sun|Mon|Tue|Wed|Thu|Fri|Sat) (?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec) [0-9]{1,2} [0-9]{1,2}:[0-9]{2}:[0-9]{2} [0-9]{4}";

/// `01:23`, `1:23:45.7890`.
const CLOCK: &str = r"[0-9]+:[0-9]{2}(?::[0-9]{2})?(?:[,.][0-9]+)?";

/// ISO 8601 extended format, zone optional: `2024-01-31T01:23:45+09:00`.
const ISO_EXTENDED: &str =
    r"[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(?:[,.][0-9]+)?(?:Z|[+-][0-9]{2}(?::[0-9]{2})?)?";

/// ISO 8601 basic format, zone optional: `20240131T012345+0900`.
const ISO_BASIC: &str = r"[0-9]{8}T[0-9]{6}(?:Z|[+-][0-9]{2}(?:[0-9]{2})?)?";

static NUMBER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^\s*(?:{NUMBER}(?:\s+|$))+$")).unwrap());

static DATETIME_LINE: Lazy<Regex> = Lazy::new(|| {
    let token = [NUMBER, CALENDAR, CLOCK, ISO_EXTENDED, ISO_BASIC].join("|");
    Regex::new(&format!(r"^\s*(?:(?:{token})(?:\s+|$))+$")).unwrap()
});

static PROMPT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+\.[A-Z][A-Z0-9]*>)\s+(.*?)\s*$").unwrap());

static WELCOME_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*Welcome to "spec" Release"#).unwrap());

// The header printed by the `_head` macro of standard.mac:
// `Scan 3   ascan   file=/data/run.001   ascan th 0 1 100 1  user=alice`
static SCAN_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^Scan\s+([0-9]+)\s{3}(\S.*?)\s{3}",
        r"(?:file\s*=\s*(\S.*?)|\*\*NO DATA FILE\*\*)",
        r"\s{2,}(\S.*?)\s{2}user\s*=\s*(\S.*)$",
    ))
    .unwrap()
});

/// Flavour of a data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    /// Every token is a number.
    Numeric,
    /// At least one token is a time or timestamp.
    Temporal,
}

/// Path captured from a scan header, with its UTF-16 column span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCapture {
    pub path: String,
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanHeader {
    pub number: String,
    pub kind_text: String,
    pub file: Option<FileCapture>,
    pub description: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    DataRow(DataKind),
    Prompt { id: String, text: String },
    Welcome,
    ScanHeader(ScanHeader),
    Plain,
}

/// Classifies one line. The first matching shape wins, in this order: data
/// row, prompt, welcome banner, scan header.
///
/// `previous_blank` tells whether a preceding line exists and is blank; the
/// welcome banner only counts in that case.
pub fn classify_line(text: &str, previous_blank: bool, policy: AbsorptionPolicy) -> LineClass {
    if let Some(kind) = data_kind(text, policy) {
        return LineClass::DataRow(kind);
    }
    if let Some((id, text)) = parse_prompt(text) {
        return LineClass::Prompt { id, text };
    }
    if previous_blank && is_welcome(text) {
        return LineClass::Welcome;
    }
    match parse_scan_header(text) {
        Some(header) => LineClass::ScanHeader(header),
        None => LineClass::Plain,
    }
}

/// Returns the flavour of `text` if it is a data row under `policy`.
pub fn data_kind(text: &str, policy: AbsorptionPolicy) -> Option<DataKind> {
    if NUMBER_LINE.is_match(text) {
        return Some(DataKind::Numeric);
    }
    match policy {
        AbsorptionPolicy::Numeric => None,
        AbsorptionPolicy::Temporal | AbsorptionPolicy::Split => {
            DATETIME_LINE.is_match(text).then_some(DataKind::Temporal)
        }
    }
}

/// True if the line is made of numbers only. Scan data blocks use this
/// regardless of the absorption policy.
pub fn is_numeric_row(text: &str) -> bool {
    NUMBER_LINE.is_match(text)
}

pub fn parse_prompt(text: &str) -> Option<(String, String)> {
    let caps = PROMPT_LINE.captures(text)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

/// Shape check only; the blank-line rule lives in [`classify_line`].
pub fn is_welcome(text: &str) -> bool {
    WELCOME_LINE.is_match(text)
}

pub fn parse_scan_header(text: &str) -> Option<ScanHeader> {
    let caps = SCAN_LINE.captures(text)?;
    let file = caps.get(3).map(|m| FileCapture {
        path: m.as_str().to_string(),
        start: utf16_column(text, m.start()),
        end: utf16_column(text, m.end()),
    });
    Some(ScanHeader {
        number: caps[1].to_string(),
        kind_text: caps[2].to_string(),
        file,
        description: caps[4].trim_end().to_string(),
        user: caps[5].trim_end().to_string(),
    })
}
