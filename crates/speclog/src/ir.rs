use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A zero-based line/column position. Columns count UTF-16 code units, the
/// way editors address text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LineRange {
    pub start: Position,
    pub end: Position,
}

impl LineRange {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A zero-length range at the very start of the document.
    pub fn origin() -> Self {
        Self::default()
    }
}

/// What produced a [`FoldRegion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FoldKind {
    Session,
    /// Banner text between the welcome line and the first prompt of a session.
    Banner,
    Prompt,
    /// A run of numeric or datetime rows.
    Data,
    /// The data block following a scan header.
    Scan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoldRegion {
    pub start_line: u32,
    pub end_line: u32,
    pub kind: FoldKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Session,
    Prompt,
    Scan,
}

/// One entry of the outline tree.
///
/// `range` is the full textual extent of the node and `selection_range` the
/// single line that defines it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineNode {
    pub kind: NodeKind,
    pub name: String,
    pub detail: String,
    pub range: LineRange,
    pub selection_range: LineRange,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    pub fn new(kind: NodeKind, name: impl Into<String>, detail: impl Into<String>, anchor: LineRange) -> Self {
        Self {
            kind,
            name: name.into(),
            detail: detail.into(),
            range: anchor,
            selection_range: anchor,
            children: Vec::new(),
        }
    }
}

/// A clickable reference to a data file named in a scan header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSpan {
    pub line: u32,
    pub start_column: u32,
    pub end_column: u32,
    pub target: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub folding_ranges: Vec<FoldRegion>,
    pub document_symbols: Vec<OutlineNode>,
    pub document_links: Vec<LinkSpan>,
}

impl ParseResult {
    pub fn is_empty(&self) -> bool {
        self.folding_ranges.is_empty()
            && self.document_symbols.is_empty()
            && self.document_links.is_empty()
    }
}
