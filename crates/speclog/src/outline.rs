use crate::cancel::{Cancellation, NeverCancelled};
use crate::classify::{DataKind, LineClass, ScanHeader, classify_line, is_numeric_row};
use crate::config::{AbsorptionPolicy, ParserConfig};
use crate::document::LineSource;
use crate::ir::{FoldKind, FoldRegion, LineRange, LinkSpan, NodeKind, OutlineNode, ParseResult};
use crate::links::resolve_target;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("parse cancelled at line {line}")]
    Cancelled { line: usize },
}

/// Builds folding ranges, the session/prompt/scan outline and data file
/// links for a spec session log.
///
/// Every call to [`parse`](Self::parse) scans the whole document once from
/// top to bottom; the parser itself holds only configuration and can be
/// reused and shared between threads.
#[derive(Debug, Clone, Default)]
pub struct OutlineParser {
    config: ParserConfig,
    workspace_folder: Option<PathBuf>,
}

impl OutlineParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Folder that relative `file=` paths are resolved against.
    pub fn with_workspace_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.workspace_folder = Some(folder.into());
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn workspace_folder(&self) -> Option<&Path> {
        self.workspace_folder.as_deref()
    }

    /// Parses the whole document.
    pub fn parse<L: LineSource + ?Sized>(&self, doc: &L) -> ParseResult {
        // Cannot fail: the token never fires.
        self.parse_cancellable(doc, &NeverCancelled).unwrap_or_default()
    }

    /// Parses the whole document, polling `cancel` before every line.
    ///
    /// A cancelled parse yields [`ParseError::Cancelled`] and no partial
    /// result.
    pub fn parse_cancellable<L, C>(&self, doc: &L, cancel: &C) -> Result<ParseResult, ParseError>
    where
        L: LineSource + ?Sized,
        C: Cancellation + ?Sized,
    {
        let line_count = doc.line_count();
        if line_count == 0 {
            return Ok(ParseResult::default());
        }

        let mut state = OutlineState::new(&self.config, self.workspace_folder.as_deref());
        let mut index = 0;
        while index < line_count {
            if cancel.is_cancelled() {
                log::debug!("parse cancelled at line {} of {}", index, line_count);
                return Err(ParseError::Cancelled { line: index });
            }
            index = state.step(doc, index);
        }

        let result = state.finish(doc);
        log::trace!(
            "parsed {} lines: {} sessions, {} folds, {} links",
            line_count,
            result.document_symbols.len(),
            result.folding_ranges.len(),
            result.document_links.len()
        );
        Ok(result)
    }
}

struct SessionSlot {
    node: OutlineNode,
    /// Blank line in front of the banner; `None` for the synthetic
    /// `session #0`.
    start_line: Option<usize>,
}

#[derive(Clone, Copy)]
struct OpenPrompt {
    /// Index among the current session's children.
    child: usize,
    line: usize,
}

#[derive(Clone, Copy)]
struct Run {
    start: usize,
    kind: DataKind,
}

/// Scan state threaded through [`step`](OutlineState::step), one line at a
/// time. The current session is always the last one in `sessions`.
struct OutlineState<'a> {
    config: &'a ParserConfig,
    workspace_folder: Option<&'a Path>,
    sessions: Vec<SessionSlot>,
    prompt: Option<OpenPrompt>,
    run: Option<Run>,
    session_count: u32,
    folds: Vec<FoldRegion>,
    links: Vec<LinkSpan>,
}

impl<'a> OutlineState<'a> {
    fn new(config: &'a ParserConfig, workspace_folder: Option<&'a Path>) -> Self {
        Self {
            config,
            workspace_folder,
            sessions: Vec::new(),
            prompt: None,
            run: None,
            session_count: 0,
            folds: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Consumes line `index` and returns the index of the next line to
    /// look at. Scan data blocks are consumed whole.
    fn step<L: LineSource + ?Sized>(&mut self, doc: &L, index: usize) -> usize {
        let text = doc.line_text(index);
        let previous_blank = index > 0 && doc.line(index - 1).is_empty_or_whitespace();

        match classify_line(text, previous_blank, self.config.absorption) {
            LineClass::DataRow(kind) => {
                self.absorb(index, kind);
                index + 1
            }
            LineClass::Prompt { id, text } => {
                self.close_run(index);
                self.open_prompt(doc, index, id, text);
                index + 1
            }
            LineClass::Welcome => {
                self.close_run(index);
                self.open_session(doc, index);
                index + 1
            }
            LineClass::ScanHeader(header) => {
                self.close_run(index);
                self.scan_header(doc, index, &header)
            }
            LineClass::Plain => {
                self.close_run(index);
                index + 1
            }
        }
    }

    fn finish<L: LineSource + ?Sized>(mut self, doc: &L) -> ParseResult {
        let line_count = doc.line_count();
        self.close_run(line_count);

        let last = line_count - 1;
        if let Some(prompt) = self.prompt.take() {
            self.close_prompt(doc, prompt, last);
        }
        self.close_session(doc, last);

        ParseResult {
            folding_ranges: self.folds,
            document_symbols: self.sessions.into_iter().map(|slot| slot.node).collect(),
            document_links: self.links,
        }
    }

    fn absorb(&mut self, index: usize, kind: DataKind) {
        match self.run {
            Some(run) if self.same_run(run.kind, kind) => {}
            Some(_) => {
                self.close_run(index);
                self.run = Some(Run { start: index, kind });
            }
            None => self.run = Some(Run { start: index, kind }),
        }
    }

    fn same_run(&self, current: DataKind, next: DataKind) -> bool {
        self.config.absorption != AbsorptionPolicy::Split || current == next
    }

    /// Ends the open data run; `end` is the first line that is not part of
    /// it. The fold stops one line short of the last row.
    fn close_run(&mut self, end: usize) {
        if let Some(run) = self.run.take() {
            if let Some(fold_end) = end.checked_sub(2) {
                self.push_fold(run.start, fold_end, FoldKind::Data);
            }
        }
    }

    fn open_prompt<L: LineSource + ?Sized>(&mut self, doc: &L, index: usize, id: String, text: String) {
        if let Some(prompt) = self.prompt.take() {
            self.close_prompt(doc, prompt, index - 1);
        }

        let current = self
            .sessions
            .last()
            .map(|slot| (slot.start_line, slot.node.children.is_empty()));
        match current {
            None => {
                // The banner is missing, e.g. the log was rotated while spec
                // was running.
                self.sessions.push(SessionSlot {
                    node: OutlineNode::new(NodeKind::Session, "session #0", "", LineRange::origin()),
                    start_line: None,
                });
            }
            // First prompt of the session: fold the banner text above it.
            Some((Some(start), true)) => self.push_fold(start + 1, index - 1, FoldKind::Banner),
            Some(_) => {}
        }

        let node = OutlineNode::new(NodeKind::Prompt, id, text, doc.line(index).range());
        if let Some(session) = self.sessions.last_mut() {
            self.prompt = Some(OpenPrompt {
                child: session.node.children.len(),
                line: index,
            });
            session.node.children.push(node);
        }
    }

    fn open_session<L: LineSource + ?Sized>(&mut self, doc: &L, index: usize) {
        // The blank separator line in front of the banner belongs to the new
        // session, so the previous blocks end two lines up.
        if let Some(last) = index.checked_sub(2) {
            if let Some(prompt) = self.prompt.take() {
                self.close_prompt(doc, prompt, last);
            }
            self.close_session(doc, last);
        }
        self.prompt = None;

        self.session_count += 1;
        let blank = index - 1;
        let anchor = LineRange::new(doc.line(blank).start(), doc.line(index).end());
        self.sessions.push(SessionSlot {
            node: OutlineNode::new(NodeKind::Session, format!("session #{}", self.session_count), "", anchor),
            start_line: Some(blank),
        });
    }

    fn scan_header<L: LineSource + ?Sized>(&mut self, doc: &L, index: usize, header: &ScanHeader) -> usize {
        if self.config.document_links {
            self.push_link(index, header);
        }

        let Some(prompt) = self.prompt.filter(|_| self.config.scan_blocks) else {
            return index + 1;
        };
        let line_count = doc.line_count();
        if index + 4 >= line_count
            || !doc.line(index + 2).is_empty_or_whitespace()
            || !doc.line_text(index + 3).trim_start().starts_with('#')
        {
            return index + 1;
        }

        let data_start = index + 4;
        let mut next = data_start;
        while next < line_count && is_numeric_row(doc.line_text(next)) {
            next += 1;
        }
        // Without any rows the block ends on the `#` line.
        let last = next - 1;
        self.push_fold(data_start, last - 1, FoldKind::Scan);

        let anchor = doc.line(index).range();
        let mut node = OutlineNode::new(
            NodeKind::Scan,
            format!("Scan {}", header.number),
            doc.line_text(index + 1),
            anchor,
        );
        node.range.end = doc.line(last).end();
        if let Some(session) = self.sessions.last_mut() {
            session.node.children[prompt.child].children.push(node);
        }
        next
    }

    fn push_link(&mut self, index: usize, header: &ScanHeader) {
        let Some(file) = &header.file else {
            return;
        };
        match resolve_target(&file.path, self.workspace_folder) {
            Some(target) => self.links.push(LinkSpan {
                line: index as u32,
                start_column: file.start,
                end_column: file.end,
                target,
            }),
            None => log::trace!("no workspace folder to resolve {:?} on line {}", file.path, index),
        }
    }

    fn close_prompt<L: LineSource + ?Sized>(&mut self, doc: &L, prompt: OpenPrompt, last: usize) {
        let end = doc.line(last.max(prompt.line)).end();
        if let Some(session) = self.sessions.last_mut() {
            session.node.children[prompt.child].range.end = end;
        }
        self.push_fold(prompt.line, last, FoldKind::Prompt);
    }

    fn close_session<L: LineSource + ?Sized>(&mut self, doc: &L, last: usize) {
        let Some(session) = self.sessions.last_mut() else {
            return;
        };
        let start_line = session.start_line;
        session.node.range.end = doc.line(last.max(start_line.unwrap_or(0))).end();
        if let Some(start) = start_line {
            self.push_fold(start, last, FoldKind::Session);
        }
    }

    /// Single place where folds are emitted: a region must hide at least one
    /// line between its boundary lines.
    fn push_fold(&mut self, start: usize, end: usize, kind: FoldKind) {
        if end > start + 1 {
            self.folds.push(FoldRegion {
                start_line: start as u32,
                end_line: end as u32,
                kind,
            });
        }
    }
}
