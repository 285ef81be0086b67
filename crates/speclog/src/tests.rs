use crate::ir::{FoldKind, FoldRegion, LineRange, NodeKind, Position};
use crate::{AbsorptionPolicy, OutlineParser, ParseError, ParserConfig, TextLines};
use std::cell::Cell;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

const BANNER: &str = r#"Welcome to "spec" Release 6.12.03"#;

fn fold(start_line: u32, end_line: u32, kind: FoldKind) -> FoldRegion {
    FoldRegion { start_line, end_line, kind }
}

fn range(start: (u32, u32), end: (u32, u32)) -> LineRange {
    LineRange::new(Position::new(start.0, start.1), Position::new(end.0, end.1))
}

#[test]
fn test_parse_empty_document() {
    let doc: Vec<&str> = Vec::new();
    let result = OutlineParser::new().parse(&doc);
    assert!(result.is_empty());

    let result = OutlineParser::new().parse(&TextLines::new(""));
    assert!(result.is_empty());
}

#[test]
fn test_single_session() {
    let doc = vec!["", BANNER, "1.SPEC> mv x 1", "   "];
    let result = OutlineParser::new().parse(&doc);

    assert_eq!(result.folding_ranges, vec![fold(0, 3, FoldKind::Session)]);
    assert_eq!(result.document_symbols.len(), 1);

    let session = &result.document_symbols[0];
    assert_eq!(session.kind, NodeKind::Session);
    assert_eq!(session.name, "session #1");
    assert_eq!(session.range, range((0, 0), (3, 3)));
    assert_eq!(session.selection_range, range((0, 0), (1, BANNER.len() as u32)));

    let prompt = &session.children[0];
    assert_eq!(prompt.kind, NodeKind::Prompt);
    assert_eq!(prompt.name, "1.SPEC>");
    assert_eq!(prompt.detail, "mv x 1");
    assert_eq!(prompt.range, range((2, 0), (3, 3)));
    assert_eq!(prompt.selection_range, range((2, 0), (2, 14)));
}

#[test]
fn test_prompt_without_banner() {
    let doc = vec!["2.SPEC> do_scan"];
    let result = OutlineParser::new().parse(&doc);

    assert!(result.folding_ranges.is_empty());
    let session = &result.document_symbols[0];
    assert_eq!(session.name, "session #0");
    assert_eq!(session.selection_range, LineRange::origin());
    assert_eq!(session.range, range((0, 0), (0, 15)));
    assert_eq!(session.children.len(), 1);
    assert_eq!(session.children[0].detail, "do_scan");
}

#[test]
fn test_banner_needs_blank_line_before() {
    let doc = vec!["1.SPEC> a", BANNER, "2.SPEC> b"];
    let result = OutlineParser::new().parse(&doc);
    assert_eq!(result.document_symbols.len(), 1);
    assert_eq!(result.document_symbols[0].name, "session #0");
    assert_eq!(result.document_symbols[0].children.len(), 2);

    let doc = vec![BANNER, "1.SPEC> a"];
    let result = OutlineParser::new().parse(&doc);
    assert_eq!(result.document_symbols[0].name, "session #0");
}

#[test]
fn test_consecutive_sessions() {
    let doc = vec![
        "",
        BANNER,
        "Copyright notice",
        "Using four-circle configuration",
        "1.SPEC> wa",
        "th = 10",
        "tth = 20",
        "",
        BANNER,
        "1.SPEC> wa",
    ];
    let result = OutlineParser::new().parse(&doc);

    assert_eq!(
        result.folding_ranges,
        vec![
            fold(1, 3, FoldKind::Banner),
            fold(4, 6, FoldKind::Prompt),
            fold(0, 6, FoldKind::Session),
            fold(7, 9, FoldKind::Session),
        ]
    );

    let names: Vec<_> = result.document_symbols.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["session #1", "session #2"]);

    let first = &result.document_symbols[0];
    assert_eq!(first.range.end, Position::new(6, 8));
    assert_eq!(first.children[0].range, range((4, 0), (6, 8)));

    let second = &result.document_symbols[1];
    assert_eq!(second.range.start, Position::new(7, 0));
    assert_eq!(second.range.end, Position::new(9, 10));
}

#[test]
fn test_synthetic_session_precedes_banner_sessions() {
    let doc = vec!["1.SPEC> a", "x", "y", "", BANNER, "2.SPEC> b"];
    let result = OutlineParser::new().parse(&doc);

    let names: Vec<_> = result.document_symbols.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["session #0", "session #1"]);
    assert_eq!(result.document_symbols[0].range, range((0, 0), (2, 1)));

    // `session #0` is never folded.
    assert_eq!(
        result.folding_ranges,
        vec![fold(0, 2, FoldKind::Prompt), fold(3, 5, FoldKind::Session)]
    );
}

#[test]
fn test_numeric_block_between_prompts() {
    let mut doc = vec!["1.SPEC> p 1".to_string()];
    doc.extend((0..10).map(|i| format!("{}.5  {}e-3  -7", i, i)));
    doc.push("2.SPEC> p 2".to_string());

    let result = OutlineParser::new().parse(&doc);
    assert_eq!(
        result.folding_ranges,
        vec![fold(1, 9, FoldKind::Data), fold(0, 10, FoldKind::Prompt)]
    );
    let session = &result.document_symbols[0];
    assert!(session.children.iter().all(|p| p.children.is_empty()));
}

#[test]
fn test_data_run_at_end_of_document() {
    let doc = vec!["1", "2", "3", "4"];
    let result = OutlineParser::new().parse(&doc);
    assert_eq!(result.folding_ranges, vec![fold(0, 2, FoldKind::Data)]);
    assert!(result.document_symbols.is_empty());

    // Too short to fold.
    let doc = vec!["1", "2", "3"];
    assert!(OutlineParser::new().parse(&doc).folding_ranges.is_empty());
}

fn mixed_rows() -> Vec<&'static str> {
    vec![
        "1 2 3",
        "4 5 6",
        "7 8 9",
        "10 11 12",
        "12:00 1",
        "12:01 2",
        "12:02 3",
        "2024-01-31T12:03:00 4",
        "end",
    ]
}

#[test]
fn test_absorption_policies() {
    let parse = |absorption| {
        let config = ParserConfig {
            absorption,
            ..ParserConfig::default()
        };
        OutlineParser::new().with_config(config).parse(&mixed_rows()).folding_ranges
    };

    assert_eq!(parse(AbsorptionPolicy::Temporal), vec![fold(0, 6, FoldKind::Data)]);
    assert_eq!(
        parse(AbsorptionPolicy::Split),
        vec![fold(0, 2, FoldKind::Data), fold(4, 6, FoldKind::Data)]
    );
    assert_eq!(parse(AbsorptionPolicy::Numeric), vec![fold(0, 2, FoldKind::Data)]);
}

fn scan_log(file: &str) -> Vec<String> {
    let mut doc = vec![
        "1.SPEC> ascan th 0 1 100 1".to_string(),
        format!("Scan 3   Mscan   file={}   ascan th 0 1 100 1   user=alice", file),
        "ascan th 0 1 100 1".to_string(),
        String::new(),
        "#  th  det  mon".to_string(),
    ];
    doc.extend((0..50).map(|i| format!("{:.2}  {}  1000", i as f64 * 0.01, i * 3)));
    doc.push("2.SPEC> ".to_string());
    doc
}

#[test]
fn test_scan_with_absolute_file() {
    let doc = scan_log("/data/run.001");
    let result = OutlineParser::new().parse(&doc);

    assert_eq!(
        result.folding_ranges,
        vec![fold(5, 53, FoldKind::Scan), fold(0, 54, FoldKind::Prompt)]
    );

    let prompt = &result.document_symbols[0].children[0];
    assert_eq!(prompt.children.len(), 1);
    let scan = &prompt.children[0];
    assert_eq!(scan.kind, NodeKind::Scan);
    assert_eq!(scan.name, "Scan 3");
    assert_eq!(scan.detail, "ascan th 0 1 100 1");
    assert_eq!(scan.selection_range.start, Position::new(1, 0));
    assert_eq!(scan.selection_range.end.line, 1);
    assert_eq!(scan.range.start, Position::new(1, 0));
    assert_eq!(scan.range.end.line, 54);

    assert_eq!(result.document_links.len(), 1);
    let link = &result.document_links[0];
    assert_eq!(link.line, 1);
    assert_eq!((link.start_column, link.end_column), (22, 35));
    assert_eq!(link.target, PathBuf::from("/data/run.001"));
}

#[test]
fn test_scan_with_relative_file() {
    let doc = scan_log("data/run.001");

    let result = OutlineParser::new().parse(&doc);
    assert!(result.document_links.is_empty());
    assert_eq!(result.document_symbols[0].children[0].children.len(), 1);

    let result = OutlineParser::new()
        .with_workspace_folder("/home/alice/beamtime")
        .parse(&doc);
    assert_eq!(
        result.document_links[0].target,
        PathBuf::from("/home/alice/beamtime/data/run.001")
    );
}

#[test]
fn test_scan_without_prompt_still_links() {
    let doc = scan_log("/data/run.001");
    let result = OutlineParser::new().parse(&doc[1..]);

    assert_eq!(result.document_links.len(), 1);
    assert_eq!(result.document_links[0].line, 0);
    // The rows fall back to an ordinary data run.
    assert!(result.folding_ranges.contains(&fold(4, 52, FoldKind::Data)));
    let session = &result.document_symbols[0];
    assert!(session.children[0].children.is_empty());
}

#[test]
fn test_scan_without_rows_ends_on_comment_line() {
    let doc = vec![
        "1.SPEC> ascan th 0 1 10 1",
        "Scan 4   ascan   **NO DATA FILE**  ascan th 0 1 10 1  user=bob",
        "ascan th 0 1 10 1",
        "",
        "#  th  det",
        "Scan aborted.",
    ];
    let result = OutlineParser::new().parse(&doc);
    let scan = &result.document_symbols[0].children[0].children[0];
    assert_eq!(scan.name, "Scan 4");
    assert_eq!(scan.range, range((1, 0), (4, 10)));
    assert!(result.document_links.is_empty());
    assert!(!result.folding_ranges.iter().any(|f| f.kind == FoldKind::Scan));
}

#[test]
fn test_scan_needs_lookahead_shape() {
    let mut doc = scan_log("/data/run.001");
    doc[3] = "not blank".to_string();
    let result = OutlineParser::new().parse(&doc);
    assert!(result.document_symbols[0].children[0].children.is_empty());
    assert_eq!(result.document_links.len(), 1);
}

#[test]
fn test_scan_blocks_and_links_can_be_disabled() {
    let config = ParserConfig {
        scan_blocks: false,
        document_links: false,
        ..ParserConfig::default()
    };
    let result = OutlineParser::new()
        .with_config(config)
        .parse(&scan_log("/data/run.001"));

    assert!(result.document_links.is_empty());
    assert!(result.document_symbols[0].children[0].children.is_empty());
    assert!(result.folding_ranges.contains(&fold(5, 53, FoldKind::Data)));
}

#[test]
fn test_parse_is_idempotent() {
    let doc = scan_log("/data/run.001");
    let parser = OutlineParser::new();
    assert_eq!(parser.parse(&doc), parser.parse(&doc));
}

#[test]
fn test_cancelled_parse_has_no_result() {
    let doc = scan_log("/data/run.001");
    let cancelled = AtomicBool::new(true);
    let outcome = OutlineParser::new().parse_cancellable(&doc, &cancelled);
    assert_eq!(outcome, Err(ParseError::Cancelled { line: 0 }));
}

/// Fires after a fixed number of polls.
struct Countdown(Cell<usize>);

impl crate::Cancellation for Countdown {
    fn is_cancelled(&self) -> bool {
        let left = self.0.get();
        self.0.set(left.saturating_sub(1));
        left == 0
    }
}

#[test]
fn test_cancellation_mid_scan() {
    let doc = vec!["1.SPEC> a", "b", "c", "d"];
    let outcome = OutlineParser::new().parse_cancellable(&doc, &Countdown(Cell::new(2)));
    assert_eq!(outcome, Err(ParseError::Cancelled { line: 2 }));

    let outcome = OutlineParser::new().parse_cancellable(&doc, &Countdown(Cell::new(10)));
    assert!(outcome.is_ok());
}
