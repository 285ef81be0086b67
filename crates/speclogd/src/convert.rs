//! Mapping from the parser's data model to LSP types.

use speclog::ir::{FoldRegion, LineRange, LinkSpan, NodeKind, OutlineNode};
use tower_lsp::lsp_types::{
    DocumentLink, DocumentSymbol, FoldingRange, FoldingRangeKind, Position, Range, SymbolKind, Url,
};

pub fn to_range(range: &LineRange) -> Range {
    Range {
        start: Position {
            line: range.start.line,
            character: range.start.character,
        },
        end: Position {
            line: range.end.line,
            character: range.end.character,
        },
    }
}

pub fn to_folding_range(fold: &FoldRegion) -> FoldingRange {
    FoldingRange {
        start_line: fold.start_line,
        start_character: None,
        end_line: fold.end_line,
        end_character: None,
        kind: Some(FoldingRangeKind::Region),
        collapsed_text: None,
    }
}

fn symbol_kind(kind: NodeKind) -> SymbolKind {
    match kind {
        NodeKind::Session => SymbolKind::ENUM,
        NodeKind::Prompt => SymbolKind::ENUM_MEMBER,
        NodeKind::Scan => SymbolKind::NUMBER,
    }
}

pub fn to_document_symbol(node: &OutlineNode) -> DocumentSymbol {
    #[allow(deprecated)]
    DocumentSymbol {
        name: node.name.clone(),
        detail: Some(node.detail.clone()).filter(|detail| !detail.is_empty()),
        kind: symbol_kind(node.kind),
        tags: None,
        deprecated: None,
        range: to_range(&node.range),
        selection_range: to_range(&node.selection_range),
        children: Some(node.children.iter().map(to_document_symbol).collect()),
    }
}

/// Links whose target cannot be expressed as a `file:` URL are dropped.
pub fn to_document_link(link: &LinkSpan) -> Option<DocumentLink> {
    let target = Url::from_file_path(&link.target).ok()?;
    Some(DocumentLink {
        range: Range {
            start: Position {
                line: link.line,
                character: link.start_column,
            },
            end: Position {
                line: link.line,
                character: link.end_column,
            },
        },
        target: Some(target),
        tooltip: Some(link.target.display().to_string()),
        data: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use speclog::{OutlineParser, TextLines};

    const LOG: &str = "1.SPEC> ascan th 0 1 4 1
Scan 7   ascan   file=/data/run.007  ascan th 0 1 4 1  user=alice
ascan th 0 1 4 1

#  th  det
0  1
1  4
2  9
3  16
4  25
2.SPEC> ";

    #[test]
    fn test_symbols_nest() {
        let result = OutlineParser::new().parse(&TextLines::new(LOG));
        let symbols: Vec<_> = result.document_symbols.iter().map(to_document_symbol).collect();

        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].kind, SymbolKind::ENUM);
        assert_eq!(symbols[0].detail, None);

        let prompts = symbols[0].children.as_ref().unwrap();
        assert_eq!(prompts[0].kind, SymbolKind::ENUM_MEMBER);
        assert_eq!(prompts[0].detail.as_deref(), Some("ascan th 0 1 4 1"));

        let scans = prompts[0].children.as_ref().unwrap();
        assert_eq!(scans[0].name, "Scan 7");
        assert_eq!(scans[0].kind, SymbolKind::NUMBER);
        assert_eq!(scans[0].selection_range.start, Position { line: 1, character: 0 });
        assert_eq!(scans[0].range.end.line, 9);
    }

    #[test]
    fn test_folds_and_links() {
        let result = OutlineParser::new().parse(&TextLines::new(LOG));

        let folds: Vec<_> = result.folding_ranges.iter().map(to_folding_range).collect();
        assert!(folds.iter().all(|f| f.kind == Some(FoldingRangeKind::Region)));
        assert!(folds.iter().any(|f| (f.start_line, f.end_line) == (5, 8)));

        let links: Vec<_> = result.document_links.iter().filter_map(to_document_link).collect();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target.as_ref().unwrap().as_str(), "file:///data/run.007");
        assert_eq!(links[0].range.start, Position { line: 1, character: 22 });
        assert_eq!(links[0].range.end, Position { line: 1, character: 35 });
        assert_eq!(links[0].tooltip.as_deref(), Some("/data/run.007"));
    }
}
