#![no_main]
use libfuzzer_sys::fuzz_target;
use speclog::{AbsorptionPolicy, OutlineParser, ParserConfig, TextLines};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let lines = TextLines::new(&text);
    for absorption in [
        AbsorptionPolicy::Numeric,
        AbsorptionPolicy::Temporal,
        AbsorptionPolicy::Split,
    ] {
        let parser = OutlineParser::new()
            .with_config(ParserConfig {
                absorption,
                ..ParserConfig::default()
            })
            .with_workspace_folder("/fuzz");
        let result = parser.parse(&lines);
        for fold in &result.folding_ranges {
            assert!(fold.end_line > fold.start_line + 1);
        }
    }
});
