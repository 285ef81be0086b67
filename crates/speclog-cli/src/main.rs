use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use notify::{RecursiveMode, Watcher};
use speclog::ir::OutlineNode;
use speclog::{AbsorptionPolicy, OutlineParser, ParseResult, ParserConfig, TextLines};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

#[derive(Parser)]
#[command(name = "speclog")]
#[command(about = "Outline tools for spec session logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a session log and emit the result as JSON
    Parse {
        #[arg(value_name = "FILE")]
        path: PathBuf,
        #[command(flatten)]
        options: ParseOptions,
    },
    /// Print the session/prompt/scan tree of a log
    Outline {
        #[arg(value_name = "FILE")]
        path: PathBuf,
        #[command(flatten)]
        options: ParseOptions,
    },
    /// Re-parse a log every time it is written to
    Watch {
        #[arg(value_name = "FILE")]
        path: PathBuf,
        #[command(flatten)]
        options: ParseOptions,
    },
}

#[derive(Args)]
struct ParseOptions {
    /// Which rows are folded as bulk data
    #[arg(long, value_enum, default_value_t = Absorption::Temporal)]
    absorption: Absorption,
    /// Do not attach scans to prompts
    #[arg(long)]
    no_scans: bool,
    /// Do not emit links for data files
    #[arg(long)]
    no_links: bool,
    /// Folder that relative data file paths are resolved against
    #[arg(long, value_name = "DIR")]
    workspace: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Absorption {
    Numeric,
    Temporal,
    Split,
}

impl From<Absorption> for AbsorptionPolicy {
    fn from(value: Absorption) -> Self {
        match value {
            Absorption::Numeric => AbsorptionPolicy::Numeric,
            Absorption::Temporal => AbsorptionPolicy::Temporal,
            Absorption::Split => AbsorptionPolicy::Split,
        }
    }
}

impl ParseOptions {
    fn parser(&self) -> OutlineParser {
        let parser = OutlineParser::new().with_config(ParserConfig {
            absorption: self.absorption.into(),
            scan_blocks: !self.no_scans,
            document_links: !self.no_links,
        });
        match &self.workspace {
            Some(folder) => parser.with_workspace_folder(folder),
            None => parser,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Parse { path, options } => {
            let result = parse_file(&options.parser(), path)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Outline { path, options } => {
            let result = parse_file(&options.parser(), path)?;
            print!("{}", render_outline(&result));
        }
        Commands::Watch { path, options } => watch(&options.parser(), path)?,
    }
    Ok(())
}

fn parse_file(parser: &OutlineParser, path: &Path) -> anyhow::Result<ParseResult> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    // Logs capture raw terminal output, which is not always valid UTF-8.
    let text = String::from_utf8_lossy(&bytes);
    Ok(parser.parse(&TextLines::new(&text)))
}

fn watch(parser: &OutlineParser, path: &Path) -> anyhow::Result<()> {
    println!("{}", summary(&parse_file(parser, path)?));

    let (tx, rx) = mpsc::channel::<notify::Result<notify::Event>>();
    let mut watcher = notify::recommended_watcher(tx)?;
    watcher
        .watch(path, RecursiveMode::NonRecursive)
        .with_context(|| format!("watching {}", path.display()))?;
    log::info!("watching {}", path.display());

    for res in rx {
        match res {
            Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                match parse_file(parser, path) {
                    Ok(result) => println!("{}", summary(&result)),
                    Err(e) => log::error!("{:#}", e),
                }
            }
            Ok(_) => {}
            Err(e) => log::error!("watch error: {:?}", e),
        }
    }
    Ok(())
}

fn summary(result: &ParseResult) -> String {
    let prompts: usize = result
        .document_symbols
        .iter()
        .map(|session| session.children.len())
        .sum();
    format!(
        "{} sessions, {} prompts, {} folds, {} links",
        result.document_symbols.len(),
        prompts,
        result.folding_ranges.len(),
        result.document_links.len()
    )
}

/// One node per line, `line: name detail`, children indented.
fn render_outline(result: &ParseResult) -> String {
    let mut out = String::new();
    for node in &result.document_symbols {
        render_node(&mut out, node, 0);
    }
    out
}

fn render_node(out: &mut String, node: &OutlineNode, depth: usize) {
    let line = node.selection_range.start.line + 1;
    out.push_str(&format!("{:>6}: {:indent$}{}", line, "", node.name, indent = depth * 2));
    if !node.detail.is_empty() {
        out.push_str("  ");
        out.push_str(&node.detail);
    }
    out.push('\n');
    for child in &node.children {
        render_node(out, child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "
Welcome to \"spec\" Release 6.12.03
1.FOURC> ascan th 0 1 4 1
Scan 7   ascan   file=/data/run.007  ascan th 0 1 4 1  user=alice
ascan th 0 1 4 1

#  th  det
0  1
1  4
2  9
3  16
4  25
2.FOURC> wh";

    #[test]
    fn test_render_outline() {
        let result = OutlineParser::new().parse(&TextLines::new(LOG));
        let expected = concat!(
            "     1: session #1\n",
            "     3:   1.FOURC>  ascan th 0 1 4 1\n",
            "     4:     Scan 7  ascan th 0 1 4 1\n",
            "    13:   2.FOURC>  wh\n",
        );
        assert_eq!(render_outline(&result), expected);
    }

    #[test]
    fn test_summary() {
        let result = OutlineParser::new().parse(&TextLines::new(LOG));
        assert_eq!(summary(&result), "1 sessions, 2 prompts, 3 folds, 1 links");
    }

    #[test]
    fn test_options_map_to_config() {
        let cli = Cli::parse_from([
            "speclog",
            "outline",
            "fourc.log",
            "--absorption",
            "split",
            "--no-links",
            "--workspace",
            "/beamtime",
        ]);
        let Commands::Outline { options, .. } = cli.command else {
            panic!("expected outline");
        };
        let parser = options.parser();
        assert_eq!(parser.config().absorption, AbsorptionPolicy::Split);
        assert!(parser.config().scan_blocks);
        assert!(!parser.config().document_links);
        assert_eq!(parser.workspace_folder(), Some(Path::new("/beamtime")));
    }
}
