//! # spec session log outline
//!
//! Single pass parser turning the session logs written by the `spec`
//! instrument control program into editor structure: folding regions, an
//! outline tree and links to the data files named in scan headers.
//!
//! ## Overview
//!
//! A log is a sequence of sessions, each started by a welcome banner:
//!
//! ```text
//!
//! Welcome to "spec" Release 6.12.03
//! ...
//! 1.SPEC> ascan th 0 1 10 1
//! Scan 1   Wed Jan 31 01:23:45 2024   file=/data/run.001  fourc  user=alice
//! ascan th 0 1 10 1
//!
//! #  Theta  Detector  Monitor
//! 0.0  12  1000
//! 0.1  15  1000
//! ...
//! 2.SPEC>
//! ```
//!
//! The parser recognizes line *shapes* only:
//!
//! - **Data rows** made of numbers (and, depending on
//!   [`AbsorptionPolicy`](config::AbsorptionPolicy), times and timestamps)
//! - **Prompts** such as `12.SPEC> mv th 10`
//! - **Welcome banners**, only after a blank line
//! - **Scan headers** printed by the `_head` macro
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐  classify_line()  ┌──────────────┐   finish()   ┌─────────────┐
//! │ LineSource  │ ────────────────► │ OutlineState │ ───────────► │ ParseResult │
//! │ (the log)   │   one line at a   │  (reducer)   │              │             │
//! └─────────────┘       time        └──────────────┘              └─────────────┘
//! ```
//!
//! - [`classify`] tags each line.
//! - [`outline`] folds the tagged lines into sessions, prompts and scans.
//! - [`links`] resolves data file paths.
//!
//! Logs whose first banner was lost (the file was rotated while spec was
//! running) get a synthetic `session #0` holding the prompts seen before the
//! first banner.
//!
//! ## Example
//!
//! ```
//! use speclog::{OutlineParser, TextLines};
//!
//! let log = "\nWelcome to \"spec\" Release 6\n1.SPEC> mv x 1\n   ";
//! let result = OutlineParser::new().parse(&TextLines::new(log));
//!
//! let session = &result.document_symbols[0];
//! assert_eq!(session.name, "session #1");
//! assert_eq!(session.children[0].name, "1.SPEC>");
//! assert_eq!(session.children[0].detail, "mv x 1");
//! ```
//!
//! ## Cancellation
//!
//! [`OutlineParser::parse_cancellable`] polls a [`Cancellation`] token before
//! every line and gives up without a partial result once it fires.

/// Cooperative cancellation tokens.
pub mod cancel;
/// Line shape recognition.
pub mod classify;
/// Parser configuration.
pub mod config;
/// Line addressable document views.
pub mod document;
/// Output data model.
pub mod ir;
/// Data file link resolution.
pub mod links;
/// Session/prompt/scan outline builder.
pub mod outline;

#[cfg(test)]
mod tests;

pub use cancel::{Cancellation, NeverCancelled};
pub use config::{AbsorptionPolicy, ConfigError, ParserConfig};
pub use document::{Line, LineSource, TextLines};
pub use ir::ParseResult;
pub use outline::{OutlineParser, ParseError};

/// Version of the JSON shape of [`ParseResult`].
///
/// - MAJOR: fields removed or renamed
/// - MINOR: new optional fields or fold kinds
/// - PATCH: parsing fixes, same shape
pub const SCHEMA_VERSION: &str = "1.0.0";
