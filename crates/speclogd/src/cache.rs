use dashmap::DashMap;
use speclog::{OutlineParser, ParseError, ParseResult, TextLines};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tower_lsp::lsp_types::Url;

/// Latest completed parse of a document.
#[derive(Debug, Clone, Default)]
struct Snapshot {
    /// Generation of the parse that produced `result`.
    generation: u64,
    /// Highest generation that finished, successfully or not.
    settled: u64,
    result: Option<Arc<ParseResult>>,
}

#[derive(Debug)]
struct Entry {
    generation: u64,
    pending: Arc<AtomicBool>,
    snapshots: Arc<watch::Sender<Snapshot>>,
}

impl Entry {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(Snapshot::default());
        Self {
            generation: 0,
            pending: Arc::new(AtomicBool::new(false)),
            snapshots: Arc::new(tx),
        }
    }
}

/// Parse results keyed by document.
///
/// Each open document has at most one parse in flight: scheduling a new one
/// cancels the previous. Readers always get the newest completed result,
/// never a partial one.
#[derive(Debug, Default)]
pub struct ParseCache {
    entries: DashMap<Url, Entry>,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, uri: &Url) -> bool {
        self.entries.contains_key(uri)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Starts parsing `lines` in the background, superseding any pending
    /// parse of the same document.
    pub fn schedule(&self, uri: Url, lines: TextLines, parser: OutlineParser) {
        let cancel = Arc::new(AtomicBool::new(false));
        let (generation, snapshots) = {
            let mut entry = self.entries.entry(uri.clone()).or_insert_with(Entry::new);
            entry.pending.store(true, Ordering::Release);
            entry.pending = Arc::clone(&cancel);
            entry.generation += 1;
            (entry.generation, Arc::clone(&entry.snapshots))
        };

        tokio::spawn(async move {
            let outcome =
                tokio::task::spawn_blocking(move || parser.parse_cancellable(&lines, &cancel)).await;

            match outcome {
                Ok(Ok(result)) => {
                    let result = Arc::new(result);
                    snapshots.send_if_modified(|snapshot| {
                        if snapshot.generation >= generation {
                            return false;
                        }
                        snapshot.generation = generation;
                        snapshot.settled = snapshot.settled.max(generation);
                        snapshot.result = Some(result);
                        true
                    });
                    log::debug!("parsed {} (generation {})", uri, generation);
                }
                Ok(Err(ParseError::Cancelled { line })) => {
                    log::debug!("parse of {} superseded at line {}", uri, line);
                }
                Err(e) => {
                    // Keep the previous result so readers are not stuck
                    // waiting for a parse that will never complete.
                    log::error!("parse of {} failed: {}", uri, e);
                    snapshots.send_if_modified(|snapshot| {
                        if snapshot.settled >= generation {
                            return false;
                        }
                        snapshot.settled = generation;
                        true
                    });
                }
            }
        });
    }

    /// Waits for the parse that was current when called (or a newer one)
    /// and returns its result.
    ///
    /// Returns `None` for unknown documents, or when the document is closed
    /// while waiting.
    pub async fn latest(&self, uri: &Url) -> Option<Arc<ParseResult>> {
        let (generation, mut rx) = {
            let entry = self.entries.get(uri)?;
            (entry.generation, entry.snapshots.subscribe())
        };
        let snapshot = rx.wait_for(|s| s.settled >= generation).await.ok()?;
        snapshot.result.clone()
    }

    /// Newest completed result, without waiting.
    pub fn completed(&self, uri: &Url) -> Option<Arc<ParseResult>> {
        let entry = self.entries.get(uri)?;
        let snapshot = entry.snapshots.borrow();
        snapshot.result.clone()
    }

    /// Forgets a document and cancels its pending parse.
    pub fn remove(&self, uri: &Url) {
        if let Some((_, entry)) = self.entries.remove(uri) {
            entry.pending.store(true, Ordering::Release);
        }
    }
}
