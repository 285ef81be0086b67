pub mod cache;
pub mod config;
pub mod convert;
pub mod workspace;

use cache::ParseCache;
use config::ServerConfig;
use dashmap::DashMap;
use speclog::{OutlineParser, TextLines};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use workspace::Workspace;

/// An open document that passed the language filter.
#[derive(Debug, Clone)]
pub struct TrackedDocument {
    pub language_id: String,
    pub text: String,
}

#[derive(Debug)]
pub struct Backend {
    pub client: Client,
    /// Tracked documents, keyed like the cache.
    pub documents: Arc<DashMap<Url, TrackedDocument>>,
    pub cache: Arc<ParseCache>,
    pub workspace: Arc<Workspace>,
    pub config: Arc<Mutex<ServerConfig>>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: Arc::new(DashMap::new()),
            cache: Arc::new(ParseCache::new()),
            workspace: Arc::new(Workspace::new()),
            config: Arc::new(Mutex::new(ServerConfig::default())),
        }
    }

    fn config(&self) -> MutexGuard<'_, ServerConfig> {
        self.config.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn parser_for(&self, uri: &Url) -> OutlineParser {
        let parser = OutlineParser::new().with_config(self.config().parser.clone());
        match self.workspace.folder_for(uri) {
            Some(folder) => parser.with_workspace_folder(folder),
            None => parser,
        }
    }

    fn schedule(&self, uri: Url, text: &str) {
        let parser = self.parser_for(&uri);
        self.cache.schedule(uri, TextLines::new(text), parser);
    }

    /// Re-parses every tracked document, e.g. after a settings change.
    fn reschedule_all(&self) {
        let tracked: Vec<(Url, String)> = self
            .documents
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().text.clone()))
            .collect();
        for (uri, text) in tracked {
            self.schedule(uri, &text);
        }
    }

    /// Forgets documents opened under a language id that no longer applies.
    fn untrack_other_languages(&self, language_id: &str) {
        let stale: Vec<Url> = self
            .documents
            .iter()
            .filter(|entry| entry.value().language_id != language_id)
            .map(|entry| entry.key().clone())
            .collect();
        for uri in stale {
            log::debug!("no longer tracking {}", uri);
            self.documents.remove(&uri);
            self.cache.remove(&uri);
        }
    }

    fn reload_config(&self, settings: serde_json::Value) {
        match ServerConfig::from_value(settings) {
            Ok(config) => {
                log::info!("settings: {:?}", config);
                let language_id = config.language_id.clone();
                *self.config() = config;
                self.untrack_other_languages(&language_id);
            }
            Err(e) => log::warn!("{}; keeping previous settings", e),
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(options) = params.initialization_options.clone() {
            self.reload_config(options);
        }
        self.workspace.initialize(&params);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                document_link_provider: Some(DocumentLinkOptions {
                    resolve_provider: Some(false),
                    work_done_progress_options: Default::default(),
                }),
                workspace: Some(WorkspaceServerCapabilities {
                    workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                        supported: Some(true),
                        change_notifications: Some(OneOf::Left(true)),
                    }),
                    file_operations: None,
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "spec log server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let document = params.text_document;
        if document.language_id != self.config().language_id {
            log::debug!("ignoring {} ({})", document.uri, document.language_id);
            return;
        }
        self.schedule(document.uri.clone(), &document.text);
        self.documents.insert(
            document.uri,
            TrackedDocument {
                language_id: document.language_id,
                text: document.text,
            },
        );
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        // Full sync: the last change carries the whole text.
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        let Some(mut document) = self.documents.get_mut(&uri) else {
            return;
        };
        document.text = change.text;
        let text = document.text.clone();
        drop(document);
        self.schedule(uri, &text);
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.remove(&uri);
        self.cache.remove(&uri);
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        self.reload_config(params.settings);
        self.reschedule_all();
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        self.workspace.apply(&params.event);
        self.reschedule_all();
    }

    async fn folding_range(&self, params: FoldingRangeParams) -> Result<Option<Vec<FoldingRange>>> {
        let Some(result) = self.cache.latest(&params.text_document.uri).await else {
            return Ok(None);
        };
        Ok(Some(
            result
                .folding_ranges
                .iter()
                .map(convert::to_folding_range)
                .collect(),
        ))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let Some(result) = self.cache.latest(&params.text_document.uri).await else {
            return Ok(None);
        };
        let symbols = result
            .document_symbols
            .iter()
            .map(convert::to_document_symbol)
            .collect();
        Ok(Some(DocumentSymbolResponse::Nested(symbols)))
    }

    async fn document_link(&self, params: DocumentLinkParams) -> Result<Option<Vec<DocumentLink>>> {
        let Some(result) = self.cache.latest(&params.text_document.uri).await else {
            return Ok(None);
        };
        Ok(Some(
            result
                .document_links
                .iter()
                .filter_map(convert::to_document_link)
                .collect(),
        ))
    }
}
