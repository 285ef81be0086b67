use std::path::PathBuf;
use std::sync::RwLock;
use tower_lsp::lsp_types::{InitializeParams, Url, WorkspaceFolder, WorkspaceFoldersChangeEvent};

/// The folders opened by the client, used to resolve relative data file
/// paths found in logs.
#[derive(Debug, Default)]
pub struct Workspace {
    folders: RwLock<Vec<PathBuf>>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the folders from `workspaceFolders`, falling back to `rootUri`.
    #[allow(deprecated)]
    pub fn initialize(&self, params: &InitializeParams) {
        let folders: Vec<PathBuf> = match &params.workspace_folders {
            Some(folders) if !folders.is_empty() => folders.iter().filter_map(folder_path).collect(),
            _ => params
                .root_uri
                .as_ref()
                .and_then(|uri| uri.to_file_path().ok())
                .into_iter()
                .collect(),
        };
        log::info!("workspace folders: {:?}", folders);
        *self.write() = folders;
    }

    pub fn apply(&self, event: &WorkspaceFoldersChangeEvent) {
        let mut folders = self.write();
        for removed in event.removed.iter().filter_map(folder_path) {
            folders.retain(|folder| *folder != removed);
        }
        for added in event.added.iter().filter_map(folder_path) {
            if !folders.contains(&added) {
                folders.push(added);
            }
        }
    }

    /// The deepest folder containing the document, if any.
    pub fn folder_for(&self, uri: &Url) -> Option<PathBuf> {
        let path = uri.to_file_path().ok()?;
        let folders = self.folders.read().unwrap_or_else(|e| e.into_inner());
        folders
            .iter()
            .filter(|folder| path.starts_with(folder))
            .max_by_key(|folder| folder.components().count())
            .cloned()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<PathBuf>> {
        self.folders.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn folder_path(folder: &WorkspaceFolder) -> Option<PathBuf> {
    folder.uri.to_file_path().ok()
}
