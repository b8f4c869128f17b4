//! WISL LSP Server implementation

use std::sync::{Arc, OnceLock};

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::capabilities::{self, ClientFlags};
use crate::client::LspClient;
use crate::code_lens::{self, CodeLensProvider};
use crate::diagnostics::DiagnosticsPublisher;
use crate::document::DocumentStore;
use crate::settings::{Settings, SettingsResolver};

/// WISL Language Server
pub struct WislLspServer<C: LspClient = Client> {
    client: C,
    flags: OnceLock<ClientFlags>,
    documents: Arc<RwLock<DocumentStore>>,
    settings: Arc<SettingsResolver<C>>,
    diagnostics: DiagnosticsPublisher<C>,
    code_lenses: CodeLensProvider<C>,
}

impl<C: LspClient> WislLspServer<C> {
    /// Create a new WISL LSP server
    pub fn new(client: C) -> Self {
        let documents = Arc::new(RwLock::new(DocumentStore::new()));
        let settings = Arc::new(SettingsResolver::new(client.clone()));
        Self {
            diagnostics: DiagnosticsPublisher::new(
                client.clone(),
                documents.clone(),
                settings.clone(),
            ),
            code_lenses: CodeLensProvider::new(documents.clone(), settings.clone()),
            client,
            flags: OnceLock::new(),
            documents,
            settings,
        }
    }

    /// Client flags recorded at `initialize`; all false before it
    pub fn client_flags(&self) -> ClientFlags {
        self.flags.get().copied().unwrap_or_default()
    }

    pub fn documents(&self) -> &Arc<RwLock<DocumentStore>> {
        &self.documents
    }

    pub fn settings(&self) -> &Arc<SettingsResolver<C>> {
        &self.settings
    }

    /// Wait until every validation started by a notification has finished
    pub async fn wait_for_validations(&self) {
        self.diagnostics.wait_idle().await;
    }

    async fn log(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        self.client.log_message(MessageType::INFO, message).await;
    }
}

#[tower_lsp::async_trait]
impl<C: LspClient> LanguageServer for WislLspServer<C> {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let flags = ClientFlags::from_capabilities(&params.capabilities);
        if self.flags.set(flags).is_err() {
            tracing::warn!("initialize received twice; keeping the first negotiation");
        }
        let flags = self.client_flags();
        tracing::info!(
            configuration = flags.configuration,
            workspace_folders = flags.workspace_folders,
            "client capabilities negotiated"
        );

        self.settings.enable_pull(flags.configuration);
        if let Some(options) = params.initialization_options {
            match Settings::from_init_options(&options) {
                Ok(settings) => self.settings.set_global(settings).await,
                Err(e) => tracing::warn!("ignoring initialization options: {}", e),
            }
        }

        Ok(InitializeResult {
            capabilities: capabilities::server_capabilities(),
            server_info: Some(ServerInfo {
                name: "wisl-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let flags = self.client_flags();
        if flags.configuration {
            if let Err(e) = self
                .client
                .register_capability(vec![capabilities::configuration_registration()])
                .await
            {
                tracing::warn!("failed to register for configuration changes: {}", e);
            }
        }

        self.log("WISL LSP server initialized").await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        let document = self
            .documents
            .write()
            .await
            .open(doc.uri, doc.text, doc.version);

        self.diagnostics.spawn_validate(document);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // Full sync: the last change carries the whole document.
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };

        let document = self.documents.write().await.change(&uri, change.text, version);
        match document {
            Some(document) => self.diagnostics.spawn_validate(document),
            None => tracing::warn!(%uri, "change for a document that is not open"),
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.write().await.close(&uri);
        self.settings.forget(&uri).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        self.settings.configuration_changed(&params.settings).await;
        self.diagnostics.spawn_validate_all();
    }

    async fn did_change_workspace_folders(&self, _: DidChangeWorkspaceFoldersParams) {
        self.log("Workspace folder change event received").await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        tracing::debug!(count = params.changes.len(), "watched files changed");
    }

    async fn code_lens(&self, params: CodeLensParams) -> Result<Option<Vec<CodeLens>>> {
        // tower-lsp answers `$/cancelRequest` by dropping this future. The
        // analyzer runs on a detached task, so the drop abandons it without
        // killing the process.
        Ok(self
            .code_lenses
            .provide(&params.text_document.uri, &CancellationToken::new())
            .await)
    }

    async fn code_lens_resolve(&self, params: CodeLens) -> Result<CodeLens> {
        Ok(code_lens::resolve(params))
    }
}
