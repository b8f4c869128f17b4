//! Analyze-and-publish cycle
//!
//! Notification handlers hand validations to background tasks and return at
//! once, so an analyzer that never exits only holds up its own document.

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::RwLock;
use tokio_util::task::TaskTracker;
use tower_lsp::lsp_types::{Diagnostic, MessageType};

use crate::analyzer::{Analyzer, AnalyzerRequest};
use crate::client::LspClient;
use crate::document::{Document, DocumentStore};
use crate::settings::SettingsResolver;

/// Runs the analyzer for a document and publishes what it reports
#[derive(Clone)]
pub struct DiagnosticsPublisher<C> {
    client: C,
    documents: Arc<RwLock<DocumentStore>>,
    settings: Arc<SettingsResolver<C>>,
    tasks: TaskTracker,
}

impl<C: LspClient> DiagnosticsPublisher<C> {
    pub fn new(
        client: C,
        documents: Arc<RwLock<DocumentStore>>,
        settings: Arc<SettingsResolver<C>>,
    ) -> Self {
        Self {
            client,
            documents,
            settings,
            tasks: TaskTracker::new(),
        }
    }

    /// Validate `document` on a background task
    pub fn spawn_validate(&self, document: Document) {
        let publisher = self.clone();
        self.tasks.spawn(async move { publisher.validate(document).await });
    }

    /// Validate every open document on a background task
    pub fn spawn_validate_all(&self) {
        let publisher = self.clone();
        self.tasks.spawn(async move { publisher.validate_all().await });
    }

    /// Wait for every background validation spawned so far
    pub async fn wait_idle(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    /// Validate one document snapshot.
    ///
    /// - analyzer unavailable: nothing is published
    /// - success: the analyzer's diagnostics replace the previous ones
    /// - failure: diagnostics are cleared and the error is shown
    ///
    /// Results for a document that was closed or changed while the analyzer
    /// ran are dropped; the newer validation publishes instead.
    pub async fn validate(&self, document: Document) {
        let settings = match self.settings.resolve(&document.uri).await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(uri = %document.uri, "skipping validation: {}", e);
                return;
            }
        };

        let Some(analyzer) = Analyzer::locate(&settings) else {
            return;
        };

        let request = AnalyzerRequest::new(&document, &settings);
        let result = analyzer.run(&request).await;

        // Held through publishing, so an older version can never publish
        // after a newer one.
        let documents = self.documents.read().await;
        if !documents.is_current(&document.uri, document.version) {
            match &result {
                Ok(_) => tracing::trace!(
                    uri = %document.uri,
                    version = document.version,
                    "dropping stale analyzer result"
                ),
                Err(e) => tracing::debug!(
                    uri = %document.uri,
                    version = document.version,
                    "dropping stale analyzer failure: {}",
                    e
                ),
            }
            return;
        }

        match result {
            Ok(output) => {
                tracing::debug!(
                    uri = %document.uri,
                    count = output.diagnostics.len(),
                    "publishing diagnostics"
                );
                self.publish(&document, output.diagnostics).await;
            }
            Err(e) => {
                tracing::warn!(uri = %document.uri, "analyzer failed: {}", e);
                self.publish(&document, Vec::new()).await;
                self.client
                    .show_message(MessageType::ERROR, e.to_string())
                    .await;
            }
        }
    }

    /// Validate every open document concurrently
    pub async fn validate_all(&self) {
        let documents = self.documents.read().await.all();
        join_all(documents.into_iter().map(|doc| self.validate(doc))).await;
    }

    async fn publish(&self, document: &Document, diagnostics: Vec<Diagnostic>) {
        self.client
            .publish_diagnostics(document.uri.clone(), diagnostics, Some(document.version))
            .await;
    }
}
