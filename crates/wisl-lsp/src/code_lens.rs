//! Code lens requests
//!
//! Lenses come from the same analyzer run as diagnostics, but failures here
//! are silent: the request answers `null` and nothing is shown to the user.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_lsp::lsp_types::{CodeLens, Url};

use crate::analyzer::{Analyzer, AnalyzerRequest};
use crate::client::LspClient;
use crate::document::DocumentStore;
use crate::settings::SettingsResolver;

pub struct CodeLensProvider<C> {
    documents: Arc<RwLock<DocumentStore>>,
    settings: Arc<SettingsResolver<C>>,
}

impl<C: LspClient> CodeLensProvider<C> {
    pub fn new(documents: Arc<RwLock<DocumentStore>>, settings: Arc<SettingsResolver<C>>) -> Self {
        Self {
            documents,
            settings,
        }
    }

    /// Lenses for `uri`, or `None` when the analyzer is unavailable, the
    /// document is not open, the analyzer fails, or `token` is cancelled.
    pub async fn provide(&self, uri: &Url, token: &CancellationToken) -> Option<Vec<CodeLens>> {
        let settings = tokio::select! {
            biased;
            () = token.cancelled() => return None,
            resolved = self.settings.resolve(uri) => match resolved {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!(%uri, "no code lenses: {}", e);
                    return None;
                }
            },
        };

        let analyzer = Analyzer::locate(&settings)?;
        let request = {
            let documents = self.documents.read().await;
            AnalyzerRequest::new(documents.get(uri)?, &settings)
        };

        match analyzer.run_cancellable(request, token).await? {
            Ok(output) => Some(output.code_lenses),
            Err(e) => {
                tracing::debug!(%uri, "no code lenses: {}", e);
                None
            }
        }
    }
}

/// `codeLens/resolve`: lenses arrive complete from the analyzer, so the
/// lens is returned unchanged.
pub fn resolve(lens: CodeLens) -> CodeLens {
    lens
}
