//! Capability negotiation
//!
//! What the client can do decides how settings are resolved; what the
//! server declares is fixed: full text sync and code lenses with resolve.

use tower_lsp::lsp_types::{
    ClientCapabilities, CodeLensOptions, Registration, ServerCapabilities,
    TextDocumentSyncCapability, TextDocumentSyncKind,
};

/// Registration id used for the dynamic configuration registration
pub const CONFIGURATION_REGISTRATION_ID: &str = "wisl-did-change-configuration";

/// Client features the server adapts to, recorded at `initialize`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientFlags {
    /// Client answers `workspace/configuration`
    pub configuration: bool,
    /// Client sends `workspace/didChangeWorkspaceFolders`
    pub workspace_folders: bool,
}

impl ClientFlags {
    pub fn from_capabilities(capabilities: &ClientCapabilities) -> Self {
        let workspace = capabilities.workspace.as_ref();
        Self {
            configuration: workspace
                .and_then(|ws| ws.configuration)
                .unwrap_or(false),
            workspace_folders: workspace
                .and_then(|ws| ws.workspace_folders)
                .unwrap_or(false),
        }
    }
}

/// Capabilities declared in the `initialize` response
pub fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Kind(
            TextDocumentSyncKind::FULL,
        )),
        code_lens_provider: Some(CodeLensOptions {
            resolve_provider: Some(true),
        }),
        ..Default::default()
    }
}

/// Dynamic registration for `workspace/didChangeConfiguration`
pub fn configuration_registration() -> Registration {
    Registration {
        id: CONFIGURATION_REGISTRATION_ID.to_string(),
        method: "workspace/didChangeConfiguration".to_string(),
        register_options: None,
    }
}
