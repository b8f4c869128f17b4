//! Outgoing half of the connection
//!
//! Every message the server sends to the editor goes through [`LspClient`],
//! so the handlers can run against the real tower-lsp [`Client`] or a
//! recording stand-in.

use serde_json::Value;
use tower_lsp::async_trait;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{ConfigurationItem, Diagnostic, MessageType, Registration, Url};
use tower_lsp::Client;

#[async_trait]
pub trait LspClient: Send + Sync + Clone + 'static {
    async fn publish_diagnostics(&self, uri: Url, diags: Vec<Diagnostic>, version: Option<i32>);

    async fn show_message(&self, typ: MessageType, message: String);

    async fn log_message(&self, typ: MessageType, message: String);

    /// `workspace/configuration` request
    async fn configuration(&self, items: Vec<ConfigurationItem>) -> Result<Vec<Value>>;

    /// `client/registerCapability` request
    async fn register_capability(&self, registrations: Vec<Registration>) -> Result<()>;
}

#[async_trait]
impl LspClient for Client {
    async fn publish_diagnostics(&self, uri: Url, diags: Vec<Diagnostic>, version: Option<i32>) {
        self.publish_diagnostics(uri, diags, version).await;
    }

    async fn show_message(&self, typ: MessageType, message: String) {
        self.show_message(typ, message).await;
    }

    async fn log_message(&self, typ: MessageType, message: String) {
        self.log_message(typ, message).await;
    }

    async fn configuration(&self, items: Vec<ConfigurationItem>) -> Result<Vec<Value>> {
        self.configuration(items).await
    }

    async fn register_capability(&self, registrations: Vec<Registration>) -> Result<()> {
        self.register_capability(registrations).await
    }
}
