//! Shared test support: a recording client and throwaway analyzer scripts

#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tempfile::TempDir;
use tower_lsp::async_trait;
use tower_lsp::jsonrpc;
use tower_lsp::lsp_types::*;
use wisl_lsp::client::LspClient;
use wisl_lsp::server::WislLspServer;

/// One `textDocument/publishDiagnostics` notification
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub uri: Url,
    pub diagnostics: Vec<Diagnostic>,
    pub version: Option<i32>,
}

#[derive(Default)]
struct Recorded {
    published: Mutex<Vec<Published>>,
    messages: Mutex<Vec<(MessageType, String)>>,
    logs: Mutex<Vec<String>>,
    registrations: Mutex<Vec<Registration>>,
    configuration_items: Mutex<Vec<ConfigurationItem>>,
    configuration_requests: AtomicUsize,
    configuration: Mutex<Value>,
    configuration_delay: Mutex<Duration>,
    fail_configuration: AtomicBool,
}

/// Client that records everything the server sends and answers
/// `workspace/configuration` with a configurable `wisl` section.
#[derive(Clone, Default)]
pub struct RecordingClient {
    recorded: Arc<Recorded>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Section returned for every configuration item
    pub fn set_configuration(&self, section: Value) {
        *self.recorded.configuration.lock().unwrap() = section;
    }

    /// Delay before answering configuration requests
    pub fn set_configuration_delay(&self, delay: Duration) {
        *self.recorded.configuration_delay.lock().unwrap() = delay;
    }

    pub fn fail_configuration(&self, fail: bool) {
        self.recorded.fail_configuration.store(fail, Ordering::SeqCst);
    }

    pub fn published(&self) -> Vec<Published> {
        self.recorded.published.lock().unwrap().clone()
    }

    pub fn published_for(&self, uri: &Url) -> Vec<Published> {
        self.published()
            .into_iter()
            .filter(|p| &p.uri == uri)
            .collect()
    }

    pub fn messages(&self) -> Vec<(MessageType, String)> {
        self.recorded.messages.lock().unwrap().clone()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(typ, _)| *typ == MessageType::ERROR)
            .map(|(_, message)| message)
            .collect()
    }

    pub fn logs(&self) -> Vec<String> {
        self.recorded.logs.lock().unwrap().clone()
    }

    pub fn registrations(&self) -> Vec<Registration> {
        self.recorded.registrations.lock().unwrap().clone()
    }

    pub fn configuration_requests(&self) -> usize {
        self.recorded.configuration_requests.load(Ordering::SeqCst)
    }

    pub fn configuration_items(&self) -> Vec<ConfigurationItem> {
        self.recorded.configuration_items.lock().unwrap().clone()
    }
}

#[async_trait]
impl LspClient for RecordingClient {
    async fn publish_diagnostics(&self, uri: Url, diags: Vec<Diagnostic>, version: Option<i32>) {
        self.recorded.published.lock().unwrap().push(Published {
            uri,
            diagnostics: diags,
            version,
        });
    }

    async fn show_message(&self, typ: MessageType, message: String) {
        self.recorded.messages.lock().unwrap().push((typ, message));
    }

    async fn log_message(&self, _: MessageType, message: String) {
        self.recorded.logs.lock().unwrap().push(message);
    }

    async fn configuration(&self, items: Vec<ConfigurationItem>) -> jsonrpc::Result<Vec<Value>> {
        self.recorded
            .configuration_requests
            .fetch_add(1, Ordering::SeqCst);
        self.recorded
            .configuration_items
            .lock()
            .unwrap()
            .extend(items.iter().cloned());

        let delay = *self.recorded.configuration_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.recorded.fail_configuration.load(Ordering::SeqCst) {
            return Err(jsonrpc::Error::internal_error());
        }

        let section = self.recorded.configuration.lock().unwrap().clone();
        Ok(items.iter().map(|_| section.clone()).collect())
    }

    async fn register_capability(&self, registrations: Vec<Registration>) -> jsonrpc::Result<()> {
        self.recorded
            .registrations
            .lock()
            .unwrap()
            .extend(registrations);
        Ok(())
    }
}

// ============================================================================
// Server setup
// ============================================================================

pub fn new_server() -> (WislLspServer<RecordingClient>, RecordingClient) {
    let client = RecordingClient::new();
    (WislLspServer::new(client.clone()), client)
}

/// Capabilities of a client that supports scoped configuration
pub fn pull_capabilities() -> ClientCapabilities {
    ClientCapabilities {
        workspace: Some(WorkspaceClientCapabilities {
            configuration: Some(true),
            workspace_folders: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn init_params(capabilities: ClientCapabilities, options: Option<Value>) -> InitializeParams {
    InitializeParams {
        process_id: Some(1),
        capabilities,
        initialization_options: options,
        ..Default::default()
    }
}

/// `initializationOptions` pointing the global settings at `binary`
pub fn binary_options(binary: &str, debug_mode: bool) -> Value {
    json!({ "wisl": { "binaryPath": binary, "debugMode": debug_mode } })
}

pub fn uri(name: &str) -> Url {
    Url::parse(&format!("file:///workspace/{}", name)).unwrap()
}

pub fn open_params(uri: &Url, text: &str, version: i32) -> DidOpenTextDocumentParams {
    DidOpenTextDocumentParams {
        text_document: TextDocumentItem {
            uri: uri.clone(),
            language_id: "wisl".to_string(),
            version,
            text: text.to_string(),
        },
    }
}

pub fn change_params(uri: &Url, text: &str, version: i32) -> DidChangeTextDocumentParams {
    DidChangeTextDocumentParams {
        text_document: VersionedTextDocumentIdentifier {
            uri: uri.clone(),
            version,
        },
        content_changes: vec![TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: text.to_string(),
        }],
    }
}

pub fn close_params(uri: &Url) -> DidCloseTextDocumentParams {
    DidCloseTextDocumentParams {
        text_document: TextDocumentIdentifier { uri: uri.clone() },
    }
}

pub fn code_lens_params(uri: &Url) -> CodeLensParams {
    CodeLensParams {
        text_document: TextDocumentIdentifier { uri: uri.clone() },
        work_done_progress_params: WorkDoneProgressParams::default(),
        partial_result_params: PartialResultParams::default(),
    }
}

pub fn diagnostic(line: u32, message: &str) -> Diagnostic {
    Diagnostic {
        range: Range::new(Position::new(line, 0), Position::new(line, 1)),
        severity: Some(DiagnosticSeverity::ERROR),
        message: message.to_string(),
        ..Default::default()
    }
}

pub fn lens(line: u32, title: &str) -> CodeLens {
    CodeLens {
        range: Range::new(Position::new(line, 0), Position::new(line, 4)),
        command: Some(Command {
            title: title.to_string(),
            command: String::new(),
            arguments: None,
        }),
        data: None,
    }
}

// ============================================================================
// Analyzer scripts
// ============================================================================

/// An executable shell script standing in for the analyzer. The script is
/// deleted when this value is dropped.
pub struct AnalyzerScript {
    _dir: TempDir,
    path: PathBuf,
}

#[cfg(unix)]
impl AnalyzerScript {
    /// Script with the given `sh` body
    pub fn new(body: &str) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wisl-analyzer");
        {
            let mut file = fs::File::create(&path).unwrap();
            writeln!(file, "#!/bin/sh").unwrap();
            writeln!(file, "{}", body).unwrap();
            file.sync_all().unwrap();
        }
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        Self { _dir: dir, path }
    }

    /// Script that consumes stdin and prints `output` verbatim
    pub fn printing(output: &Value) -> Self {
        Self::new(&format!("cat > /dev/null\ncat <<'EOF'\n{}\nEOF", output))
    }

    pub fn path(&self) -> &str {
        self.path.to_str().unwrap()
    }
}
