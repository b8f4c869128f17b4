//! External analyzer invocation
//!
//! The analyzer is run once per request as
//! `<binaryPath> -uri <documentUri> [-debug]`, with the document text on
//! stdin. It answers with a single JSON object on stdout:
//!
//! ```json
//! { "diagnostics": [...], "codeLenses": [...] }
//! ```
//!
//! Either field may be omitted. A missing binary is not an error: it is
//! the normal state before the user configures one, and [`Analyzer::locate`]
//! reports it as `None`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tower_lsp::lsp_types::{CodeLens, Diagnostic, Url};

use crate::document::Document;
use crate::error::{AnalyzerError, AnalyzerResult};
use crate::settings::Settings;

/// One invocation's input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerRequest {
    pub uri: Url,
    pub text: String,
    pub debug_mode: bool,
}

impl AnalyzerRequest {
    pub fn new(document: &Document, settings: &Settings) -> Self {
        Self {
            uri: document.uri.clone(),
            text: document.text.clone(),
            debug_mode: settings.debug_mode,
        }
    }

    /// Command-line arguments passed to the analyzer
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["-uri".to_string(), self.uri.to_string()];
        if self.debug_mode {
            args.push("-debug".to_string());
        }
        args
    }
}

/// Parsed analyzer stdout
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerOutput {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub diagnostics: Vec<Diagnostic>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub code_lenses: Vec<CodeLens>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl AnalyzerOutput {
    /// Parse analyzer stdout. Anything other than a JSON object is rejected.
    pub fn parse(stdout: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(stdout)?;
        if !value.is_object() {
            return Err(serde::de::Error::custom(format!(
                "expected a JSON object, found {}",
                json_kind(&value)
            )));
        }
        serde_json::from_value(value)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A located analyzer executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analyzer {
    path: PathBuf,
}

impl Analyzer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Find the executable named by `settings.binary_path`.
    ///
    /// Paths are checked on disk; bare names are looked up on `PATH`.
    /// Returns `None` when nothing executable is found.
    pub fn locate(settings: &Settings) -> Option<Self> {
        let configured = settings.binary_path.trim();
        if configured.is_empty() {
            return None;
        }

        match which::which(configured) {
            Ok(path) => Some(Self::new(path)),
            Err(e) => {
                tracing::debug!(binary = configured, "analyzer unavailable: {}", e);
                None
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the analyzer to completion.
    pub async fn run(&self, request: &AnalyzerRequest) -> AnalyzerResult<AnalyzerOutput> {
        tracing::debug!(
            analyzer = %self.path.display(),
            uri = %request.uri,
            debug_mode = request.debug_mode,
            "running analyzer"
        );

        let mut child = Command::new(&self.path)
            .args(request.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AnalyzerError::spawn(&self.path, e))?;

        // Feed stdin while stdout is drained, so a large document cannot
        // deadlock against a full output pipe.
        let stdin = child.stdin.take();
        let input = request.text.as_bytes();
        let write_input = async move {
            if let Some(mut stdin) = stdin {
                match stdin.write_all(input).await {
                    Ok(()) => {}
                    // The analyzer may exit without reading its input.
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                        tracing::trace!("analyzer closed stdin early");
                    }
                    Err(e) => return Err(AnalyzerError::Stdin(e)),
                }
            }
            Ok(())
        };

        let (written, output) = tokio::join!(write_input, child.wait_with_output());
        let output = output.map_err(AnalyzerError::Wait)?;

        if !output.status.success() {
            return Err(AnalyzerError::exit(output.status, &output.stderr));
        }
        written?;

        let stdout = String::from_utf8(output.stdout)?;
        Ok(AnalyzerOutput::parse(&stdout)?)
    }

    /// Run the analyzer on a separate task and race it against `token`.
    ///
    /// Returns `None` once the token is cancelled. The task is detached
    /// rather than killed; whatever it produces is dropped.
    pub async fn run_cancellable(
        &self,
        request: AnalyzerRequest,
        token: &CancellationToken,
    ) -> Option<AnalyzerResult<AnalyzerOutput>> {
        if token.is_cancelled() {
            return None;
        }

        let analyzer = self.clone();
        let task = tokio::spawn(async move { analyzer.run(&request).await });

        tokio::select! {
            biased;
            () = token.cancelled() => {
                tracing::debug!("analyzer result abandoned after cancellation");
                None
            }
            joined = task => Some(joined.map_err(AnalyzerError::from).and_then(|result| result)),
        }
    }
}
