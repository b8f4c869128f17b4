//! Per-document settings resolution
//!
//! Settings come from one of two places, decided at `initialize`:
//! - clients that answer `workspace/configuration` are asked per document
//!   (scoped to the document URI), and the answer is cached per URI;
//! - other clients get a single global settings object, seeded from
//!   `initializationOptions` and replaced by `didChangeConfiguration`.
//!
//! The cache stores the *pending* query, so concurrent resolves for the same
//! URI share one request.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tower_lsp::lsp_types::{ConfigurationItem, Url};

use crate::client::LspClient;
use crate::error::SettingsError;

/// Configuration section requested from the client
pub const SECTION: &str = "wisl";

/// Analyzer looked up on `PATH` when nothing is configured
pub const DEFAULT_BINARY_PATH: &str = "wisl";

/// Settings in effect for one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Path to the analyzer executable
    pub binary_path: String,
    /// Pass `-debug` to the analyzer
    pub debug_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            binary_path: DEFAULT_BINARY_PATH.to_string(),
            debug_mode: false,
        }
    }
}

impl Settings {
    /// Parse the value of a `wisl` section. A missing or `null` section
    /// yields the defaults.
    pub fn from_section(section: Option<Value>) -> Result<Self, SettingsError> {
        match section {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(value) => {
                serde_json::from_value(value).map_err(|e| SettingsError::Invalid(e.to_string()))
            }
        }
    }

    /// Parse a payload that nests the section under `wisl`, as sent with
    /// `workspace/didChangeConfiguration`.
    pub fn from_payload(payload: &Value) -> Result<Self, SettingsError> {
        Self::from_section(payload.get(SECTION).cloned())
    }

    /// Parse `initializationOptions`, accepting either `{ "wisl": {...} }`
    /// or the bare settings object.
    pub fn from_init_options(options: &Value) -> Result<Self, SettingsError> {
        match options.get(SECTION) {
            Some(section) => Self::from_section(Some(section.clone())),
            None => Self::from_section(Some(options.clone())),
        }
    }
}

type PendingSettings = Shared<BoxFuture<'static, Result<Settings, SettingsError>>>;

/// Resolves and caches [`Settings`] per document URI
pub struct SettingsResolver<C> {
    client: C,
    pull: AtomicBool,
    global: RwLock<Settings>,
    cache: Mutex<HashMap<Url, PendingSettings>>,
}

impl<C: LspClient> SettingsResolver<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            pull: AtomicBool::new(false),
            global: RwLock::new(Settings::default()),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Switch between scoped configuration queries and the global fallback
    pub fn enable_pull(&self, enabled: bool) {
        self.pull.store(enabled, Ordering::SeqCst);
    }

    pub fn pull_enabled(&self) -> bool {
        self.pull.load(Ordering::SeqCst)
    }

    pub async fn global(&self) -> Settings {
        self.global.read().await.clone()
    }

    pub async fn set_global(&self, settings: Settings) {
        *self.global.write().await = settings;
    }

    /// Settings for `uri`.
    ///
    /// A failed query is evicted from the cache before the error is
    /// returned, so the next resolve for the URI asks again.
    pub async fn resolve(&self, uri: &Url) -> Result<Settings, SettingsError> {
        if !self.pull_enabled() {
            return Ok(self.global().await);
        }

        let pending = {
            let mut cache = self.cache.lock().await;
            cache
                .entry(uri.clone())
                .or_insert_with(|| self.query(uri.clone()))
                .clone()
        };

        let result = pending.clone().await;
        if result.is_err() {
            let mut cache = self.cache.lock().await;
            if cache.get(uri).is_some_and(|cached| cached.ptr_eq(&pending)) {
                cache.remove(uri);
            }
        }
        result
    }

    fn query(&self, uri: Url) -> PendingSettings {
        let client = self.client.clone();
        async move {
            tracing::debug!(%uri, "requesting scoped configuration");
            let items = vec![ConfigurationItem {
                scope_uri: Some(uri),
                section: Some(SECTION.to_string()),
            }];
            let values = client
                .configuration(items)
                .await
                .map_err(|e| SettingsError::Query(e.to_string()))?;
            Settings::from_section(values.into_iter().next())
        }
        .boxed()
        .shared()
    }

    /// Drop the cached entry for a closed document
    pub async fn forget(&self, uri: &Url) {
        self.cache.lock().await.remove(uri);
    }

    /// Drop every cached entry
    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }

    /// Handle `workspace/didChangeConfiguration`.
    ///
    /// With scoped queries the cache is cleared and the payload ignored;
    /// otherwise the payload's `wisl` section becomes the global settings.
    /// An unparsable section leaves the previous global settings in place.
    pub async fn configuration_changed(&self, payload: &Value) {
        if self.pull_enabled() {
            self.clear().await;
            return;
        }

        match Settings::from_payload(payload) {
            Ok(settings) => {
                tracing::info!(?settings, "global settings updated");
                self.set_global(settings).await;
            }
            Err(e) => tracing::warn!("ignoring configuration change: {}", e),
        }
    }

    /// Number of URIs with a cached (pending or resolved) entry
    pub async fn cached_len(&self) -> usize {
        self.cache.lock().await.len()
    }
}
