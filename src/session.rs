//! Editing-session state: the field catalog snapshot, the debounce timer and
//! the latest validation result.
//!
//! Every edit is validated locally and published at once. When the local
//! result is valid, an authoritative check is scheduled after a quiet
//! period; a later edit cancels it, and a result that arrives for anything
//! but the latest edit is discarded.

use crate::api_client::{FilterBackend, FilterRequest};
use crate::config::{EditorSettings, FilterConfig};
use crate::fields::FieldCatalog;
use crate::validate::{ServerValidation, ValidationResult, validate};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A validation result and the edit it belongs to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionUpdate {
    /// Increases by one for every edit
    pub generation: u64,
    pub text: String,
    pub result: ValidationResult,
}

impl SessionUpdate {
    /// True once the server's answer (or its absence) has been merged
    pub fn is_authoritative(&self) -> bool {
        self.result.server_validation.is_some()
    }
}

pub struct EditorSession {
    backend: Arc<dyn FilterBackend>,
    catalog: FieldCatalog,
    editor: EditorSettings,
    generation: u64,
    pending: Option<JoinHandle<()>>,
    updates: watch::Sender<Option<SessionUpdate>>,
}

impl EditorSession {
    /// Start a session, fetching the field catalog once. When the fetch
    /// fails, the configured built-in catalog is used instead.
    pub async fn start(backend: Arc<dyn FilterBackend>, config: &FilterConfig) -> Self {
        let catalog = load_catalog(backend.as_ref(), config).await;
        Self::with_catalog(backend, catalog, config.editor.clone())
    }

    pub fn with_catalog(
        backend: Arc<dyn FilterBackend>,
        catalog: FieldCatalog,
        editor: EditorSettings,
    ) -> Self {
        let (updates, _) = watch::channel(None);
        Self {
            backend,
            catalog,
            editor,
            generation: 0,
            pending: None,
            updates,
        }
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<SessionUpdate>> {
        self.updates.subscribe()
    }

    pub fn latest(&self) -> Option<SessionUpdate> {
        self.updates.borrow().clone()
    }

    /// Handle one edit. Returns the local result immediately; the
    /// authoritative result, if any, is published to subscribers later.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_input(&mut self, text: &str) -> ValidationResult {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }

        self.generation += 1;
        let generation = self.generation;
        let result = validate(text, &self.catalog);

        self.updates.send_replace(Some(SessionUpdate {
            generation,
            text: text.to_string(),
            result: result.clone(),
        }));

        if !result.valid {
            debug!(generation, "local validation failed, skipping server check");
            return result;
        }

        let backend = Arc::clone(&self.backend);
        let updates = self.updates.clone();
        let request = FilterRequest::new(text, &self.editor);
        let use_test = self.editor.source_id.is_some();
        let quiet = self.editor.debounce();
        let local = result.clone();

        debug!(generation, ?quiet, "scheduling server check");
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;

            let server = authoritative_check(backend.as_ref(), &request, use_test).await;
            let mut merged = local;
            merged.merge_server(server);

            // Compared under the channel lock so a newer edit always wins
            updates.send_if_modified(|current| match current {
                Some(update) if update.generation == generation => {
                    update.result = merged;
                    true
                }
                _ => {
                    debug!(generation, "dropping stale server result");
                    false
                }
            });
        }));

        result
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

/// Fetch the field catalog once, falling back to the configured built-in set.
pub async fn load_catalog(backend: &dyn FilterBackend, config: &FilterConfig) -> FieldCatalog {
    match backend.fetch_fields().await {
        Ok(fields) => {
            let catalog = FieldCatalog::new(fields);
            if catalog.is_empty() {
                warn!("server returned no fields, using built-in catalog");
                config.fields.catalog()
            } else {
                debug!(fields = catalog.len(), "loaded field catalog");
                catalog
            }
        }
        Err(err) => {
            warn!("failed to fetch field catalog, using built-in catalog: {err}");
            config.fields.catalog()
        }
    }
}

/// `/filters/test` is used when a source is selected, since it validates and
/// reports match counts in one call. A failed call degrades to
/// `Unavailable`.
pub async fn authoritative_check(
    backend: &dyn FilterBackend,
    request: &FilterRequest,
    use_test: bool,
) -> ServerValidation {
    let outcome = if use_test {
        backend
            .test_expression(request)
            .await
            .map(ServerValidation::from)
    } else {
        backend
            .validate_expression(request)
            .await
            .map(ServerValidation::from)
    };

    outcome.unwrap_or_else(|err| {
        warn!("server validation unavailable: {err}");
        ServerValidation::unavailable(err.to_string())
    })
}
