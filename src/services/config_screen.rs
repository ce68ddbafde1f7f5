//! The configuration screen: load, validate, render, save.
//!
//! One [`ConfigScreen`] serves any number of requests. Each call to
//! [`ConfigScreen::show`] or [`ConfigScreen::process`] runs a single
//! sequential pass with its own ledger; nothing is retried and nothing runs
//! in the background.

use std::{sync::Arc, time::Duration};

use serde::Serialize;

use crate::{
    config::AppConfig,
    db::{ConfigStore, DbError, open_store},
    models::{ConfigField, ConfigurationRecord, Finding, FindingKind},
    render::{FormTemplate, RenderOutput},
    services::{
        reconciler::{ConfigReconciler, Decision, FormState},
        version_check::VersionChecker,
    },
};

/// Errors building a screen from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ScreenError {
    #[error("Store error: {0}")]
    Store(#[from] DbError),

    #[error("Failed to read form template {1}: {0}")]
    Template(std::io::Error, std::path::PathBuf),

    #[error("Failed to build release feed client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// A rendered form together with what went into it.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedForm {
    pub html: String,
    pub output: RenderOutput,
    pub findings: Vec<Finding>,
}

impl RenderedForm {
    pub fn disable_controls(&self) -> bool {
        self.output.disable_controls
    }
}

/// Result of processing a submission.
#[derive(Debug, Clone)]
pub enum ScreenOutcome {
    /// The submission was persisted; `form` shows the stored state.
    Saved { id: i64, form: RenderedForm },
    /// The submission was rejected or could not be persisted.
    Redisplay(RenderedForm),
}

/// A stored row as seen by the reconciler.
struct LoadedRecord {
    /// Validity marker followed by the stored columns.
    record: ConfigurationRecord,
    problem: Option<Finding>,
}

pub struct ConfigScreen {
    store: Arc<dyn ConfigStore>,
    reconciler: ConfigReconciler,
    version_checker: Option<VersionChecker>,
    template: FormTemplate,
    default_id: i64,
}

impl ConfigScreen {
    pub fn new(store: Arc<dyn ConfigStore>, default_id: i64) -> Self {
        Self {
            store,
            reconciler: ConfigReconciler::default(),
            version_checker: None,
            template: FormTemplate::embedded(),
            default_id,
        }
    }

    /// Build a screen with the store, template and feed client described by
    /// `config`.
    pub async fn from_config(config: &AppConfig) -> Result<Self, ScreenError> {
        let store = open_store(&config.store, config.screen.config_id).await?;

        let template = match &config.screen.template {
            Some(path) => FormTemplate::from_file(path)
                .map_err(|e| ScreenError::Template(e, path.clone()))?,
            None => FormTemplate::embedded(),
        }
        .with_root_doc(config.screen.root_doc.clone());

        let version_checker = if config.version_check.enabled {
            Some(VersionChecker::new(
                config.version_check.feed_url.clone(),
                Duration::from_secs(config.version_check.timeout_secs),
            )?)
        } else {
            None
        };

        Ok(Self {
            store,
            reconciler: ConfigReconciler::new(config.screen.expected_items),
            version_checker,
            template,
            default_id: config.screen.config_id,
        })
    }

    pub fn with_version_checker(mut self, checker: VersionChecker) -> Self {
        self.version_checker = Some(checker);
        self
    }

    pub fn store(&self) -> &Arc<dyn ConfigStore> {
        &self.store
    }

    pub fn default_id(&self) -> i64 {
        self.default_id
    }

    /// Render the form for the stored configuration `id`.
    pub async fn show(&self, id: i64) -> RenderedForm {
        let loaded = self.load_record(id).await;

        let version = match (&self.version_checker, &loaded.problem) {
            (Some(checker), None) => match loaded.record.field(ConfigField::Version) {
                Some(stored) => Some(checker.check(stored).await),
                None => None,
            },
            _ => None,
        };

        let mut form = self.reconciler.prepare(&loaded.record, version.as_ref());
        if let Some(problem) = loaded.problem {
            form.ledger.record(problem);
        }
        self.render(&form)
    }

    /// Validate a submission and persist it if nothing blocks it.
    pub async fn process(&self, submitted: &ConfigurationRecord) -> ScreenOutcome {
        let id = self.resolve_id(submitted);
        let loaded = self.load_record(id).await;

        let decision = self.reconciler.apply(submitted, &loaded.record);
        let mut form = match decision {
            Decision::Commit { record, mut form } => match self.store.save(id, &record).await {
                Ok(()) => {
                    tracing::info!(id, fields = record.len(), "Saved SSO configuration");
                    return ScreenOutcome::Saved {
                        id,
                        form: self.show(id).await,
                    };
                }
                Err(e) => {
                    tracing::error!(id, error = %e, "Failed to save SSO configuration");
                    form.ledger.record(Finding::global(
                        FindingKind::PersistenceFailed,
                        format!("The configuration could not be saved: {e}"),
                    ));
                    form
                }
            },
            Decision::Redisplay(form) => form,
        };

        if let Some(problem) = loaded.problem {
            form.ledger.record(problem);
        }
        ScreenOutcome::Redisplay(self.render(&form))
    }

    /// The configuration row a submission refers to.
    ///
    /// The submitted `id` is used when it is numeric and shorter than ten
    /// characters; anything else falls back to the default row. Signs,
    /// whitespace and exponents are rejected, unlike a loose numeric check.
    pub fn resolve_id(&self, submitted: &ConfigurationRecord) -> i64 {
        submitted
            .field(ConfigField::Id)
            .filter(|id| id.len() < 10 && !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|id| id.parse().ok())
            .unwrap_or(self.default_id)
    }

    async fn load_record(&self, id: i64) -> LoadedRecord {
        let (row, problem) = match self.store.load(id).await {
            Ok(Some(row)) => (Some(row), None),
            Ok(None) => {
                tracing::error!(id, "SSO configuration row not found");
                (
                    None,
                    Some(format!("No SSO configuration with id {id} was found")),
                )
            }
            Err(e) => {
                tracing::error!(id, error = %e, "Failed to load SSO configuration");
                (
                    None,
                    Some("The SSO configuration could not be loaded from the database".to_string()),
                )
            }
        };

        let mut record = ConfigurationRecord::with_validity_marker(row.is_some());
        if let Some(row) = row {
            for (name, value) in row.iter() {
                record.insert(name, value);
            }
        }

        LoadedRecord {
            record,
            problem: problem.map(|message| Finding::global(FindingKind::StoreUnavailable, message)),
        }
    }

    fn render(&self, form: &FormState) -> RenderedForm {
        let output = form.finish();
        RenderedForm {
            html: self.template.render(&output),
            findings: form.ledger.findings().to_vec(),
            output,
        }
    }
}
