//! Predictor registry

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{ModelSpec, ModelsConfig};
use crate::error::CommitteeError;
use crate::models::predictor::Predictor;
use crate::types::prediction::PredictorId;
use crate::types::task::Task;

/// A predictor registered for a task
#[derive(Clone)]
pub struct RegisteredPredictor {
    /// Selection name
    pub id: PredictorId,
    /// Model hub identifier
    pub model: String,
    /// Framework the checkpoint is loaded with
    pub framework: String,
    /// Selected when the caller expresses no preference
    pub selected_by_default: bool,
    /// The predictor itself
    pub predictor: Arc<dyn Predictor>,
}

impl std::fmt::Debug for RegisteredPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredPredictor")
            .field("id", &self.id)
            .field("model", &self.model)
            .field("framework", &self.framework)
            .field("selected_by_default", &self.selected_by_default)
            .finish()
    }
}

/// Predictors available per task.
///
/// Registration order is invocation order, and therefore the tie-break
/// order of the consensus vote.
#[derive(Debug, Default)]
pub struct PredictorRegistry {
    predictors: HashMap<Task, Vec<RegisteredPredictor>>,
}

impl PredictorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from the configured model table.
    ///
    /// `build` constructs a predictor for a model; a model whose predictor
    /// fails to build is logged and skipped.
    pub fn from_config<F>(models: &ModelsConfig, mut build: F) -> Self
    where
        F: FnMut(Task, &ModelSpec) -> Result<Arc<dyn Predictor>>,
    {
        let mut registry = Self::new();

        for task in Task::ALL {
            for spec in models.for_task(task) {
                match build(task, spec) {
                    Ok(predictor) => {
                        registry.register_spec(task, spec, predictor);
                        info!(
                            task = %task,
                            model = %spec.name,
                            checkpoint = %spec.model,
                            framework = %spec.framework,
                            "Loaded predictor"
                        );
                    }
                    Err(e) => {
                        warn!(
                            task = %task,
                            model = %spec.name,
                            error = %e,
                            "Failed to load predictor, skipping"
                        );
                    }
                }
            }
        }

        info!(count = registry.len(), "Predictor registry ready");
        registry
    }

    /// Register a predictor under a name.
    ///
    /// Re-registering a name replaces the previous predictor in place.
    pub fn register(
        &mut self,
        task: Task,
        name: impl Into<PredictorId>,
        predictor: Arc<dyn Predictor>,
    ) -> &mut Self {
        let entry = RegisteredPredictor {
            id: name.into(),
            model: String::new(),
            framework: String::new(),
            selected_by_default: false,
            predictor,
        };
        self.insert(task, entry);
        self
    }

    fn register_spec(&mut self, task: Task, spec: &ModelSpec, predictor: Arc<dyn Predictor>) {
        self.insert(
            task,
            RegisteredPredictor {
                id: PredictorId::new(spec.name.clone()),
                model: spec.model.clone(),
                framework: spec.framework.clone(),
                selected_by_default: spec.selected_by_default,
                predictor,
            },
        );
    }

    fn insert(&mut self, task: Task, entry: RegisteredPredictor) {
        if entry.predictor.task() != task {
            warn!(
                model = %entry.id,
                registered_for = %task,
                serves = %entry.predictor.task(),
                "Predictor registered for a task it does not serve"
            );
        }

        let slot = self.predictors.entry(task).or_default();
        match slot.iter_mut().find(|existing| existing.id == entry.id) {
            Some(existing) => *existing = entry,
            None => slot.push(entry),
        }
    }

    /// Remove a predictor, returning it if it was registered
    pub fn unregister(&mut self, task: Task, name: &str) -> Option<RegisteredPredictor> {
        let slot = self.predictors.get_mut(&task)?;
        let index = slot.iter().position(|p| p.id.as_str() == name)?;
        Some(slot.remove(index))
    }

    /// Drop every registered predictor
    pub fn clear(&mut self) {
        self.predictors.clear();
    }

    /// Predictors registered for a task, in registration order
    pub fn predictors(&self, task: Task) -> &[RegisteredPredictor] {
        self.predictors.get(&task).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Names registered for a task
    pub fn names(&self, task: Task) -> Vec<PredictorId> {
        self.predictors(task).iter().map(|p| p.id.clone()).collect()
    }

    /// Names selected by default for a task
    pub fn default_selection(&self, task: Task) -> Vec<PredictorId> {
        self.predictors(task)
            .iter()
            .filter(|p| p.selected_by_default)
            .map(|p| p.id.clone())
            .collect()
    }

    /// Resolve selected names to predictors, in registration order.
    ///
    /// Duplicate names are collapsed; unknown names are an error.
    pub fn resolve<S: AsRef<str>>(
        &self,
        task: Task,
        selection: &[S],
    ) -> Result<Vec<RegisteredPredictor>, CommitteeError> {
        if selection.is_empty() {
            return Err(CommitteeError::NoPredictorSelected(task));
        }

        let names: Vec<&str> = selection.iter().map(AsRef::<str>::as_ref).collect();
        let available = self.predictors(task);
        if let Some(unknown) = names
            .iter()
            .find(|name| !available.iter().any(|p| p.id.as_str() == **name))
        {
            return Err(CommitteeError::UnknownPredictor {
                task,
                name: unknown.to_string(),
            });
        }

        Ok(available
            .iter()
            .filter(|p| names.contains(&p.id.as_str()))
            .cloned()
            .collect())
    }

    /// Total number of registered predictors
    pub fn len(&self) -> usize {
        self.predictors.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
