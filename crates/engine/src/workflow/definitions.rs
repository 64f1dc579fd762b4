//! Definition registry: validated workflows keyed by name.
//!
//! The registry pulls raw documents from a [`DefinitionSource`] the first time any lookup
//! happens and keeps the validated definitions for the lifetime of the process. A document that
//! fails to parse or validate is logged and skipped; it never prevents the others from loading.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, OnceLock, RwLock},
};

use anyhow::{Context, Result};
use conductor_types::WorkflowDocument;
use indexmap::IndexMap;
use tracing::{info, warn};

use crate::{
    agents::AgentExecutor, error::ValidationError, model::WorkflowDefinition, parse_workflow_file,
    workflow::document::workflow_definition_from_document,
};

/// File extensions recognised as workflow documents.
pub const WORKFLOW_FILE_EXTENSIONS: [&str; 3] = ["yml", "yaml", "json"];

/// A raw document together with where it came from.
#[derive(Debug)]
pub struct LoadedDocument {
    /// File path or other label used in diagnostics.
    pub origin: String,
    pub document: Result<WorkflowDocument>,
}

/// Supplies raw workflow documents to a [`DefinitionRegistry`].
pub trait DefinitionSource: Send + Sync {
    /// Label used in log output.
    fn describe(&self) -> String;

    /// Reads every available document. Per-document failures are reported inside
    /// [`LoadedDocument`]; an `Err` means the source as a whole could not be read.
    fn load_documents(&self) -> Result<Vec<LoadedDocument>>;
}

/// Loads `*.yml`, `*.yaml`, and `*.json` files from one directory, in file name order.
#[derive(Debug, Clone)]
pub struct DirectoryDefinitionSource {
    directory: PathBuf,
}

impl DirectoryDefinitionSource {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self { directory: directory.into() }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl DefinitionSource for DirectoryDefinitionSource {
    fn describe(&self) -> String {
        self.directory.display().to_string()
    }

    fn load_documents(&self) -> Result<Vec<LoadedDocument>> {
        let entries = fs::read_dir(&self.directory)
            .with_context(|| format!("Failed to read workflow directory: {}", self.directory.display()))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let recognised = path
                .extension()
                .and_then(|extension| extension.to_str())
                .is_some_and(|extension| WORKFLOW_FILE_EXTENSIONS.contains(&extension));
            if recognised && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        Ok(paths
            .into_iter()
            .map(|path| LoadedDocument {
                origin: path.display().to_string(),
                document: parse_workflow_file(&path),
            })
            .collect())
    }
}

/// In-memory documents, mostly useful for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticDefinitionSource {
    documents: Vec<WorkflowDocument>,
}

impl StaticDefinitionSource {
    pub fn new(documents: Vec<WorkflowDocument>) -> Self {
        Self { documents }
    }
}

impl DefinitionSource for StaticDefinitionSource {
    fn describe(&self) -> String {
        format!("{} in-memory document(s)", self.documents.len())
    }

    fn load_documents(&self) -> Result<Vec<LoadedDocument>> {
        Ok(self
            .documents
            .iter()
            .map(|document| LoadedDocument {
                origin: format!("static:{}", document.name),
                document: Ok(document.clone()),
            })
            .collect())
    }
}

/// Process-lifetime lookup table from workflow name to validated definition.
pub struct DefinitionRegistry {
    source: Option<Box<dyn DefinitionSource>>,
    executor: Arc<dyn AgentExecutor>,
    loaded: OnceLock<()>,
    definitions: RwLock<IndexMap<String, Arc<WorkflowDefinition>>>,
}

impl DefinitionRegistry {
    /// Registry without a source; definitions arrive through [`register`](Self::register).
    pub fn new(executor: Arc<dyn AgentExecutor>) -> Self {
        Self {
            source: None,
            executor,
            loaded: OnceLock::new(),
            definitions: RwLock::new(IndexMap::new()),
        }
    }

    /// Registry that lazily loads from `source` on first access.
    pub fn with_source(source: impl DefinitionSource + 'static, executor: Arc<dyn AgentExecutor>) -> Self {
        Self {
            source: Some(Box::new(source)),
            ..Self::new(executor)
        }
    }

    /// Validates and stores a document, replacing any definition with the same name.
    pub fn register(&self, document: &WorkflowDocument) -> Result<Arc<WorkflowDefinition>, ValidationError> {
        self.ensure_loaded();
        self.insert_document(document)
    }

    /// Looks up a definition by name.
    pub fn get(&self, name: &str) -> Option<Arc<WorkflowDefinition>> {
        self.ensure_loaded();
        self.definitions
            .read()
            .expect("definition registry lock poisoned")
            .get(name)
            .cloned()
    }

    /// Every definition in load order.
    pub fn definitions(&self) -> Vec<Arc<WorkflowDefinition>> {
        self.ensure_loaded();
        self.definitions
            .read()
            .expect("definition registry lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.ensure_loaded();
        self.definitions
            .read()
            .expect("definition registry lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ensure_loaded();
        self.definitions.read().expect("definition registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_loaded(&self) {
        self.loaded.get_or_init(|| self.load_from_source());
    }

    fn load_from_source(&self) {
        let Some(source) = &self.source else {
            return;
        };

        let documents = match source.load_documents() {
            Ok(documents) => documents,
            Err(error) => {
                warn!(source = %source.describe(), error = %format!("{error:#}"), "workflow source could not be read");
                return;
            }
        };

        for loaded in documents {
            let document = match loaded.document {
                Ok(document) => document,
                Err(error) => {
                    warn!(origin = %loaded.origin, error = %format!("{error:#}"), "skipping unreadable workflow document");
                    continue;
                }
            };
            if let Err(error) = self.insert_document(&document) {
                warn!(origin = %loaded.origin, error = %error, "skipping invalid workflow definition");
            }
        }

        let count = self.definitions.read().expect("definition registry lock poisoned").len();
        info!(source = %source.describe(), count, "workflow definitions loaded");
    }

    fn insert_document(&self, document: &WorkflowDocument) -> Result<Arc<WorkflowDefinition>, ValidationError> {
        let definition = Arc::new(workflow_definition_from_document(document, self.executor.as_ref())?);
        let replaced = self
            .definitions
            .write()
            .expect("definition registry lock poisoned")
            .insert(definition.name().to_string(), Arc::clone(&definition))
            .is_some();
        info!(workflow = %definition.name(), steps = definition.steps().len(), replaced, "workflow definition registered");
        Ok(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::MockAgentExecutor;
    use conductor_types::{WorkflowAgentDeclaration, WorkflowStepDefinition, WorkflowVersion};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn document(name: &str, agent: &str) -> WorkflowDocument {
        WorkflowDocument {
            version: WorkflowVersion::Number(1),
            name: name.into(),
            description: String::new(),
            inputs: Vec::new(),
            agents: vec![WorkflowAgentDeclaration::mock("planner")],
            steps: vec![WorkflowStepDefinition::new("only", agent, "static input")],
        }
    }

    fn executor() -> Arc<dyn AgentExecutor> {
        Arc::new(MockAgentExecutor::new())
    }

    struct CountingSource {
        calls: Arc<AtomicUsize>,
    }

    impl DefinitionSource for CountingSource {
        fn describe(&self) -> String {
            "counting".into()
        }

        fn load_documents(&self) -> Result<Vec<LoadedDocument>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![LoadedDocument {
                origin: "counting".into(),
                document: Ok(document("lazy", "planner")),
            }])
        }
    }

    #[test]
    fn loads_lazily_and_only_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = DefinitionRegistry::with_source(CountingSource { calls: Arc::clone(&calls) }, executor());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert!(registry.get("lazy").is_some());
        assert!(registry.get("lazy").is_some());
        assert_eq!(registry.names(), vec!["lazy"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalid_documents_do_not_block_valid_ones() {
        let source = StaticDefinitionSource::new(vec![document("good", "planner"), document("bad", "builder")]);
        let registry = DefinitionRegistry::with_source(source, executor());

        assert_eq!(registry.names(), vec!["good"]);
        assert!(registry.get("bad").is_none());
    }

    #[test]
    fn registering_again_replaces_the_definition() {
        let registry = DefinitionRegistry::new(executor());
        let first = registry.register(&document("wf", "planner")).expect("first registration");

        let mut updated = document("wf", "planner");
        updated.description = "second".into();
        let second = registry.register(&updated).expect("second registration");

        assert_eq!(registry.len(), 1);
        assert_eq!(first.description(), "");
        assert_eq!(second.description(), "second");
        assert_eq!(registry.get("wf").expect("registered").description(), "second");
    }

    #[test]
    fn register_reports_validation_errors() {
        let registry = DefinitionRegistry::new(executor());
        let error = registry.register(&document("wf", "builder")).expect_err("undeclared agent");
        assert!(matches!(error, ValidationError::UndeclaredAgent { ref step_id, .. } if step_id == "only"));
        assert!(registry.is_empty());
    }

    #[test]
    fn directory_source_reads_yaml_and_json_in_name_order() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        fs::write(
            temp_dir.path().join("b.yml"),
            "version: 1\nname: beta\nagents: [{name: planner}]\nsteps: [{id: s, agent: planner, input: x}]\n",
        )
        .expect("write yml");
        fs::write(
            temp_dir.path().join("a.json"),
            r#"{"version": "1", "name": "alpha", "agents": [{"name": "planner"}], "steps": [{"id": "s", "agent": "planner", "input": "x"}]}"#,
        )
        .expect("write json");
        fs::write(temp_dir.path().join("c.yaml"), "this: [is not a workflow").expect("write broken");
        fs::write(temp_dir.path().join("notes.txt"), "ignored").expect("write txt");

        let registry = DefinitionRegistry::with_source(DirectoryDefinitionSource::new(temp_dir.path()), executor());

        assert_eq!(registry.names(), vec!["alpha", "beta"]);
    }

    #[test]
    fn missing_directory_yields_an_empty_registry() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let source = DirectoryDefinitionSource::new(temp_dir.path().join("absent"));
        assert!(source.load_documents().is_err());

        let registry = DefinitionRegistry::with_source(source, executor());
        assert!(registry.is_empty());
    }
}
