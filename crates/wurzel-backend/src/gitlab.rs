//! Backend GitLab CI: un job por step con `script`, `artifacts.paths` y
//! `needs` con los nombres de sus dependencias.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use wurzel_core::constants::RUN_ID_ENV;
use wurzel_core::settings::from_prefixed;
use wurzel_core::{ConfigSource, ExecutorKind, NodeId, StepGraph};

use crate::backend::Backend;
use crate::errors::BackendError;
use crate::lowering::{lower, LoweringOptions};
use crate::values::{load_values, select};

pub const SETTINGS_PREFIX: &str = "GITLABBACKEND";
/// Id de ejecución por defecto: el del pipeline de GitLab.
const PIPELINE_RUN_ID: &str = "gitlab-$CI_PIPELINE_ID";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GitlabImageConfig {
    pub name: String,
    pub pull_policy: Option<String>,
}

impl Default for GitlabImageConfig {
    fn default() -> Self {
        Self { name: "ghcr.io/telekom/wurzel:latest".to_string(),
               pull_policy: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GitlabCacheConfig {
    pub paths: Vec<String>,
    pub key: String,
    pub policy: String,
}

impl Default for GitlabCacheConfig {
    fn default() -> Self {
        Self { paths: Vec::new(),
               key: "${CI_COMMIT_REF_SLUG}".to_string(),
               policy: "pull-push".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GitlabArtifactConfig {
    pub expire_in: String,
    pub when: String,
}

impl Default for GitlabArtifactConfig {
    fn default() -> Self {
        Self { expire_in: "1 week".to_string(),
               when: "on_success".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GitlabJobConfig {
    pub stage: String,
    pub tags: Vec<String>,
    pub timeout: Option<String>,
    /// Número de reintentos o un objeto `retry` de GitLab.
    pub retry: Value,
    pub allow_failure: bool,
    pub rules: Vec<Value>,
    pub before_script: Vec<String>,
    pub after_script: Vec<String>,
}

impl Default for GitlabJobConfig {
    fn default() -> Self {
        Self { stage: "process".to_string(),
               tags: Vec::new(),
               timeout: None,
               retry: Value::from(0),
               allow_failure: false,
               rules: Vec::new(),
               before_script: Vec::new(),
               after_script: Vec::new() }
    }
}

/// Entrada de `gitlab` en los ficheros de values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GitlabConfig {
    pub data_dir: PathBuf,
    pub encapsulate_env: bool,
    pub image: GitlabImageConfig,
    pub variables: IndexMap<String, String>,
    pub cache: GitlabCacheConfig,
    pub artifacts: GitlabArtifactConfig,
    pub default_job: GitlabJobConfig,
    pub stages: Vec<String>,
}

impl Default for GitlabConfig {
    fn default() -> Self {
        Self { data_dir: PathBuf::from("./data"),
               encapsulate_env: true,
               image: GitlabImageConfig::default(),
               variables: IndexMap::new(),
               cache: GitlabCacheConfig::default(),
               artifacts: GitlabArtifactConfig::default(),
               default_job: GitlabJobConfig::default(),
               stages: vec!["process".to_string()] }
    }
}

/// Settings planos desde la configuración ambiente (`GITLABBACKEND__*`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE", default)]
pub struct GitlabBackendSettings {
    pub image: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub encapsulate_env: Option<bool>,
    pub stage: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl From<GitlabBackendSettings> for GitlabConfig {
    fn from(s: GitlabBackendSettings) -> Self {
        let mut config = GitlabConfig::default();
        if let Some(image) = s.image {
            config.image.name = image;
        }
        if let Some(dir) = s.data_dir {
            config.data_dir = dir;
        }
        if let Some(on) = s.encapsulate_env {
            config.encapsulate_env = on;
        }
        if let Some(stage) = s.stage {
            config.stages = vec![stage.clone()];
            config.default_job.stage = stage;
        }
        if let Some(tags) = s.tags {
            config.default_job.tags = tags;
        }
        config
    }
}

fn as_posix(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn is_set(v: &Value) -> bool {
    match v {
        Value::Null | Value::Bool(false) => false,
        Value::Number(n) => n.as_f64() != Some(0.0),
        _ => true,
    }
}

#[derive(Debug, Clone, Default)]
pub struct GitlabBackend {
    pub config: GitlabConfig,
    pub executor: Option<ExecutorKind>,
}

impl GitlabBackend {
    pub fn new(config: GitlabConfig) -> Self {
        Self { config,
               executor: Some(ExecutorKind::Prometheus) }
    }

    pub fn with_executor(mut self, executor: Option<ExecutorKind>) -> Self {
        self.executor = executor;
        self
    }

    pub fn from_config(config: &dyn ConfigSource) -> Result<Self, BackendError> {
        let settings: GitlabBackendSettings = from_prefixed(config, SETTINGS_PREFIX)?;
        Ok(Self::new(settings.into()))
    }

    pub fn from_values(files: &[PathBuf], name: Option<&str>) -> Result<Self, BackendError> {
        let values = load_values(files)?;
        Ok(Self::new(select(&values, "gitlab", name)?))
    }

    fn options(&self) -> LoweringOptions {
        LoweringOptions { data_dir: self.config.data_dir.clone(),
                          executor: self.executor,
                          encapsulate_env: self.config.encapsulate_env }
    }

    /// Jobs por nombre de step, dependencias primero.
    pub fn generate_jobs(&self, graph: &StepGraph, root: NodeId) -> Result<Map<String, Value>, BackendError> {
        let job = &self.config.default_job;
        let mut jobs = Map::new();
        for d in lower(graph, root, &self.options())?.iter() {
            let mut cfg = Map::new();
            cfg.insert("stage".into(), json!(job.stage));
            cfg.insert("script".into(), json!([d.command.to_string()]));
            cfg.insert("artifacts".into(),
                       json!({
                           "paths": [as_posix(&d.output)],
                           "expire_in": self.config.artifacts.expire_in,
                           "when": self.config.artifacts.when,
                       }));
            if !d.needs.is_empty() {
                cfg.insert("needs".into(), json!(d.needs));
            }
            if !job.tags.is_empty() {
                cfg.insert("tags".into(), json!(job.tags));
            }
            if let Some(timeout) = &job.timeout {
                cfg.insert("timeout".into(), json!(timeout));
            }
            if is_set(&job.retry) {
                cfg.insert("retry".into(), job.retry.clone());
            }
            if job.allow_failure {
                cfg.insert("allow_failure".into(), json!(true));
            }
            if !job.rules.is_empty() {
                cfg.insert("rules".into(), json!(job.rules));
            }
            if !job.before_script.is_empty() {
                cfg.insert("before_script".into(), json!(job.before_script));
            }
            if !job.after_script.is_empty() {
                cfg.insert("after_script".into(), json!(job.after_script));
            }
            jobs.insert(d.name.to_string(), Value::Object(cfg));
        }
        Ok(jobs)
    }
}

impl Backend for GitlabBackend {
    fn name(&self) -> &'static str {
        "GitlabBackend"
    }

    fn generate_artifact(&self, graph: &StepGraph, root: NodeId) -> Result<String, BackendError> {
        let jobs = self.generate_jobs(graph, root)?;
        let c = &self.config;
        let mut pipeline = Map::new();

        let image = match &c.image.pull_policy {
            Some(policy) => json!({ "name": c.image.name, "pull_policy": policy }),
            None => json!(c.image.name),
        };
        pipeline.insert("image".into(), image);

        let mut variables = Map::new();
        variables.insert(RUN_ID_ENV.into(), json!(PIPELINE_RUN_ID));
        for (k, v) in &c.variables {
            variables.insert(k.clone(), json!(v));
        }
        pipeline.insert("variables".into(), Value::Object(variables));

        if !c.cache.paths.is_empty() {
            pipeline.insert("cache".into(),
                            json!({ "paths": c.cache.paths, "key": c.cache.key, "policy": c.cache.policy }));
        }
        pipeline.insert("stages".into(), json!(c.stages));
        pipeline.extend(jobs);
        Ok(serde_yaml::to_string(&Value::Object(pipeline))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_settings_override_defaults() {
        let config: GitlabConfig = GitlabBackendSettings { stage: Some("build".into()),
                                                           tags: Some(vec!["docker".into()]),
                                                           ..Default::default() }.into();
        assert_eq!(config.default_job.stage, "build");
        assert_eq!(config.stages, vec!["build"]);
        assert_eq!(config.default_job.tags, vec!["docker"]);
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn retry_zero_is_not_emitted() {
        assert!(!is_set(&json!(0)));
        assert!(is_set(&json!(2)));
        assert!(is_set(&json!({"max": 2})));
    }
}
