//! Backend Argo Workflows: un DAG de tareas con una plantilla de
//! contenedor por step. Con `schedule` el manifiesto es un `CronWorkflow`.
//!
//! Los artefactos viajan por un bucket S3 compartido; cada tarea recibe
//! las salidas de sus dependencias como artefactos de entrada.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use wurzel_core::constants::RUN_ID_ENV;
use wurzel_core::settings::from_prefixed;
use wurzel_core::{ConfigSource, ExecutorKind, NodeId, StepGraph};

use crate::backend::Backend;
use crate::errors::BackendError;
use crate::lowering::{lower, ArtifactDescriptor, LoweringOptions};
use crate::values::{load_values, select};

pub const SETTINGS_PREFIX: &str = "ARGOWORKFLOWBACKEND";
const API_VERSION: &str = "argoproj.io/v1alpha1";
const ENTRYPOINT: &str = "wurzel-pipeline";
const WORKFLOW_UID: &str = "{{workflow.uid}}";

/// Settings planos desde la configuración ambiente
/// (`ARGOWORKFLOWBACKEND__IMAGE`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE", default)]
pub struct ArgoBackendSettings {
    pub image: String,
    pub namespace: String,
    pub pipeline_name: String,
    pub schedule: Option<String>,
    pub service_account_name: String,
    pub data_dir: PathBuf,
    pub encapsulate_env: bool,
    pub bucket: String,
    pub endpoint: String,
}

impl Default for ArgoBackendSettings {
    fn default() -> Self {
        Self { image: "ghcr.io/telekom/wurzel".to_string(),
               namespace: "argo-workflows".to_string(),
               pipeline_name: "wurzel".to_string(),
               schedule: Some("0 4 * * *".to_string()),
               service_account_name: "wurzel-service-account".to_string(),
               data_dir: PathBuf::from("/usr/app/data"),
               encapsulate_env: true,
               bucket: "wurzel-bucket".to_string(),
               endpoint: "s3.amazonaws.com".to_string() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityContext {
    pub run_as_non_root: Option<bool>,
    pub run_as_user: Option<u32>,
    pub run_as_group: Option<u32>,
    pub allow_privilege_escalation: Option<bool>,
    pub read_only_root_filesystem: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Resources {
    pub cpu_request: Option<String>,
    pub cpu_limit: Option<String>,
    pub memory_request: Option<String>,
    pub memory_limit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnvFromSource {
    /// `secret` o `configMap`.
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerConfig {
    pub image: String,
    pub env: IndexMap<String, String>,
    pub env_from: Vec<EnvFromSource>,
    pub security_context: Option<SecurityContext>,
    pub resources: Resources,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self { image: ArgoBackendSettings::default().image,
               env: IndexMap::new(),
               env_from: Vec::new(),
               security_context: None,
               resources: Resources::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub default_mode: Option<u32>,
}

impl Default for S3Config {
    fn default() -> Self {
        let s = ArgoBackendSettings::default();
        Self { bucket: s.bucket,
               endpoint: s.endpoint,
               default_mode: None }
    }
}

/// Configuración de un workflow (entrada de `workflows` en los values).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArgoConfig {
    pub name: String,
    pub namespace: String,
    pub schedule: Option<String>,
    pub service_account_name: String,
    pub data_dir: PathBuf,
    pub encapsulate_env: bool,
    pub container: ContainerConfig,
    pub artifacts: S3Config,
}

impl Default for ArgoConfig {
    fn default() -> Self {
        ArgoBackendSettings::default().into()
    }
}

impl From<ArgoBackendSettings> for ArgoConfig {
    fn from(s: ArgoBackendSettings) -> Self {
        Self { name: s.pipeline_name,
               namespace: s.namespace,
               schedule: s.schedule,
               service_account_name: s.service_account_name,
               data_dir: s.data_dir,
               encapsulate_env: s.encapsulate_env,
               container: ContainerConfig { image: s.image,
                                            env: IndexMap::new(),
                                            env_from: Vec::new(),
                                            security_context: None,
                                            resources: Resources::default() },
               artifacts: S3Config { bucket: s.bucket,
                                     endpoint: s.endpoint,
                                     default_mode: None } }
    }
}

/// Etiqueta DNS (RFC 1123): minúsculas, dígitos y `-`, sin `-` en los
/// extremos, como mucho 63 caracteres.
pub fn validate_dns_label(name: &str) -> Result<(), BackendError> {
    let invalid = |message: &str| BackendError::InvalidSetting { key: "PIPELINE_NAME".to_string(),
                                                                 message: format!("{name:?} {message}") };
    if name.is_empty() || name.len() > 63 {
        return Err(invalid("must have 1 to 63 characters"));
    }
    if !name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        return Err(invalid("may only contain lowercase letters, digits and '-'"));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(invalid("must start and end with a letter or digit"));
    }
    Ok(())
}

// ---------------- Manifiesto ----------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    api_version: &'static str,
    kind: &'static str,
    metadata: Metadata,
    spec: Spec,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generate_name: Option<String>,
    namespace: String,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Spec {
    Cron(CronSpec),
    Workflow(WorkflowSpec),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CronSpec {
    schedule: String,
    workflow_spec: WorkflowSpec,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowSpec {
    service_account_name: String,
    entrypoint: &'static str,
    templates: Vec<Template>,
}

#[derive(Serialize)]
struct Template {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    dag: Option<Dag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inputs: Option<ArtifactList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    container: Option<Container>,
    #[serde(skip_serializing_if = "Option::is_none")]
    outputs: Option<ArtifactList>,
}

#[derive(Serialize)]
struct Dag {
    tasks: Vec<DagTask>,
}

#[derive(Serialize)]
struct DagTask {
    name: String,
    template: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    arguments: Option<ArtifactList>,
}

#[derive(Serialize)]
struct ArtifactList {
    artifacts: Vec<Artifact>,
}

#[derive(Serialize)]
struct Artifact {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    s3: Option<S3Location>,
}

#[derive(Serialize)]
struct S3Location {
    bucket: String,
    endpoint: String,
    key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Container {
    image: String,
    command: Vec<String>,
    env: Vec<EnvVar>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    env_from: Vec<IndexMap<String, IndexMap<&'static str, String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    security_context: Option<SecurityContextOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resources: Option<ResourcesOut>,
}

#[derive(Serialize)]
struct EnvVar {
    name: String,
    value: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SecurityContextOut {
    #[serde(skip_serializing_if = "Option::is_none")]
    run_as_non_root: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_as_user: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_as_group: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allow_privilege_escalation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    read_only_root_filesystem: Option<bool>,
}

#[derive(Serialize)]
struct ResourcesOut {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    requests: IndexMap<&'static str, String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    limits: IndexMap<&'static str, String>,
}

fn task_name(step: &str) -> String {
    step.to_lowercase()
}

fn as_posix(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[derive(Debug, Clone)]
pub struct ArgoBackend {
    pub config: ArgoConfig,
    pub executor: Option<ExecutorKind>,
}

impl Default for ArgoBackend {
    fn default() -> Self {
        Self::new(ArgoConfig::default())
    }
}

impl ArgoBackend {
    pub fn new(config: ArgoConfig) -> Self {
        Self { config,
               executor: Some(ExecutorKind::Prometheus) }
    }

    pub fn with_executor(mut self, executor: Option<ExecutorKind>) -> Self {
        self.executor = executor;
        self
    }

    pub fn from_config(config: &dyn ConfigSource) -> Result<Self, BackendError> {
        let settings: ArgoBackendSettings = from_prefixed(config, SETTINGS_PREFIX)?;
        validate_dns_label(&settings.pipeline_name)?;
        Ok(Self::new(settings.into()))
    }

    /// Entrada de `workflows` en los ficheros de values.
    pub fn from_values(files: &[PathBuf], name: Option<&str>) -> Result<Self, BackendError> {
        let values = load_values(files)?;
        let config: ArgoConfig = select(&values, "workflows", name)?;
        validate_dns_label(&config.name)?;
        Ok(Self::new(config))
    }

    fn options(&self) -> LoweringOptions {
        LoweringOptions { data_dir: self.config.data_dir.clone(),
                          executor: self.executor,
                          encapsulate_env: self.config.encapsulate_env }
    }

    fn s3(&self, step: &str) -> S3Location {
        S3Location { bucket: self.config.artifacts.bucket.clone(),
                     endpoint: self.config.artifacts.endpoint.clone(),
                     key: format!("{WORKFLOW_UID}/{step}") }
    }

    fn container(&self, d: &ArtifactDescriptor) -> Container {
        let c = &self.config.container;
        let mut env = vec![EnvVar { name: RUN_ID_ENV.to_string(),
                                    value: WORKFLOW_UID.to_string() }];
        env.extend(c.env
                    .iter()
                    .filter(|(k, _)| k.as_str() != RUN_ID_ENV)
                    .map(|(k, v)| EnvVar { name: k.clone(),
                                           value: v.clone() }));
        let env_from = c.env_from
                        .iter()
                        .map(|src| {
                            let key = if src.kind.eq_ignore_ascii_case("secret") { "secretRef" } else { "configMapRef" };
                            let mut reference = IndexMap::from([("name", src.name.clone())]);
                            if let Some(prefix) = &src.prefix {
                                reference.insert("prefix", prefix.clone());
                            }
                            IndexMap::from([(key.to_string(), reference)])
                        })
                        .collect();
        let security_context = c.security_context.as_ref().map(|s| SecurityContextOut { run_as_non_root: s.run_as_non_root,
                                                                                         run_as_user: s.run_as_user,
                                                                                         run_as_group: s.run_as_group,
                                                                                         allow_privilege_escalation: s.allow_privilege_escalation,
                                                                                         read_only_root_filesystem: s.read_only_root_filesystem });
        let r = &c.resources;
        let pick = |pairs: [(&'static str, &Option<String>); 2]| -> IndexMap<&'static str, String> {
            pairs.into_iter().filter_map(|(k, v)| v.clone().map(|v| (k, v))).collect()
        };
        let requests = pick([("cpu", &r.cpu_request), ("memory", &r.memory_request)]);
        let limits = pick([("cpu", &r.cpu_limit), ("memory", &r.memory_limit)]);
        let resources = (!requests.is_empty() || !limits.is_empty()).then_some(ResourcesOut { requests, limits });

        Container { image: c.image.clone(),
                    command: d.command.argv(),
                    env,
                    env_from,
                    security_context,
                    resources }
    }

    fn templates(&self, graph: &StepGraph, root: NodeId) -> Result<Vec<Template>, BackendError> {
        let lowered = lower(graph, root, &self.options())?;
        let mut tasks = Vec::with_capacity(lowered.len());
        let mut templates = Vec::with_capacity(lowered.len() + 1);

        for d in lowered.iter() {
            let name = task_name(d.name);
            let deps: Vec<String> = d.needs.iter().map(|n| task_name(n)).collect();
            let arguments = (!deps.is_empty()).then(|| ArtifactList { artifacts: deps.iter()
                                                                                      .map(|dep| Artifact { name: dep.clone(),
                                                                                                            path: None,
                                                                                                            from: Some(format!("{{{{tasks.{dep}.outputs.artifacts.{dep}}}}}")),
                                                                                                            mode: None,
                                                                                                            s3: None })
                                                                                      .collect() });
            tasks.push(DagTask { name: name.clone(),
                                 template: name.clone(),
                                 dependencies: deps.clone(),
                                 arguments });

            let inputs = (!d.deps.is_empty()).then(|| ArtifactList { artifacts: deps.iter()
                                                                                    .zip(&d.deps)
                                                                                    .map(|(dep, path)| Artifact { name: dep.clone(),
                                                                                                                  path: Some(as_posix(path)),
                                                                                                                  from: None,
                                                                                                                  mode: self.config.artifacts.default_mode,
                                                                                                                  s3: None })
                                                                                    .collect() });
            let outputs = ArtifactList { artifacts: vec![Artifact { name: name.clone(),
                                                                    path: Some(as_posix(&d.output)),
                                                                    from: None,
                                                                    mode: None,
                                                                    s3: Some(self.s3(d.name)) }] };
            templates.push(Template { name,
                                      dag: None,
                                      inputs,
                                      container: Some(self.container(d)),
                                      outputs: Some(outputs) });
        }

        templates.insert(0,
                         Template { name: ENTRYPOINT.to_string(),
                                    dag: Some(Dag { tasks }),
                                    inputs: None,
                                    container: None,
                                    outputs: None });
        Ok(templates)
    }
}

impl Backend for ArgoBackend {
    fn name(&self) -> &'static str {
        "ArgoBackend"
    }

    fn generate_artifact(&self, graph: &StepGraph, root: NodeId) -> Result<String, BackendError> {
        let workflow = WorkflowSpec { service_account_name: self.config.service_account_name.clone(),
                                      entrypoint: ENTRYPOINT,
                                      templates: self.templates(graph, root)? };
        let schedule = self.config.schedule.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let manifest = match schedule {
            Some(schedule) => Manifest { api_version: API_VERSION,
                                         kind: "CronWorkflow",
                                         metadata: Metadata { name: Some(self.config.name.clone()),
                                                              generate_name: None,
                                                              namespace: self.config.namespace.clone() },
                                         spec: Spec::Cron(CronSpec { schedule: schedule.to_string(),
                                                                     workflow_spec: workflow }) },
            None => Manifest { api_version: API_VERSION,
                               kind: "Workflow",
                               metadata: Metadata { name: None,
                                                    generate_name: Some(format!("{}-", self.config.name)),
                                                    namespace: self.config.namespace.clone() },
                               spec: Spec::Workflow(workflow) },
        };
        Ok(serde_yaml::to_string(&manifest)?)
    }
}
