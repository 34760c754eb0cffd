//! wurzel-backend: generación de manifiestos para orquestadores externos
//! (DVC, Argo Workflows, GitLab CI) a partir de un grafo de steps.
pub mod argo;
pub mod backend;
pub mod cli_call;
pub mod dvc;
pub mod errors;
pub mod gitlab;
pub mod lowering;
pub mod registry;
pub mod values;

pub use argo::{ArgoBackend, ArgoBackendSettings, ArgoConfig};
pub use backend::{run_id, Backend};
pub use cli_call::{generate_cli_call, CliCall};
pub use dvc::{DvcBackend, DvcConfig, DvcStage};
pub use errors::BackendError;
pub use gitlab::{GitlabBackend, GitlabBackendSettings, GitlabConfig};
pub use lowering::{lower, ArtifactDescriptor, Lowered, LoweringOptions};
pub use registry::{build_backend, BackendKind, BackendOptions};
