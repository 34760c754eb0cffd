//! wurzel-core: grafo de steps tipados y motor de ejecución.
pub mod config;
pub mod constants;
pub mod context;
pub mod contract;
pub mod errors;
pub mod executor;
pub mod graph;
pub mod history;
pub mod middleware;
pub mod settings;
pub mod step;

pub use contract::{Contract, ContractDescriptor, DataModel, NoInput, Table};
pub use errors::{ChainError, ContractError, ExecutorError, GraphError, SettingsError, StepError};
pub use executor::{ExecutorKind, ExecutorOptions, StepExecutor, StepInput, StepOutcome, StepReport};
pub use graph::{run_graph, NodeId, Pipe, SameAs, StepGraph};
pub use history::History;
pub use middleware::{Middleware, MiddlewareChain, MiddlewareRegistry, Next};
pub use settings::{ConfigSource, EnvConfigSource, MapConfigSource, NoSettings, Settings};
pub use step::{OutputMode, StepHandle, StepOutput, StepSignature, TypedStep};

