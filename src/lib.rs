pub mod cli;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use cli::{Cli, Commands};
pub use error::{PipelineError, ProvisionError, UpsertFailed};
pub use models::{Config, IndexDescriptor, OutputFormat, QueryResult, Record};
