mod error;
mod loader;
mod run;

pub use error::ConfigError;
pub use loader::Config;
pub use run::{AgentBootstrap, RunConfig, RunOverrides};
