pub mod cli;
pub mod domain;
pub mod error;
pub mod infra;
pub mod logging;
pub mod services;

// Make test_support available for integration tests
pub mod test_support;

pub use domain::{CommandResult, HostRuntime, ServiceSpec, ShellCommand, VolumeMount};
pub use error::{DeployError, DeployResult};
pub use infra::{ShellExecutor, SystemdAdapter};
pub use services::Deployer;
