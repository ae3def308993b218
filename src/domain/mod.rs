mod command;
pub mod service;
pub mod traits;
pub mod unit;

pub use command::{CommandResult, ShellCommand};
pub use service::{ServiceSpec, VolumeMount, validate_service_name};
pub use traits::HostRuntime;
pub use unit::{UnitTemplate, exec_line, render};
