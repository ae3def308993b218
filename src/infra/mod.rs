pub mod config;
pub mod shell;
pub mod systemd_adapter;

pub use shell::ShellExecutor;
pub use systemd_adapter::SystemdAdapter;
