use super::CommandResult;
use std::fmt::Debug;
use std::io;
use std::path::Path;

/// Host operations driven by the deployment runner.
///
/// Command-backed operations report the captured [`CommandResult`] and leave
/// the interpretation of the exit code to the caller.
pub trait HostRuntime: Send + Sync + Debug {
    /// `systemctl stop <unit>`
    fn stop_unit(&self, unit: &str) -> CommandResult;

    /// `docker build -t <tag> <context_dir>`
    fn build_image(&self, tag: &str, context_dir: &Path) -> CommandResult;

    /// Create a directory and its parents; succeeds if it already exists
    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Replace the unit file at `path` with `content`
    fn write_unit(&self, path: &Path, content: &str) -> io::Result<()>;

    /// `systemctl daemon-reload`
    fn daemon_reload(&self) -> CommandResult;

    /// `systemctl enable <unit>`
    fn enable_unit(&self, unit: &str) -> CommandResult;

    /// `systemctl start <unit>`
    fn start_unit(&self, unit: &str) -> CommandResult;

    /// Check if a command is available on the PATH
    fn is_command_available(&self, cmd: &str) -> bool;
}
