use crate::domain::{CommandResult, HostRuntime};
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::RwLock;

/// Recording host runtime for tests.
///
/// Every call is appended to a command log (`stop:<unit>`, `build:<tag>:<dir>`,
/// `mkdir:<dir>`, `write:<path>`, `daemon-reload`, `enable:<unit>`,
/// `start:<unit>`) and unit files are kept in memory.
#[derive(Debug)]
pub struct MockRuntime {
    commands: RwLock<Vec<String>>,
    files: RwLock<HashMap<String, String>>,
    fail_on: RwLock<Option<String>>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self {
            commands: RwLock::new(Vec::new()),
            files: RwLock::new(HashMap::new()),
            fail_on: RwLock::new(None),
        }
    }

    /// Makes one operation (`stop`, `build`, `mkdir`, `write`,
    /// `daemon-reload`, `enable`, `start`) fail
    pub fn set_fail_on(&self, operation: &str) {
        *self.fail_on.write().unwrap() = Some(operation.to_string());
    }

    pub fn get_commands(&self) -> Vec<String> {
        self.commands.read().unwrap().clone()
    }

    /// Operation names in call order, without their arguments
    pub fn get_operations(&self) -> Vec<String> {
        self.get_commands()
            .iter()
            .map(|c| c.split(':').next().unwrap_or_default().to_string())
            .collect()
    }

    pub fn written(&self, path: &str) -> Option<String> {
        self.files.read().unwrap().get(path).cloned()
    }

    fn record_command(&self, cmd: &str) {
        self.commands.write().unwrap().push(cmd.to_string());
    }

    fn fails(&self, operation: &str) -> bool {
        self.fail_on.read().unwrap().as_deref() == Some(operation)
    }

    fn command(&self, operation: &str, record: String) -> CommandResult {
        self.record_command(&record);

        if self.fails(operation) {
            return CommandResult {
                exit_code: 1,
                stdout: String::new(),
                stderr: format!("Mock failure on: {operation}"),
            };
        }

        CommandResult::default()
    }

    fn io_op(&self, operation: &str, record: String) -> io::Result<()> {
        self.record_command(&record);

        if self.fails(operation) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("Mock failure on: {operation}"),
            ));
        }
        Ok(())
    }
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl HostRuntime for MockRuntime {
    fn stop_unit(&self, unit: &str) -> CommandResult {
        self.command("stop", format!("stop:{unit}"))
    }

    fn build_image(&self, tag: &str, context_dir: &Path) -> CommandResult {
        self.command("build", format!("build:{tag}:{}", context_dir.display()))
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        self.io_op("mkdir", format!("mkdir:{}", path.display()))
    }

    fn write_unit(&self, path: &Path, content: &str) -> io::Result<()> {
        let key = path.display().to_string();
        self.io_op("write", format!("write:{key}"))?;
        self.files.write().unwrap().insert(key, content.to_string());
        Ok(())
    }

    fn daemon_reload(&self) -> CommandResult {
        self.command("daemon-reload", "daemon-reload".to_string())
    }

    fn enable_unit(&self, unit: &str) -> CommandResult {
        self.command("enable", format!("enable:{unit}"))
    }

    fn start_unit(&self, unit: &str) -> CommandResult {
        self.command("start", format!("start:{unit}"))
    }

    fn is_command_available(&self, cmd: &str) -> bool {
        self.record_command(&format!("is_available:{cmd}"));
        true
    }
}
