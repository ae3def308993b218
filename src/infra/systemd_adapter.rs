use super::ShellExecutor;
use crate::domain::{CommandResult, HostRuntime, ShellCommand};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;

/// Drives the real host: `docker`, `systemctl` and the local filesystem.
#[derive(Debug, Clone)]
pub struct SystemdAdapter {
    shell: ShellExecutor,
    docker: String,
    systemctl: String,
}

impl SystemdAdapter {
    pub fn new(docker: impl Into<String>, systemctl: impl Into<String>) -> Self {
        Self {
            shell: ShellExecutor::new(),
            docker: docker.into(),
            systemctl: systemctl.into(),
        }
    }

    fn systemctl(&self, args: &[&str]) -> CommandResult {
        let mut argv = vec![self.systemctl.clone()];
        argv.extend(args.iter().map(|a| a.to_string()));
        self.shell.run(&ShellCommand::Args(argv))
    }
}

impl Default for SystemdAdapter {
    fn default() -> Self {
        Self::new("docker", "systemctl")
    }
}

impl HostRuntime for SystemdAdapter {
    fn stop_unit(&self, unit: &str) -> CommandResult {
        self.systemctl(&["stop", unit])
    }

    fn build_image(&self, tag: &str, context_dir: &Path) -> CommandResult {
        self.shell.run(&ShellCommand::Args(vec![
            self.docker.clone(),
            "build".into(),
            "-t".into(),
            tag.into(),
            context_dir.to_string_lossy().into_owned(),
        ]))
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn write_unit(&self, path: &Path, content: &str) -> io::Result<()> {
        atomic_write(path, content)
    }

    fn daemon_reload(&self) -> CommandResult {
        self.systemctl(&["daemon-reload"])
    }

    fn enable_unit(&self, unit: &str) -> CommandResult {
        self.systemctl(&["enable", unit])
    }

    fn start_unit(&self, unit: &str) -> CommandResult {
        self.systemctl(&["start", unit])
    }

    fn is_command_available(&self, cmd: &str) -> bool {
        Command::new(cmd)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

/// Writes `content` to a temporary file next to `path` and renames it over
/// the target, so readers only ever see the old or the new unit.
///
/// Unit files may carry credentials, so the file is only readable by its owner.
/// The directory is synced after the rename so the new entry survives a crash.
pub fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    sync_dir(dir)
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
