use crate::error::{DeployError, DeployResult};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Bind between a host directory and a path inside the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    pub host: PathBuf,
    pub container: String,
    pub read_only: bool,
    /// Host directory is created before the unit starts
    pub create: bool,
}

impl VolumeMount {
    pub fn new(host: impl Into<PathBuf>, container: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
            read_only: false,
            create: false,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn created(mut self) -> Self {
        self.create = true;
        self
    }

    /// Parses `host:container[:ro]`
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split(':');
        let host = parts.next().filter(|p| !p.is_empty())?;
        let container = parts.next().filter(|p| !p.is_empty())?;
        let read_only = match parts.next() {
            None => false,
            Some("ro") => true,
            Some("rw") => false,
            Some(_) => return None,
        };
        if parts.next().is_some() {
            return None;
        }

        Some(Self {
            host: PathBuf::from(host),
            container: container.to_string(),
            read_only,
            create: false,
        })
    }
}

impl fmt::Display for VolumeMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host.display(), self.container)?;
        if self.read_only {
            write!(f, ":ro")?;
        }
        Ok(())
    }
}

/// Everything the runner needs to install one containerized service as a
/// systemd unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    /// systemd unit name, without the `.service` suffix
    pub name: String,
    pub description: String,
    pub container_name: String,
    pub image: String,
    /// Directory (relative to the build root) to build `image` from
    pub build_context: Option<PathBuf>,
    pub ports: Vec<String>,
    pub volumes: Vec<VolumeMount>,
    /// Passed to the container as `-e NAME=VALUE`
    pub env: BTreeMap<String, String>,
    /// Written as `Environment=` in the unit and forwarded by name
    pub unit_env: BTreeMap<String, String>,
    /// Container command appended after the image
    pub command: Vec<String>,
}

impl ServiceSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            container_name: name.clone(),
            name,
            description: description.into(),
            image: image.into(),
            build_context: None,
            ports: Vec::new(),
            volumes: Vec::new(),
            env: BTreeMap::new(),
            unit_env: BTreeMap::new(),
            command: Vec::new(),
        }
    }

    pub fn container_name(mut self, name: impl Into<String>) -> Self {
        self.container_name = name.into();
        self
    }

    pub fn build_from(mut self, context: impl Into<PathBuf>) -> Self {
        self.build_context = Some(context.into());
        self
    }

    pub fn port(mut self, mapping: impl Into<String>) -> Self {
        self.ports.push(mapping.into());
        self
    }

    pub fn volume(mut self, volume: VolumeMount) -> Self {
        self.volumes.push(volume);
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn unit_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.unit_env.insert(key.into(), value.into());
        self
    }

    pub fn unit_file_name(&self) -> String {
        format!("{}.service", self.name)
    }

    /// Argument vector of the `docker run` invocation started by the unit.
    pub fn run_args(&self, docker: &str) -> Vec<String> {
        let mut args: Vec<String> = vec![docker.into(), "run".into(), "--rm".into(), "-i".into()];

        for (key, value) in &self.env {
            args.push("-e".into());
            args.push(format!("{key}={value}"));
        }

        for key in self.unit_env.keys() {
            args.push("-e".into());
            args.push(key.clone());
        }

        args.push("--name".into());
        args.push(self.container_name.clone());

        for port in &self.ports {
            args.push("-p".into());
            args.push(port.clone());
        }

        for volume in &self.volumes {
            args.push("-v".into());
            args.push(volume.to_string());
        }

        args.push(self.image.clone());
        args.extend(self.command.iter().cloned());

        args
    }

    pub fn directories_to_create(&self) -> impl Iterator<Item = &PathBuf> {
        self.volumes.iter().filter(|v| v.create).map(|v| &v.host)
    }
}

/// Unit and container names share docker's container naming rules.
pub fn validate_service_name(name: &str) -> DeployResult<()> {
    let invalid = |reason: String| DeployError::InvalidServiceName {
        name: name.to_string(),
        reason,
    };

    let Some(first_char) = name.chars().next() else {
        return Err(invalid("nome vazio".into()));
    };

    if !first_char.is_ascii_alphanumeric() {
        return Err(invalid("deve começar com letra ou número".into()));
    }

    if let Some(c) = name
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '_' && *c != '.' && *c != '-')
    {
        return Err(invalid(format!("contém caractere inválido '{c}'")));
    }

    Ok(())
}
