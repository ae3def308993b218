use crate::domain::{ServiceSpec, VolumeMount, validate_service_name};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/homelab/homelab.toml";
pub const LOCAL_CONFIG_NAME: &str = "homelab.toml";
pub const DEFAULT_LOG_FILE_NAME: &str = "debug.log";

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// Account the units run as
    pub user: Option<String>,
    /// Home directory of that account
    pub home: Option<PathBuf>,
    pub unit_dir: Option<PathBuf>,
    /// Directory build contexts are resolved against
    pub build_root: Option<PathBuf>,
    pub docker: Option<String>,
    pub systemctl: Option<String>,
    pub log_file: Option<PathBuf>,
}

/// A service declared as `[services.NAME]`
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServiceDefinition {
    pub image: String,
    pub description: Option<String>,
    pub container_name: Option<String>,
    pub build_context: Option<PathBuf>,
    #[serde(default)]
    pub ports: Vec<String>,
    #[serde(default)]
    pub volumes: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub command: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub services: BTreeMap<String, ServiceDefinition>,
}

impl AppConfig {
    /// Merges another AppConfig into self.
    /// Values from `other` overwrite values in `self` if present.
    pub fn merge(&mut self, other: AppConfig) {
        let host = other.host;
        if host.user.is_some() {
            self.host.user = host.user;
        }
        if host.home.is_some() {
            self.host.home = host.home;
        }
        if host.unit_dir.is_some() {
            self.host.unit_dir = host.unit_dir;
        }
        if host.build_root.is_some() {
            self.host.build_root = host.build_root;
        }
        if host.docker.is_some() {
            self.host.docker = host.docker;
        }
        if host.systemctl.is_some() {
            self.host.systemctl = host.systemctl;
        }
        if host.log_file.is_some() {
            self.host.log_file = host.log_file;
        }

        // Services with same name in 'other' overwrite existing
        self.services.extend(other.services);
    }

    pub fn settings(&self) -> Settings {
        let user = self.host.user.clone().unwrap_or_else(|| "ivan".to_string());
        let home = self
            .host
            .home
            .as_deref()
            .map(expand)
            .unwrap_or_else(|| PathBuf::from("/home").join(&user));

        Settings {
            home,
            unit_dir: self
                .host
                .unit_dir
                .as_deref()
                .map(expand)
                .unwrap_or_else(|| PathBuf::from("/etc/systemd/system")),
            build_root: self
                .host
                .build_root
                .as_deref()
                .map(expand)
                .unwrap_or_else(|| PathBuf::from(".")),
            docker: self.host.docker.clone().unwrap_or_else(|| "docker".into()),
            systemctl: self
                .host
                .systemctl
                .clone()
                .unwrap_or_else(|| "systemctl".into()),
            log_file: self.host.log_file.as_deref().map(expand),
            user,
        }
    }

    pub fn service(&self, name: &str) -> Result<ServiceSpec> {
        let Some(def) = self.services.get(name) else {
            bail!("Serviço '{}' não definido em [services]", name);
        };
        service_from_definition(name, def)
    }
}

/// Host settings with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub user: String,
    pub home: PathBuf,
    pub unit_dir: PathBuf,
    pub build_root: PathBuf,
    pub docker: String,
    pub systemctl: String,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        AppConfig::default().settings()
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path.to_string_lossy().as_ref()).into_owned())
}

fn service_from_definition(name: &str, def: &ServiceDefinition) -> Result<ServiceSpec> {
    validate_service_name(name)?;

    if def.image.trim().is_empty() {
        bail!("Serviço '{}' sem campo 'image'", name);
    }

    let mut spec = ServiceSpec::new(
        name,
        def.description.clone().unwrap_or_else(|| name.to_string()),
        def.image.clone(),
    );

    if let Some(container) = &def.container_name {
        validate_service_name(container)?;
        spec = spec.container_name(container.clone());
    }
    if let Some(context) = &def.build_context {
        spec = spec.build_from(context.clone());
    }
    for port in &def.ports {
        spec = spec.port(port.clone());
    }
    for raw in &def.volumes {
        let Some(mut volume) = VolumeMount::parse(raw) else {
            bail!(
                "Volume '{}' do serviço '{}' inválido (esperado host:container[:ro])",
                raw,
                name
            );
        };
        volume.host = expand(&volume.host);
        spec = spec.volume(volume.created());
    }
    spec.env = def.env.clone();
    spec.command = def.command.clone();

    Ok(spec)
}

fn read_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path).with_context(|| format!("lendo {:?}", path))?;
    toml::from_str(&content).with_context(|| format!("parse de {:?}", path))
}

/// Loads the global config and merges `./homelab.toml` over it.
///
/// A missing global file falls back to defaults; an explicitly requested
/// file must exist.
pub fn load_app_config(explicit: Option<&Path>, local_dir: &Path) -> Result<AppConfig> {
    let mut app_config = match explicit {
        Some(path) => read_config(path)?,
        None => {
            let global = Path::new(DEFAULT_CONFIG_PATH);
            if global.exists() {
                read_config(global)?
            } else {
                debug!("config global ausente em {:?}, usando padrões", global);
                AppConfig::default()
            }
        }
    };

    let local_config_path = local_dir.join(LOCAL_CONFIG_NAME);
    if local_config_path.exists() && Some(local_config_path.as_path()) != explicit {
        let local_app_config = read_config(&local_config_path)
            .with_context(|| format!("lendo config local em {:?}", local_config_path))?;
        app_config.merge(local_app_config);
    }

    Ok(app_config)
}

/// Debug log location: next to the executable unless configured.
pub fn default_log_file() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_LOG_FILE_NAME)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE_NAME))
}
