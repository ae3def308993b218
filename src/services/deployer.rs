use super::catalog;
use crate::domain::{HostRuntime, ServiceSpec, UnitTemplate, exec_line};
use crate::error::{DeployError, DeployResult};
use crate::infra::config::Settings;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Installs containerized services as systemd units.
///
/// Every install runs the same sequence: stop, optional build, host
/// directories, unit file, daemon-reload, enable, start. Steps run one at a
/// time and nothing is rolled back when a later step fails.
pub struct Deployer {
    runtime: Arc<dyn HostRuntime>,
    settings: Settings,
}

impl Deployer {
    pub fn new(runtime: Arc<dyn HostRuntime>, settings: Settings) -> Self {
        Self { runtime, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn unit_path(&self, spec: &ServiceSpec) -> PathBuf {
        self.settings.unit_dir.join(spec.unit_file_name())
    }

    /// Unit text for `spec`, exactly as `install` would write it
    pub fn render_unit(&self, spec: &ServiceSpec) -> DeployResult<String> {
        let exec_start = exec_line(&spec.run_args(&self.settings.docker));

        UnitTemplate {
            user: &self.settings.user,
            description: &spec.description,
            exec_start: &exec_start,
            environment: &spec.unit_env,
        }
        .render()
    }

    pub fn install(&self, spec: &ServiceSpec) -> DeployResult<()> {
        match self.install_steps(spec) {
            Ok(()) => {
                info!(" {} instalado e iniciado", spec.name);
                Ok(())
            }
            Err(e) => {
                error!(" Falha ao instalar {}: {}", spec.name, e);
                Err(e)
            }
        }
    }

    fn install_steps(&self, spec: &ServiceSpec) -> DeployResult<()> {
        let unit = spec.unit_file_name();
        info!(" Instalando {} ({})...", spec.name, spec.description);

        // Render first so an invalid value never touches the host
        let content = self.render_unit(spec)?;

        let stopped = self.runtime.stop_unit(&unit);
        if stopped.success() {
            debug!("{unit} parado");
        } else {
            warn!(
                "  Não foi possível parar {unit} (pode não existir): {}",
                stopped.summary()
            );
        }

        if let Some(context) = &spec.build_context {
            let context_dir = self.settings.build_root.join(context);
            info!("  Construindo imagem {} a partir de {:?}...", spec.image, context_dir);

            let built = self.runtime.build_image(&spec.image, &context_dir);
            if !built.success() {
                return Err(DeployError::BuildFailed {
                    image: spec.image.clone(),
                    exit_code: built.exit_code,
                    detail: built.summary().to_string(),
                });
            }
        }

        for dir in spec.directories_to_create() {
            debug!("garantindo diretório {:?}", dir);
            self.runtime
                .create_dir(dir)
                .map_err(|source| DeployError::DirectoryCreateFailed {
                    path: dir.clone(),
                    source,
                })?;
        }

        let path = self.unit_path(spec);
        info!("  Escrevendo {:?}", path);
        self.runtime
            .write_unit(&path, &content)
            .map_err(|source| DeployError::UnitWriteFailed {
                path: path.clone(),
                source,
            })?;

        let reloaded = self.runtime.daemon_reload();
        if !reloaded.success() {
            return Err(DeployError::DaemonReloadFailed {
                exit_code: reloaded.exit_code,
                detail: reloaded.summary().to_string(),
            });
        }

        let enabled = self.runtime.enable_unit(&unit);
        if !enabled.success() {
            return Err(DeployError::EnableFailed {
                unit,
                exit_code: enabled.exit_code,
                detail: enabled.summary().to_string(),
            });
        }

        let started = self.runtime.start_unit(&unit);
        if !started.success() {
            return Err(DeployError::ServiceStartFailed {
                unit,
                exit_code: started.exit_code,
                detail: started.summary().to_string(),
            });
        }

        Ok(())
    }

    /// FTP server sharing `local_path` (the host home when omitted) at the
    /// host home path inside the container
    pub fn install_ftp(
        &self,
        user: &str,
        password: &str,
        local_path: Option<&Path>,
    ) -> DeployResult<()> {
        self.install(&catalog::ftp(&self.settings, user, password, local_path))
    }

    pub fn install_postgres(
        &self,
        user: &str,
        password: &str,
        data_dir: Option<&Path>,
    ) -> DeployResult<()> {
        self.install(&catalog::postgres(&self.settings, user, password, data_dir))
    }

    pub fn install_nginx(&self, content_dir: &Path) -> DeployResult<()> {
        self.install(&catalog::nginx(content_dir))
    }

    pub fn install_transmission(&self, download_dir: &Path) -> DeployResult<()> {
        self.install(&catalog::transmission(&self.settings, download_dir))
    }

    pub fn install_airdcpp(&self, share_dir: &Path) -> DeployResult<()> {
        self.install(&catalog::airdcpp(&self.settings, share_dir))
    }

    pub fn install_telegram_bot(&self, name: &str, token: &str) -> DeployResult<()> {
        self.install(&catalog::telegram_bot(name, token)?)
    }

    pub fn install_telegram_userbot(
        &self,
        name: &str,
        api_id: &str,
        api_hash: &str,
    ) -> DeployResult<()> {
        self.install(&catalog::telegram_userbot(
            &self.settings,
            name,
            api_id,
            api_hash,
        )?)
    }

    /// Proxy first, then the loader; stops at the first failure
    pub fn install_mitm_pipeline(&self, connection_string: &str) -> DeployResult<()> {
        for spec in catalog::mitm_pipeline(connection_string) {
            self.install(&spec)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockRuntime;

    fn deployer() -> (Deployer, Arc<MockRuntime>) {
        let mock = Arc::new(MockRuntime::new());
        (Deployer::new(mock.clone(), Settings::default()), mock)
    }

    #[test]
    fn test_unit_path() {
        let (deployer, _) = deployer();
        let spec = catalog::nginx(Path::new("/srv/www"));
        assert_eq!(
            deployer.unit_path(&spec),
            PathBuf::from("/etc/systemd/system/nginx.service")
        );
    }

    #[test]
    fn test_no_build_without_context() {
        let (deployer, mock) = deployer();
        deployer.install_nginx(Path::new("/srv/www")).unwrap();

        let commands = mock.get_commands();
        assert!(!commands.iter().any(|c| c.starts_with("build:")));
        assert!(commands.contains(&"mkdir:/srv/www".to_string()));
    }

    #[test]
    fn test_build_uses_build_root() {
        let mock = Arc::new(MockRuntime::new());
        let settings = Settings {
            build_root: PathBuf::from("/opt/homelab"),
            ..Settings::default()
        };
        let deployer = Deployer::new(mock.clone(), settings);

        deployer.install_transmission(Path::new("/dl")).unwrap();
        assert!(
            mock.get_commands()
                .contains(&"build:transmission:/opt/homelab/transmission".to_string())
        );
    }

    #[test]
    fn test_invalid_value_touches_nothing() {
        let (deployer, mock) = deployer();
        let err = deployer
            .install_ftp("alice\nExecStartPre=/bin/sh", "pw", None)
            .unwrap_err();

        assert!(matches!(err, DeployError::InvalidUnitValue { .. }));
        assert!(mock.get_commands().is_empty());
    }

    #[test]
    fn test_mitm_pipeline_installs_both_units() {
        let (deployer, mock) = deployer();
        deployer.install_mitm_pipeline("postgres://db").unwrap();

        let proxy = mock
            .written("/etc/systemd/system/mitm_proxy.service")
            .unwrap();
        let loader = mock
            .written("/etc/systemd/system/bot_loader.service")
            .unwrap();
        for unit in [&proxy, &loader] {
            assert!(unit.contains("Environment=MITM_DB=postgres://db\n"));
            assert!(unit.contains(" -e MITM_DB "));
        }

        let commands = mock.get_commands();
        let proxy_start = commands
            .iter()
            .position(|c| c == "start:mitm_proxy.service")
            .unwrap();
        let loader_stop = commands
            .iter()
            .position(|c| c == "stop:bot_loader.service")
            .unwrap();
        assert!(proxy_start < loader_stop);
    }

    #[test]
    fn test_mitm_pipeline_stops_after_first_failure() {
        let (deployer, mock) = deployer();
        mock.set_fail_on("build");

        assert!(deployer.install_mitm_pipeline("postgres://db").is_err());
        assert!(
            !mock
                .get_commands()
                .iter()
                .any(|c| c.contains("bot_loader"))
        );
    }
}
