use crate::infra::config::AppConfig;
use crate::services::Deployer;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InstallCommand {
    #[command(subcommand)]
    pub service: InstallTarget,
}

#[derive(Subcommand, Debug)]
pub enum InstallTarget {
    /// Servidor FTP (unit aig_ftp)
    Ftp {
        #[arg(long, env = "HOMELAB_FTP_USER")]
        user: String,
        #[arg(long, env = "HOMELAB_FTP_PASSWORD", hide_env_values = true)]
        password: String,
        /// Diretório do host exposto pelo FTP (padrão: home do usuário)
        #[arg(long)]
        local_path: Option<PathBuf>,
    },
    /// Servidor PostgreSQL
    Postgres {
        #[arg(long, env = "HOMELAB_POSTGRES_USER")]
        user: String,
        #[arg(long, env = "HOMELAB_POSTGRES_PASSWORD", hide_env_values = true)]
        password: String,
        /// Diretório de dados (padrão: ~/postgres-base)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Servidor web Nginx
    Nginx {
        #[arg(long)]
        content_dir: PathBuf,
    },
    /// Cliente BitTorrent Transmission
    Transmission {
        #[arg(long)]
        download_dir: PathBuf,
    },
    /// Cliente AirDC++
    Airdcpp {
        #[arg(long)]
        share_dir: PathBuf,
    },
    /// Bot do Telegram (Bot API)
    TelegramBot {
        /// Nome da unit, do container e do diretório de build
        #[arg(long)]
        name: String,
        #[arg(long, env = "HOMELAB_BOT_TOKEN", hide_env_values = true)]
        token: String,
    },
    /// Userbot do Telegram (api id/hash)
    TelegramUserbot {
        #[arg(long)]
        name: String,
        #[arg(long, env = "HOMELAB_API_ID")]
        api_id: String,
        #[arg(long, env = "HOMELAB_API_HASH", hide_env_values = true)]
        api_hash: String,
    },
    /// Proxy MITM e carregador de bots
    Mitm {
        #[arg(long, env = "HOMELAB_MITM_DB", hide_env_values = true)]
        connection_string: String,
    },
    /// Serviço definido em [services.NOME] na config
    Custom { name: String },
}

impl InstallTarget {
    fn label(&self) -> &str {
        match self {
            Self::Ftp { .. } => "ftp",
            Self::Postgres { .. } => "postgres",
            Self::Nginx { .. } => "nginx",
            Self::Transmission { .. } => "transmission",
            Self::Airdcpp { .. } => "airdcpp",
            Self::TelegramBot { name, .. } | Self::TelegramUserbot { name, .. } => name.as_str(),
            Self::Mitm { .. } => "mitm",
            Self::Custom { name } => name.as_str(),
        }
    }
}

pub fn run(command: InstallCommand, deployer: &Deployer, config: &AppConfig) -> Result<()> {
    let label = command.service.label().to_string();
    dispatch(command.service, deployer, config).with_context(|| format!("instalando {label}"))
}

fn dispatch(target: InstallTarget, deployer: &Deployer, config: &AppConfig) -> Result<()> {
    match target {
        InstallTarget::Ftp {
            user,
            password,
            local_path,
        } => deployer.install_ftp(&user, &password, local_path.as_deref())?,
        InstallTarget::Postgres {
            user,
            password,
            data_dir,
        } => deployer.install_postgres(&user, &password, data_dir.as_deref())?,
        InstallTarget::Nginx { content_dir } => deployer.install_nginx(&content_dir)?,
        InstallTarget::Transmission { download_dir } => {
            deployer.install_transmission(&download_dir)?
        }
        InstallTarget::Airdcpp { share_dir } => deployer.install_airdcpp(&share_dir)?,
        InstallTarget::TelegramBot { name, token } => {
            deployer.install_telegram_bot(&name, &token)?
        }
        InstallTarget::TelegramUserbot {
            name,
            api_id,
            api_hash,
        } => deployer.install_telegram_userbot(&name, &api_id, &api_hash)?,
        InstallTarget::Mitm { connection_string } => {
            deployer.install_mitm_pipeline(&connection_string)?
        }
        InstallTarget::Custom { name } => deployer.install(&config.service(&name)?)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockRuntime;
    use std::sync::Arc;

    fn deployer() -> (Deployer, Arc<MockRuntime>) {
        let mock = Arc::new(MockRuntime::new());
        (
            Deployer::new(mock.clone(), AppConfig::default().settings()),
            mock,
        )
    }

    #[test]
    fn test_custom_service_from_config() -> Result<()> {
        let config: AppConfig = toml::from_str(
            r#"
[services.redis]
image = "redis:7"
ports = ["6379:6379"]
"#,
        )?;
        let (deployer, mock) = deployer();

        run(
            InstallCommand {
                service: InstallTarget::Custom {
                    name: "redis".into(),
                },
            },
            &deployer,
            &config,
        )?;

        let unit = mock.written("/etc/systemd/system/redis.service").unwrap();
        assert!(unit.contains("-p 6379:6379 redis:7"));
        Ok(())
    }

    #[test]
    fn test_unknown_custom_service_fails() {
        let (deployer, mock) = deployer();
        let err = run(
            InstallCommand {
                service: InstallTarget::Custom {
                    name: "ghost".into(),
                },
            },
            &deployer,
            &AppConfig::default(),
        )
        .unwrap_err();

        assert!(format!("{err:#}").contains("instalando ghost"));
        assert!(mock.get_commands().is_empty());
    }

    #[test]
    fn test_error_carries_service_label() {
        let (deployer, mock) = deployer();
        mock.set_fail_on("start");

        let err = run(
            InstallCommand {
                service: InstallTarget::Nginx {
                    content_dir: PathBuf::from("/srv/www"),
                },
            },
            &deployer,
            &AppConfig::default(),
        )
        .unwrap_err();

        let chain = format!("{err:#}");
        assert!(chain.contains("instalando nginx"));
        assert!(chain.contains("não foi possível iniciar nginx.service"));
    }
}
