use anyhow::Result;
use clap::{Parser, Subcommand};
use homelab::cli::{self, InstallCommand};
use homelab::infra::SystemdAdapter;
use homelab::infra::config::{AppConfig, default_log_file, load_app_config};
use homelab::logging;
use homelab::services::Deployer;
use std::path::{Path, PathBuf};
use std::process::exit;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "homelab",
    about = "Instala os serviços do homelab como units do systemd",
    version
)]
struct Cli {
    /// Arquivo de configuração (default: /etc/homelab/homelab.toml)
    #[arg(long, env = "HOMELAB_CONFIG")]
    config: Option<PathBuf>,

    /// Log de debug, truncado a cada execução (default: debug.log ao lado do binário)
    #[arg(long, env = "HOMELAB_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Para, constrói, escreve a unit e inicia um serviço
    Install(InstallCommand),
    /// Verifica dependências e diretórios
    Doctor,
}

fn main() {
    let cli = Cli::parse();

    let app_config = match load_app_config(cli.config.as_deref(), Path::new(".")) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:?}");
            exit(1);
        }
    };

    let log_file = cli
        .log_file
        .clone()
        .or_else(|| app_config.settings().log_file)
        .unwrap_or_else(default_log_file);

    let (session, dispatch) = match logging::init(&log_file) {
        Ok(logging) => logging,
        Err(e) => {
            eprintln!("{e:?}");
            exit(1);
        }
    };

    let result = tracing::dispatcher::with_default(&dispatch, || {
        info!("Log de debug em {:?}", session.path());
        let result = run(cli.command, &app_config);
        if let Err(error) = &result {
            logging::report_error(error);
        }
        result
    });

    if let Err(e) = session.finish() {
        eprintln!("falha ao gravar o log: {e}");
    }

    exit(if result.is_ok() { 0 } else { 1 })
}

fn run(command: Commands, app_config: &AppConfig) -> Result<()> {
    let settings = app_config.settings();
    let runtime = Arc::new(SystemdAdapter::new(
        settings.docker.clone(),
        settings.systemctl.clone(),
    ));

    match command {
        Commands::Install(cmd) => {
            let deployer = Deployer::new(runtime, settings);
            cli::install::run(cmd, &deployer, app_config)
        }
        Commands::Doctor => {
            cli::doctor(runtime.as_ref(), &settings);
            Ok(())
        }
    }
}
