use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the deployment runner.
///
/// Stopping a unit is best effort and never produces an error; every other
/// step aborts the install with one of these kinds.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("build da imagem {image} falhou (status {exit_code}): {detail}")]
    BuildFailed {
        image: String,
        exit_code: i32,
        detail: String,
    },

    #[error("não foi possível criar o diretório {path:?}")]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("não foi possível escrever a unit {path:?}")]
    UnitWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("systemctl daemon-reload falhou (status {exit_code}): {detail}")]
    DaemonReloadFailed { exit_code: i32, detail: String },

    #[error("não foi possível habilitar {unit} (status {exit_code}): {detail}")]
    EnableFailed {
        unit: String,
        exit_code: i32,
        detail: String,
    },

    #[error("não foi possível iniciar {unit} (status {exit_code}): {detail}")]
    ServiceStartFailed {
        unit: String,
        exit_code: i32,
        detail: String,
    },

    #[error("valor inválido para {field} na unit: contém quebra de linha")]
    InvalidUnitValue { field: &'static str },

    #[error("nome de serviço inválido '{name}': {reason}")]
    InvalidServiceName { name: String, reason: String },
}

pub type DeployResult<T> = std::result::Result<T, DeployError>;
