//! Service definitions for everything the homelab runs.

use crate::domain::{ServiceSpec, VolumeMount, validate_service_name};
use crate::error::DeployResult;
use crate::infra::config::Settings;
use std::path::Path;

pub const MITM_DB_VAR: &str = "MITM_DB";

pub fn ftp(
    settings: &Settings,
    user: &str,
    password: &str,
    local_path: Option<&Path>,
) -> ServiceSpec {
    let home = settings.home.to_string_lossy().into_owned();
    let host_path = local_path.unwrap_or(settings.home.as_path());

    ServiceSpec::new("aig_ftp", "FTP server", "ftp")
        .container_name("ftp")
        .build_from("ftp")
        .env("FTP_PASS", password)
        .env("FTP_USER", user)
        .port("20-21:20-21/tcp")
        .port("40000-40009:40000-40009/tcp")
        .volume(VolumeMount::new(host_path, home))
}

pub fn postgres(
    settings: &Settings,
    user: &str,
    password: &str,
    data_dir: Option<&Path>,
) -> ServiceSpec {
    let data_dir = data_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| settings.home.join("postgres-base"));

    ServiceSpec::new("postgres", "PostgreSQL server", "postgres")
        .container_name("pg")
        .port("5432:5432")
        .env("POSTGRES_USER", user)
        .env("POSTGRES_PASSWORD", password)
        .volume(VolumeMount::new(data_dir, "/var/lib/postgresql/data").created())
}

pub fn nginx(content_dir: &Path) -> ServiceSpec {
    ServiceSpec::new("nginx", "Nginx web server", "nginx")
        .port("80:80")
        .volume(
            VolumeMount::new(content_dir, "/usr/share/nginx/html")
                .read_only()
                .created(),
        )
}

pub fn transmission(settings: &Settings, download_dir: &Path) -> ServiceSpec {
    ServiceSpec::new("transmission", "Transmission BitTorrent client", "transmission")
        .build_from("transmission")
        .port("9091:9091")
        .port("51413:51413")
        .port("51413:51413/udp")
        .volume(VolumeMount::new(download_dir, "/downloads").created())
        .volume(
            VolumeMount::new(settings.home.join("transmission-config"), "/config").created(),
        )
}

pub fn airdcpp(settings: &Settings, share_dir: &Path) -> ServiceSpec {
    ServiceSpec::new("airdcpp", "AirDC++ web client", "airdcpp")
        .build_from("airdcpp")
        .port("5600:5600")
        .port("5601:5601")
        .port("21248:21248")
        .port("21248:21248/udp")
        .port("21249:21249")
        .volume(VolumeMount::new(share_dir, "/Share").created())
        .volume(
            VolumeMount::new(settings.home.join("airdcpp-config"), "/.airdcpp").created(),
        )
}

/// Bot API bot built from `<build_root>/<name>`
pub fn telegram_bot(name: &str, token: &str) -> DeployResult<ServiceSpec> {
    validate_service_name(name)?;

    Ok(
        ServiceSpec::new(name, format!("Telegram bot {name}"), name)
            .build_from(name)
            .env("BOT_TOKEN", token),
    )
}

/// MTProto client bot; its session file survives restarts
pub fn telegram_userbot(
    settings: &Settings,
    name: &str,
    api_id: &str,
    api_hash: &str,
) -> DeployResult<ServiceSpec> {
    validate_service_name(name)?;

    let session_dir = settings.home.join(format!("{name}-session"));

    Ok(
        ServiceSpec::new(name, format!("Telegram userbot {name}"), name)
            .build_from(name)
            .env("API_ID", api_id)
            .env("API_HASH", api_hash)
            .volume(VolumeMount::new(session_dir, "/session").created()),
    )
}

/// Proxy and loader share the database connection string through the unit
/// environment.
pub fn mitm_pipeline(connection_string: &str) -> [ServiceSpec; 2] {
    let proxy = ServiceSpec::new("mitm_proxy", "MITM proxy", "mitm_proxy")
        .build_from("mitm_proxy")
        .port("8080:8080")
        .unit_env(MITM_DB_VAR, connection_string);

    let loader = ServiceSpec::new("bot_loader", "MITM bot loader", "bot_loader")
        .build_from("bot_loader")
        .unit_env(MITM_DB_VAR, connection_string);

    [proxy, loader]
}
