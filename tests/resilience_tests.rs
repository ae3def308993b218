use anyhow::Result;
use homelab::infra::SystemdAdapter;
use homelab::infra::config::Settings;
use homelab::services::Deployer;
use homelab::test_support::MockRuntime;
use homelab::DeployError;
use std::fs;
use std::path::Path;
use std::sync::Arc;

fn create_deployer() -> (Deployer, Arc<MockRuntime>) {
    let mock = Arc::new(MockRuntime::new());
    let deployer = Deployer::new(mock.clone(), Settings::default());
    (deployer, mock)
}

#[test]
fn test_failed_stop_does_not_abort() -> Result<()> {
    let (deployer, mock) = create_deployer();
    mock.set_fail_on("stop");

    deployer.install_nginx(Path::new("/srv/www"))?;

    assert!(
        mock.get_commands()
            .contains(&"start:nginx.service".to_string())
    );
    Ok(())
}

#[test]
fn test_failed_build_aborts_before_unit_write() {
    let (deployer, mock) = create_deployer();
    mock.set_fail_on("build");

    let err = deployer.install_ftp("alice", "s3cret", None).unwrap_err();

    match err {
        DeployError::BuildFailed {
            image, exit_code, ..
        } => {
            assert_eq!(image, "ftp");
            assert_eq!(exit_code, 1);
        }
        other => panic!("erro inesperado: {other:?}"),
    }
    assert_eq!(mock.get_operations(), vec!["stop", "build"]);
    assert!(mock.written("/etc/systemd/system/aig_ftp.service").is_none());
}

#[test]
fn test_failed_mkdir_is_reported() {
    let (deployer, mock) = create_deployer();
    mock.set_fail_on("mkdir");

    let err = deployer.install_postgres("u", "p", None).unwrap_err();
    assert!(matches!(err, DeployError::DirectoryCreateFailed { .. }));
    assert!(!mock.get_operations().contains(&"write".to_string()));
}

#[test]
fn test_failed_write_is_reported() {
    let (deployer, mock) = create_deployer();
    mock.set_fail_on("write");

    let err = deployer.install_nginx(Path::new("/srv/www")).unwrap_err();
    assert!(matches!(err, DeployError::UnitWriteFailed { .. }));
    assert!(!mock.get_operations().contains(&"daemon-reload".to_string()));
}

#[test]
fn test_failed_lifecycle_steps_map_to_error_kinds() {
    let cases = [
        ("daemon-reload", "daemon-reload"),
        ("enable", "enable"),
        ("start", "start"),
    ];

    for (fail_on, last_op) in cases {
        let (deployer, mock) = create_deployer();
        mock.set_fail_on(fail_on);

        let err = deployer.install_nginx(Path::new("/srv/www")).unwrap_err();
        let expected = match fail_on {
            "daemon-reload" => matches!(err, DeployError::DaemonReloadFailed { .. }),
            "enable" => matches!(err, DeployError::EnableFailed { .. }),
            _ => matches!(err, DeployError::ServiceStartFailed { .. }),
        };
        assert!(expected, "{fail_on}: erro inesperado {err:?}");
        assert_eq!(mock.get_operations().last().unwrap(), last_op);
    }
}

#[test]
fn test_real_host_install_is_idempotent() -> Result<()> {
    let root = tempfile::tempdir()?;
    let unit_dir = root.path().join("units");
    let data_dir = root.path().join("pgdata");
    fs::create_dir(&unit_dir)?;

    let settings = Settings {
        unit_dir: unit_dir.clone(),
        ..Settings::default()
    };
    // `true` stands in for both docker and systemctl
    let deployer = Deployer::new(Arc::new(SystemdAdapter::new("true", "true")), settings);

    deployer.install_postgres("u", "p", Some(&data_dir))?;
    fs::write(data_dir.join("PG_VERSION"), "16")?;
    deployer.install_postgres("u", "p2", Some(&data_dir))?;

    assert_eq!(fs::read_to_string(data_dir.join("PG_VERSION"))?, "16");

    let unit = fs::read_to_string(unit_dir.join("postgres.service"))?;
    assert!(unit.contains("POSTGRES_PASSWORD=p2"));
    assert_eq!(fs::read_dir(&unit_dir)?.count(), 1);

    Ok(())
}

#[test]
fn test_real_host_failed_start_leaves_unit_in_place() -> Result<()> {
    let root = tempfile::tempdir()?;
    let settings = Settings {
        unit_dir: root.path().to_path_buf(),
        ..Settings::default()
    };
    // docker succeeds, every systemctl call fails
    let deployer = Deployer::new(Arc::new(SystemdAdapter::new("true", "false")), settings);

    let err = deployer
        .install_nginx(&root.path().join("www"))
        .unwrap_err();

    assert!(matches!(err, DeployError::DaemonReloadFailed { .. }));
    assert!(root.path().join("nginx.service").exists());
    Ok(())
}
