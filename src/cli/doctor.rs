use crate::domain::HostRuntime;
use crate::infra::config::Settings;

/// Prints one line per check and never fails; returns how many checks failed.
pub fn doctor(runtime: &dyn HostRuntime, settings: &Settings) -> usize {
    println!("🔍 Checando dependências e configuração...");
    let mut problems = 0;

    for dep in [settings.docker.as_str(), settings.systemctl.as_str()] {
        if runtime.is_command_available(dep) {
            println!("✅ {dep} disponível");
        } else {
            println!("⚠️  {dep} não encontrado no PATH");
            problems += 1;
        }
    }

    let dirs = [
        ("Diretório de units", &settings.unit_dir),
        ("Raiz de build", &settings.build_root),
    ];
    for (label, dir) in dirs {
        if dir.is_dir() {
            println!("✅ {label}: {:?}", dir);
        } else {
            println!("⚠️  {label} ausente em {:?}", dir);
            problems += 1;
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockRuntime;

    #[test]
    fn test_doctor_checks_binaries_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            unit_dir: dir.path().to_path_buf(),
            build_root: dir.path().join("missing"),
            ..Settings::default()
        };
        let mock = MockRuntime::new();

        let problems = doctor(&mock, &settings);

        assert_eq!(problems, 1);
        let commands = mock.get_commands();
        assert!(commands.contains(&"is_available:docker".to_string()));
        assert!(commands.contains(&"is_available:systemctl".to_string()));
    }
}
