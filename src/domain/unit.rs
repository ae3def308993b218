use crate::error::{DeployError, DeployResult};
use std::collections::BTreeMap;

/// Fixed-structure systemd unit for a container started by `docker run`.
#[derive(Debug, Clone)]
pub struct UnitTemplate<'a> {
    pub user: &'a str,
    pub description: &'a str,
    pub exec_start: &'a str,
    pub environment: &'a BTreeMap<String, String>,
}

impl UnitTemplate<'_> {
    /// Renders the unit text.
    ///
    /// Values are interpolated verbatim except for `%`, which systemd treats
    /// as a specifier prefix. A value containing a line break would inject
    /// extra directives and is rejected.
    pub fn render(&self) -> DeployResult<String> {
        let user = unit_value("User", self.user)?;
        let description = unit_value("Description", self.description)?;
        let exec_start = unit_value("ExecStart", self.exec_start)?;

        let mut environment = String::new();
        for (key, value) in self.environment {
            let line = unit_value("Environment", &format!("{key}={value}"))?;
            environment.push_str(&format!("Environment={}\n", quote_arg(&line)));
        }

        Ok(format!(
            "[Unit]
Description={description}
After=docker.service
After=network.target

[Service]
User={user}
{environment}ExecStart={exec_start}

[Install]
WantedBy=multi-user.target
"
        ))
    }
}

/// Renders a unit with no extra environment.
pub fn render(user: &str, description: &str, exec_command: &str) -> DeployResult<String> {
    UnitTemplate {
        user,
        description,
        exec_start: exec_command,
        environment: &BTreeMap::new(),
    }
    .render()
}

/// Joins an argument vector into an `ExecStart=` command line that systemd
/// splits back into the same arguments.
///
/// systemd expands `$NAME`/`${NAME}` in command lines, so every `$` is
/// doubled. `Environment=` values are not expanded and go through
/// [`quote_arg`] only.
pub fn exec_line(args: &[String]) -> String {
    args.iter()
        .map(|arg| quote_arg(&arg.replace('$', "$$")))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_arg(arg: &str) -> String {
    let needs_quotes = arg.is_empty()
        || arg
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '\\' | ';'));

    if !needs_quotes {
        return arg.to_string();
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

fn unit_value(field: &'static str, value: &str) -> DeployResult<String> {
    if value.contains(['\n', '\r']) {
        return Err(DeployError::InvalidUnitValue { field });
    }
    Ok(value.replace('%', "%%"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section_headers(text: &str) -> Vec<&str> {
        text.lines()
            .map(str::trim)
            .filter(|l| l.starts_with('[') && l.ends_with(']'))
            .collect()
    }

    #[test]
    fn test_render_has_three_sections_in_order() {
        let text = render("ivan", "FTP server", "docker run ftp").unwrap();
        assert_eq!(section_headers(&text), ["[Unit]", "[Service]", "[Install]"]);
    }

    #[test]
    fn test_render_interpolates_description_and_exec() {
        let text = render("ivan", "X", "Y").unwrap();
        assert!(text.contains("Description=X\n"));
        assert!(text.contains("ExecStart=Y\n"));
        assert!(text.contains("User=ivan\n"));
        assert!(text.contains("After=docker.service\nAfter=network.target\n"));
        assert!(text.contains("WantedBy=multi-user.target\n"));
    }

    #[test]
    fn test_render_every_line_belongs_to_a_section() {
        let text = render("ivan", "desc", "cmd").unwrap();
        let first = text.lines().find(|l| !l.trim().is_empty()).unwrap();
        assert_eq!(first, "[Unit]");
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            assert!(line.starts_with('[') || line.contains('='), "linha solta: {line}");
        }
    }

    #[test]
    fn test_render_rejects_newlines() {
        let err = render("ivan", "evil\n[Service]", "cmd").unwrap_err();
        assert!(matches!(
            err,
            DeployError::InvalidUnitValue {
                field: "Description"
            }
        ));

        assert!(render("ivan", "ok", "cmd\r\nExecStartPre=/bin/true").is_err());
    }

    #[test]
    fn test_render_escapes_percent() {
        let text = render("ivan", "100% uptime", "docker run -e PASS=a%b img").unwrap();
        assert!(text.contains("Description=100%% uptime"));
        assert!(text.contains("PASS=a%%b"));
    }

    #[test]
    fn test_render_environment_lines_in_service_section() {
        let mut env = BTreeMap::new();
        env.insert("MITM_DB".to_string(), "host=db user=bot".to_string());
        let text = UnitTemplate {
            user: "ivan",
            description: "proxy",
            exec_start: "docker run -e MITM_DB mitm",
            environment: &env,
        }
        .render()
        .unwrap();

        let service = text.split("[Service]").nth(1).unwrap();
        let service = service.split("[Install]").next().unwrap();
        assert!(service.contains("Environment=\"MITM_DB=host=db user=bot\"\n"));
        assert!(service.contains("ExecStart=docker run -e MITM_DB mitm"));
    }

    #[test]
    fn test_exec_line_escapes_variable_expansion() {
        let args: Vec<String> = ["docker", "run", "-e", "FTP_PASS=a$b", "-e", "X=${x}"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(exec_line(&args), "docker run -e FTP_PASS=a$$b -e X=$${x}");
    }

    #[test]
    fn test_environment_dollar_is_left_alone() {
        let mut env = BTreeMap::new();
        env.insert("MITM_DB".to_string(), "pass$word".to_string());
        let text = UnitTemplate {
            user: "ivan",
            description: "proxy",
            exec_start: "docker run -e MITM_DB mitm",
            environment: &env,
        }
        .render()
        .unwrap();

        assert!(text.contains("Environment=MITM_DB=pass$word\n"));
    }

    #[test]
    fn test_exec_line_quotes_only_when_needed() {
        let args: Vec<String> = ["docker", "run", "-e", "GREETING=hello world", "-e", "Q=a\"b"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            exec_line(&args),
            r#"docker run -e "GREETING=hello world" -e "Q=a\"b""#
        );
    }
}
