use std::fmt;

/// A command handed to the shell executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Interpreted by `sh -c`
    Shell(String),
    /// Program followed by its arguments, spawned directly without a shell
    Args(Vec<String>),
}

impl ShellCommand {
    pub fn args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Args(args.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shell(line) => write!(f, "sh -c {line:?}"),
            Self::Args(args) => write!(f, "{}", args.join(" ")),
        }
    }
}

/// Captured outcome of an external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last non-empty line of stderr, falling back to stdout
    pub fn summary(&self) -> &str {
        fn last(text: &str) -> Option<&str> {
            text.lines().rev().map(str::trim).find(|l| !l.is_empty())
        }

        last(&self.stderr)
            .or_else(|| last(&self.stdout))
            .unwrap_or("")
    }
}
