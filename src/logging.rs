//! Process logging: a debug log file plus coloured console output.
//!
//! The [`LogSession`] is created once at startup. It truncates the log file
//! and hands out a [`Dispatch`] that the caller scopes around its work with
//! [`tracing::dispatcher::with_default`]; nothing is installed globally. The
//! session is finished explicitly before exit so the file is flushed to disk.

use anyhow::{Context, Result};
use std::fmt;
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Dispatch, Event, Subscriber, error};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt as tfmt, prelude::*};

pub struct LogSession {
    file: Arc<File>,
    path: PathBuf,
}

impl LogSession {
    /// Opens the log file, discarding whatever a previous run left in it.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| format!("criando {:?}", parent))?;
        }

        let file = File::create(path).with_context(|| format!("abrindo log {:?}", path))?;

        Ok(Self {
            file: Arc::new(file),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File layer at DEBUG plus a console layer filtered by `console_filter`.
    pub fn subscriber(&self, console_filter: EnvFilter) -> impl Subscriber + Send + Sync + 'static {
        let file_layer = tfmt::layer()
            .with_writer(self.file.clone())
            .with_ansi(false)
            .event_format(FileFormat {
                pid: std::process::id(),
            })
            .with_filter(LevelFilter::DEBUG);

        let console_layer = tfmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_ansi(io::stderr().is_terminal())
            .with_writer(io::stderr)
            .with_filter(console_filter);

        tracing_subscriber::registry()
            .with(file_layer)
            .with(console_layer)
    }

    pub fn dispatch(&self, console_filter: EnvFilter) -> Dispatch {
        Dispatch::new(self.subscriber(console_filter))
    }

    /// Flushes the log file to disk.
    pub fn finish(self) -> io::Result<()> {
        self.file.sync_all()
    }
}

/// Console filter from `RUST_LOG`, INFO and above by default.
pub fn console_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Opens the log file and builds the dispatch for the current run.
pub fn init(path: &Path) -> Result<(LogSession, Dispatch)> {
    let session = LogSession::open(path)?;
    let dispatch = session.dispatch(console_filter());
    Ok((session, dispatch))
}

/// Logs a failed run as a single line with its context chain.
pub fn report_error(error: &anyhow::Error) {
    error!("{error:#}");
}

/// `timestamp|PID:pid|LEVEL|file:line| message fields`
struct FileFormat {
    pid: u32,
}

impl<S, N> FormatEvent<S, N> for FileFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let level = meta.level().to_string();

        SystemTime.format_time(&mut writer)?;
        write!(
            writer,
            "|PID:{:<11}|{:<8}|{}:{}| ",
            self.pid,
            level,
            meta.file().unwrap_or("?"),
            meta.line().unwrap_or(0)
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
