//! Logger Module
//!
//! Instance-scoped logging for a [`crate::Client`] and its sessions.
//!
//! ## Responsibilities
//! - Own a `tracing` dispatcher whose output goes to stderr, a file or any writer
//! - Filter events by [`Severity`], adjustable at runtime
//! - Drive the debug switches of the native libraries ([`LibLogLevel`])
//!
//! No global subscriber is installed. Events are routed to a logger by running
//! code inside [`Logger::scope`], so two clients can log to two files.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::ops::BitOr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::dispatcher::{self, Dispatch};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{reload, Registry};

use crate::error::Result;
use crate::native::Native;

/// Environment variable selecting the severity of [`Logger::from_env`]
pub const ENV_LEVEL: &str = "K2HDKC_RS_DBGLEVEL";

/// Environment variable selecting the log file of [`Logger::from_env`]
pub const ENV_FILE: &str = "K2HDKC_RS_DBGFILE";

// =============================================================================
// Severity
// =============================================================================

/// Log severity, from quietest to noisiest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    Silent,
    #[default]
    Error,
    Warning,
    Info,
    Dump,
}

impl Severity {
    /// Parse a severity name; unknown names fall back to [`Severity::Error`]
    pub fn parse(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!("unknown severity {:?}, falling back to ERROR", name);
            Severity::Error
        })
    }

    fn level_filter(self) -> LevelFilter {
        match self {
            Severity::Silent => LevelFilter::OFF,
            Severity::Error => LevelFilter::ERROR,
            Severity::Warning => LevelFilter::WARN,
            Severity::Info => LevelFilter::INFO,
            Severity::Dump => LevelFilter::TRACE,
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "SLT" | "SILENT" => Ok(Severity::Silent),
            "ERR" | "ERROR" => Ok(Severity::Error),
            "WAN" | "WARNING" => Ok(Severity::Warning),
            "MSG" | "INFO" => Ok(Severity::Info),
            "DMP" | "DUMP" => Ok(Severity::Dump),
            other => Err(format!("unknown severity {other:?}")),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Silent => "SILENT",
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
            Severity::Info => "INFO",
            Severity::Dump => "DUMP",
        })
    }
}

// =============================================================================
// Native Library Switches
// =============================================================================

/// A native library with its own debug level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeLib {
    K2hdkc,
    Chmpx,
    K2hash,
}

/// Set of native log switches to turn on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LibLogLevel(u8);

impl LibLogLevel {
    /// Turn every native log off
    pub const SILENT: LibLogLevel = LibLogLevel(0);
    /// k2hdkc communication log
    pub const COMLOG: LibLogLevel = LibLogLevel(1 << 0);
    pub const K2HDKC: LibLogLevel = LibLogLevel(1 << 1);
    pub const CHMPX: LibLogLevel = LibLogLevel(1 << 2);
    pub const K2HASH: LibLogLevel = LibLogLevel(1 << 3);

    pub fn contains(self, other: LibLogLevel) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn is_silent(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for LibLogLevel {
    type Output = LibLogLevel;

    fn bitor(self, rhs: LibLogLevel) -> LibLogLevel {
        LibLogLevel(self.0 | rhs.0)
    }
}

// =============================================================================
// Sink
// =============================================================================

enum Output {
    Stderr,
    File(File),
    Writer(Box<dyn Write + Send>),
    Closed,
}

/// Closable destination shared by the fmt layer and the logger
#[derive(Clone)]
struct Sink(Arc<Mutex<Output>>);

impl Sink {
    fn new(output: Output) -> Self {
        Sink(Arc::new(Mutex::new(output)))
    }

    fn replace(&self, output: Output) {
        let previous = std::mem::replace(&mut *self.0.lock(), output);
        if let Output::File(mut file) = previous {
            let _ = file.flush();
        }
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut *self.0.lock() {
            Output::Stderr => io::stderr().write(buf),
            Output::File(file) => file.write(buf),
            Output::Writer(w) => w.write(buf),
            Output::Closed => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut *self.0.lock() {
            Output::Stderr => io::stderr().flush(),
            Output::File(file) => file.flush(),
            Output::Writer(w) => w.flush(),
            Output::Closed => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for Sink {
    type Writer = Sink;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

// =============================================================================
// Logger
// =============================================================================

struct Inner {
    dispatch: Dispatch,
    filter: reload::Handle<LevelFilter, Registry>,
    sink: Sink,
    severity: Mutex<Severity>,
    file: Mutex<Option<PathBuf>>,
}

/// Cheaply cloneable handle to one logging destination
///
/// The sink is closed by [`Logger::close`] or when the last clone is dropped.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

impl Logger {
    fn build(output: Output, severity: Severity, file: Option<PathBuf>) -> Self {
        let sink = Sink::new(output);
        let (filter, handle) = reload::Layer::new(severity.level_filter());
        let subscriber = Registry::default().with(filter).with(
            tracing_subscriber::fmt::layer()
                .with_writer(sink.clone())
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        );

        Self {
            inner: Arc::new(Inner {
                dispatch: Dispatch::new(subscriber),
                filter: handle,
                sink,
                severity: Mutex::new(severity),
                file: Mutex::new(file),
            }),
        }
    }

    /// Log to stderr
    pub fn stderr(severity: Severity) -> Self {
        Self::build(Output::Stderr, severity, None)
    }

    /// Append to `path`, creating it if needed
    pub fn to_file(path: impl AsRef<Path>, severity: Severity) -> Result<Self> {
        let path = path.as_ref();
        let file = open_append(path)?;
        Ok(Self::build(Output::File(file), severity, Some(path.to_path_buf())))
    }

    /// Log to an arbitrary writer
    pub fn with_writer<W>(writer: W, severity: Severity) -> Self
    where
        W: Write + Send + 'static,
    {
        Self::build(Output::Writer(Box::new(writer)), severity, None)
    }

    /// Logger configured by `K2HDKC_RS_DBGLEVEL` and `K2HDKC_RS_DBGFILE`
    ///
    /// The level defaults to ERROR. A log file that cannot be opened falls
    /// back to stderr.
    pub fn from_env() -> Self {
        let severity = std::env::var(ENV_LEVEL)
            .ok()
            .filter(|v| !v.is_empty())
            .map(|v| Severity::parse(&v))
            .unwrap_or_default();

        match std::env::var(ENV_FILE).ok().filter(|v| !v.is_empty()) {
            Some(path) => Self::to_file(&path, severity).unwrap_or_else(|e| {
                let logger = Self::stderr(severity);
                logger.error(format_args!("{path} open error: {e}. Fallback to stderr."));
                logger
            }),
            None => Self::stderr(severity),
        }
    }

    pub fn severity(&self) -> Severity {
        *self.inner.severity.lock()
    }

    pub fn set_severity(&self, severity: Severity) {
        *self.inner.severity.lock() = severity;
        if let Err(e) = self.inner.filter.reload(severity.level_filter()) {
            tracing::warn!("severity reload failed: {}", e);
        }
    }

    /// Current log file, `None` when logging to stderr or a writer
    pub fn log_file(&self) -> Option<PathBuf> {
        self.inner.file.lock().clone()
    }

    /// Switch to appending to `path`, or back to stderr with `None`
    ///
    /// The previous destination is closed first.
    pub fn set_log_file(&self, path: Option<&Path>) -> Result<()> {
        match path {
            Some(path) => {
                let file = open_append(path)?;
                self.inner.sink.replace(Output::File(file));
                *self.inner.file.lock() = Some(path.to_path_buf());
            }
            None => {
                self.inner.sink.replace(Output::Stderr);
                *self.inner.file.lock() = None;
            }
        }
        Ok(())
    }

    /// Stop writing; later events are discarded
    pub fn close(&self) {
        self.inner.sink.replace(Output::Closed);
        *self.inner.file.lock() = None;
    }

    /// Run `f` with this logger as the default `tracing` dispatcher
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        dispatcher::with_default(&self.inner.dispatch, f)
    }

    pub fn error(&self, msg: impl fmt::Display) {
        self.scope(|| tracing::error!("{}", msg));
    }

    pub fn warn(&self, msg: impl fmt::Display) {
        self.scope(|| tracing::warn!("{}", msg));
    }

    pub fn info(&self, msg: impl fmt::Display) {
        self.scope(|| tracing::info!("{}", msg));
    }

    pub fn dump(&self, msg: impl fmt::Display) {
        self.scope(|| tracing::trace!("{}", msg));
    }

    /// Apply native log switches at this logger's severity
    ///
    /// [`LibLogLevel::SILENT`] turns every native log off.
    pub(crate) fn apply_lib_level(&self, native: &dyn Native, level: LibLogLevel) {
        let severity = self.severity();
        if level.is_silent() {
            native.set_comlog(false);
            for lib in [NativeLib::K2hdkc, NativeLib::Chmpx, NativeLib::K2hash] {
                native.set_debug_level(lib, Severity::Silent);
            }
            return;
        }
        if level.contains(LibLogLevel::COMLOG) {
            native.set_comlog(severity != Severity::Silent);
        }
        for (flag, lib) in [
            (LibLogLevel::K2HDKC, NativeLib::K2hdkc),
            (LibLogLevel::CHMPX, NativeLib::Chmpx),
            (LibLogLevel::K2HASH, NativeLib::K2hash),
        ] {
            if level.contains(flag) {
                native.set_debug_level(lib, severity);
            }
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::from_env()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("severity", &self.severity())
            .field("file", &self.log_file())
            .finish()
    }
}
