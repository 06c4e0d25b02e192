//! Deferred-logging façade over the byte ring.
//!
//! The logger starts in [`Mode::Buffering`]: records below the flush
//! trigger are JSON-serialised and parked in the ring as length-prefixed
//! frames instead of reaching the sink. The first record at or above the
//! trigger drains the ring to the sink in FIFO order, emits itself, and
//! switches the logger to [`Mode::Direct`], where every record is emitted
//! immediately. [`DeferredLogger::clear_all`] returns to buffering with an
//! empty ring.
//!
//! The façade owns its ring and its sink; nothing here is global except the
//! optional [`global`] accessor, which wraps one instance in a `Mutex`.
//! Construction always initialises the instance it is called on.
//!
//! Hooks are an ordered list of callbacks with an explicit severity filter,
//! fired for every record before mode dispatch.

use std::fmt;
use std::io::{self, Write};
use std::panic::Location;
use std::sync::{Mutex, OnceLock};

use ahash::AHashMap;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::frame::{self, FrameError};
use crate::ring::RingBuffer;
use crate::units::BufferSizes;

/// Record severity, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    /// All severities, least urgent first.
    pub const ALL: [Severity; 6] = [
        Severity::Trace,
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Fatal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One log record as it is serialised to the ring or the sink.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub level: Severity,
    #[serde(rename = "msg")]
    pub message: String,
    pub time: DateTime<Utc>,
    /// Caller location (`file.rs:line`), present when the logger reports
    /// callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Rendered resource tags, sorted by type.
    #[serde(rename = "res", skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(rename = "cat", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Typed resource tags attached to every record.
///
/// A resource is a `"type:id"` string; a tag without a `:` separator is
/// filed under the unknown type `"X"`. Rendering is deterministic: tags are
/// sorted by type and joined as `type:id, type:id`.
#[derive(Debug, Default)]
pub struct Resources {
    tags: AHashMap<String, String>,
    rendered: String,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the tag for the resource's type.
    pub fn set(&mut self, resource: &str) {
        let (kind, id) = split_resource(resource);
        self.tags.insert(kind.to_owned(), id.to_owned());
        self.render();
    }

    /// Removes the tag for `kind`, if any.
    pub fn unset(&mut self, kind: &str) {
        self.tags.remove(kind);
        self.render();
    }

    pub fn clear(&mut self) {
        self.tags.clear();
        self.rendered.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// The rendered, sorted `type:id, type:id` form.
    pub fn as_str(&self) -> &str {
        &self.rendered
    }

    fn render(&mut self) {
        let mut kinds: Vec<&str> = self.tags.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        let mut out = String::new();
        for kind in kinds {
            if !out.is_empty() {
                out.push_str(", ");
            }
            out.push_str(kind);
            out.push(':');
            out.push_str(&self.tags[kind]);
        }
        self.rendered = out;
    }
}

impl fmt::Display for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

fn split_resource(resource: &str) -> (&str, &str) {
    match resource.find(':') {
        Some(idx) => (&resource[..idx], &resource[idx + 1..]),
        None => ("X", resource),
    }
}

/// Caller-reporting options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggerOptions {
    /// Attach the caller's `file:line` to every record.
    pub report_caller: bool,
    /// Shorten the caller file to its basename.
    pub short_caller: bool,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            report_caller: true,
            short_caller: true,
        }
    }
}

/// Dispatch mode of the façade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Records below the trigger are parked in the ring.
    Buffering,
    /// Every record goes straight to the sink.
    Direct,
}

/// Errors surfaced by the logging façade.
#[derive(Debug)]
#[non_exhaustive]
pub enum LogError {
    /// Record could not be serialised to JSON.
    Serialize(serde_json::Error),
    /// The sink rejected a write.
    Sink(io::Error),
    /// A buffered frame could not be decoded during flush.
    Frame(FrameError),
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialize(err) => write!(f, "record serialisation failed: {err}"),
            Self::Sink(err) => write!(f, "sink write failed: {err}"),
            Self::Frame(err) => write!(f, "buffered record corrupt: {err}"),
        }
    }
}

impl std::error::Error for LogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Serialize(err) => Some(err),
            Self::Sink(err) => Some(err),
            Self::Frame(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for LogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err)
    }
}

impl From<io::Error> for LogError {
    fn from(err: io::Error) -> Self {
        Self::Sink(err)
    }
}

impl From<FrameError> for LogError {
    fn from(err: FrameError) -> Self {
        Self::Frame(err)
    }
}

type HookFn = Box<dyn FnMut(&LogRecord) + Send>;

struct Hook {
    levels: Vec<Severity>,
    callback: HookFn,
}

/// Logger that defers low-severity records into a ring buffer and flushes
/// them when something urgent happens.
pub struct DeferredLogger {
    options: LoggerOptions,
    resources: Resources,
    category: Option<String>,
    buffer: RingBuffer,
    mode: Mode,
    flush_at: Severity,
    hooks: Vec<Hook>,
    sink: Box<dyn Write + Send>,
}

impl DeferredLogger {
    /// Builds a buffering logger writing to stdout, with the ring sized by
    /// `sizes`.
    pub fn new(options: LoggerOptions, sizes: &BufferSizes) -> Self {
        Self::with_sink(options, sizes, Box::new(io::stdout()))
    }

    /// Builds a logger sized from the environment
    /// (`DEFAULT_BUFFER_SIZE`, `MAXIMUM_BUFFER_SIZE`, `EXTEND_COEFFICIENT`).
    pub fn from_env(options: LoggerOptions) -> Self {
        Self::new(options, &BufferSizes::from_env())
    }

    /// Builds a buffering logger writing to an arbitrary sink.
    pub fn with_sink(
        options: LoggerOptions,
        sizes: &BufferSizes,
        sink: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            options,
            resources: Resources::new(),
            category: None,
            buffer: RingBuffer::with_limits(sizes.initial, sizes.maximum, sizes.grow_threshold),
            mode: Mode::Buffering,
            flush_at: Severity::Error,
            hooks: Vec::new(),
            sink,
        }
    }

    /// Current dispatch mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Bytes currently parked in the ring.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Severity at or above which the buffer is drained and the logger goes
    /// direct. Defaults to [`Severity::Error`].
    pub fn set_flush_trigger(&mut self, level: Severity) -> &mut Self {
        self.flush_at = level;
        self
    }

    /// Adds or replaces a `"type:id"` resource tag.
    pub fn set_resource(&mut self, resource: &str) -> &mut Self {
        self.resources.set(resource);
        self
    }

    /// Removes the resource tag of the given type.
    pub fn unset_resource(&mut self, kind: &str) -> &mut Self {
        self.resources.unset(kind);
        self
    }

    pub fn clear_resources(&mut self) -> &mut Self {
        self.resources.clear();
        self
    }

    pub fn set_category(&mut self, category: &str) -> &mut Self {
        self.category = Some(category.to_owned());
        self
    }

    pub fn clear_category(&mut self) -> &mut Self {
        self.category = None;
        self
    }

    /// Registers a callback fired for every record whose severity is in
    /// `levels`, in registration order, before mode dispatch.
    pub fn add_hook(
        &mut self,
        levels: &[Severity],
        callback: impl FnMut(&LogRecord) + Send + 'static,
    ) -> &mut Self {
        self.hooks.push(Hook {
            levels: levels.to_vec(),
            callback: Box::new(callback),
        });
        self
    }

    /// Drops tags, category and all buffered records, and returns the
    /// logger to buffering mode. The ring shrinks back to its initial
    /// capacity.
    pub fn clear_all(&mut self) -> &mut Self {
        self.resources.clear();
        self.category = None;
        self.mode = Mode::Buffering;
        self.buffer.reset();
        self
    }

    /// Logs one record at the given severity.
    #[track_caller]
    pub fn log(&mut self, level: Severity, message: &str) -> Result<(), LogError> {
        let record = self.make_record(level, message, Location::caller());
        self.dispatch(record)
    }

    #[track_caller]
    pub fn trace(&mut self, message: &str) -> Result<(), LogError> {
        self.log(Severity::Trace, message)
    }

    #[track_caller]
    pub fn debug(&mut self, message: &str) -> Result<(), LogError> {
        self.log(Severity::Debug, message)
    }

    #[track_caller]
    pub fn info(&mut self, message: &str) -> Result<(), LogError> {
        self.log(Severity::Info, message)
    }

    #[track_caller]
    pub fn warn(&mut self, message: &str) -> Result<(), LogError> {
        self.log(Severity::Warn, message)
    }

    #[track_caller]
    pub fn error(&mut self, message: &str) -> Result<(), LogError> {
        self.log(Severity::Error, message)
    }

    #[track_caller]
    pub fn fatal(&mut self, message: &str) -> Result<(), LogError> {
        self.log(Severity::Fatal, message)
    }

    /// Drains every buffered record to the sink in FIFO order.
    pub fn flush(&mut self) -> Result<(), LogError> {
        while !self.buffer.is_empty() {
            let payload = frame::read_record(&mut self.buffer)?;
            self.sink.write_all(&payload)?;
            self.sink.write_all(b"\n")?;
        }
        self.sink.flush()?;
        Ok(())
    }

    fn dispatch(&mut self, record: LogRecord) -> Result<(), LogError> {
        for hook in &mut self.hooks {
            if hook.levels.contains(&record.level) {
                (hook.callback)(&record);
            }
        }

        match self.mode {
            Mode::Buffering if record.level < self.flush_at => {
                let json = serde_json::to_vec(&record)?;
                frame::write_record(&mut self.buffer, &json)?;
                Ok(())
            }
            Mode::Buffering => {
                self.flush()?;
                self.mode = Mode::Direct;
                self.emit(&record)
            }
            Mode::Direct => self.emit(&record),
        }
    }

    fn emit(&mut self, record: &LogRecord) -> Result<(), LogError> {
        let json = serde_json::to_vec(record)?;
        self.sink.write_all(&json)?;
        self.sink.write_all(b"\n")?;
        Ok(())
    }

    fn make_record(&self, level: Severity, message: &str, caller: &Location<'_>) -> LogRecord {
        let file = if self.options.report_caller {
            let path = caller.file();
            let shown = if self.options.short_caller {
                path.rsplit('/').next().unwrap_or(path)
            } else {
                path
            };
            Some(format!("{}:{}", shown, caller.line()))
        } else {
            None
        };
        LogRecord {
            level,
            message: message.to_owned(),
            time: Utc::now(),
            file,
            resource: if self.resources.is_empty() {
                None
            } else {
                Some(self.resources.as_str().to_owned())
            },
            category: self.category.clone(),
        }
    }
}

impl fmt::Debug for DeferredLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredLogger")
            .field("mode", &self.mode)
            .field("flush_at", &self.flush_at)
            .field("buffered_len", &self.buffer.len())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

static GLOBAL: OnceLock<Mutex<DeferredLogger>> = OnceLock::new();

/// Process-wide logger, created on first use with default options and
/// environment-driven buffer sizes.
///
/// The accessor is initialise-once; the logger itself is an ordinary
/// instance and additional loggers can be built independently.
pub fn global() -> &'static Mutex<DeferredLogger> {
    GLOBAL.get_or_init(|| Mutex::new(DeferredLogger::from_env(LoggerOptions::default())))
}
