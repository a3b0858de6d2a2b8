//! Logging setup on top of the `log` facade and `flexi_logger`
//!
//! The pipeline needs two severities the `log` crate does not have: NOTICE
//! (between INFO and WARNING) and CRITICAL (above ERROR, used when a stage
//! keeps running after an unexpected failure). They are carried as a
//! `severity` key-value on the log record and rendered by the formatters
//! installed in [`init_logging`]. Use the [`notice!`](crate::notice) and
//! [`critical!`](crate::critical) macros to emit them.

use crate::config::LoggingConfig;
use log::kv::{Key, Source};
use std::sync::{Mutex, OnceLock};

/// Key-value name carrying an extended severity on a log record
pub const SEVERITY_KEY: &str = "severity";

static LOGGER_HANDLE: OnceLock<Mutex<flexi_logger::LoggerHandle>> = OnceLock::new();

/// Named severities understood by the formatters, lowest first
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// The `log` level a record of this severity is filtered at
    pub fn level(self) -> log::Level {
        match self {
            Severity::Trace => log::Level::Trace,
            Severity::Debug => log::Level::Debug,
            Severity::Info | Severity::Notice => log::Level::Info,
            Severity::Warning => log::Level::Warn,
            Severity::Error | Severity::Critical => log::Level::Error,
        }
    }

    /// Severity implied by a plain `log` level
    pub fn from_level(level: log::Level) -> Self {
        match level {
            log::Level::Trace => Severity::Trace,
            log::Level::Debug => Severity::Debug,
            log::Level::Info => Severity::Info,
            log::Level::Warn => Severity::Warning,
            log::Level::Error => Severity::Error,
        }
    }

    /// Severity of a record, honouring the `severity` key-value when present
    pub fn of_record(record: &log::Record) -> Self {
        record
            .key_values()
            .get(Key::from_str(SEVERITY_KEY))
            .and_then(|value| value.to_string().parse::<Severity>().ok())
            .unwrap_or_else(|| Severity::from_level(record.level()))
    }

    /// Three-letter tag used by the text formats
    pub fn abbreviation(self) -> &'static str {
        match self {
            Severity::Trace => "TRC",
            Severity::Debug => "DBG",
            Severity::Info => "INF",
            Severity::Notice => "NTC",
            Severity::Warning => "WRN",
            Severity::Error => "ERR",
            Severity::Critical => "CRT",
        }
    }

    fn colored_abbreviation(self) -> colored::ColoredString {
        use colored::*;
        match self {
            Severity::Trace => "TRC".magenta(),
            Severity::Debug => "DBG".blue(),
            Severity::Info => "INF".green(),
            Severity::Notice => "NTC".cyan(),
            Severity::Warning => "WRN".yellow(),
            Severity::Error => "ERR".red().bold(),
            Severity::Critical => "CRT".white().on_red().bold(),
        }
    }
}

/// Log at CRITICAL: filtered as `error`, rendered as `CRT`
#[macro_export]
macro_rules! critical {
    ($($arg:tt)+) => {
        ::log::error!(severity = "CRITICAL"; $($arg)+)
    };
}

/// Log at NOTICE: filtered as `info`, rendered as `NTC`
#[macro_export]
macro_rules! notice {
    ($($arg:tt)+) => {
        ::log::info!(severity = "NOTICE"; $($arg)+)
    };
}

/// Emit a message at an arbitrary [`Severity`]
pub fn log_at(severity: Severity, args: std::fmt::Arguments<'_>) {
    match severity {
        Severity::Critical => crate::critical!("{}", args),
        Severity::Notice => crate::notice!("{}", args),
        other => log::log!(other.level(), "{}", args),
    }
}

/// Install the process-wide logger
///
/// Only the first call installs anything; later calls return `Ok(())` so
/// that library users and tests can call this freely.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    use flexi_logger::{FileSpec, Logger};

    // Serialises first callers so only one of them reaches `start`
    static INIT: Mutex<()> = Mutex::new(());
    let _init = INIT.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

    if LOGGER_HANDLE.get().is_some() {
        return Ok(());
    }

    let mut logger = Logger::try_with_str(config.level.as_str())?;

    match config.format.as_str() {
        "json" => {
            logger = logger.format(json_format);
        }
        "ext" => {
            if config.color {
                logger = logger.format(extended_color_format);
            } else {
                logger = logger.format(extended_format);
            }
        }
        _ => {
            if config.color {
                logger = logger.format(simple_color_format);
            } else {
                logger = logger.format(simple_format);
            }
        }
    }

    if let Some(file_path) = &config.file {
        let file_spec = FileSpec::try_from(file_path.as_path())?;
        logger = logger.log_to_file(file_spec);
    }

    let handle = logger.start()?;
    let _ = LOGGER_HANDLE.set(Mutex::new(handle));

    Ok(())
}

// Simple text format without target info
fn simple_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    // Format: "YYYY-MM-DD HH:mm:ss.fff INF message"
    write!(
        w,
        "{} {} {}",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        Severity::of_record(record).abbreviation(),
        record.args()
    )
}

fn simple_color_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use colored::*;

    write!(
        w,
        "{} {} {}",
        now.format("%Y-%m-%d %H:%M:%S%.3f").to_string().dimmed(),
        Severity::of_record(record).colored_abbreviation(),
        record.args()
    )
}

// Extended format with thread and target info, no colors
fn extended_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    let target_formatted = format_target_as_path(record.target(), record.line());

    // Format: "YYYY-MM-DD HH:mm:ss.fff INF [thread] message (postfetch/engine.rs:42)"
    write!(
        w,
        "{} {} [{}] {} ({})",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        Severity::of_record(record).abbreviation(),
        std::thread::current().name().unwrap_or("unnamed"),
        record.args(),
        target_formatted
    )
}

fn extended_color_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use colored::*;

    let target_formatted = format_target_as_path(record.target(), record.line());

    write!(
        w,
        "{} {} [{}] {} ({})",
        now.format("%Y-%m-%d %H:%M:%S%.3f").to_string().dimmed(),
        Severity::of_record(record).colored_abbreviation(),
        std::thread::current().name().unwrap_or("unnamed"),
        record.args(),
        target_formatted.dimmed()
    )
}

fn json_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use serde_json::{json, to_string};

    let target_formatted = format_target_as_path(record.target(), record.line());

    // Ordered: timestamp, level, message, metadata
    let json_obj = json!({
        "timestamp": now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        "level": Severity::of_record(record).to_string(),
        "message": record.args().to_string(),
        "thread": std::thread::current().name().unwrap_or("unnamed"),
        "target": target_formatted
    });

    match to_string(&json_obj) {
        Ok(json_string) => {
            w.write_all(json_string.as_bytes())?;
            Ok(())
        }
        Err(_) => {
            w.write_all(b"{\"error\":\"Failed to serialize log message\"}")?;
            Ok(())
        }
    }
}

// postfetch::postfetch::engine -> postfetch/engine.rs:42
fn format_target_as_path(target: &str, line: Option<u32>) -> String {
    let path_like = if let Some(without_prefix) = target.strip_prefix("postfetch::") {
        without_prefix.replace("::", "/") + ".rs"
    } else {
        target.replace("::", "/")
    };

    if let Some(line_num) = line {
        format!("{}:{}", path_like, line_num)
    } else {
        path_like
    }
}
