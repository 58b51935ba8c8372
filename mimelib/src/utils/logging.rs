/*
 * melib
 *
 * Copyright 2019 Manos Pitsidianakis
 *
 * This file is part of meli.
 *
 * meli is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * meli is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with meli. If not, see <http://www.gnu.org/licenses/>.
 */

//! A minimal [`log`] backend for programs that embed this crate and have no
//! logger of their own.

use std::{
    io::Write,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
};

use log::{Level, LevelFilter, Log, Metadata, Record};

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, PartialOrd, Serialize)]
#[repr(u8)]
pub enum LogLevel {
    OFF = 0,
    ERROR,
    #[default]
    WARN,
    INFO,
    DEBUG,
    TRACE,
}

impl From<u8> for LogLevel {
    fn from(verbosity: u8) -> Self {
        match verbosity {
            0 => Self::OFF,
            1 => Self::ERROR,
            2 => Self::WARN,
            3 => Self::INFO,
            4 => Self::DEBUG,
            _ => Self::TRACE,
        }
    }
}

impl From<Level> for LogLevel {
    fn from(l: Level) -> Self {
        match l {
            Level::Error => Self::ERROR,
            Level::Warn => Self::WARN,
            Level::Info => Self::INFO,
            Level::Debug => Self::DEBUG,
            Level::Trace => Self::TRACE,
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::OFF => Self::Off,
            LogLevel::ERROR => Self::Error,
            LogLevel::WARN => Self::Warn,
            LogLevel::INFO => Self::Info,
            LogLevel::DEBUG => Self::Debug,
            LogLevel::TRACE => Self::Trace,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::OFF => "OFF",
                Self::ERROR => "ERROR",
                Self::WARN => "WARN",
                Self::INFO => "INFO",
                Self::DEBUG => "DEBUG",
                Self::TRACE => "TRACE",
            }
        )
    }
}

/// Writes log records to standard error.
#[derive(Clone)]
pub struct StderrLogger {
    level: Arc<AtomicU8>,
    print_level: bool,
    print_module_names: bool,
}

impl std::fmt::Debug for StderrLogger {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_struct(stringify!(StderrLogger))
            .field("level", &self.log_level())
            .field("print_level", &self.print_level)
            .field("print_module_names", &self.print_module_names)
            .finish()
    }
}

impl Default for StderrLogger {
    fn default() -> Self {
        Self::new(LogLevel::default())
    }
}

impl StderrLogger {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level: Arc::new(AtomicU8::new(level as u8)),
            print_level: true,
            print_module_names: true,
        }
    }

    /// Install a logger as the global [`log`] backend. Only the first call
    /// installs anything; later calls return a handle that only changes the
    /// level filter.
    pub fn init(level: LogLevel) -> Self {
        use std::sync::Once;

        static INIT_STDERR_LOGGING: Once = Once::new();

        let logger = Self::new(level);
        #[cfg(feature = "debug-tracing")]
        log::set_max_level(if level == LogLevel::OFF {
            LevelFilter::Off
        } else {
            LevelFilter::Trace
        });
        #[cfg(not(feature = "debug-tracing"))]
        log::set_max_level(LevelFilter::from(level));

        INIT_STDERR_LOGGING.call_once(|| {
            if log::set_boxed_logger(Box::new(logger.clone())).is_err() {
                log::warn!("A logger is already installed, StderrLogger was not registered.");
            }
        });
        logger
    }

    pub fn log_level(&self) -> LogLevel {
        self.level.load(Ordering::SeqCst).into()
    }

    pub fn set_log_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::SeqCst);
    }

    pub fn print_level(mut self, new_val: bool) -> Self {
        self.print_level = new_val;
        self
    }

    pub fn print_module_names(mut self, new_val: bool) -> Self {
        self.print_module_names = new_val;
        self
    }

    fn write_record(&self, writer: &mut impl Write, record: &Record) -> Option<()> {
        write!(
            writer,
            "{}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )
        .ok()?;
        writer.write_all(b" [").ok()?;
        if self.print_level {
            writer
                .write_all(record.level().to_string().as_bytes())
                .ok()?;
        }
        write!(writer, "]: ").ok()?;
        if self.print_module_names {
            write!(writer, "{}: ", record.metadata().target()).ok()?;
        }
        writeln!(writer, "{}", record.args()).ok()?;
        writer.flush().ok()?;
        Some(())
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.log_level() != LogLevel::OFF
            && LogLevel::from(metadata.level()) <= self.log_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        _ = self.write_record(&mut std::io::stderr().lock(), record);
    }

    fn flush(&self) {
        _ = std::io::stderr().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_level_filter() {
        let logger = StderrLogger::new(LogLevel::WARN);
        let warn = Metadata::builder().level(Level::Warn).build();
        let debug = Metadata::builder().level(Level::Debug).build();
        assert!(logger.enabled(&warn));
        assert!(!logger.enabled(&debug));
        logger.set_log_level(LogLevel::TRACE);
        assert!(logger.enabled(&debug));
        logger.set_log_level(LogLevel::OFF);
        assert!(!logger.enabled(&warn));
        assert_eq!(LogLevel::from(4), LogLevel::DEBUG);
        assert_eq!(LevelFilter::from(LogLevel::INFO), LevelFilter::Info);
    }

    #[test]
    fn test_logging_debug_macro_passes_values_through() {
        assert_eq!(debug!(2 + 2), 4);
        assert_eq!(debug!("literal"), "literal");
        let handler = crate::email::content::registry()
            .lookup(&crate::ContentType::new("text", "plain"))
            .map(|handler| format!("{:?}", debug!(handler)));
        assert_eq!(handler.unwrap(), "TextHandler");
    }

    #[test]
    fn test_logging_record_format() {
        let logger = StderrLogger::new(LogLevel::INFO).print_module_names(false);
        let mut out = vec![];
        logger
            .write_record(
                &mut out,
                &Record::builder()
                    .args(format_args!("recovered unterminated comment"))
                    .level(Level::Info)
                    .build(),
            )
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.ends_with(" [INFO]: recovered unterminated comment\n"));
    }
}
