//! Logging setup from [`LoggingConfig`].
//!
//! The pipeline opens a `pipeline` span per message, so turning on
//! `span_events.new` and `span_events.close` shows every message entering
//! and leaving with its busy time.
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "pretty"
//! output = "file"
//! file_path = "logs/chime.log"
//! rotation = "daily"
//! span_events = { new = true, close = true }
//! filters = { chime_framework = "debug", sqlx = "warn" }
//! ```
//!
//! `RUST_LOG` replaces `level` when set; `filters` apply on top of either.

use std::ffi::OsStr;
use std::path::Path;

use tracing::level_filters::LevelFilter;
use tracing::{debug, warn};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{LogFormat, LogOutput, LogRotation, LoggingConfig, SpanEventConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Installs the global subscriber described by `config`.
///
/// Does nothing if a subscriber is already installed, so runtimes built one
/// after another (tests, restarts) keep the first one. A log file that
/// cannot be opened falls back to stderr.
pub fn init_from_config(config: &LoggingConfig) {
    let (writer, file_error) = match writer(config) {
        Ok(writer) => (writer, None),
        Err(e) => (BoxMakeWriter::new(std::io::stderr), Some(e)),
    };
    let filter = filter(config, std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());

    let installed = tracing_subscriber::registry()
        .with(layer(config, writer))
        .with(filter)
        .try_init()
        .is_ok();
    if !installed {
        return;
    }

    if let Some(e) = file_error {
        warn!(path = ?config.file_path, error = %e, "Cannot open log file, logging to stderr");
    }
    debug!(
        level = %config.level,
        format = ?config.format,
        output = ?config.output,
        "Logging initialized"
    );
}

fn filter(config: &LoggingConfig, rust_log: Option<&str>) -> EnvFilter {
    let base = LevelFilter::from_level(config.level.to_tracing_level());
    let mut filter = EnvFilter::builder()
        .with_default_directive(base.into())
        .parse_lossy(rust_log.unwrap_or_default());

    for (module, level) in &config.filters {
        if let Ok(directive) = format!("{module}={level}").parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

fn layer(config: &LoggingConfig, writer: BoxMakeWriter) -> BoxedLayer {
    let layer = fmt::layer()
        .with_writer(writer)
        .with_span_events(span_events(&config.span_events))
        .with_thread_ids(config.thread_ids)
        .with_file(config.file_location)
        .with_line_number(config.file_location);

    match config.format {
        LogFormat::Full => layer.boxed(),
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        #[cfg(feature = "json-log")]
        LogFormat::Json => layer.json().boxed(),
        // Rejected by validation; compact if it gets here anyway.
        #[cfg(not(feature = "json-log"))]
        LogFormat::Json => layer.compact().boxed(),
    }
}

fn writer(config: &LoggingConfig) -> Result<BoxMakeWriter, InitError> {
    match (config.output, config.file_path.as_deref()) {
        (LogOutput::Stderr, _) => Ok(BoxMakeWriter::new(std::io::stderr)),
        (LogOutput::File, Some(path)) => {
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path.file_name().unwrap_or_else(|| OsStr::new("chime.log"));

            let appender = RollingFileAppender::builder()
                .rotation(rotation(config.rotation))
                .filename_prefix(name.to_string_lossy())
                .build(dir)?;
            Ok(BoxMakeWriter::new(appender))
        }
        // A missing file path is rejected by validation.
        (LogOutput::Stdout | LogOutput::File, _) => Ok(BoxMakeWriter::new(std::io::stdout)),
    }
}

fn span_events(config: &SpanEventConfig) -> FmtSpan {
    [
        (config.new, FmtSpan::NEW),
        (config.enter, FmtSpan::ENTER),
        (config.exit, FmtSpan::EXIT),
        (config.close, FmtSpan::CLOSE),
    ]
    .into_iter()
    .filter(|(on, _)| *on)
    .fold(FmtSpan::NONE, |acc, (_, span)| acc | span)
}

fn rotation(rotation: LogRotation) -> Rotation {
    match rotation {
        LogRotation::Never => Rotation::NEVER,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_filter_levels() {
        let mut config = LoggingConfig {
            level: LogLevel::Warn,
            ..Default::default()
        };
        config
            .filters
            .insert("chime_framework".to_string(), LogLevel::Trace);

        let rendered = filter(&config, None).to_string();
        assert!(rendered.contains("warn"), "{rendered}");
        assert!(rendered.contains("chime_framework=trace"), "{rendered}");

        let rendered = filter(&config, Some("sqlx=debug")).to_string();
        assert!(rendered.contains("sqlx=debug"), "{rendered}");
        assert!(rendered.contains("chime_framework=trace"), "{rendered}");
    }

    #[test]
    fn test_span_events() {
        assert_eq!(span_events(&SpanEventConfig::default()), FmtSpan::NONE);
        assert_eq!(
            span_events(&SpanEventConfig {
                new: true,
                close: true,
                ..Default::default()
            }),
            FmtSpan::NEW | FmtSpan::CLOSE
        );
    }

    #[test]
    fn test_file_writer() {
        let dir = std::env::temp_dir().join(format!("chime-log-{}", std::process::id()));
        let config = LoggingConfig {
            output: LogOutput::File,
            file_path: Some(dir.join("bot.log")),
            rotation: LogRotation::Daily,
            ..Default::default()
        };

        assert!(writer(&config).is_ok());
        assert!(dir.is_dir());
        let _ = std::fs::remove_dir_all(dir);
    }
}
