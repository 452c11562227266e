//! Telemetry setup

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LogSettings};
use crate::error::AppError;

/// Installs the global subscriber. `RUST_LOG` takes precedence over `log.level`.
///
/// The returned guard flushes the file appender and must be held until exit.
pub fn init_telemetry(settings: &LogSettings) -> Result<Option<WorkerGuard>, AppError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| AppError::TelemetryError(e.to_string()))?;

    let (writer, guard) = match &settings.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "crm-server.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (fmt::writer::BoxMakeWriter::new(writer), Some(guard))
        }
        None => (fmt::writer::BoxMakeWriter::new(std::io::stdout), None),
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match settings.format {
        LogFormat::Json => registry.with(fmt::layer().json().with_writer(writer)).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty().with_writer(writer)).try_init(),
    };
    result.map_err(|e| AppError::TelemetryError(e.to_string()))?;

    Ok(guard)
}
