use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
        }
    }
}

/// Installs the global subscriber. Logs go to stderr so they never mix with
/// the study prompts on stdout. Calling it again is a no-op.
pub fn init_tracing(config: &LogConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    let registry = Registry::default().with(env_filter).with(stderr_layer);

    if config.enable_file_logs {
        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("flashcard-srs")
            .filename_suffix("log")
            .max_log_files(30)
            .build(&config.log_dir);
        let file_appender = match file_appender {
            Ok(appender) => appender,
            Err(e) => {
                eprintln!("file logging disabled, cannot open {}: {e}", config.log_dir);
                init_registry(registry);
                return;
            }
        };
        let file_layer = fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .json();
        init_registry(registry.with(file_layer));
    } else {
        init_registry(registry);
    }
}

fn init_registry<S: SubscriberInitExt>(subscriber: S) {
    // An already-installed subscriber (tests, repeated init) is fine.
    if let Err(e) = subscriber.try_init() {
        let msg = e.to_string();
        if !msg.contains("already been set") {
            eprintln!("failed to initialize tracing: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let cfg = LogConfig::default();
        init_tracing(&cfg);
        init_tracing(&cfg);
    }

    #[test]
    fn file_logs_into_temp_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = LogConfig {
            log_level: "debug".to_string(),
            enable_file_logs: true,
            log_dir: dir.path().to_string_lossy().to_string(),
        };
        init_tracing(&cfg);
        tracing::debug!("file logging smoke test");
    }
}
