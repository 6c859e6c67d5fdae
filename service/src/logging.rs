use crate::config::{Config, RustEnv};
use log::{LevelFilter, SetLoggerError};
use simplelog::{self, ConfigBuilder, ThreadLogMode};

/// Dependencies whose log output is suppressed unless the relay runs at Trace level.
/// The Redis and Web Push clients log every request at Debug, which drowns out
/// the relay's own event logging.
const FILTERED_MODULES: &[&str] = &[
    "sqlx", "sea_orm", "tower", "hyper", "axum", "redis", "isahc", "web_push",
];

pub struct Logger {}

impl Logger {
    /// Installs the global terminal logger for the relay process.
    ///
    /// Must be called once, before any component starts logging. Returns an
    /// error if another logger has already been installed.
    pub fn init_logger(config: &Config) -> Result<(), SetLoggerError> {
        let apply_filters = Self::should_filter_dependencies(config.log_level_filter);
        let log_config = Self::build_log_config(apply_filters, &config.runtime_env());

        simplelog::TermLogger::init(
            config.log_level_filter,
            log_config,
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        )
    }

    /// Trace shows everything, every other level hides dependency chatter.
    fn should_filter_dependencies(level: LevelFilter) -> bool {
        level != LevelFilter::Trace
    }

    fn build_log_config(apply_filters: bool, runtime_env: &RustEnv) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        // Connection tasks run on the multi-threaded runtime, thread ids make
        // interleaved authentication logs readable during development.
        if *runtime_env == RustEnv::Development {
            builder.set_thread_level(LevelFilter::Debug);
            builder.set_thread_mode(ThreadLogMode::IDs);
        } else {
            builder.set_thread_level(LevelFilter::Off);
        }

        if apply_filters {
            for module in FILTERED_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}
