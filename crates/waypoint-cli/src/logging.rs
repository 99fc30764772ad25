//! Subscriber setup for `tracing`.
//!
//! `RUST_LOG` selects the filter unless `-v` forces one; the fallback is
//! `warn`. Logs go to stderr so stdout stays parseable.

use crate::config::CliConfig;
use tracing_subscriber::EnvFilter;

/// Filter for `config`
#[must_use]
pub fn env_filter(config: &CliConfig) -> EnvFilter {
    match config.verbosity.log_directive() {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    }
}

/// Install the global subscriber; a second call is ignored
pub fn init(config: &CliConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_writer(std::io::stderr)
        .with_target(true);
    let installed = if config.log_json {
        builder.json().try_init()
    } else {
        builder.with_ansi(config.color.should_color()).try_init()
    };
    if installed.is_err() {
        tracing::debug!("subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Verbosity;

    #[test]
    fn test_verbose_overrides_environment() {
        let config = CliConfig::new().with_verbosity(Verbosity::Debug);
        assert!(env_filter(&config).to_string().contains("waypoint=debug"));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let config = CliConfig::new().with_log_json(true);
        init(&config);
        init(&config);
    }
}
