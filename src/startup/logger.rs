//! Startup logging

use crate::config::{Config, ConfigResolution, EnvVars, EnvironmentOverrides, LoggingConfig};
use crate::error::{MetricsError, Result};
use tracing::{info, warn, Subscriber};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logs what the process is about to talk to; never prints credentials
pub struct StartupLogger;

impl StartupLogger {
    pub fn display_startup_info(resolution: &ConfigResolution, version: &str) {
        let config = &resolution.config;
        info!("🚀 vcfo-metrics v{} starting...", version);
        info!("📁 Config file: {:?}", resolution.config_path);

        if resolution.overrides.has_overrides() {
            Self::display_environment_overrides(&resolution.overrides);
        }

        Self::display_instances(config);

        info!(
            "🌐 HTTP: timeout {}s, certificate verification {}",
            config.http.timeout_secs,
            if config.http.accept_invalid_certs {
                "disabled"
            } else {
                "enabled"
            }
        );
        if config.http.accept_invalid_certs {
            warn!("   ⚠️  Invalid TLS certificates will be accepted");
        }

        let intervals = &config.intervals;
        info!(
            "⏱️  Interval policy: 5m ≤ {}h, 15m ≤ {}h, hourly ≤ {}h, daily beyond",
            intervals.five_minute_max_hours,
            intervals.fifteen_minute_max_hours,
            intervals.hourly_max_hours
        );
    }

    fn display_environment_overrides(overrides: &EnvironmentOverrides) {
        info!("🔧 Environment Overrides:");
        for override_info in overrides.get_override_summary() {
            info!("   ✅ {}", override_info);
        }
    }

    fn display_instances(config: &Config) {
        info!("🎯 Monitoring instances ({}):", config.instances.len());
        for (index, instance) in config.instances.iter().enumerate() {
            let marker = if index == 0 { " (default)" } else { "" };
            match instance.major_version {
                Some(version) => info!(
                    "   • {}{} → {} (v{})",
                    instance.name, marker, instance.base_url, version
                ),
                None => info!("   • {}{} → {}", instance.name, marker, instance.base_url),
            }
            if let Some(related) = &instance.related_instance_names {
                if !related.is_empty() {
                    info!("     related: {}", related.join(", "));
                }
            }
        }
    }
}

/// Subscriber for the configuration loading phase, before the logging section is known.
///
/// `RUST_LOG` wins, then the explicit level, then `VCFO_LOG_LEVEL`, then `info`.
pub fn bootstrap_subscriber(level: Option<&str>) -> impl Subscriber + Send + Sync {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level
            .map(str::to_string)
            .or_else(|| std::env::var(EnvVars::LOG_LEVEL).ok())
            .filter(|l| LoggingConfig::validate_level(l).is_ok())
            .unwrap_or_else(|| "info".to_string());
        EnvFilter::new(level.to_lowercase())
    });

    tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr),
    )
}

/// Install the global subscriber; `RUST_LOG` takes precedence over the configured level
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_lowercase()));

    let registry = tracing_subscriber::registry().with(env_filter);

    // stdout carries command output, so logs go to stderr
    let result = if config.format.eq_ignore_ascii_case("json") {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    result.map_err(|e| MetricsError::config(format!("Failed to initialize logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_subscriber_honors_explicit_level() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }

        tracing::subscriber::with_default(bootstrap_subscriber(Some("debug")), || {
            assert!(tracing::enabled!(tracing::Level::DEBUG));
            assert!(!tracing::enabled!(tracing::Level::TRACE));
        });
        tracing::subscriber::with_default(bootstrap_subscriber(Some("warn")), || {
            assert!(tracing::enabled!(tracing::Level::WARN));
            assert!(!tracing::enabled!(tracing::Level::INFO));
        });
    }
}
