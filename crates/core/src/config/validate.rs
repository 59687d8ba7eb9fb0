use super::{parse_time_of_day, types::Config, ConfigError};
use crate::store::MAX_BATCH_WRITES;
use crate::trending::JobKind;

/// Longest aggregation window, one year.
pub const MAX_WINDOW_HOURS: u32 = 24 * 365;

/// Longest retention period, ten years.
pub const MAX_RETENTION_DAYS: u32 = 3650;

/// Validate semantic constraints serde cannot express.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return invalid("server.port cannot be 0");
    }

    let trending = &config.trending;

    let window_hours = trending.aggregator.window_hours;
    if window_hours == 0 || window_hours > MAX_WINDOW_HOURS {
        return invalid(format!(
            "trending.aggregator.window_hours must be between 1 and {}, got {}",
            MAX_WINDOW_HOURS, window_hours
        ));
    }
    // Every matched term is one write in the aggregation batch
    check_batch_size("trending.aggregator.top_terms", trending.aggregator.top_terms)?;

    let rate = trending.decay.decay_rate;
    if rate.is_nan() || rate <= 0.0 || rate > 1.0 {
        return invalid(format!(
            "trending.decay.decay_rate must be in (0, 1], got {}",
            rate
        ));
    }
    let threshold = trending.decay.min_threshold;
    if threshold.is_nan() || threshold < 0.0 {
        return invalid("trending.decay.min_threshold cannot be negative");
    }
    check_batch_size("trending.decay.batch_size", trending.decay.batch_size)?;

    let retention_days = trending.retention.retention_days;
    if retention_days == 0 || retention_days > MAX_RETENTION_DAYS {
        return invalid(format!(
            "trending.retention.retention_days must be between 1 and {}, got {}",
            MAX_RETENTION_DAYS, retention_days
        ));
    }
    check_batch_size("trending.retention.batch_size", trending.retention.batch_size)?;

    if trending.pool.pool_size == 0 {
        return invalid("trending.pool.pool_size must be greater than 0");
    }

    if config.scheduler.job_timeout_secs == 0 {
        return invalid("scheduler.job_timeout_secs must be greater than 0");
    }
    for kind in JobKind::ALL {
        let at = config.scheduler.at(kind);
        if parse_time_of_day(at).is_none() {
            return invalid(format!(
                "scheduler.{}.at must be HH:MM, got {:?}",
                kind, at
            ));
        }
    }

    Ok(())
}

fn check_batch_size(key: &str, size: usize) -> Result<(), ConfigError> {
    if size == 0 || size > MAX_BATCH_WRITES {
        return invalid(format!(
            "{} must be between 1 and {}, got {}",
            key, MAX_BATCH_WRITES, size
        ));
    }
    Ok(())
}

fn invalid(msg: impl Into<String>) -> Result<(), ConfigError> {
    Err(ConfigError::ValidationError(msg.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(config: &Config, needle: &str) {
        match validate_config(config) {
            Err(ConfigError::ValidationError(msg)) => {
                assert!(msg.contains(needle), "unexpected message: {}", msg)
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_defaults() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        assert_invalid(&config, "server.port");
    }

    #[test]
    fn test_validate_decay_rate_bounds() {
        let mut config = Config::default();

        config.trending.decay.decay_rate = 1.0;
        assert!(validate_config(&config).is_ok());

        config.trending.decay.decay_rate = 0.0;
        assert_invalid(&config, "decay_rate");

        config.trending.decay.decay_rate = 1.5;
        assert_invalid(&config, "decay_rate");

        config.trending.decay.decay_rate = f64::NAN;
        assert_invalid(&config, "decay_rate");
    }

    #[test]
    fn test_validate_negative_threshold_fails() {
        let mut config = Config::default();
        config.trending.decay.min_threshold = -0.1;
        assert_invalid(&config, "min_threshold");
    }

    #[test]
    fn test_validate_batch_size_bounds() {
        let mut config = Config::default();

        config.trending.decay.batch_size = 500;
        assert!(validate_config(&config).is_ok());

        config.trending.decay.batch_size = 501;
        assert_invalid(&config, "trending.decay.batch_size");

        config.trending.decay.batch_size = 300;
        config.trending.retention.batch_size = 0;
        assert_invalid(&config, "trending.retention.batch_size");
    }

    #[test]
    fn test_validate_zero_values_fail() {
        let mut config = Config::default();
        config.trending.aggregator.window_hours = 0;
        assert_invalid(&config, "window_hours");

        let mut config = Config::default();
        config.trending.aggregator.top_terms = 0;
        assert_invalid(&config, "top_terms");

        let mut config = Config::default();
        config.trending.retention.retention_days = 0;
        assert_invalid(&config, "retention_days");

        let mut config = Config::default();
        config.trending.pool.pool_size = 0;
        assert_invalid(&config, "pool_size");

        let mut config = Config::default();
        config.scheduler.job_timeout_secs = 0;
        assert_invalid(&config, "job_timeout_secs");
    }

    #[test]
    fn test_validate_window_caps() {
        let mut config = Config::default();
        config.trending.aggregator.window_hours = MAX_WINDOW_HOURS;
        config.trending.retention.retention_days = MAX_RETENTION_DAYS;
        assert!(validate_config(&config).is_ok());

        config.trending.aggregator.window_hours = u32::MAX;
        assert_invalid(&config, "window_hours");

        let mut config = Config::default();
        config.trending.retention.retention_days = u32::MAX;
        assert_invalid(&config, "retention_days");
    }

    #[test]
    fn test_validate_top_terms_fits_one_batch() {
        let mut config = Config::default();

        config.trending.aggregator.top_terms = MAX_BATCH_WRITES;
        assert!(validate_config(&config).is_ok());

        config.trending.aggregator.top_terms = 600;
        assert_invalid(&config, "trending.aggregator.top_terms");
    }

    #[test]
    fn test_validate_bad_fire_time() {
        let mut config = Config::default();
        config.scheduler.retention.at = Some("5 o'clock".to_string());
        assert_invalid(&config, "scheduler.retention.at");
    }
}
