//! Configuration validation

use crate::schema::RawConfig;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    ZeroInterval { field: &'static str },

    #[error("warning_threshold {0} must be between 0 and 1")]
    ThresholdOutOfRange(f64),

    #[error("untracked_schemes contains an empty scheme")]
    EmptyScheme,

    #[error("untracked scheme '{0}' must not include ':'")]
    SchemeWithColon(String),
}

/// Validate a raw configuration, collecting every error
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.schedule.flush_interval_seconds == Some(0) {
        errors.push(ValidationError::ZeroInterval {
            field: "flush_interval_seconds",
        });
    }
    if config.schedule.sweep_interval_seconds == Some(0) {
        errors.push(ValidationError::ZeroInterval {
            field: "sweep_interval_seconds",
        });
    }

    if let Some(threshold) = config.defaults.warning_threshold
        && !(0.0..=1.0).contains(&threshold)
    {
        errors.push(ValidationError::ThresholdOutOfRange(threshold));
    }

    if let Some(schemes) = &config.domains.untracked_schemes {
        for scheme in schemes {
            if scheme.trim().is_empty() {
                errors.push(ValidationError::EmptyScheme);
            } else if scheme.contains(':') {
                errors.push(ValidationError::SchemeWithColon(scheme.clone()));
            }
        }
    }

    errors
}
