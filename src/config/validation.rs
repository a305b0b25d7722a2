use std::net::SocketAddr;

use url::Url;

use crate::config::models::{AppConfig, ServiceConfig};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Application configuration validator
pub struct AppConfigValidator;

impl AppConfigValidator {
    /// Validate the entire application configuration
    pub fn validate(config: &AppConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&config.gateway.listen_addr) {
            errors.push(e);
        }
        for (section, service) in [
            ("auth_service", &config.auth_service),
            ("patient_service", &config.patient_service),
        ] {
            if let Err(mut service_errors) = Self::validate_service(section, service) {
                errors.append(&mut service_errors);
            }
        }

        if Url::parse(&config.registry.url).is_err() {
            errors.push(ValidationError::InvalidField {
                field: "registry.url".to_string(),
                message: "Must be an absolute URL (e.g., 'http://localhost:8500')".to_string(),
            });
        }

        if config.token.secret.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "token.secret".to_string(),
            });
        }
        if config.token.ttl_secs <= 0 {
            errors.push(ValidationError::InvalidField {
                field: "token.ttl_secs".to_string(),
                message: "Must be a positive number of seconds".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    fn validate_service(
        section: &str,
        service: &ServiceConfig,
    ) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&service.listen_addr) {
            errors.push(e);
        }
        if service.advertise_addr.is_empty() {
            errors.push(ValidationError::MissingField {
                field: format!("{section}.advertise_addr"),
            });
        }
        // Registry probe intervals look like "10s", "1m", "500ms".
        if !Self::is_duration_notation(&service.check_interval) {
            errors.push(ValidationError::InvalidField {
                field: format!("{section}.check_interval"),
                message: "Must be a duration like '10s'".to_string(),
            });
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Validate listen address format
    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:5000')".to_string(),
            });
        }
        Ok(())
    }

    fn is_duration_notation(value: &str) -> bool {
        let digits = value.trim_end_matches(|c: char| c.is_ascii_alphabetic());
        let unit = &value[digits.len()..];
        !digits.is_empty()
            && digits.chars().all(|c| c.is_ascii_digit())
            && matches!(unit, "ms" | "s" | "m" | "h")
    }

    /// Format multiple validation errors into a single message
    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.token.secret = "test-secret".to_string();
        config
    }

    #[test]
    fn test_defaults_with_secret_are_valid() {
        assert!(AppConfigValidator::validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let mut config = valid_config();
        config.token.secret.clear();
        let err = AppConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("token.secret"));
    }

    #[test]
    fn test_bad_listen_address_rejected() {
        let mut config = valid_config();
        config.gateway.listen_addr = "not-an-address".to_string();
        assert!(AppConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_bad_check_interval_rejected() {
        let mut config = valid_config();
        config.auth_service.check_interval = "ten seconds".to_string();
        let err = AppConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("check_interval"));
    }

    #[test]
    fn test_duration_notation_shapes() {
        assert!(AppConfigValidator::is_duration_notation("10s"));
        assert!(AppConfigValidator::is_duration_notation("500ms"));
        assert!(AppConfigValidator::is_duration_notation("1m"));
        assert!(!AppConfigValidator::is_duration_notation("s"));
        assert!(!AppConfigValidator::is_duration_notation("10"));
        assert!(!AppConfigValidator::is_duration_notation("10d"));
    }

    #[test]
    fn test_errors_are_aggregated() {
        let mut config = valid_config();
        config.gateway.listen_addr = "bad".to_string();
        config.registry.url = "not a url".to_string();
        let err = AppConfigValidator::validate(&config).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("listen address"));
        assert!(message.contains("registry.url"));
    }
}
