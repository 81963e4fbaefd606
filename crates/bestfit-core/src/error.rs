//! Error types shared across bestfit crates.

use thiserror::Error;

/// Result type alias for request validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// A selection request was rejected before any provider call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("a {0} option is missing")]
    MissingField(&'static str),

    #[error("{field} must be a finite number >= 0, got {value}")]
    InvalidResource { field: &'static str, value: f64 },

    #[error("max_interruption_frequency must be within 0..=100, got {0}")]
    InvalidInterruptionFrequency(u32),

    #[error("product descriptions must map to exactly one operating system, got: {0}")]
    MixedOperatingSystems(String),

    #[error("at least one product description is required")]
    NoProductDescriptions,

    #[error("limit must be greater than zero")]
    ZeroLimit,

    #[error("unknown {kind}: {value}")]
    UnknownValue { kind: &'static str, value: String },

    #[error("malformed request: {0}")]
    Malformed(String),
}

/// Selector configuration could not be loaded or is inconsistent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown region: {0}")]
    UnknownRegion(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{field} must be at most {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        max: u64,
    },
}

/// Failure reported by a catalog, pricing, or spot-history provider.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    #[error("provider rejected credentials: {0}")]
    Unauthorized(String),

    #[error("provider does not serve region {0}")]
    InvalidRegion(String),

    #[error("provider throttled the request: {0}")]
    Throttled(String),

    #[error("provider request timed out: {0}")]
    Timeout(String),

    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response for {instance_type}: {reason}")]
    Malformed { instance_type: String, reason: String },
}

impl ProviderError {
    /// Errors worth retrying at the provider boundary.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Throttled(_) | ProviderError::Timeout(_))
    }

    /// Errors that abort the whole selection call. A malformed payload for
    /// one instance type only excludes that type.
    pub fn is_call_fatal(&self) -> bool {
        !matches!(self, ProviderError::Malformed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors() {
        assert!(ProviderError::Throttled("rate".into()).is_transient());
        assert!(ProviderError::Timeout("slow".into()).is_transient());
        assert!(!ProviderError::Unauthorized("bad key".into()).is_transient());
        assert!(
            !ProviderError::RetriesExhausted {
                attempts: 3,
                last: "throttled".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn only_malformed_is_per_item() {
        let malformed = ProviderError::Malformed {
            instance_type: "m5.large".into(),
            reason: "price is not a number".into(),
        };
        assert!(!malformed.is_call_fatal());
        assert!(ProviderError::InvalidRegion("xx-1".into()).is_call_fatal());
        assert!(ProviderError::Transport("reset".into()).is_call_fatal());
    }

    #[test]
    fn missing_field_message() {
        assert_eq!(
            ValidationError::MissingField("vcpu").to_string(),
            "a vcpu option is missing"
        );
    }
}
