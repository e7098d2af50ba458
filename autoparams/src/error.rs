//! Error types for resolution, construction and argument assembly.

use std::fmt;

use crate::config::ConfigError;
use crate::descriptor::DescriptorError;
use crate::types::TypeQuery;

/// Failure raised by a constructor or collection assembler while building a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructionError {
    message: String,
}

impl ConstructionError {
    /// Create a construction error with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message supplied by the failing constructor
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ConstructionError {}

/// Comprehensive error type for value resolution failures
#[derive(Debug, Clone)]
pub enum ResolutionError {
    /// No generator in the composed chain claimed the query
    Unresolvable { query: TypeQuery },

    /// The selected constructor rejected the resolved arguments
    ConstructionFailed {
        type_name: String,
        source: ConstructionError,
    },

    /// The query re-entered itself more often than the configured depth allows
    RecursiveType { query: TypeQuery, depth: usize },

    /// A produced value did not have the expected Rust type
    TypeMismatch { expected: String, actual: String },

    /// A literal asset could not be converted into the parameter type
    AssetConversion { parameter: String, message: String },

    /// A literal source could not produce its rows
    Source { message: String },

    /// A descriptor adapter could not be created or queried
    Descriptor(DescriptorError),

    /// Invalid configuration
    Config(ConfigError),

    /// Internal error, e.g. a generation worker panicked
    Internal { message: String },
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionError::Unresolvable { query } => write!(
                f,
                "Object cannot be created with the given query '{}'. \
                 This can happen if the query represents a type without declared constructors",
                query
            ),
            ResolutionError::ConstructionFailed { type_name, source } => {
                write!(f, "Construction of '{}' failed: {}", type_name, source)
            }
            ResolutionError::RecursiveType { query, depth } => write!(
                f,
                "Recursive type '{}' exceeded the maximum recursion depth of {}",
                query, depth
            ),
            ResolutionError::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {}, found {}", expected, actual)
            }
            ResolutionError::AssetConversion { parameter, message } => {
                write!(f, "Asset conversion failed for '{}': {}", parameter, message)
            }
            ResolutionError::Source { message } => write!(f, "Source error: {}", message),
            ResolutionError::Descriptor(error) => write!(f, "Descriptor error: {}", error),
            ResolutionError::Config(error) => write!(f, "Configuration error: {}", error),
            ResolutionError::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for ResolutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolutionError::ConstructionFailed { source, .. } => Some(source),
            ResolutionError::Descriptor(error) => Some(error),
            ResolutionError::Config(error) => Some(error),
            _ => None,
        }
    }
}

impl From<DescriptorError> for ResolutionError {
    fn from(error: DescriptorError) -> Self {
        ResolutionError::Descriptor(error)
    }
}

impl From<ConfigError> for ResolutionError {
    fn from(error: ConfigError) -> Self {
        ResolutionError::Config(error)
    }
}

/// Helper functions for creating ResolutionError instances
impl ResolutionError {
    /// Create an unresolvable-type error naming the query
    pub fn unresolvable(query: TypeQuery) -> Self {
        Self::Unresolvable { query }
    }

    /// Create a construction failure for the named type
    pub fn construction_failed(type_name: impl Into<String>, source: ConstructionError) -> Self {
        Self::ConstructionFailed {
            type_name: type_name.into(),
            source,
        }
    }

    /// Create a recursive-type error
    pub fn recursive_type(query: TypeQuery, depth: usize) -> Self {
        Self::RecursiveType { query, depth }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an asset conversion error for the named parameter
    pub fn asset_conversion(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AssetConversion {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a literal source error
    pub fn source_error(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error reports a query no generator could satisfy
    pub fn is_unresolvable(&self) -> bool {
        matches!(self, ResolutionError::Unresolvable { .. })
    }

    /// Whether the error comes from exceeding the recursion depth
    pub fn is_recursive_type(&self) -> bool {
        matches!(self, ResolutionError::RecursiveType { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolvable_display_names_query() {
        let error = ResolutionError::unresolvable(TypeQuery::of::<String>());
        let message = error.to_string();
        assert!(message.contains("'String'"));
        assert!(error.is_unresolvable());
    }

    #[test]
    fn test_construction_failed_keeps_source() {
        use std::error::Error;

        let error = ResolutionError::construction_failed(
            "Temperature",
            ConstructionError::new("below absolute zero"),
        );

        assert_eq!(
            error.to_string(),
            "Construction of 'Temperature' failed: below absolute zero"
        );
        let source = error.source().map(|source| source.to_string());
        assert_eq!(source.as_deref(), Some("below absolute zero"));
    }

    #[test]
    fn test_recursive_type_display() {
        let error = ResolutionError::recursive_type(TypeQuery::of::<i32>(), 8);
        assert_eq!(
            error.to_string(),
            "Recursive type 'i32' exceeded the maximum recursion depth of 8"
        );
    }

    #[test]
    fn test_config_error_conversion() {
        let error: ResolutionError = ConfigError::InvalidRepeat(0).into();
        assert!(matches!(
            error,
            ResolutionError::Config(ConfigError::InvalidRepeat(0))
        ));
    }
}
