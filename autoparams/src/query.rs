//! Object queries: what a generator is asked to produce.

use std::fmt;

use crate::construct::ParameterDescriptor;
use crate::types::{Resolvable, TypeQuery};

/// A request for a value, optionally tied to the parameter it will fill
#[derive(Debug, Clone)]
pub struct ObjectQuery {
    query: TypeQuery,
    parameter: Option<ParameterDescriptor>,
}

impl ObjectQuery {
    /// Query for a value of type `T`
    pub fn of<T: Resolvable>() -> Self {
        Self::from_type(T::type_query())
    }

    /// Query for a value of the given type
    pub fn from_type(query: TypeQuery) -> Self {
        Self {
            query,
            parameter: None,
        }
    }

    /// Query for the value of a constructor or test parameter
    pub fn from_parameter(parameter: ParameterDescriptor) -> Self {
        Self {
            query: parameter.query().clone(),
            parameter: Some(parameter),
        }
    }

    /// The requested type
    pub fn type_query(&self) -> &TypeQuery {
        &self.query
    }

    /// The parameter being filled, if any
    pub fn parameter(&self) -> Option<&ParameterDescriptor> {
        self.parameter.as_ref()
    }

    /// The name of the parameter being filled, if any
    pub fn parameter_name(&self) -> Option<&str> {
        self.parameter.as_ref().and_then(ParameterDescriptor::name)
    }
}

impl fmt::Display for ObjectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parameter_name() {
            Some(name) => write!(f, "{} {}", self.query, name),
            None => write!(f, "{}", self.query),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_query_carries_name() {
        let query = ObjectQuery::from_parameter(ParameterDescriptor::named::<String>("city"));

        assert!(query.type_query().is::<String>());
        assert_eq!(query.parameter_name(), Some("city"));
        assert_eq!(query.to_string(), "String city");
    }

    #[test]
    fn test_type_query_has_no_parameter() {
        let query = ObjectQuery::of::<Vec<u8>>();

        assert!(query.parameter().is_none());
        assert_eq!(query.to_string(), "Vec<u8>");
    }
}
