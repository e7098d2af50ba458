//! Reuse of one value for later requests of its type.

use std::fmt;
use std::sync::Arc;

use crate::context::ResolutionContext;
use crate::customization::{Customizer, CustomizerKey};
use crate::error::ResolutionError;
use crate::generator::{ObjectGenerator, SharedGenerator};
use crate::query::ObjectQuery;
use crate::types::{Resolvable, TypeQuery};
use crate::value::{GenerationResult, Value};

type QueryPredicate = Arc<dyn Fn(&ObjectQuery) -> bool + Send + Sync>;

/// Which queries of the frozen type receive the frozen value.
///
/// The requested type must always equal the frozen type; a matching narrows
/// that further.
#[derive(Clone)]
pub enum Matching {
    /// Every query for the frozen type
    ExactType,
    /// Only parameters with this name
    ParameterName(String),
    /// Only queries the predicate accepts
    Predicate(QueryPredicate),
}

impl Matching {
    pub fn parameter_name(name: impl Into<String>) -> Self {
        Matching::ParameterName(name.into())
    }

    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&ObjectQuery) -> bool + Send + Sync + 'static,
    {
        Matching::Predicate(Arc::new(predicate))
    }

    /// Whether `query` is answered by the frozen value
    pub fn accepts(&self, query: &ObjectQuery) -> bool {
        match self {
            Matching::ExactType => true,
            Matching::ParameterName(name) => query.parameter_name() == Some(name.as_str()),
            Matching::Predicate(predicate) => predicate(query),
        }
    }
}

impl fmt::Debug for Matching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matching::ExactType => f.write_str("ExactType"),
            Matching::ParameterName(name) => f.debug_tuple("ParameterName").field(name).finish(),
            Matching::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Answers queries for one type with a fixed value
#[derive(Debug, Clone)]
pub struct Freeze {
    query: TypeQuery,
    value: Value,
    matching: Matching,
}

impl Freeze {
    /// Freeze an already produced value of the given type
    pub fn new(query: TypeQuery, value: Value) -> Self {
        Self {
            query,
            value,
            matching: Matching::ExactType,
        }
    }

    /// Freeze a typed value
    pub fn value<T: Resolvable>(value: T) -> Self {
        Self::new(T::type_query(), Value::new(value))
    }

    /// Freeze a typed value for the parameters called `name`
    pub fn by_name<T: Resolvable>(name: impl Into<String>, value: T) -> Self {
        Self::value(value).matching(Matching::parameter_name(name))
    }

    /// Restrict the queries that receive the value
    pub fn matching(mut self, matching: Matching) -> Self {
        self.matching = matching;
        self
    }
}

impl Customizer for Freeze {
    fn customize(&self, generator: SharedGenerator) -> SharedGenerator {
        Arc::new(FrozenGenerator {
            query: self.query.clone(),
            value: self.value.clone(),
            matching: self.matching.clone(),
            inner: generator,
        })
    }

    fn key(&self) -> Option<CustomizerKey> {
        let key = CustomizerKey::named(self.name()).with_target(self.query.key());
        match &self.matching {
            Matching::ExactType => Some(key),
            Matching::ParameterName(name) => Some(key.with_detail(name.clone())),
            Matching::Predicate(_) => None,
        }
    }
}

struct FrozenGenerator {
    query: TypeQuery,
    value: Value,
    matching: Matching,
    inner: SharedGenerator,
}

impl ObjectGenerator for FrozenGenerator {
    fn generate(
        &self,
        query: &ObjectQuery,
        context: &mut ResolutionContext,
    ) -> Result<GenerationResult, ResolutionError> {
        if *query.type_query() == self.query && self.matching.accepts(query) {
            Ok(GenerationResult::produced(self.value.clone(), "Freeze"))
        } else {
            self.inner.generate(query, context)
        }
    }
}
