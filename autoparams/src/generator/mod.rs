//! Object generators and their composition.
//!
//! Every generator either produces a value for a query or returns
//! [`GenerationResult::Empty`] to let the next generator try. The default
//! pipeline is a [`CompositeObjectGenerator`] over the built-in generators;
//! customizers wrap it to change behavior for particular types.

use std::any::Any;
use std::sync::Arc;

use crate::context::ResolutionContext;
use crate::error::ResolutionError;
use crate::query::ObjectQuery;
use crate::source::asset_converter_generator;
use crate::types::{Resolvable, TypeKey, TypeQuery};
use crate::value::{GenerationResult, Value};

pub mod collections;
pub mod complex;
pub mod primitives;

pub use collections::CollectionGenerator;
pub use complex::{ComplexObjectGenerator, EnumGenerator};
pub use primitives::primitive_generators;

/// Produces values for the queries it recognizes
pub trait ObjectGenerator: Send + Sync {
    /// Produce a value for `query`, or return an empty result to decline
    fn generate(
        &self,
        query: &ObjectQuery,
        context: &mut ResolutionContext,
    ) -> Result<GenerationResult, ResolutionError>;
}

/// Shared handle to a generator
pub type SharedGenerator = Arc<dyn ObjectGenerator>;

/// Generator backed by a closure
pub struct FnGenerator<F> {
    function: F,
}

/// Create a generator from a closure
pub fn from_fn<F>(function: F) -> FnGenerator<F>
where
    F: Fn(&ObjectQuery, &mut ResolutionContext) -> Result<GenerationResult, ResolutionError>
        + Send
        + Sync,
{
    FnGenerator { function }
}

impl<F> ObjectGenerator for FnGenerator<F>
where
    F: Fn(&ObjectQuery, &mut ResolutionContext) -> Result<GenerationResult, ResolutionError>
        + Send
        + Sync,
{
    fn generate(
        &self,
        query: &ObjectQuery,
        context: &mut ResolutionContext,
    ) -> Result<GenerationResult, ResolutionError> {
        (self.function)(query, context)
    }
}

/// Tries its generators in order; the first non-empty result wins
#[derive(Clone, Default)]
pub struct CompositeObjectGenerator {
    generators: Vec<SharedGenerator>,
}

impl CompositeObjectGenerator {
    /// Compose generators, highest priority first
    pub fn new(generators: Vec<SharedGenerator>) -> Self {
        Self { generators }
    }

    /// Number of composed generators
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// Whether nothing is composed
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl ObjectGenerator for CompositeObjectGenerator {
    fn generate(
        &self,
        query: &ObjectQuery,
        context: &mut ResolutionContext,
    ) -> Result<GenerationResult, ResolutionError> {
        for generator in &self.generators {
            let result = generator.generate(query, context)?;
            if !result.is_empty() {
                return Ok(result);
            }
        }
        Ok(GenerationResult::Empty)
    }
}

/// How a [`TypeMatchingGenerator`] recognizes a query
#[derive(Debug, Clone)]
pub enum TypeMatch {
    /// The exact instantiated type
    Exact(TypeKey),
    /// Any instantiation of a parameterized type with this raw name
    Raw(&'static str),
}

impl TypeMatch {
    pub fn exact<T: Any>() -> Self {
        TypeMatch::Exact(TypeKey::of::<T>())
    }

    pub fn raw(name: &'static str) -> Self {
        TypeMatch::Raw(name)
    }

    pub fn matches(&self, query: &TypeQuery) -> bool {
        match self {
            TypeMatch::Exact(key) => query.key() == *key,
            TypeMatch::Raw(name) => query.matches_raw(name),
        }
    }
}

type MatchingFactory = Arc<
    dyn Fn(&ObjectQuery, &mut ResolutionContext) -> Result<Value, ResolutionError> + Send + Sync,
>;

/// Produces values for a fixed set of types and declines everything else
#[derive(Clone)]
pub struct TypeMatchingGenerator {
    candidates: Vec<TypeMatch>,
    factory: MatchingFactory,
}

impl TypeMatchingGenerator {
    /// Generator for any of `candidates`, built by a type-erased factory
    pub fn new<F>(candidates: Vec<TypeMatch>, factory: F) -> Self
    where
        F: Fn(&ObjectQuery, &mut ResolutionContext) -> Result<Value, ResolutionError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            candidates,
            factory: Arc::new(factory),
        }
    }

    /// Generator for exactly `T`
    pub fn create<T, F>(factory: F) -> Self
    where
        T: Resolvable,
        F: Fn(&ObjectQuery, &mut ResolutionContext) -> Result<T, ResolutionError>
            + Send
            + Sync
            + 'static,
    {
        Self::new(
            vec![TypeMatch::exact::<T>()],
            move |query: &ObjectQuery, context: &mut ResolutionContext| {
                factory(query, context).map(Value::new)
            },
        )
    }

    /// Generator that always yields `value` for its type
    pub fn constant<T: Resolvable>(value: T) -> Self {
        Self::create::<T, _>(move |_: &ObjectQuery, _: &mut ResolutionContext| Ok(value.clone()))
    }
}

impl ObjectGenerator for TypeMatchingGenerator {
    fn generate(
        &self,
        query: &ObjectQuery,
        context: &mut ResolutionContext,
    ) -> Result<GenerationResult, ResolutionError> {
        if self
            .candidates
            .iter()
            .any(|candidate| candidate.matches(query.type_query()))
        {
            let value = (self.factory)(query, context)?;
            Ok(GenerationResult::produced(value, "TypeMatchingGenerator"))
        } else {
            Ok(GenerationResult::Empty)
        }
    }
}

/// The built-in pipeline: primitives, services, collections, enums, composites
pub fn default_generator() -> SharedGenerator {
    let mut generators = primitive_generators();
    generators.push(Arc::new(asset_converter_generator()));
    generators.push(Arc::new(CollectionGenerator));
    generators.push(Arc::new(EnumGenerator));
    generators.push(Arc::new(ComplexObjectGenerator::defensive()));
    Arc::new(CompositeObjectGenerator::new(generators))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolutionConfig;

    #[derive(Debug, Clone, PartialEq)]
    struct Label(&'static str);

    impl Resolvable for Label {}

    fn named(name: &'static str) -> SharedGenerator {
        Arc::new(TypeMatchingGenerator::constant(Label(name)))
    }

    fn context_with(generator: SharedGenerator) -> ResolutionContext {
        ResolutionContext::with_generator(generator, ResolutionConfig::default().with_seed(1))
    }

    #[test]
    fn test_composite_first_non_empty_wins() {
        let declining: SharedGenerator =
            Arc::new(from_fn(|_, _| Ok(GenerationResult::Empty)));
        let composite =
            CompositeObjectGenerator::new(vec![declining, named("first"), named("second")]);
        let mut context = context_with(Arc::new(CompositeObjectGenerator::default()));

        let result = composite
            .generate(&ObjectQuery::of::<Label>(), &mut context)
            .unwrap();

        assert_eq!(
            result.value().and_then(|value| value.downcast_ref::<Label>()),
            Some(&Label("first"))
        );
    }

    #[test]
    fn test_composite_all_empty_is_empty() {
        let composite = CompositeObjectGenerator::new(vec![named("only labels")]);
        let mut context = context_with(Arc::new(CompositeObjectGenerator::default()));

        let result = composite
            .generate(&ObjectQuery::of::<u64>(), &mut context)
            .unwrap();

        assert!(result.is_empty());
        assert!(CompositeObjectGenerator::default().is_empty());
    }

    #[test]
    fn test_type_match_raw_and_exact() {
        assert!(TypeMatch::raw("Vec").matches(&TypeQuery::of::<Vec<String>>()));
        assert!(!TypeMatch::raw("Vec").matches(&TypeQuery::of::<Option<String>>()));
        assert!(TypeMatch::exact::<Vec<u8>>().matches(&TypeQuery::of::<Vec<u8>>()));
        assert!(!TypeMatch::exact::<Vec<u8>>().matches(&TypeQuery::of::<Vec<i8>>()));
    }

    #[test]
    fn test_errors_propagate_through_composite() {
        let failing: SharedGenerator =
            Arc::new(from_fn(|_, _| Err(ResolutionError::internal("boom"))));
        let composite = CompositeObjectGenerator::new(vec![failing, named("never")]);
        let mut context = context_with(Arc::new(CompositeObjectGenerator::default()));

        let error = composite
            .generate(&ObjectQuery::of::<Label>(), &mut context)
            .unwrap_err();
        assert!(matches!(error, ResolutionError::Internal { .. }));
    }
}
