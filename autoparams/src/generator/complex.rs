//! Generators for composite types and enumerations.

use rand::Rng;

use crate::construct::{ConstructionStrategy, Constructor, TypeShape};
use crate::context::ResolutionContext;
use crate::error::ResolutionError;
use crate::generator::ObjectGenerator;
use crate::query::ObjectQuery;
use crate::types::TypeQuery;
use crate::value::{GenerationResult, Value};

/// Builds composite types through a selected constructor.
///
/// Each constructor parameter is resolved through the context's current
/// generator, in declaration order, so nested customizations apply.
#[derive(Clone)]
pub struct ComplexObjectGenerator {
    strategy: ConstructionStrategy,
}

impl ComplexObjectGenerator {
    pub fn new(strategy: ConstructionStrategy) -> Self {
        Self { strategy }
    }

    /// Prefer primary constructors, then the fewest parameters
    pub fn defensive() -> Self {
        Self::new(ConstructionStrategy::defensive())
    }

    /// Prefer the most parameters
    pub fn aggressive() -> Self {
        Self::new(ConstructionStrategy::aggressive())
    }
}

impl Default for ComplexObjectGenerator {
    fn default() -> Self {
        Self::defensive()
    }
}

impl ObjectGenerator for ComplexObjectGenerator {
    fn generate(
        &self,
        query: &ObjectQuery,
        context: &mut ResolutionContext,
    ) -> Result<GenerationResult, ResolutionError> {
        let Some(descriptor) = query.type_query().describe() else {
            return Ok(GenerationResult::Empty);
        };
        let Some(constructor) = self.strategy.select(&descriptor) else {
            return Ok(GenerationResult::Empty);
        };

        let value = construct(constructor, query.type_query(), context)?;
        Ok(GenerationResult::produced(value, "ComplexObjectGenerator"))
    }
}

/// Picks a random variant and resolves its fields
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumGenerator;

impl ObjectGenerator for EnumGenerator {
    fn generate(
        &self,
        query: &ObjectQuery,
        context: &mut ResolutionContext,
    ) -> Result<GenerationResult, ResolutionError> {
        let Some(descriptor) = query.type_query().describe() else {
            return Ok(GenerationResult::Empty);
        };
        let TypeShape::Enumeration(variants) = descriptor.shape() else {
            return Ok(GenerationResult::Empty);
        };
        if variants.is_empty() {
            return Ok(GenerationResult::Empty);
        }

        let index = context.rng().gen_range(0..variants.len());
        let value = construct(variants[index].constructor(), query.type_query(), context)?;
        Ok(GenerationResult::produced(value, "EnumGenerator"))
    }
}

/// Resolve every parameter of `constructor` and invoke it
pub(crate) fn construct(
    constructor: &Constructor,
    target: &TypeQuery,
    context: &mut ResolutionContext,
) -> Result<Value, ResolutionError> {
    let mut arguments = Vec::with_capacity(constructor.parameter_count());
    for parameter in constructor.parameters() {
        arguments.push(context.resolve_query(&ObjectQuery::from_parameter(parameter.clone()))?);
    }
    constructor
        .invoke(arguments)
        .map_err(|source| ResolutionError::construction_failed(target.to_string(), source))
}
