//! Generator for collection types.

use crate::construct::{ConstructorArgs, TypeShape};
use crate::context::ResolutionContext;
use crate::error::ResolutionError;
use crate::generator::ObjectGenerator;
use crate::query::ObjectQuery;
use crate::value::GenerationResult;

/// Fills collection types with `collection_size` resolved entries.
///
/// Set-like and map-like collections deduplicate entries, so they may end
/// up smaller than the configured size.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionGenerator;

impl ObjectGenerator for CollectionGenerator {
    fn generate(
        &self,
        query: &ObjectQuery,
        context: &mut ResolutionContext,
    ) -> Result<GenerationResult, ResolutionError> {
        let Some(descriptor) = query.type_query().describe() else {
            return Ok(GenerationResult::Empty);
        };
        let TypeShape::Collection(shape) = descriptor.shape() else {
            return Ok(GenerationResult::Empty);
        };

        let size = context.config().collection_size;
        let mut entries = Vec::with_capacity(size);
        for _ in 0..size {
            let mut values = Vec::with_capacity(shape.components().len());
            for component in shape.components() {
                values.push(context.resolve_query(&ObjectQuery::from_type(component.clone()))?);
            }
            entries.push(ConstructorArgs::new(values));
        }

        let value = shape.assemble(entries).map_err(|source| {
            ResolutionError::construction_failed(query.type_query().to_string(), source)
        })?;
        Ok(GenerationResult::produced(value, "CollectionGenerator"))
    }
}
