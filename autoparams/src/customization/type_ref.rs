//! Support for `TypeRef<T>` parameters.
//!
//! A `TypeRef<T>` is built from the token of `T`, which plain generation has
//! no way to pick. Two customizers fill the gap: one substitutes the token
//! when a `TypeRef` is generated, the other teaches the asset converter to
//! turn a literal type token into a `TypeRef`.

use std::sync::Arc;

use crate::construct::ParameterDescriptor;
use crate::context::ResolutionContext;
use crate::customization::{CompositeCustomizer, Customizer};
use crate::error::ResolutionError;
use crate::generator::{ObjectGenerator, SharedGenerator, from_fn};
use crate::query::ObjectQuery;
use crate::source::{Asset, AssetConverter, SharedAssetConverter};
use crate::types::{TYPE_REF, TypeQuery, TypeToken};
use crate::value::{GenerationResult, Value};

/// Build the `TypeRef` described by `query` around `token`
fn build_type_ref(query: &TypeQuery, token: TypeToken) -> Result<Value, ResolutionError> {
    let descriptor = query
        .describe()
        .ok_or_else(|| ResolutionError::unresolvable(query.clone()))?;
    let constructor = descriptor
        .constructors()
        .first()
        .ok_or_else(|| ResolutionError::unresolvable(query.clone()))?;

    constructor
        .invoke(vec![Value::new(token)])
        .map_err(|source| ResolutionError::construction_failed(query.to_string(), source))
}

/// Answers every `TypeRef<X>` query with a reference to `X`
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeRefSubstitution;

impl Customizer for TypeRefSubstitution {
    fn customize(&self, generator: SharedGenerator) -> SharedGenerator {
        Arc::new(TypeRefGenerator { inner: generator })
    }
}

struct TypeRefGenerator {
    inner: SharedGenerator,
}

impl ObjectGenerator for TypeRefGenerator {
    fn generate(
        &self,
        query: &ObjectQuery,
        context: &mut ResolutionContext,
    ) -> Result<GenerationResult, ResolutionError> {
        let target = query.type_query();
        match target.as_parameterized() {
            Some(parameterized) if parameterized.raw() == TYPE_REF => {
                let Some(argument) = parameterized.argument(0) else {
                    return self.inner.generate(query, context);
                };
                let value = build_type_ref(target, TypeToken::from(argument))?;
                Ok(GenerationResult::produced(value, "TypeRefSubstitution"))
            }
            _ => self.inner.generate(query, context),
        }
    }
}

/// Decorates the asset converter service with the type-token rule
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeRefAssetCustomizer;

impl Customizer for TypeRefAssetCustomizer {
    fn customize(&self, generator: SharedGenerator) -> SharedGenerator {
        Arc::new(from_fn(
            move |query: &ObjectQuery, context: &mut ResolutionContext| {
                let result = generator.generate(query, context)?;
                if !query.type_query().is::<SharedAssetConverter>() {
                    return Ok(result);
                }
                result.try_map(|value| {
                    let current = value.downcast::<SharedAssetConverter>()?;
                    Ok(Value::new(SharedAssetConverter::new(
                        TypeRefAssetConverter::new(current),
                    )))
                })
            },
        ))
    }
}

/// Converts a type-token asset into a `TypeRef` parameter.
///
/// Every other asset goes to the wrapped converter.
#[derive(Debug, Clone)]
pub struct TypeRefAssetConverter {
    inner: SharedAssetConverter,
}

impl TypeRefAssetConverter {
    pub fn new(inner: SharedAssetConverter) -> Self {
        Self { inner }
    }
}

impl AssetConverter for TypeRefAssetConverter {
    fn convert(
        &self,
        parameter: &ParameterDescriptor,
        asset: Asset,
    ) -> Result<Value, ResolutionError> {
        match asset {
            Asset::Type(token) if parameter.query().matches_raw(TYPE_REF) => {
                build_type_ref(parameter.query(), token)
            }
            other => self.inner.convert(parameter, other),
        }
    }
}

/// Both `TypeRef` customizations
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeRefCustomizer;

impl Customizer for TypeRefCustomizer {
    fn customize(&self, generator: SharedGenerator) -> SharedGenerator {
        CompositeCustomizer::default()
            .with(TypeRefSubstitution)
            .with(TypeRefAssetCustomizer)
            .customize(generator)
    }
}
