//! Customizers: functions from generator to generator.
//!
//! A customizer wraps the composed generator of a context. Customizers
//! applied later become outer layers, so they see each query first and
//! delegate unchanged when they do not handle it.

use std::any::type_name;
use std::sync::Arc;

use crate::generator::{CompositeObjectGenerator, SharedGenerator};
use crate::types::TypeKey;

pub mod aggressive;
pub mod freeze;
pub mod type_ref;

pub use aggressive::ResolveConstructorAggressively;
pub use freeze::{Freeze, Matching};
pub use type_ref::{
    TypeRefAssetConverter, TypeRefAssetCustomizer, TypeRefCustomizer, TypeRefSubstitution,
};

/// What makes two customizers "the same" for [`ResolutionContext::apply_customizer_once`]
///
/// [`ResolutionContext::apply_customizer_once`]: crate::ResolutionContext::apply_customizer_once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomizerKey {
    name: &'static str,
    target: Option<TypeKey>,
    detail: Option<String>,
}

impl CustomizerKey {
    pub fn named(name: &'static str) -> Self {
        Self {
            name,
            target: None,
            detail: None,
        }
    }

    /// Distinguish customizers of one kind by the type they act on
    pub fn with_target(mut self, target: TypeKey) -> Self {
        self.target = Some(target);
        self
    }

    /// Distinguish customizers of one kind by any other setting
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Transforms the composed generator of a context
pub trait Customizer: Send + Sync {
    /// Wrap `generator`, returning the new composed generator
    fn customize(&self, generator: SharedGenerator) -> SharedGenerator;

    /// Name recorded by the context when the customizer is applied
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    /// Key for applying the customizer at most once, `None` when every
    /// instance counts as distinct
    fn key(&self) -> Option<CustomizerKey> {
        Some(CustomizerKey::named(self.name()))
    }
}

/// Shared handle to a customizer
pub type SharedCustomizer = Arc<dyn Customizer>;

/// Applies its members in declaration order
#[derive(Clone, Default)]
pub struct CompositeCustomizer {
    customizers: Vec<SharedCustomizer>,
}

impl CompositeCustomizer {
    pub fn new(customizers: Vec<SharedCustomizer>) -> Self {
        Self { customizers }
    }

    /// Append a customizer, which becomes the outermost layer
    pub fn with<C: Customizer + 'static>(mut self, customizer: C) -> Self {
        self.customizers.push(Arc::new(customizer));
        self
    }
}

impl Customizer for CompositeCustomizer {
    fn customize(&self, generator: SharedGenerator) -> SharedGenerator {
        self.customizers
            .iter()
            .fold(generator, |generator, customizer| customizer.customize(generator))
    }

    fn key(&self) -> Option<CustomizerKey> {
        None
    }
}

/// Customizer backed by a closure
pub struct FnCustomizer<F> {
    function: F,
}

/// Create a customizer from a closure
pub fn customizer_fn<F>(function: F) -> FnCustomizer<F>
where
    F: Fn(SharedGenerator) -> SharedGenerator + Send + Sync,
{
    FnCustomizer { function }
}

impl<F> Customizer for FnCustomizer<F>
where
    F: Fn(SharedGenerator) -> SharedGenerator + Send + Sync,
{
    fn customize(&self, generator: SharedGenerator) -> SharedGenerator {
        (self.function)(generator)
    }

    fn key(&self) -> Option<CustomizerKey> {
        None
    }
}

/// Puts a generator in front of the composed one
#[derive(Clone)]
pub struct GeneratorCustomizer {
    generator: SharedGenerator,
}

impl GeneratorCustomizer {
    pub fn new(generator: SharedGenerator) -> Self {
        Self { generator }
    }
}

impl Customizer for GeneratorCustomizer {
    fn customize(&self, generator: SharedGenerator) -> SharedGenerator {
        Arc::new(CompositeObjectGenerator::new(vec![
            Arc::clone(&self.generator),
            generator,
        ]))
    }

    fn key(&self) -> Option<CustomizerKey> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolutionConfig;
    use crate::context::ResolutionContext;
    use crate::generator::TypeMatchingGenerator;

    fn constant(value: u32) -> GeneratorCustomizer {
        GeneratorCustomizer::new(Arc::new(TypeMatchingGenerator::constant(value)))
    }

    #[test]
    fn test_last_customizer_is_outermost() {
        let composite = CompositeCustomizer::default()
            .with(constant(1))
            .with(constant(2));

        let mut context =
            ResolutionContext::with_config(ResolutionConfig::default().with_seed(8));
        context.apply_customizer(&composite);

        assert_eq!(context.resolve::<u32>().unwrap(), 2);
    }

    #[test]
    fn test_generator_customizer_keeps_fallback() {
        let mut context =
            ResolutionContext::with_config(ResolutionConfig::default().with_seed(8));
        context.apply_customizer(&constant(5));

        assert_eq!(context.resolve::<u32>().unwrap(), 5);
        assert_eq!(context.resolve::<Vec<u32>>().unwrap(), vec![5, 5, 5]);
        assert!(context.resolve::<String>().is_ok());
    }

    #[test]
    fn test_closure_customizer() {
        let swallow_all =
            customizer_fn(|_| Arc::new(CompositeObjectGenerator::default()) as SharedGenerator);
        let mut context =
            ResolutionContext::with_config(ResolutionConfig::default().with_seed(8));
        context.apply_customizer(&swallow_all);

        assert!(context.resolve::<u32>().unwrap_err().is_unresolvable());
    }
}
