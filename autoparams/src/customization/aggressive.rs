//! Switches constructor selection to the aggressive strategy.

use std::sync::Arc;

use crate::customization::Customizer;
use crate::generator::{CompositeObjectGenerator, ComplexObjectGenerator, SharedGenerator};

/// Builds composite types through the constructor with the most parameters.
///
/// Only composite types are affected; every other query reaches the wrapped
/// generator unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveConstructorAggressively;

impl Customizer for ResolveConstructorAggressively {
    fn customize(&self, generator: SharedGenerator) -> SharedGenerator {
        Arc::new(CompositeObjectGenerator::new(vec![
            Arc::new(ComplexObjectGenerator::aggressive()),
            generator,
        ]))
    }
}
