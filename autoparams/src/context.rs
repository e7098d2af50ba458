//! Per-invocation resolution state.

use std::sync::Arc;

use rand::rngs::StdRng;
use tracing::{debug, info, trace};

use crate::config::{ResolutionConfig, create_resolution_config};
use crate::customization::{Customizer, CustomizerKey};
use crate::error::ResolutionError;
use crate::generator::{SharedGenerator, default_generator};
use crate::query::ObjectQuery;
use crate::rng::create_rng;
use crate::types::{Resolvable, TypeQuery};
use crate::value::{GenerationResult, Value};

/// The state one test invocation resolves values through.
///
/// A context owns the composed generator, a record of the customizers
/// applied to it, the RNG and the stack of queries currently being
/// resolved. It is never shared between invocations.
pub struct ResolutionContext {
    generator: SharedGenerator,
    config: ResolutionConfig,
    rng: StdRng,
    customizers: Vec<&'static str>,
    applied_keys: Vec<CustomizerKey>,
    stack: Vec<TypeQuery>,
}

impl ResolutionContext {
    /// Context over the default pipeline with the global configuration
    pub fn new() -> Self {
        Self::with_config(create_resolution_config())
    }

    /// Context over the default pipeline
    pub fn with_config(config: ResolutionConfig) -> Self {
        Self::with_generator(default_generator(), config)
    }

    /// Context over a custom base generator
    pub fn with_generator(generator: SharedGenerator, config: ResolutionConfig) -> Self {
        let rng = create_rng(config.seed);
        Self {
            generator,
            config,
            rng,
            customizers: Vec::new(),
            applied_keys: Vec::new(),
            stack: Vec::new(),
        }
    }

    pub fn config(&self) -> &ResolutionConfig {
        &self.config
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// The currently composed generator
    pub fn generator(&self) -> SharedGenerator {
        Arc::clone(&self.generator)
    }

    /// Number of queries currently being resolved
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Wrap the composed generator with `customizer`
    pub fn apply_customizer(&mut self, customizer: &dyn Customizer) {
        let name = customizer.name();
        self.generator = customizer.customize(Arc::clone(&self.generator));
        self.customizers.push(name);
        if let Some(key) = customizer.key() {
            self.applied_keys.push(key);
        }
        debug!(customizer = name, "applied customizer");
    }

    /// Apply `customizer` unless one with the same key was already applied
    pub fn apply_customizer_once(&mut self, customizer: &dyn Customizer) -> bool {
        let duplicate = customizer
            .key()
            .is_some_and(|key| self.applied_keys.contains(&key));
        if duplicate {
            return false;
        }
        self.apply_customizer(customizer);
        true
    }

    /// Whether a customizer with this name was applied
    pub fn is_customized_by(&self, name: &str) -> bool {
        self.customizers.iter().any(|applied| *applied == name)
    }

    /// Names of the applied customizers, in application order
    pub fn customizers(&self) -> &[&'static str] {
        &self.customizers
    }

    /// Resolve a value of type `T`
    pub fn resolve<T: Resolvable>(&mut self) -> Result<T, ResolutionError> {
        self.resolve_query(&ObjectQuery::of::<T>())?.downcast::<T>()
    }

    /// Resolve a value for an arbitrary query
    pub fn resolve_query(&mut self, query: &ObjectQuery) -> Result<Value, ResolutionError> {
        let target = query.type_query();
        let occurrences = self.stack.iter().filter(|active| *active == target).count();
        if occurrences >= self.config.max_recursion_depth {
            return match target.absent() {
                Some(absent) => Ok(absent),
                None => Err(ResolutionError::recursive_type(target.clone(), occurrences)),
            };
        }

        trace!(query = %query, depth = self.stack.len(), "resolving");
        self.stack.push(target.clone());
        let generator = Arc::clone(&self.generator);
        let result = generator.generate(query, self);
        self.stack.pop();

        // A cycle that runs through a type with an absent value ends there.
        let result = match result {
            Err(error) if error.is_recursive_type() => match target.absent() {
                Some(absent) => {
                    debug!(query = %query, "recursion depth reached, using absent value");
                    return Ok(absent);
                }
                None => return Err(error),
            },
            result => result?,
        };

        match result {
            GenerationResult::Produced { value, producer } => {
                if self.config.log_resolution {
                    info!(
                        depth = self.stack.len(),
                        query = %query,
                        producer,
                        value = ?value,
                        "resolved"
                    );
                } else {
                    debug!(query = %query, producer, "resolved");
                }
                Ok(value)
            }
            GenerationResult::Empty => Err(ResolutionError::unresolvable(target.clone())),
        }
    }
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::{Constructor, ConstructorKind, ParameterDescriptor, TypeDescriptor};
    use crate::customization::Freeze;
    use crate::types::TypeToken;

    #[derive(Debug, Clone, PartialEq)]
    struct Pair {
        x: i32,
        y: i32,
    }

    impl Resolvable for Pair {
        fn describe() -> Option<TypeDescriptor> {
            Some(TypeDescriptor::composite::<Self>(vec![Constructor::new(
                "new",
                ConstructorKind::Primary,
                vec![
                    ParameterDescriptor::named::<i32>("x"),
                    ParameterDescriptor::named::<i32>("y"),
                ],
                |mut args| {
                    Ok(Pair {
                        x: args.take()?,
                        y: args.take()?,
                    })
                },
            )]))
        }
    }

    #[derive(Debug, Clone)]
    struct Node {
        next: Option<Box<Node>>,
    }

    impl Node {
        fn len(&self) -> usize {
            1 + self.next.as_ref().map_or(0, |next| next.len())
        }
    }

    impl Resolvable for Node {
        fn describe() -> Option<TypeDescriptor> {
            Some(TypeDescriptor::composite::<Self>(vec![Constructor::new(
                "new",
                ConstructorKind::Primary,
                vec![ParameterDescriptor::named::<Option<Box<Node>>>("next")],
                |mut args| Ok(Node { next: args.take()? }),
            )]))
        }
    }

    #[derive(Debug, Clone)]
    struct Loop {
        #[allow(dead_code)]
        next: Box<Loop>,
    }

    impl Resolvable for Loop {
        fn describe() -> Option<TypeDescriptor> {
            Some(TypeDescriptor::composite::<Self>(vec![Constructor::new(
                "new",
                ConstructorKind::Primary,
                vec![ParameterDescriptor::named::<Box<Loop>>("next")],
                |mut args| Ok(Loop { next: args.take()? }),
            )]))
        }
    }

    fn seeded() -> ResolutionContext {
        ResolutionContext::with_config(ResolutionConfig::default().with_seed(2024))
    }

    #[test]
    fn test_resolve_fills_every_field() {
        let pair: Pair = seeded().resolve().unwrap();
        assert_ne!(pair.x, 0);
        assert_ne!(pair.y, 0);
    }

    #[test]
    fn test_same_seed_same_values() {
        let first: Pair = seeded().resolve().unwrap();
        let second: Pair = seeded().resolve().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unresolvable_names_query() {
        let error = seeded().resolve::<TypeToken>().unwrap_err();
        match error {
            ResolutionError::Unresolvable { query } => assert!(query.is::<TypeToken>()),
            other => panic!("unexpected error: {}", other),
        }
    }

    fn shallow() -> ResolutionContext {
        ResolutionContext::with_config(
            ResolutionConfig::default()
                .with_seed(3)
                .with_max_recursion_depth(4),
        )
    }

    #[test]
    fn test_optional_cycle_ends_with_none() {
        let mut context = shallow();

        let node: Node = context.resolve().unwrap();
        assert_eq!(node.len(), 4);
        assert_eq!(context.depth(), 0);
    }

    #[test]
    fn test_required_cycle_is_an_error() {
        let mut context = shallow();

        let error = context.resolve::<Loop>().unwrap_err();
        assert!(matches!(error, ResolutionError::RecursiveType { depth: 4, .. }));
        assert!(error.is_recursive_type());
        assert_eq!(context.depth(), 0);
    }

    #[test]
    fn test_customizer_bookkeeping() {
        let mut context = seeded();
        let freeze = Freeze::value(7i32);

        assert!(context.apply_customizer_once(&freeze));
        assert!(!context.apply_customizer_once(&freeze));
        assert_eq!(context.customizers().len(), 1);
        assert!(context.is_customized_by(freeze.name()));

        let pair: Pair = context.resolve().unwrap();
        assert_eq!(pair, Pair { x: 7, y: 7 });
    }

    #[test]
    fn test_freezes_of_different_types_both_apply() {
        let mut context = seeded();

        assert!(context.apply_customizer_once(&Freeze::value(7u8)));
        assert!(context.apply_customizer_once(&Freeze::value(String::from("fixed"))));
        assert!(!context.apply_customizer_once(&Freeze::value(8u8)));

        assert_eq!(context.resolve::<u8>().unwrap(), 7);
        assert_eq!(context.resolve::<String>().unwrap(), "fixed");
    }
}
