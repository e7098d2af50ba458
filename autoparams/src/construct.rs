//! Construction paths and the strategies that choose between them.
//!
//! A [`TypeDescriptor`] lists the ways a type can be built. For composite
//! types these are [`Constructor`]s; the [`ConstructorExtractor`] decides
//! which of them are candidates and a [`ConstructorResolver`] chain picks
//! one. Selection is pure: the same descriptor always yields the same
//! constructor.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::config::ConfigError;
use crate::customization::Matching;
use crate::error::ConstructionError;
use crate::types::{Resolvable, TypeKey, TypeQuery};
use crate::value::Value;

/// Type-erased constructor body
pub type Factory = Arc<dyn Fn(ConstructorArgs) -> Result<Value, ConstructionError> + Send + Sync>;

/// Type-erased collection assembler
pub type Assembler =
    Arc<dyn Fn(Vec<ConstructorArgs>) -> Result<Value, ConstructionError> + Send + Sync>;

/// Ordered argument values handed to a constructor
#[derive(Debug, Clone, Default)]
pub struct ConstructorArgs {
    values: VecDeque<Value>,
}

impl ConstructorArgs {
    /// Wrap the arguments in declaration order
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values: values.into(),
        }
    }

    /// Take the next argument as a `T`
    pub fn take<T: Resolvable>(&mut self) -> Result<T, ConstructionError> {
        let value = self
            .values
            .pop_front()
            .ok_or_else(|| ConstructionError::new("missing constructor argument"))?;
        value
            .downcast::<T>()
            .map_err(|error| ConstructionError::new(error.to_string()))
    }

    /// Number of arguments not yet taken
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether every argument was taken
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One parameter of a constructor, or of a generated test
#[derive(Debug, Clone)]
pub struct ParameterDescriptor {
    name: Option<String>,
    query: TypeQuery,
    bounds: Option<(i128, i128)>,
    frozen: Option<Matching>,
}

impl ParameterDescriptor {
    /// An unnamed parameter of type `T`
    pub fn of<T: Resolvable>() -> Self {
        Self::from_query(T::type_query())
    }

    /// A named parameter of type `T`
    pub fn named<T: Resolvable>(name: impl Into<String>) -> Self {
        Self::of::<T>().with_name(name)
    }

    /// An unnamed parameter for an arbitrary query
    pub fn from_query(query: TypeQuery) -> Self {
        Self {
            name: None,
            query,
            bounds: None,
            frozen: None,
        }
    }

    /// Set the parameter name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Restrict generated integers to the inclusive range `min..=max`
    pub fn with_bounds(mut self, min: i128, max: i128) -> Self {
        self.bounds = Some((min, max));
        self
    }

    /// Mark the parameter's value for reuse by later resolutions of its type
    pub fn frozen(self) -> Self {
        self.frozen_by(Matching::ExactType)
    }

    /// Mark the parameter's value for reuse by the later resolutions `matching` accepts
    pub fn frozen_by(mut self, matching: Matching) -> Self {
        self.frozen = Some(matching);
        self
    }

    /// Reuse the value only for later parameters that share this parameter's name
    pub fn frozen_by_name(self) -> Self {
        let name = self.name.clone().unwrap_or_default();
        self.frozen_by(Matching::ParameterName(name))
    }

    /// The parameter name, if declared
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The parameter type
    pub fn query(&self) -> &TypeQuery {
        &self.query
    }

    /// Integer bounds, if any
    pub fn bounds(&self) -> Option<(i128, i128)> {
        self.bounds
    }

    /// Validate the declared bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.bounds {
            Some((min, max)) if min > max => Err(ConfigError::InvalidBounds { min, max }),
            _ => Ok(()),
        }
    }

    /// Whether the parameter is frozen
    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    /// How the frozen value is matched against later queries
    pub fn freeze_matching(&self) -> Option<&Matching> {
        self.frozen.as_ref()
    }

    /// Name for messages: the declared name or the type
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.query.to_string(),
        }
    }
}

/// How a constructor was declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructorKind {
    /// The type's designated primary constructor
    Primary,
    /// A constructor tagged with the property names it binds, in order
    Properties(Vec<&'static str>),
    /// Any other declared constructor
    Declared,
    /// Produced by tooling rather than written by the type's author
    Synthesized,
}

/// One way of building a value of a composite type
#[derive(Clone)]
pub struct Constructor {
    name: &'static str,
    kind: ConstructorKind,
    parameters: Vec<ParameterDescriptor>,
    factory: Factory,
}

impl Constructor {
    /// Declare a constructor producing `T`
    pub fn new<T, F>(
        name: &'static str,
        kind: ConstructorKind,
        parameters: Vec<ParameterDescriptor>,
        factory: F,
    ) -> Self
    where
        T: Resolvable,
        F: Fn(ConstructorArgs) -> Result<T, ConstructionError> + Send + Sync + 'static,
    {
        Self {
            name,
            kind,
            parameters,
            factory: Arc::new(move |args: ConstructorArgs| factory(args).map(Value::new)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &ConstructorKind {
        &self.kind
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_primary(&self) -> bool {
        self.kind == ConstructorKind::Primary
    }

    pub fn is_synthesized(&self) -> bool {
        self.kind == ConstructorKind::Synthesized
    }

    /// Property names, for property-tagged constructors
    pub fn property_names(&self) -> Option<&[&'static str]> {
        match &self.kind {
            ConstructorKind::Properties(names) => Some(names),
            _ => None,
        }
    }

    /// Build a value from arguments in parameter order
    pub fn invoke(&self, arguments: Vec<Value>) -> Result<Value, ConstructionError> {
        if arguments.len() != self.parameters.len() {
            return Err(ConstructionError::new(format!(
                "constructor '{}' expects {} arguments but received {}",
                self.name,
                self.parameters.len(),
                arguments.len()
            )));
        }
        (self.factory)(ConstructorArgs::new(arguments))
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// A named enum variant and the constructor that builds it
#[derive(Debug, Clone)]
pub struct Variant {
    name: &'static str,
    constructor: Constructor,
}

impl Variant {
    pub fn new(name: &'static str, constructor: Constructor) -> Self {
        Self { name, constructor }
    }

    /// A field-less variant
    pub fn unit<T: Resolvable>(name: &'static str, make: fn() -> T) -> Self {
        Self::new(
            name,
            Constructor::new(name, ConstructorKind::Declared, Vec::new(), move |_| {
                Ok(make())
            }),
        )
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn constructor(&self) -> &Constructor {
        &self.constructor
    }

    /// Whether the variant carries no fields
    pub fn is_unit(&self) -> bool {
        self.constructor.parameter_count() == 0
    }
}

/// Element layout of a collection type
#[derive(Clone)]
pub struct CollectionShape {
    components: Vec<TypeQuery>,
    assemble: Assembler,
}

impl CollectionShape {
    /// Component types of one entry, e.g. key and value for maps
    pub fn components(&self) -> &[TypeQuery] {
        &self.components
    }

    /// Build the collection from its entries
    pub fn assemble(&self, entries: Vec<ConstructorArgs>) -> Result<Value, ConstructionError> {
        (self.assemble)(entries)
    }
}

impl fmt::Debug for CollectionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionShape")
            .field("components", &self.components)
            .finish()
    }
}

/// The ways a type can be built
#[derive(Debug, Clone)]
pub enum TypeShape {
    Composite(Vec<Constructor>),
    Enumeration(Vec<Variant>),
    Collection(CollectionShape),
    Opaque,
}

/// A type's identity together with its shape
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    key: TypeKey,
    shape: TypeShape,
}

impl TypeDescriptor {
    /// A composite type built through constructors
    pub fn composite<T: Resolvable>(constructors: Vec<Constructor>) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            shape: TypeShape::Composite(constructors),
        }
    }

    /// An enumeration with named variants
    pub fn enumeration<T: Resolvable>(variants: Vec<Variant>) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            shape: TypeShape::Enumeration(variants),
        }
    }

    /// A collection assembled from generated entries
    pub fn collection<T, F>(components: Vec<TypeQuery>, assemble: F) -> Self
    where
        T: Resolvable,
        F: Fn(Vec<ConstructorArgs>) -> Result<T, ConstructionError> + Send + Sync + 'static,
    {
        Self {
            key: TypeKey::of::<T>(),
            shape: TypeShape::Collection(CollectionShape {
                components,
                assemble: Arc::new(move |entries: Vec<ConstructorArgs>| {
                    assemble(entries).map(Value::new)
                }),
            }),
        }
    }

    /// A type with no construction path, such as a trait object
    pub fn opaque<T: Resolvable>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            shape: TypeShape::Opaque,
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn shape(&self) -> &TypeShape {
        &self.shape
    }

    /// Declared constructors, empty for non-composite types
    pub fn constructors(&self) -> &[Constructor] {
        match &self.shape {
            TypeShape::Composite(constructors) => constructors,
            _ => &[],
        }
    }

    /// Declared variants, empty for non-enumerations
    pub fn variants(&self) -> &[Variant] {
        match &self.shape {
            TypeShape::Enumeration(variants) => variants,
            _ => &[],
        }
    }

    /// Look up a variant by name
    pub fn variant(&self, name: &str) -> Option<&Variant> {
        self.variants().iter().find(|variant| variant.name() == name)
    }
}

/// Enumerates the constructor candidates of a type
pub trait ConstructorExtractor: Send + Sync {
    fn extract<'a>(&self, descriptor: &'a TypeDescriptor) -> Vec<&'a Constructor>;
}

/// Returns declared constructors, skipping synthesized zero-argument ones
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredConstructorExtractor;

impl ConstructorExtractor for DeclaredConstructorExtractor {
    fn extract<'a>(&self, descriptor: &'a TypeDescriptor) -> Vec<&'a Constructor> {
        descriptor
            .constructors()
            .iter()
            .filter(|constructor| {
                !(constructor.is_synthesized() && constructor.parameter_count() == 0)
            })
            .collect()
    }
}

/// Picks one constructor among candidates, or declines
pub trait ConstructorResolver: Send + Sync {
    fn resolve<'a>(&self, candidates: &[&'a Constructor]) -> Option<&'a Constructor>;
}

/// Which end of the parameter count ordering a resolver prefers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterPreference {
    Fewest,
    Most,
}

impl ParameterPreference {
    // Ties keep the earliest declared constructor.
    fn select<'a, I>(self, candidates: I) -> Option<&'a Constructor>
    where
        I: IntoIterator<Item = &'a Constructor>,
    {
        candidates.into_iter().fold(None, |best, candidate| match best {
            None => Some(candidate),
            Some(current) => {
                let better = match self {
                    ParameterPreference::Fewest => {
                        candidate.parameter_count() < current.parameter_count()
                    }
                    ParameterPreference::Most => {
                        candidate.parameter_count() > current.parameter_count()
                    }
                };
                Some(if better { candidate } else { current })
            }
        })
    }
}

/// Selects the designated primary constructor
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimaryConstructorResolver;

impl ConstructorResolver for PrimaryConstructorResolver {
    fn resolve<'a>(&self, candidates: &[&'a Constructor]) -> Option<&'a Constructor> {
        candidates
            .iter()
            .copied()
            .find(|constructor| constructor.is_primary())
    }
}

/// Selects among property-tagged constructors
#[derive(Debug, Clone, Copy)]
pub struct PropertiesConstructorResolver {
    preference: ParameterPreference,
}

impl PropertiesConstructorResolver {
    pub fn new(preference: ParameterPreference) -> Self {
        Self { preference }
    }
}

impl ConstructorResolver for PropertiesConstructorResolver {
    fn resolve<'a>(&self, candidates: &[&'a Constructor]) -> Option<&'a Constructor> {
        self.preference.select(
            candidates
                .iter()
                .copied()
                .filter(|constructor| constructor.property_names().is_some()),
        )
    }
}

/// Selects by parameter count alone
#[derive(Debug, Clone, Copy)]
pub struct ParameterCountResolver {
    preference: ParameterPreference,
}

impl ParameterCountResolver {
    pub fn new(preference: ParameterPreference) -> Self {
        Self { preference }
    }
}

impl ConstructorResolver for ParameterCountResolver {
    fn resolve<'a>(&self, candidates: &[&'a Constructor]) -> Option<&'a Constructor> {
        self.preference.select(candidates.iter().copied())
    }
}

/// Tries resolvers in order and returns the first selection
#[derive(Clone)]
pub struct CompositeConstructorResolver {
    resolvers: Vec<Arc<dyn ConstructorResolver>>,
}

impl CompositeConstructorResolver {
    pub fn new(resolvers: Vec<Arc<dyn ConstructorResolver>>) -> Self {
        Self { resolvers }
    }

    /// Primary, then property-tagged with fewest parameters, then fewest parameters
    pub fn defensive() -> Self {
        Self::new(vec![
            Arc::new(PrimaryConstructorResolver),
            Arc::new(PropertiesConstructorResolver::new(
                ParameterPreference::Fewest,
            )),
            Arc::new(ParameterCountResolver::new(ParameterPreference::Fewest)),
        ])
    }

    /// Property-tagged with most parameters, then most parameters
    pub fn aggressive() -> Self {
        Self::new(vec![
            Arc::new(PropertiesConstructorResolver::new(ParameterPreference::Most)),
            Arc::new(ParameterCountResolver::new(ParameterPreference::Most)),
        ])
    }
}

impl ConstructorResolver for CompositeConstructorResolver {
    fn resolve<'a>(&self, candidates: &[&'a Constructor]) -> Option<&'a Constructor> {
        self.resolvers
            .iter()
            .find_map(|resolver| resolver.resolve(candidates))
    }
}

/// An extractor paired with a resolver
#[derive(Clone)]
pub struct ConstructionStrategy {
    extractor: Arc<dyn ConstructorExtractor>,
    resolver: Arc<dyn ConstructorResolver>,
}

impl ConstructionStrategy {
    pub fn new(
        extractor: Arc<dyn ConstructorExtractor>,
        resolver: Arc<dyn ConstructorResolver>,
    ) -> Self {
        Self {
            extractor,
            resolver,
        }
    }

    /// Declared constructors under the defensive resolver chain
    pub fn defensive() -> Self {
        Self::new(
            Arc::new(DeclaredConstructorExtractor),
            Arc::new(CompositeConstructorResolver::defensive()),
        )
    }

    /// Declared constructors under the aggressive resolver chain
    pub fn aggressive() -> Self {
        Self::new(
            Arc::new(DeclaredConstructorExtractor),
            Arc::new(CompositeConstructorResolver::aggressive()),
        )
    }

    /// The constructor used to build values of the described type
    pub fn select<'a>(&self, descriptor: &'a TypeDescriptor) -> Option<&'a Constructor> {
        let candidates = self.extractor.extract(descriptor);
        self.resolver.resolve(&candidates)
    }
}

impl Default for ConstructionStrategy {
    fn default() -> Self {
        Self::defensive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Shipment {
        origin: String,
        weight: u32,
        fragile: bool,
    }

    fn constructor(
        name: &'static str,
        kind: ConstructorKind,
        parameters: Vec<ParameterDescriptor>,
    ) -> Constructor {
        Constructor::new(name, kind, parameters, |_| {
            Ok(Shipment {
                origin: String::new(),
                weight: 0,
                fragile: false,
            })
        })
    }

    fn params(count: usize) -> Vec<ParameterDescriptor> {
        (0..count).map(|_| ParameterDescriptor::of::<u32>()).collect()
    }

    impl Resolvable for Shipment {}

    fn descriptor(constructors: Vec<Constructor>) -> TypeDescriptor {
        TypeDescriptor::composite::<Shipment>(constructors)
    }

    fn selected(
        strategy: &ConstructionStrategy,
        descriptor: &TypeDescriptor,
    ) -> Option<&'static str> {
        strategy.select(descriptor).map(Constructor::name)
    }

    #[test]
    fn test_invoke_builds_value() {
        let ctor = Constructor::new(
            "new",
            ConstructorKind::Primary,
            vec![
                ParameterDescriptor::named::<String>("origin"),
                ParameterDescriptor::named::<u32>("weight"),
                ParameterDescriptor::named::<bool>("fragile"),
            ],
            |mut args| {
                Ok(Shipment {
                    origin: args.take()?,
                    weight: args.take()?,
                    fragile: args.take()?,
                })
            },
        );

        let value = ctor
            .invoke(vec![
                Value::new(String::from("Oslo")),
                Value::new(12u32),
                Value::new(true),
            ])
            .unwrap();

        assert_eq!(
            value.downcast::<Shipment>().unwrap(),
            Shipment {
                origin: "Oslo".to_string(),
                weight: 12,
                fragile: true,
            }
        );
    }

    #[test]
    fn test_invoke_checks_arity_and_types() {
        let ctor = constructor("new", ConstructorKind::Primary, params(1));
        assert!(ctor.invoke(Vec::new()).is_err());

        let typed = Constructor::new(
            "new",
            ConstructorKind::Primary,
            vec![ParameterDescriptor::of::<u32>()],
            |mut args| args.take::<u32>(),
        );
        let error = typed.invoke(vec![Value::new("text".to_string())]).unwrap_err();
        assert!(error.message().contains("expected u32"));
    }

    #[test]
    fn test_extractor_skips_synthesized_no_arg_constructor() {
        let descriptor = descriptor(vec![
            constructor("default", ConstructorKind::Synthesized, params(0)),
            constructor("new", ConstructorKind::Declared, params(2)),
        ]);

        let candidates = DeclaredConstructorExtractor.extract(&descriptor);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name(), "new");
    }

    #[test]
    fn test_defensive_prefers_primary() {
        let descriptor = descriptor(vec![
            constructor("short", ConstructorKind::Declared, params(1)),
            constructor("primary", ConstructorKind::Primary, params(3)),
        ]);

        assert_eq!(
            selected(&ConstructionStrategy::defensive(), &descriptor),
            Some("primary")
        );
    }

    #[test]
    fn test_defensive_prefers_fewest_properties() {
        let descriptor = descriptor(vec![
            constructor("plain", ConstructorKind::Declared, params(0)),
            constructor(
                "wide",
                ConstructorKind::Properties(vec!["a", "b", "c"]),
                params(3),
            ),
            constructor(
                "narrow",
                ConstructorKind::Properties(vec!["a", "b"]),
                params(2),
            ),
        ]);

        assert_eq!(
            selected(&ConstructionStrategy::defensive(), &descriptor),
            Some("narrow")
        );
    }

    #[test]
    fn test_defensive_falls_back_to_fewest_parameters() {
        let descriptor = descriptor(vec![
            constructor("three", ConstructorKind::Declared, params(3)),
            constructor("one", ConstructorKind::Declared, params(1)),
            constructor("also_one", ConstructorKind::Declared, params(1)),
        ]);

        assert_eq!(
            selected(&ConstructionStrategy::defensive(), &descriptor),
            Some("one")
        );
    }

    #[test]
    fn test_aggressive_prefers_most_parameters() {
        let descriptor = descriptor(vec![
            constructor("primary", ConstructorKind::Primary, params(1)),
            constructor("full", ConstructorKind::Declared, params(3)),
            constructor("also_full", ConstructorKind::Declared, params(3)),
        ]);

        assert_eq!(
            selected(&ConstructionStrategy::aggressive(), &descriptor),
            Some("full")
        );
    }

    #[test]
    fn test_selection_is_deterministic() {
        let descriptor = descriptor(vec![
            constructor("a", ConstructorKind::Declared, params(2)),
            constructor("b", ConstructorKind::Declared, params(2)),
        ]);
        let strategy = ConstructionStrategy::defensive();

        let first = selected(&strategy, &descriptor);
        for _ in 0..10 {
            assert_eq!(selected(&strategy, &descriptor), first);
        }
    }

    #[test]
    fn test_no_candidates_declines() {
        assert!(
            ConstructionStrategy::defensive()
                .select(&TypeDescriptor::opaque::<Shipment>())
                .is_none()
        );
        assert!(
            ConstructionStrategy::defensive()
                .select(&descriptor(vec![constructor(
                    "default",
                    ConstructorKind::Synthesized,
                    params(0)
                )]))
                .is_none()
        );
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let parameter = ParameterDescriptor::of::<u8>().with_bounds(10, 1);
        assert_eq!(
            parameter.validate(),
            Err(ConfigError::InvalidBounds { min: 10, max: 1 })
        );
        assert!(ParameterDescriptor::of::<u8>().with_bounds(1, 1).validate().is_ok());
    }
}
