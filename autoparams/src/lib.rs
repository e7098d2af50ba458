#![allow(clippy::result_large_err)]

//! # AutoParams - Test Fixture Generation for Rust
//!
//! AutoParams builds fully populated values of arbitrary types so tests do
//! not have to spell out fixtures by hand. Types take part by implementing
//! [`Resolvable`], usually through `#[derive(Resolvable)]`, which exposes
//! their constructors to the resolution pipeline.
//!
//! ## Quick Start
//!
//! ```rust
//! use autoparams::{ResolutionConfig, ResolutionContext, Resolvable};
//!
//! #[derive(Debug, Clone, Resolvable)]
//! struct Order {
//!     id: u64,
//!     customer: String,
//!     quantity: u16,
//! }
//!
//! let mut context = ResolutionContext::with_config(ResolutionConfig::default().with_seed(7));
//! let order: Order = context.resolve().unwrap();
//! assert!(order.customer.starts_with("customer"));
//! ```
//!
//! Parameterized tests get one argument list per invocation from a
//! [`TestCaseGenerator`], mixing literal rows with generated values:
//!
//! ```rust
//! use autoparams::{CsvAutoSource, ResolutionConfig, TestCaseGenerator, TestSignature};
//!
//! let signature = TestSignature::new("adds_item")
//!     .parameter::<i32>("count")
//!     .parameter::<String>("name")
//!     .parameter::<u64>("id");
//! let provider = CsvAutoSource::new(["1, foo", "2, bar"]).provider().unwrap();
//!
//! let cases = TestCaseGenerator::with_config(ResolutionConfig::default().with_seed(1))
//!     .generate(&signature, Some(&provider))
//!     .unwrap();
//! assert_eq!(cases[1].get::<String>(1).unwrap(), "bar");
//! ```

// Needed so the derive output resolves inside this crate's own tests.
extern crate self as autoparams;

// Public modules
pub mod config;
pub mod construct;
pub mod context;
pub mod customization;
pub mod descriptor;
pub mod error;
pub mod generator;
pub mod query;
pub mod rng;
pub mod runner;
pub mod source;
pub mod types;
pub mod value;

// Re-export the main public API
pub use config::{
    ConfigError, ConfigManager, GlobalConfig, ResolutionConfig, create_resolution_config,
    get_global_config, set_global_config,
};
pub use construct::{
    CompositeConstructorResolver, ConstructionStrategy, Constructor, ConstructorArgs,
    ConstructorExtractor, ConstructorKind, ConstructorResolver, DeclaredConstructorExtractor,
    ParameterDescriptor, ParameterPreference, TypeDescriptor, TypeShape, Variant,
};
pub use context::ResolutionContext;
pub use customization::{
    CompositeCustomizer, Customizer, CustomizerKey, Freeze, GeneratorCustomizer, Matching,
    ResolveConstructorAggressively, SharedCustomizer, TypeRefCustomizer, customizer_fn,
};
pub use descriptor::{
    AttributeDecl, AttributeDefault, AttributeKind, AttributeValue, DescriptorAdapter,
    DescriptorError, DescriptorInterface, ValueDescriptor, trim_indent,
};
pub use error::{ConstructionError, ResolutionError};
pub use generator::{
    CompositeObjectGenerator, ObjectGenerator, SharedGenerator, TypeMatch, TypeMatchingGenerator,
    default_generator, from_fn,
};
pub use query::ObjectQuery;
pub use rng::{DefaultRngProvider, RngProvider, create_rng};
pub use runner::{TestCase, TestCaseGenerator, TestSignature};
pub use source::{
    ArgumentsProvider, Asset, AssetConverter, AssetRow, CsvAutoSource, EnumAutoSource, EnumMode,
    MethodAutoSource, SharedAssetConverter, ValueAutoSource,
};
pub use types::{Resolvable, TypeKey, TypeQuery, TypeRef, TypeToken};
pub use value::{GenerationResult, Value};

// Re-export derive macro from separate crate when derive feature is enabled
#[cfg(feature = "derive")]
pub use autoparams_derive::Resolvable;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ResolutionConfig::default();
        assert_eq!(config.collection_size, 3);
        assert_eq!(config.max_recursion_depth, 8);
        assert_eq!(config.repeat, 1);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_resolve_through_reexports() {
        let mut context = ResolutionContext::with_config(ResolutionConfig::default().with_seed(5));
        let values: Vec<Option<u8>> = context.resolve().unwrap();
        assert_eq!(values.len(), 3);
        assert!(values.iter().all(Option::is_some));
    }
}
