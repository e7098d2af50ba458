//! Rows produced by registered argument factories.

use std::collections::HashMap;
use std::fmt;

use crate::descriptor::{
    AttributeDecl, AttributeDefault, AttributeKind, DescriptorAdapter, DescriptorInterface,
    ValueDescriptor,
};
use crate::error::ResolutionError;
use crate::runner::TestSignature;
use crate::source::{ArgumentsProvider, AssetRow};

/// Attributes of a method source declaration
pub static METHOD_SOURCE: DescriptorInterface = DescriptorInterface::new(
    "MethodSource",
    &[AttributeDecl::with_default(
        "value",
        AttributeKind::Strings,
        AttributeDefault::Empty,
    )],
);

/// A function returning literal rows
pub type ArgumentsFactory = fn() -> Vec<AssetRow>;

/// Collects the rows of the factories a declaration names.
///
/// An empty list of names, or an empty name, stands for the factory named
/// after the test itself.
#[derive(Clone)]
pub struct MethodArgumentsProvider {
    names: Vec<String>,
    factories: HashMap<String, ArgumentsFactory>,
}

impl MethodArgumentsProvider {
    pub fn accept(descriptor: &DescriptorAdapter) -> Result<Self, ResolutionError> {
        descriptor.expect_interface(&METHOD_SOURCE)?;
        Ok(Self {
            names: descriptor.value("value")?,
            factories: HashMap::new(),
        })
    }

    /// Register a factory under `name`
    pub fn with_factory(mut self, name: impl Into<String>, factory: ArgumentsFactory) -> Self {
        self.factories.insert(name.into(), factory);
        self
    }
}

impl fmt::Debug for MethodArgumentsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut factories: Vec<&String> = self.factories.keys().collect();
        factories.sort();
        f.debug_struct("MethodArgumentsProvider")
            .field("names", &self.names)
            .field("factories", &factories)
            .finish()
    }
}

impl ArgumentsProvider for MethodArgumentsProvider {
    fn provide_rows(&self, signature: &TestSignature) -> Result<Vec<AssetRow>, ResolutionError> {
        let default = [signature.name().to_string()];
        let names = if self.names.is_empty() {
            &default[..]
        } else {
            &self.names[..]
        };

        let mut rows = Vec::new();
        for name in names {
            let name = if name.is_empty() { signature.name() } else { name.as_str() };
            let factory = self.factories.get(name).ok_or_else(|| {
                ResolutionError::source_error(format!("no argument factory named '{}'", name))
            })?;
            rows.extend(factory());
        }
        Ok(rows)
    }
}

/// Native method declaration
#[derive(Debug, Clone, Default)]
pub struct MethodAutoSource {
    names: Vec<String>,
}

impl MethodAutoSource {
    /// Declaration using the factory named after the test
    pub fn new() -> Self {
        Self::default()
    }

    /// Declaration using the named factories, in order
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn descriptor(&self) -> ValueDescriptor {
        if self.names.is_empty() {
            ValueDescriptor::new()
        } else {
            ValueDescriptor::new().with("value", self.names.clone())
        }
    }

    pub fn adapter(&self) -> Result<DescriptorAdapter, ResolutionError> {
        Ok(DescriptorAdapter::create(&METHOD_SOURCE, self.descriptor())?)
    }

    pub fn provider(&self) -> Result<MethodArgumentsProvider, ResolutionError> {
        MethodArgumentsProvider::accept(&self.adapter()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Asset;

    fn primes() -> Vec<AssetRow> {
        vec![
            AssetRow::new(vec![Asset::from(2)]),
            AssetRow::new(vec![Asset::from(3)]),
        ]
    }

    fn words() -> Vec<AssetRow> {
        vec![AssetRow::new(vec![Asset::from("word")])]
    }

    #[test]
    fn test_factory_named_after_test() {
        let provider = MethodAutoSource::new()
            .provider()
            .unwrap()
            .with_factory("primes", primes);

        let rows = provider.provide_rows(&TestSignature::new("primes")).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_named_factories_in_order() {
        let provider = MethodAutoSource::named(["words", "", "primes"])
            .provider()
            .unwrap()
            .with_factory("primes", primes)
            .with_factory("words", words);

        let rows = provider.provide_rows(&TestSignature::new("words")).unwrap();
        let names: Vec<String> = rows.iter().map(AssetRow::display_name).collect();
        assert_eq!(names, vec!["word", "word", "2", "3"]);
    }

    #[test]
    fn test_missing_factory() {
        let provider = MethodAutoSource::named(["absent"]).provider().unwrap();
        assert!(provider.provide_rows(&TestSignature::new("t")).is_err());
    }
}
