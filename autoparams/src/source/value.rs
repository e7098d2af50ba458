//! One-argument rows from an array of literal values.

use crate::descriptor::{
    AttributeDecl, AttributeDefault, AttributeKind, AttributeValue, DescriptorAdapter,
    DescriptorInterface, ValueDescriptor,
};
use crate::error::ResolutionError;
use crate::runner::TestSignature;
use crate::source::{ArgumentsProvider, Asset, AssetRow};
use crate::types::TypeToken;

/// Attributes of a value source declaration
pub static VALUE_SOURCE: DescriptorInterface = DescriptorInterface::new(
    "ValueSource",
    &[
        AttributeDecl::with_default("shorts", AttributeKind::Shorts, AttributeDefault::Empty),
        AttributeDecl::with_default("bytes", AttributeKind::Bytes, AttributeDefault::Empty),
        AttributeDecl::with_default("ints", AttributeKind::Ints, AttributeDefault::Empty),
        AttributeDecl::with_default("longs", AttributeKind::Longs, AttributeDefault::Empty),
        AttributeDecl::with_default("floats", AttributeKind::Floats, AttributeDefault::Empty),
        AttributeDecl::with_default("doubles", AttributeKind::Doubles, AttributeDefault::Empty),
        AttributeDecl::with_default("chars", AttributeKind::Chars, AttributeDefault::Empty),
        AttributeDecl::with_default("booleans", AttributeKind::Bools, AttributeDefault::Empty),
        AttributeDecl::with_default("strings", AttributeKind::Strings, AttributeDefault::Empty),
        AttributeDecl::with_default("types", AttributeKind::Types, AttributeDefault::Empty),
    ],
);

/// Yields one row per value of the single non-empty array
#[derive(Debug, Clone)]
pub struct ValueArgumentsProvider {
    assets: Vec<Asset>,
}

impl ValueArgumentsProvider {
    pub fn accept(descriptor: &DescriptorAdapter) -> Result<Self, ResolutionError> {
        descriptor.expect_interface(&VALUE_SOURCE)?;

        let mut supplied = Vec::new();
        for decl in VALUE_SOURCE.attributes() {
            let value = descriptor.get(decl.name)?;
            if value.array_len().unwrap_or(0) > 0 {
                supplied.push(value.clone());
            }
        }
        if supplied.len() != 1 {
            return Err(ResolutionError::source_error(format!(
                "exactly one type of input must be provided, found {}",
                supplied.len()
            )));
        }

        let assets = match supplied.remove(0) {
            AttributeValue::Shorts(values) => values.into_iter().map(Asset::Short).collect(),
            AttributeValue::Bytes(values) => values.into_iter().map(Asset::Byte).collect(),
            AttributeValue::Ints(values) => values.into_iter().map(Asset::Int).collect(),
            AttributeValue::Longs(values) => values.into_iter().map(Asset::Long).collect(),
            AttributeValue::Floats(values) => values.into_iter().map(Asset::Float).collect(),
            AttributeValue::Doubles(values) => values.into_iter().map(Asset::Double).collect(),
            AttributeValue::Chars(values) => values.into_iter().map(Asset::Char).collect(),
            AttributeValue::Bools(values) => values.into_iter().map(Asset::Bool).collect(),
            AttributeValue::Strings(values) => values.into_iter().map(Asset::Text).collect(),
            AttributeValue::Types(values) => values.into_iter().map(Asset::Type).collect(),
            other => {
                return Err(ResolutionError::internal(format!(
                    "unexpected value source attribute {:?}",
                    other
                )));
            }
        };
        Ok(Self { assets })
    }
}

impl ArgumentsProvider for ValueArgumentsProvider {
    fn provide_rows(&self, _signature: &TestSignature) -> Result<Vec<AssetRow>, ResolutionError> {
        Ok(self
            .assets
            .iter()
            .map(|asset| AssetRow::new(vec![asset.clone()]))
            .collect())
    }
}

/// Native value declaration
#[derive(Debug, Clone, Default)]
pub struct ValueAutoSource {
    descriptor: ValueDescriptor,
}

impl ValueAutoSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn with(mut self, name: &str, value: AttributeValue) -> Self {
        self.descriptor = self.descriptor.with(name, value);
        self
    }

    pub fn shorts(self, values: Vec<i16>) -> Self {
        self.with("shorts", AttributeValue::Shorts(values))
    }

    pub fn bytes(self, values: Vec<i8>) -> Self {
        self.with("bytes", AttributeValue::Bytes(values))
    }

    pub fn ints(self, values: Vec<i32>) -> Self {
        self.with("ints", AttributeValue::Ints(values))
    }

    pub fn longs(self, values: Vec<i64>) -> Self {
        self.with("longs", AttributeValue::Longs(values))
    }

    pub fn floats(self, values: Vec<f32>) -> Self {
        self.with("floats", AttributeValue::Floats(values))
    }

    pub fn doubles(self, values: Vec<f64>) -> Self {
        self.with("doubles", AttributeValue::Doubles(values))
    }

    pub fn chars(self, values: Vec<char>) -> Self {
        self.with("chars", AttributeValue::Chars(values))
    }

    pub fn booleans(self, values: Vec<bool>) -> Self {
        self.with("booleans", AttributeValue::Bools(values))
    }

    pub fn strings<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.with("strings", AttributeValue::Strings(values))
    }

    pub fn types(self, values: Vec<TypeToken>) -> Self {
        self.with("types", AttributeValue::Types(values))
    }

    pub fn adapter(&self) -> Result<DescriptorAdapter, ResolutionError> {
        Ok(DescriptorAdapter::create(&VALUE_SOURCE, self.descriptor.clone())?)
    }

    pub fn provider(&self) -> Result<ValueArgumentsProvider, ResolutionError> {
        ValueArgumentsProvider::accept(&self.adapter()?)
    }
}
