//! Literal argument sources and asset conversion.
//!
//! A source turns a declaration into rows of [`Asset`]s, one row per test
//! invocation. Each asset is converted into its parameter's type by the
//! [`SharedAssetConverter`] service, which is itself resolved through the
//! context so customizers can decorate it.

use std::fmt;
use std::sync::Arc;

use crate::construct::{ParameterDescriptor, TypeShape};
use crate::context::ResolutionContext;
use crate::error::ResolutionError;
use crate::generator::TypeMatchingGenerator;
use crate::query::ObjectQuery;
use crate::runner::TestSignature;
use crate::types::{Resolvable, TypeToken};
use crate::value::Value;

pub mod csv;
pub mod enumeration;
pub mod method;
pub mod value;

pub use csv::{CSV_SOURCE, CsvArgumentsProvider, CsvAutoSource};
pub use enumeration::{ENUM_SOURCE, EnumArgumentsProvider, EnumAutoSource, EnumMode};
pub use method::{ArgumentsFactory, METHOD_SOURCE, MethodArgumentsProvider, MethodAutoSource};
pub use value::{VALUE_SOURCE, ValueArgumentsProvider, ValueAutoSource};

/// One literal argument
#[derive(Debug, Clone)]
pub enum Asset {
    /// An absent value
    Null,
    Text(String),
    Bool(bool),
    Char(char),
    Short(i16),
    Byte(i8),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Type(TypeToken),
    /// An already typed value
    Value(Value),
}

impl Asset {
    // Textual form of scalar assets, parsed by the target type.
    fn literal(&self) -> Option<String> {
        match self {
            Asset::Text(text) => Some(text.clone()),
            Asset::Bool(value) => Some(value.to_string()),
            Asset::Char(value) => Some(value.to_string()),
            Asset::Short(value) => Some(value.to_string()),
            Asset::Byte(value) => Some(value.to_string()),
            Asset::Int(value) => Some(value.to_string()),
            Asset::Long(value) => Some(value.to_string()),
            Asset::Float(value) => Some(value.to_string()),
            Asset::Double(value) => Some(value.to_string()),
            Asset::Null | Asset::Type(_) | Asset::Value(_) => None,
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Null => f.write_str("null"),
            Asset::Type(token) => write!(f, "{}", token),
            Asset::Value(value) => write!(f, "{:?}", value),
            other => f.write_str(&other.literal().unwrap_or_default()),
        }
    }
}

macro_rules! impl_asset_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Asset {
                fn from(value: $t) -> Self {
                    Asset::$variant(value)
                }
            }
        )*
    };
}

impl_asset_from!(
    String => Text,
    bool => Bool,
    char => Char,
    i16 => Short,
    i8 => Byte,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    TypeToken => Type,
    Value => Value,
);

impl From<&str> for Asset {
    fn from(value: &str) -> Self {
        Asset::Text(value.to_string())
    }
}

/// The literal arguments of one invocation
#[derive(Debug, Clone, Default)]
pub struct AssetRow {
    assets: Vec<Asset>,
    name: Option<String>,
}

impl AssetRow {
    pub fn new(assets: Vec<Asset>) -> Self {
        Self { assets, name: None }
    }

    /// Replace the display name derived from the assets
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn into_assets(self) -> Vec<Asset> {
        self.assets
    }

    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self
                .assets
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Produces the literal rows of a parameterized test
pub trait ArgumentsProvider: Send + Sync {
    fn provide_rows(&self, signature: &TestSignature) -> Result<Vec<AssetRow>, ResolutionError>;
}

/// Converts a literal asset into a parameter value
pub trait AssetConverter: Send + Sync {
    fn convert(
        &self,
        parameter: &ParameterDescriptor,
        asset: Asset,
    ) -> Result<Value, ResolutionError>;
}

/// The asset conversion service, resolvable from a context
#[derive(Clone)]
pub struct SharedAssetConverter(Arc<dyn AssetConverter>);

impl SharedAssetConverter {
    pub fn new<C: AssetConverter + 'static>(converter: C) -> Self {
        Self(Arc::new(converter))
    }
}

impl AssetConverter for SharedAssetConverter {
    fn convert(
        &self,
        parameter: &ParameterDescriptor,
        asset: Asset,
    ) -> Result<Value, ResolutionError> {
        self.0.convert(parameter, asset)
    }
}

impl Default for SharedAssetConverter {
    fn default() -> Self {
        Self::new(DefaultAssetConverter)
    }
}

impl fmt::Debug for SharedAssetConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedAssetConverter")
    }
}

impl Resolvable for SharedAssetConverter {}

/// Built-in conversion rules.
///
/// Typed values pass through when their type matches; null converts into a
/// type's absent value; type tokens convert into [`TypeToken`]; text and
/// scalars are parsed by the target type, and enum targets accept the name
/// of a variant without fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAssetConverter;

impl AssetConverter for DefaultAssetConverter {
    fn convert(
        &self,
        parameter: &ParameterDescriptor,
        asset: Asset,
    ) -> Result<Value, ResolutionError> {
        let target = parameter.query();
        let fail = |message: String| {
            ResolutionError::asset_conversion(parameter.display_name(), message)
        };

        match asset {
            Asset::Null => target
                .absent()
                .ok_or_else(|| fail(format!("null cannot be converted into {}", target))),
            Asset::Value(value) => {
                if value.type_id() == target.key().id() {
                    Ok(value)
                } else {
                    Err(fail(format!("{:?} is not a {}", value, target)))
                }
            }
            Asset::Type(token) => {
                if target.is::<TypeToken>() {
                    Ok(Value::new(token))
                } else {
                    Err(fail(format!("type {} cannot be converted into {}", token, target)))
                }
            }
            scalar => {
                let text = scalar.literal().unwrap_or_default();
                if let Some(parsed) = target.parse_literal(&text) {
                    return parsed.map_err(|message| fail(format!("'{}': {}", text, message)));
                }
                variant_by_name(target.describe(), &text)
                    .transpose()
                    .map_err(fail)?
                    .ok_or_else(|| fail(format!("'{}' cannot be converted into {}", text, target)))
            }
        }
    }
}

fn variant_by_name(
    descriptor: Option<crate::construct::TypeDescriptor>,
    name: &str,
) -> Option<Result<Value, String>> {
    let descriptor = descriptor?;
    let TypeShape::Enumeration(_) = descriptor.shape() else {
        return None;
    };
    let variant = descriptor.variant(name).filter(|variant| variant.is_unit())?;
    Some(
        variant
            .constructor()
            .invoke(Vec::new())
            .map_err(|error| error.to_string()),
    )
}

/// Generator answering the [`SharedAssetConverter`] service query
pub fn asset_converter_generator() -> TypeMatchingGenerator {
    TypeMatchingGenerator::create::<SharedAssetConverter, _>(
        |_: &ObjectQuery, _: &mut ResolutionContext| Ok(SharedAssetConverter::default()),
    )
}
