//! Rows from the variants of an enum.

use std::str::FromStr;

use regex::Regex;

use crate::construct::{TypeShape, Variant};
use crate::descriptor::{
    AttributeDecl, AttributeDefault, AttributeKind, AttributeValue, DescriptorAdapter,
    DescriptorInterface, ValueDescriptor,
};
use crate::error::ResolutionError;
use crate::runner::TestSignature;
use crate::source::{ArgumentsProvider, Asset, AssetRow};
use crate::types::{Resolvable, TypeToken};

/// Attributes of an enum source declaration
pub static ENUM_SOURCE: DescriptorInterface = DescriptorInterface::new(
    "EnumSource",
    &[
        AttributeDecl::required("value", AttributeKind::Type),
        AttributeDecl::with_default("names", AttributeKind::Strings, AttributeDefault::Empty),
        AttributeDecl::with_default(
            "mode",
            AttributeKind::Symbol,
            AttributeDefault::Symbol("INCLUDE"),
        ),
    ],
);

/// How the `names` attribute selects variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumMode {
    /// Only the named variants, or all when no names are given
    #[default]
    Include,
    /// All but the named variants
    Exclude,
    /// Variants whose name matches every pattern
    MatchAll,
    /// Variants whose name matches at least one pattern
    MatchAny,
}

impl EnumMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnumMode::Include => "INCLUDE",
            EnumMode::Exclude => "EXCLUDE",
            EnumMode::MatchAll => "MATCH_ALL",
            EnumMode::MatchAny => "MATCH_ANY",
        }
    }
}

impl FromStr for EnumMode {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INCLUDE" => Ok(EnumMode::Include),
            "EXCLUDE" => Ok(EnumMode::Exclude),
            "MATCH_ALL" => Ok(EnumMode::MatchAll),
            "MATCH_ANY" => Ok(EnumMode::MatchAny),
            other => Err(ResolutionError::source_error(format!("unknown enum mode '{}'", other))),
        }
    }
}

/// Yields one row per selected variant
#[derive(Debug, Clone)]
pub struct EnumArgumentsProvider {
    token: TypeToken,
    names: Vec<String>,
    mode: EnumMode,
}

impl EnumArgumentsProvider {
    pub fn accept(descriptor: &DescriptorAdapter) -> Result<Self, ResolutionError> {
        descriptor.expect_interface(&ENUM_SOURCE)?;
        let mode: String = descriptor.value("mode")?;

        Ok(Self {
            token: descriptor.value("value")?,
            names: descriptor.value("names")?,
            mode: mode.parse()?,
        })
    }

    fn select<'a>(&self, variants: &'a [Variant]) -> Result<Vec<&'a Variant>, ResolutionError> {
        match self.mode {
            EnumMode::Include | EnumMode::Exclude => {
                let unknown: Vec<&str> = self
                    .names
                    .iter()
                    .filter(|name| !variants.iter().any(|variant| variant.name() == name.as_str()))
                    .map(String::as_str)
                    .collect();
                if !unknown.is_empty() {
                    return Err(ResolutionError::source_error(format!(
                        "invalid variant name(s) for {}: {}",
                        self.token,
                        unknown.join(", ")
                    )));
                }

                let named =
                    |variant: &Variant| self.names.iter().any(|name| name == variant.name());
                let keep_named = self.mode == EnumMode::Include;
                Ok(variants
                    .iter()
                    .filter(|variant| {
                        if keep_named && self.names.is_empty() {
                            true
                        } else {
                            named(*variant) == keep_named
                        }
                    })
                    .collect())
            }
            EnumMode::MatchAll | EnumMode::MatchAny => {
                if self.names.is_empty() {
                    return Err(ResolutionError::source_error(format!(
                        "mode {} needs at least one pattern",
                        self.mode.as_str()
                    )));
                }
                let patterns = self
                    .names
                    .iter()
                    .map(|pattern| {
                        Regex::new(&format!("^(?:{})$", pattern)).map_err(|error| {
                            ResolutionError::source_error(format!(
                                "invalid pattern '{}': {}",
                                pattern, error
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                let all = self.mode == EnumMode::MatchAll;
                Ok(variants
                    .iter()
                    .filter(|variant| {
                        let mut matches = patterns
                            .iter()
                            .map(|pattern| pattern.is_match(variant.name()));
                        if all {
                            matches.all(|matched| matched)
                        } else {
                            matches.any(|matched| matched)
                        }
                    })
                    .collect())
            }
        }
    }
}

impl ArgumentsProvider for EnumArgumentsProvider {
    fn provide_rows(&self, _signature: &TestSignature) -> Result<Vec<AssetRow>, ResolutionError> {
        let descriptor = self.token.query().describe();
        let Some(TypeShape::Enumeration(variants)) = descriptor.as_ref().map(|d| d.shape()) else {
            return Err(ResolutionError::source_error(format!(
                "{} is not an enum",
                self.token
            )));
        };

        self.select(variants)?
            .into_iter()
            .map(|variant| {
                if !variant.is_unit() {
                    return Err(ResolutionError::source_error(format!(
                        "variant {}::{} has fields and cannot be used as a literal",
                        self.token,
                        variant.name()
                    )));
                }
                let value = variant.constructor().invoke(Vec::new()).map_err(|source| {
                    ResolutionError::construction_failed(self.token.to_string(), source)
                })?;
                Ok(AssetRow::new(vec![Asset::Value(value)]).named(variant.name()))
            })
            .collect()
    }
}

/// Native enum declaration
#[derive(Debug, Clone)]
pub struct EnumAutoSource {
    token: TypeToken,
    names: Vec<String>,
    mode: Option<EnumMode>,
}

impl EnumAutoSource {
    /// Declaration over the variants of `T`
    pub fn of<T: Resolvable>() -> Self {
        Self {
            token: TypeToken::of::<T>(),
            names: Vec::new(),
            mode: None,
        }
    }

    pub fn names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn mode(mut self, mode: EnumMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn descriptor(&self) -> ValueDescriptor {
        let mut descriptor = ValueDescriptor::new().with("value", self.token.clone());
        if !self.names.is_empty() {
            descriptor = descriptor.with("names", self.names.clone());
        }
        if let Some(mode) = self.mode {
            descriptor = descriptor.with("mode", AttributeValue::Symbol(mode.as_str().to_string()));
        }
        descriptor
    }

    pub fn adapter(&self) -> Result<DescriptorAdapter, ResolutionError> {
        Ok(DescriptorAdapter::create(&ENUM_SOURCE, self.descriptor())?)
    }

    pub fn provider(&self) -> Result<EnumArgumentsProvider, ResolutionError> {
        EnumArgumentsProvider::accept(&self.adapter()?)
    }
}
