//! Attribute tables that stand in for source declarations.
//!
//! A [`DescriptorInterface`] declares the attributes a literal source reads,
//! with their kinds and compiled-in defaults. A [`DescriptorAdapter`] is an
//! immutable table of values validated against one interface, so a native
//! declaration such as [`crate::source::CsvAutoSource`] can hand its values to
//! processing code written against the base interface.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::types::TypeToken;

/// The kind of value an attribute holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Bool,
    Char,
    Int,
    Str,
    Symbol,
    Type,
    Shorts,
    Bytes,
    Ints,
    Longs,
    Floats,
    Doubles,
    Chars,
    Bools,
    Strings,
    Types,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeKind::Bool => "bool",
            AttributeKind::Char => "char",
            AttributeKind::Int => "int",
            AttributeKind::Str => "string",
            AttributeKind::Symbol => "symbol",
            AttributeKind::Type => "type",
            AttributeKind::Shorts => "short[]",
            AttributeKind::Bytes => "byte[]",
            AttributeKind::Ints => "int[]",
            AttributeKind::Longs => "long[]",
            AttributeKind::Floats => "float[]",
            AttributeKind::Doubles => "double[]",
            AttributeKind::Chars => "char[]",
            AttributeKind::Bools => "bool[]",
            AttributeKind::Strings => "string[]",
            AttributeKind::Types => "type[]",
        };
        f.write_str(name)
    }
}

/// A value stored in a descriptor table
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Bool(bool),
    Char(char),
    Int(i32),
    Str(String),
    /// Name of a constant, such as an enum mode
    Symbol(String),
    Type(TypeToken),
    Shorts(Vec<i16>),
    Bytes(Vec<i8>),
    Ints(Vec<i32>),
    Longs(Vec<i64>),
    Floats(Vec<f32>),
    Doubles(Vec<f64>),
    Chars(Vec<char>),
    Bools(Vec<bool>),
    Strings(Vec<String>),
    Types(Vec<TypeToken>),
}

impl AttributeValue {
    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeValue::Bool(_) => AttributeKind::Bool,
            AttributeValue::Char(_) => AttributeKind::Char,
            AttributeValue::Int(_) => AttributeKind::Int,
            AttributeValue::Str(_) => AttributeKind::Str,
            AttributeValue::Symbol(_) => AttributeKind::Symbol,
            AttributeValue::Type(_) => AttributeKind::Type,
            AttributeValue::Shorts(_) => AttributeKind::Shorts,
            AttributeValue::Bytes(_) => AttributeKind::Bytes,
            AttributeValue::Ints(_) => AttributeKind::Ints,
            AttributeValue::Longs(_) => AttributeKind::Longs,
            AttributeValue::Floats(_) => AttributeKind::Floats,
            AttributeValue::Doubles(_) => AttributeKind::Doubles,
            AttributeValue::Chars(_) => AttributeKind::Chars,
            AttributeValue::Bools(_) => AttributeKind::Bools,
            AttributeValue::Strings(_) => AttributeKind::Strings,
            AttributeValue::Types(_) => AttributeKind::Types,
        }
    }

    /// Number of elements of an array value, `None` for scalars
    pub fn array_len(&self) -> Option<usize> {
        match self {
            AttributeValue::Shorts(values) => Some(values.len()),
            AttributeValue::Bytes(values) => Some(values.len()),
            AttributeValue::Ints(values) => Some(values.len()),
            AttributeValue::Longs(values) => Some(values.len()),
            AttributeValue::Floats(values) => Some(values.len()),
            AttributeValue::Doubles(values) => Some(values.len()),
            AttributeValue::Chars(values) => Some(values.len()),
            AttributeValue::Bools(values) => Some(values.len()),
            AttributeValue::Strings(values) => Some(values.len()),
            AttributeValue::Types(values) => Some(values.len()),
            _ => None,
        }
    }

    fn empty(kind: AttributeKind) -> Option<Self> {
        let value = match kind {
            AttributeKind::Str => AttributeValue::Str(String::new()),
            AttributeKind::Shorts => AttributeValue::Shorts(Vec::new()),
            AttributeKind::Bytes => AttributeValue::Bytes(Vec::new()),
            AttributeKind::Ints => AttributeValue::Ints(Vec::new()),
            AttributeKind::Longs => AttributeValue::Longs(Vec::new()),
            AttributeKind::Floats => AttributeValue::Floats(Vec::new()),
            AttributeKind::Doubles => AttributeValue::Doubles(Vec::new()),
            AttributeKind::Chars => AttributeValue::Chars(Vec::new()),
            AttributeKind::Bools => AttributeValue::Bools(Vec::new()),
            AttributeKind::Strings => AttributeValue::Strings(Vec::new()),
            AttributeKind::Types => AttributeValue::Types(Vec::new()),
            AttributeKind::Bool
            | AttributeKind::Char
            | AttributeKind::Int
            | AttributeKind::Symbol
            | AttributeKind::Type => return None,
        };
        Some(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<char> for AttributeValue {
    fn from(value: char) -> Self {
        AttributeValue::Char(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Str(value)
    }
}

impl From<TypeToken> for AttributeValue {
    fn from(value: TypeToken) -> Self {
        AttributeValue::Type(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(value: Vec<String>) -> Self {
        AttributeValue::Strings(value)
    }
}

/// A compiled-in attribute default
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeDefault {
    Bool(bool),
    Char(char),
    Int(i32),
    Str(&'static str),
    Symbol(&'static str),
    /// Empty string or empty array of the attribute's kind
    Empty,
}

impl AttributeDefault {
    fn materialize(self, kind: AttributeKind) -> Option<AttributeValue> {
        let value = match (self, kind) {
            (AttributeDefault::Bool(value), AttributeKind::Bool) => AttributeValue::Bool(value),
            (AttributeDefault::Char(value), AttributeKind::Char) => AttributeValue::Char(value),
            (AttributeDefault::Int(value), AttributeKind::Int) => AttributeValue::Int(value),
            (AttributeDefault::Str(value), AttributeKind::Str) => {
                AttributeValue::Str(value.to_string())
            }
            (AttributeDefault::Symbol(value), AttributeKind::Symbol) => {
                AttributeValue::Symbol(value.to_string())
            }
            (AttributeDefault::Empty, kind) => return AttributeValue::empty(kind),
            _ => return None,
        };
        Some(value)
    }
}

/// One attribute declared by an interface
#[derive(Debug, Clone, Copy)]
pub struct AttributeDecl {
    pub name: &'static str,
    pub kind: AttributeKind,
    pub default: Option<AttributeDefault>,
}

impl AttributeDecl {
    /// An attribute that every table must supply
    pub const fn required(name: &'static str, kind: AttributeKind) -> Self {
        Self {
            name,
            kind,
            default: None,
        }
    }

    /// An attribute that falls back to `default` when not supplied
    pub const fn with_default(
        name: &'static str,
        kind: AttributeKind,
        default: AttributeDefault,
    ) -> Self {
        Self {
            name,
            kind,
            default: Some(default),
        }
    }
}

/// The set of attributes a kind of source declaration carries
#[derive(Debug)]
pub struct DescriptorInterface {
    name: &'static str,
    attributes: &'static [AttributeDecl],
}

impl DescriptorInterface {
    pub const fn new(name: &'static str, attributes: &'static [AttributeDecl]) -> Self {
        Self { name, attributes }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn attributes(&self) -> &'static [AttributeDecl] {
        self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&'static AttributeDecl> {
        self.attributes.iter().find(|decl| decl.name == name)
    }
}

/// Descriptor table creation and access failures
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorError {
    /// A supplied or requested attribute is not declared by the interface
    UnknownAttribute {
        interface: &'static str,
        attribute: String,
    },
    /// A supplied or requested attribute has another kind than declared
    KindMismatch {
        interface: &'static str,
        attribute: String,
        expected: AttributeKind,
        actual: AttributeKind,
    },
    /// A declared attribute without default was not supplied
    MissingAttribute {
        interface: &'static str,
        attribute: &'static str,
    },
    /// The adapter was built for another interface
    WrongInterface {
        expected: &'static str,
        actual: &'static str,
    },
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorError::UnknownAttribute {
                interface,
                attribute,
            } => write!(f, "{} declares no attribute '{}'", interface, attribute),
            DescriptorError::KindMismatch {
                interface,
                attribute,
                expected,
                actual,
            } => write!(
                f,
                "{}.{} expects a {} value, got {}",
                interface, attribute, expected, actual
            ),
            DescriptorError::MissingAttribute {
                interface,
                attribute,
            } => write!(f, "{}.{} has no value and no default", interface, attribute),
            DescriptorError::WrongInterface { expected, actual } => {
                write!(f, "expected a {} descriptor, got {}", expected, actual)
            }
        }
    }
}

impl std::error::Error for DescriptorError {}

/// Attribute values supplied by a declaration, before validation
#[derive(Debug, Clone, Default)]
pub struct ValueDescriptor {
    values: Vec<(String, AttributeValue)>,
}

impl ValueDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply an attribute; a later value for the same name wins
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.values.push((name.into(), value.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Typed access to attribute values
pub trait FromAttribute: Sized {
    const KIND: AttributeKind;

    fn from_attribute(value: &AttributeValue) -> Option<Self>;
}

macro_rules! impl_from_attribute {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromAttribute for $t {
                const KIND: AttributeKind = AttributeKind::$variant;

                fn from_attribute(value: &AttributeValue) -> Option<Self> {
                    match value {
                        AttributeValue::$variant(inner) => Some(inner.clone()),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_from_attribute!(
    bool => Bool,
    char => Char,
    i32 => Int,
    TypeToken => Type,
    Vec<i16> => Shorts,
    Vec<i8> => Bytes,
    Vec<i32> => Ints,
    Vec<i64> => Longs,
    Vec<f32> => Floats,
    Vec<f64> => Doubles,
    Vec<char> => Chars,
    Vec<bool> => Bools,
    Vec<String> => Strings,
    Vec<TypeToken> => Types,
);

// Symbols read as strings too.
impl FromAttribute for String {
    const KIND: AttributeKind = AttributeKind::Str;

    fn from_attribute(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Str(inner) | AttributeValue::Symbol(inner) => Some(inner.clone()),
            _ => None,
        }
    }
}

/// An immutable attribute table that impersonates one interface.
///
/// Creation fails fast on unknown attributes, wrong kinds and missing
/// required attributes; afterwards every declared attribute has a value and
/// every accessor answers identically for the lifetime of the adapter.
#[derive(Debug, Clone)]
pub struct DescriptorAdapter {
    interface: &'static DescriptorInterface,
    values: BTreeMap<&'static str, AttributeValue>,
    supplied: BTreeSet<&'static str>,
}

impl DescriptorAdapter {
    pub fn create(
        interface: &'static DescriptorInterface,
        descriptor: ValueDescriptor,
    ) -> Result<Self, DescriptorError> {
        let mut values = BTreeMap::new();
        let mut supplied = BTreeSet::new();

        for (name, value) in descriptor.values {
            let decl = interface
                .attribute(&name)
                .ok_or_else(|| DescriptorError::UnknownAttribute {
                    interface: interface.name,
                    attribute: name.clone(),
                })?;
            if value.kind() != decl.kind {
                return Err(DescriptorError::KindMismatch {
                    interface: interface.name,
                    attribute: name,
                    expected: decl.kind,
                    actual: value.kind(),
                });
            }
            values.insert(decl.name, value);
            supplied.insert(decl.name);
        }

        for decl in interface.attributes {
            if values.contains_key(decl.name) {
                continue;
            }
            let value = decl
                .default
                .and_then(|default| default.materialize(decl.kind))
                .ok_or(DescriptorError::MissingAttribute {
                    interface: interface.name,
                    attribute: decl.name,
                })?;
            values.insert(decl.name, value);
        }

        Ok(Self {
            interface,
            values,
            supplied,
        })
    }

    pub fn interface(&self) -> &'static DescriptorInterface {
        self.interface
    }

    /// The identity of the impersonated interface
    pub fn kind(&self) -> &'static str {
        self.interface.name
    }

    /// Fail unless this adapter was built for `interface`
    pub fn expect_interface(
        &self,
        interface: &'static DescriptorInterface,
    ) -> Result<(), DescriptorError> {
        if self.interface.name == interface.name {
            Ok(())
        } else {
            Err(DescriptorError::WrongInterface {
                expected: interface.name,
                actual: self.interface.name,
            })
        }
    }

    /// The stored value of a declared attribute
    pub fn get(&self, name: &str) -> Result<&AttributeValue, DescriptorError> {
        self.values
            .get(name)
            .ok_or_else(|| DescriptorError::UnknownAttribute {
                interface: self.interface.name,
                attribute: name.to_string(),
            })
    }

    /// Whether the attribute was supplied rather than defaulted
    pub fn is_supplied(&self, name: &str) -> bool {
        self.supplied.contains(name)
    }

    /// The attribute converted to `T`
    pub fn value<T: FromAttribute>(&self, name: &str) -> Result<T, DescriptorError> {
        let value = self.get(name)?;
        T::from_attribute(value).ok_or_else(|| DescriptorError::KindMismatch {
            interface: self.interface.name,
            attribute: name.to_string(),
            expected: T::KIND,
            actual: value.kind(),
        })
    }
}

/// Strip the indentation shared by all non-blank lines.
///
/// A blank first or last line is dropped, carriage returns are removed and
/// blank lines do not count toward the common indentation.
pub fn trim_indent(text: &str) -> String {
    let mut lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    if lines.first().is_some_and(|line| line.trim().is_empty()) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }

    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|ch| ch.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    // Indentation is counted in characters; cut at the matching byte offset.
    lines
        .iter()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                line.char_indices()
                    .nth(indent)
                    .map_or("", |(offset, _)| &line[offset..])
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    static SAMPLE: DescriptorInterface = DescriptorInterface::new(
        "Sample",
        &[
            AttributeDecl::required("target", AttributeKind::Type),
            AttributeDecl::with_default("label", AttributeKind::Str, AttributeDefault::Str("none")),
            AttributeDecl::with_default("flag", AttributeKind::Bool, AttributeDefault::Bool(true)),
            AttributeDecl::with_default("limit", AttributeKind::Int, AttributeDefault::Int(10)),
            AttributeDecl::with_default("names", AttributeKind::Strings, AttributeDefault::Empty),
            AttributeDecl::with_default(
                "mode",
                AttributeKind::Symbol,
                AttributeDefault::Symbol("ON"),
            ),
        ],
    );

    static OTHER: DescriptorInterface = DescriptorInterface::new("Other", &[]);

    fn sample() -> ValueDescriptor {
        ValueDescriptor::new().with("target", TypeToken::of::<u8>())
    }

    #[test]
    fn test_every_attribute_resolves() {
        let adapter = DescriptorAdapter::create(&SAMPLE, sample().with("limit", 3)).unwrap();

        for decl in SAMPLE.attributes() {
            assert_eq!(adapter.get(decl.name).unwrap().kind(), decl.kind);
        }
        assert_eq!(adapter.value::<i32>("limit").unwrap(), 3);
        assert_eq!(adapter.value::<String>("label").unwrap(), "none");
        assert!(adapter.value::<bool>("flag").unwrap());
        assert!(adapter.value::<Vec<String>>("names").unwrap().is_empty());
        assert_eq!(adapter.value::<String>("mode").unwrap(), "ON");
        assert!(adapter.value::<TypeToken>("target").unwrap().is::<u8>());
    }

    #[test]
    fn test_answers_are_stable() {
        let adapter = DescriptorAdapter::create(&SAMPLE, sample()).unwrap();
        assert_eq!(adapter.get("label").unwrap(), adapter.get("label").unwrap());
        assert!(adapter.is_supplied("target"));
        assert!(!adapter.is_supplied("label"));
        assert_eq!(adapter.kind(), "Sample");
    }

    #[test]
    fn test_unknown_attribute_fails_creation() {
        let error = DescriptorAdapter::create(&SAMPLE, sample().with("colour", "red")).unwrap_err();
        assert_eq!(
            error,
            DescriptorError::UnknownAttribute {
                interface: "Sample",
                attribute: "colour".to_string(),
            }
        );
    }

    #[test]
    fn test_kind_mismatch_fails_creation() {
        let error = DescriptorAdapter::create(&SAMPLE, sample().with("limit", "ten")).unwrap_err();
        assert!(matches!(
            error,
            DescriptorError::KindMismatch {
                expected: AttributeKind::Int,
                actual: AttributeKind::Str,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_required_attribute() {
        let error = DescriptorAdapter::create(&SAMPLE, ValueDescriptor::new()).unwrap_err();
        assert_eq!(
            error,
            DescriptorError::MissingAttribute {
                interface: "Sample",
                attribute: "target",
            }
        );
    }

    #[test]
    fn test_typed_access_checks_kind() {
        let adapter = DescriptorAdapter::create(&SAMPLE, sample()).unwrap();
        assert!(adapter.value::<bool>("limit").is_err());
        assert!(adapter.value::<i32>("missing").is_err());
        assert!(adapter.expect_interface(&SAMPLE).is_ok());
        assert!(adapter.expect_interface(&OTHER).is_err());
    }

    #[test]
    fn test_trim_indent() {
        let text = "\n    a, b\n      c\n\n    d\n  ";
        assert_eq!(trim_indent(text), "a, b\n  c\n\nd");
        assert_eq!(trim_indent("x\r\n  y"), "x\n  y");
        assert_eq!(trim_indent(""), "");
    }

    #[test]
    fn test_trim_indent_with_unicode_whitespace() {
        assert_eq!(trim_indent("\u{2003}a, 1\n b, 2"), "a, 1\nb, 2");
        assert_eq!(
            trim_indent("\u{00A0}\u{00A0}x\n\u{00A0}\u{00A0}\u{00A0}y"),
            "x\n\u{00A0}y"
        );
    }
}
