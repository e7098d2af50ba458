//! Type-erased values and generation results.

use std::any::{Any, TypeId, type_name};
use std::fmt;

use crate::error::ResolutionError;
use crate::types::short_type_name;

trait AnyValue: Any + Send + Sync {
    fn clone_boxed(&self) -> Box<dyn AnyValue>;
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn fmt_debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<T: Any + Clone + fmt::Debug + Send + Sync> AnyValue for T {
    fn clone_boxed(&self) -> Box<dyn AnyValue> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn fmt_debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A produced value whose Rust type is only known at runtime
pub struct Value {
    inner: Box<dyn AnyValue>,
    type_name: &'static str,
}

impl Value {
    /// Wrap a value
    pub fn new<T: Any + Clone + fmt::Debug + Send + Sync>(value: T) -> Self {
        Self {
            inner: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Fully qualified name of the wrapped type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// `TypeId` of the wrapped type
    pub fn type_id(&self) -> TypeId {
        (*self.inner).as_any().type_id()
    }

    /// Whether the wrapped value is a `T`
    pub fn is<T: Any>(&self) -> bool {
        (*self.inner).as_any().is::<T>()
    }

    /// Borrow the wrapped value as a `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.inner).as_any().downcast_ref::<T>()
    }

    /// Unwrap the value as a `T`
    pub fn downcast<T: Any>(self) -> Result<T, ResolutionError> {
        let actual = self.type_name;
        self.inner
            .into_any()
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| {
                ResolutionError::type_mismatch(
                    short_type_name(type_name::<T>()),
                    short_type_name(actual),
                )
            })
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        Self {
            inner: (*self.inner).clone_boxed(),
            type_name: self.type_name,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (*self.inner).fmt_debug(f)
    }
}

/// Outcome of asking one generator for a value.
///
/// `Empty` means "not handled here" and lets the next generator in a
/// composition try; it is distinct from any produced value.
#[derive(Debug, Clone)]
pub enum GenerationResult {
    Empty,
    Produced {
        value: Value,
        producer: &'static str,
    },
}

impl GenerationResult {
    /// The empty result
    pub fn empty() -> Self {
        GenerationResult::Empty
    }

    /// A produced value tagged with the generator that produced it
    pub fn produced(value: Value, producer: &'static str) -> Self {
        GenerationResult::Produced { value, producer }
    }

    /// Wrap a typed value as a produced result
    pub fn of<T: Any + Clone + fmt::Debug + Send + Sync>(value: T, producer: &'static str) -> Self {
        Self::produced(Value::new(value), producer)
    }

    /// Whether no generator handled the query
    pub fn is_empty(&self) -> bool {
        matches!(self, GenerationResult::Empty)
    }

    /// The produced value, if any
    pub fn value(&self) -> Option<&Value> {
        match self {
            GenerationResult::Empty => None,
            GenerationResult::Produced { value, .. } => Some(value),
        }
    }

    /// The producing generator, if any
    pub fn producer(&self) -> Option<&'static str> {
        match self {
            GenerationResult::Empty => None,
            GenerationResult::Produced { producer, .. } => Some(producer),
        }
    }

    /// Consume the result, returning the produced value
    pub fn into_value(self) -> Option<Value> {
        match self {
            GenerationResult::Empty => None,
            GenerationResult::Produced { value, .. } => Some(value),
        }
    }

    /// Transform a produced value, leaving an empty result untouched
    pub fn try_map<F>(self, transform: F) -> Result<Self, ResolutionError>
    where
        F: FnOnce(Value) -> Result<Value, ResolutionError>,
    {
        match self {
            GenerationResult::Empty => Ok(GenerationResult::Empty),
            GenerationResult::Produced { value, producer } => Ok(GenerationResult::Produced {
                value: transform(value)?,
                producer,
            }),
        }
    }
}
