//! Runtime type identities used to route resolution requests.
//!
//! A [`TypeQuery`] is the runtime stand-in for a requested Rust type. It
//! carries the type's identity, its generic arguments when the type is
//! parameterized, and the hooks that let generators inspect the type
//! (constructors, literal parsing, the absent value) without knowing it
//! statically.

use std::any::{Any, TypeId, type_name};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::construct::{Constructor, ConstructorKind, ParameterDescriptor, TypeDescriptor};
use crate::error::ConstructionError;
use crate::value::Value;

/// Raw type name under which [`TypeRef`] queries are parameterized
pub const TYPE_REF: &str = "TypeRef";

/// Identity of a Rust type: its `TypeId` plus a readable name
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key of the type `T`
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// The underlying `TypeId`
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The fully qualified type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type name without module paths, e.g. `Vec<i32>` for `alloc::vec::Vec<i32>`
    pub fn short_name(&self) -> String {
        short_type_name(self.name)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Strip module paths from every segment of a type name
pub(crate) fn short_type_name(name: &str) -> String {
    let mut short = String::with_capacity(name.len());
    let mut segment = String::new();
    for ch in name.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            segment.push(ch);
        } else {
            short.push_str(segment.rsplit("::").next().unwrap_or(""));
            segment.clear();
            short.push(ch);
        }
    }
    short.push_str(segment.rsplit("::").next().unwrap_or(""));
    short
}

#[derive(Clone, Copy)]
struct TypeHooks {
    describe: fn() -> Option<TypeDescriptor>,
    parse: fn(&str) -> Option<Result<Value, String>>,
    absent: fn() -> Option<Value>,
}

impl TypeHooks {
    fn of<T: Resolvable>() -> Self {
        Self {
            describe: T::describe,
            parse: |text: &str| T::from_literal(text).map(|result| result.map(Value::new)),
            absent: || T::absent().map(Value::new),
        }
    }
}

/// A requested type with no generic arguments of interest
#[derive(Clone)]
pub struct ConcreteType {
    key: TypeKey,
    hooks: TypeHooks,
}

impl ConcreteType {
    /// Identity of the type
    pub fn key(&self) -> TypeKey {
        self.key
    }
}

/// A requested generic type: raw type name plus ordered type arguments
#[derive(Clone)]
pub struct ParameterizedType {
    key: TypeKey,
    raw: &'static str,
    args: Vec<TypeQuery>,
    hooks: TypeHooks,
}

impl ParameterizedType {
    /// Identity of the fully instantiated type
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// The raw (un-instantiated) type name, e.g. `Vec`
    pub fn raw(&self) -> &'static str {
        self.raw
    }

    /// The ordered type arguments
    pub fn args(&self) -> &[TypeQuery] {
        &self.args
    }

    /// The type argument at `index`
    pub fn argument(&self, index: usize) -> Option<&TypeQuery> {
        self.args.get(index)
    }
}

/// The runtime description of a requested type.
///
/// Equality and hashing use the Rust type identity only, so two queries for
/// the same instantiated type are always equal.
#[derive(Clone)]
pub enum TypeQuery {
    Concrete(ConcreteType),
    Parameterized(ParameterizedType),
}

impl TypeQuery {
    /// The query for `T`, as declared by its [`Resolvable`] implementation
    pub fn of<T: Resolvable>() -> Self {
        T::type_query()
    }

    /// A concrete query for `T`
    pub fn concrete<T: Resolvable>() -> Self {
        TypeQuery::Concrete(ConcreteType {
            key: TypeKey::of::<T>(),
            hooks: TypeHooks::of::<T>(),
        })
    }

    /// A parameterized query for `T` with its raw name and type arguments
    pub fn parameterized<T: Resolvable>(raw: &'static str, args: Vec<TypeQuery>) -> Self {
        TypeQuery::Parameterized(ParameterizedType {
            key: TypeKey::of::<T>(),
            raw,
            args,
            hooks: TypeHooks::of::<T>(),
        })
    }

    /// Identity of the requested type
    pub fn key(&self) -> TypeKey {
        match self {
            TypeQuery::Concrete(concrete) => concrete.key,
            TypeQuery::Parameterized(parameterized) => parameterized.key,
        }
    }

    /// Whether this query requests exactly `T`
    pub fn is<T: Any>(&self) -> bool {
        self.key().id() == TypeId::of::<T>()
    }

    /// The raw type name of a parameterized query
    pub fn raw(&self) -> Option<&'static str> {
        self.as_parameterized().map(ParameterizedType::raw)
    }

    /// Whether this is a parameterized query with the given raw type name
    pub fn matches_raw(&self, raw: &str) -> bool {
        self.raw() == Some(raw)
    }

    /// Type arguments, empty for concrete queries
    pub fn args(&self) -> &[TypeQuery] {
        match self {
            TypeQuery::Concrete(_) => &[],
            TypeQuery::Parameterized(parameterized) => &parameterized.args,
        }
    }

    /// Access the parameterized form, if any
    pub fn as_parameterized(&self) -> Option<&ParameterizedType> {
        match self {
            TypeQuery::Concrete(_) => None,
            TypeQuery::Parameterized(parameterized) => Some(parameterized),
        }
    }

    /// The type's constructors and shape, if it declares any
    pub fn describe(&self) -> Option<TypeDescriptor> {
        (self.hooks().describe)()
    }

    /// Parse a textual literal into a value of this type
    pub fn parse_literal(&self, text: &str) -> Option<Result<Value, String>> {
        (self.hooks().parse)(text)
    }

    /// The value that stands for a null literal, if the type has one
    pub fn absent(&self) -> Option<Value> {
        (self.hooks().absent)()
    }

    fn hooks(&self) -> &TypeHooks {
        match self {
            TypeQuery::Concrete(concrete) => &concrete.hooks,
            TypeQuery::Parameterized(parameterized) => &parameterized.hooks,
        }
    }
}

impl PartialEq for TypeQuery {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for TypeQuery {}

impl Hash for TypeQuery {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for TypeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeQuery::Concrete(concrete) => f.write_str(&concrete.key.short_name()),
            TypeQuery::Parameterized(parameterized) => {
                write!(f, "{}<", parameterized.raw)?;
                for (index, arg) in parameterized.args.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")
            }
        }
    }
}

impl fmt::Debug for TypeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeQuery({})", self)
    }
}

/// A type the resolution pipeline can reason about at runtime.
///
/// Implementations are usually derived with `#[derive(Resolvable)]`, which
/// exposes the type's constructors through [`Resolvable::describe`]. Types
/// without constructors can still implement the trait by hand; generators
/// then match on their identity.
pub trait Resolvable: Any + Clone + fmt::Debug + Send + Sync {
    /// The query that represents this type
    fn type_query() -> TypeQuery {
        TypeQuery::concrete::<Self>()
    }

    /// Constructors, variants or collection shape of this type
    fn describe() -> Option<TypeDescriptor> {
        None
    }

    /// Parse a textual literal, `None` when the type has no literal form
    fn from_literal(_text: &str) -> Option<Result<Self, String>> {
        None
    }

    /// The value a null literal converts to, `None` when nulls are rejected
    fn absent() -> Option<Self> {
        None
    }
}

macro_rules! impl_literal_resolvable {
    ($($t:ty),* $(,)?) => {
        $(
            impl Resolvable for $t {
                fn from_literal(text: &str) -> Option<Result<Self, String>> {
                    Some(text.parse::<$t>().map_err(|error| error.to_string()))
                }
            }
        )*
    };
}

impl_literal_resolvable!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
    uuid::Uuid,
);

impl<T: Resolvable> Resolvable for Option<T> {
    fn type_query() -> TypeQuery {
        TypeQuery::parameterized::<Self>("Option", vec![T::type_query()])
    }

    fn describe() -> Option<TypeDescriptor> {
        Some(TypeDescriptor::composite::<Self>(vec![Constructor::new(
            "Some",
            ConstructorKind::Primary,
            vec![ParameterDescriptor::of::<T>()],
            |mut args| Ok(Some(args.take::<T>()?)),
        )]))
    }

    fn from_literal(text: &str) -> Option<Result<Self, String>> {
        T::from_literal(text).map(|result| result.map(Some))
    }

    fn absent() -> Option<Self> {
        Some(None)
    }
}

impl<T: Resolvable> Resolvable for Box<T> {
    fn type_query() -> TypeQuery {
        TypeQuery::parameterized::<Self>("Box", vec![T::type_query()])
    }

    fn describe() -> Option<TypeDescriptor> {
        Some(TypeDescriptor::composite::<Self>(vec![Constructor::new(
            "new",
            ConstructorKind::Primary,
            vec![ParameterDescriptor::of::<T>()],
            |mut args| Ok(Box::new(args.take::<T>()?)),
        )]))
    }

    fn from_literal(text: &str) -> Option<Result<Self, String>> {
        T::from_literal(text).map(|result| result.map(Box::new))
    }
}

macro_rules! impl_sequence_resolvable {
    ($raw:literal, $collection:ident, $($bound:path),*) => {
        impl<T: Resolvable $(+ $bound)*> Resolvable for $collection<T> {
            fn type_query() -> TypeQuery {
                TypeQuery::parameterized::<Self>($raw, vec![T::type_query()])
            }

            fn describe() -> Option<TypeDescriptor> {
                Some(TypeDescriptor::collection::<Self, _>(
                    vec![T::type_query()],
                    |entries| {
                        entries
                            .into_iter()
                            .map(|mut entry| entry.take::<T>())
                            .collect()
                    },
                ))
            }
        }
    };
}

impl_sequence_resolvable!("Vec", Vec,);
impl_sequence_resolvable!("VecDeque", VecDeque,);
impl_sequence_resolvable!("HashSet", HashSet, Eq, Hash);
impl_sequence_resolvable!("BTreeSet", BTreeSet, Ord);

macro_rules! impl_map_resolvable {
    ($raw:literal, $collection:ident, $($bound:path),*) => {
        impl<K: Resolvable $(+ $bound)*, V: Resolvable> Resolvable for $collection<K, V> {
            fn type_query() -> TypeQuery {
                TypeQuery::parameterized::<Self>($raw, vec![K::type_query(), V::type_query()])
            }

            fn describe() -> Option<TypeDescriptor> {
                Some(TypeDescriptor::collection::<Self, _>(
                    vec![K::type_query(), V::type_query()],
                    |entries| {
                        entries
                            .into_iter()
                            .map(|mut entry| Ok((entry.take::<K>()?, entry.take::<V>()?)))
                            .collect()
                    },
                ))
            }
        }
    };
}

impl_map_resolvable!("HashMap", HashMap, Eq, Hash);
impl_map_resolvable!("BTreeMap", BTreeMap, Ord);

/// A type used as a value: the runtime token of some [`Resolvable`] type
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TypeToken {
    query: TypeQuery,
}

impl TypeToken {
    /// The token of `T`
    pub fn of<T: Resolvable>() -> Self {
        Self {
            query: T::type_query(),
        }
    }

    /// The query the token stands for
    pub fn query(&self) -> &TypeQuery {
        &self.query
    }

    /// Whether the token stands for `T`
    pub fn is<T: Any>(&self) -> bool {
        self.query.is::<T>()
    }
}

impl From<TypeQuery> for TypeToken {
    fn from(query: TypeQuery) -> Self {
        Self { query }
    }
}

impl From<&TypeQuery> for TypeToken {
    fn from(query: &TypeQuery) -> Self {
        Self {
            query: query.clone(),
        }
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.query, f)
    }
}

impl fmt::Debug for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeToken({})", self.query)
    }
}

impl Resolvable for TypeToken {}

/// A typed reference to the runtime token of `T`.
///
/// Its only constructor takes a [`TypeToken`], which default generation
/// cannot produce on its own. The type reference customizer substitutes the
/// token of the requested type argument.
pub struct TypeRef<T> {
    token: TypeToken,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Resolvable> TypeRef<T> {
    /// Reference to `T`
    pub fn new() -> Self {
        Self {
            token: TypeToken::of::<T>(),
            _marker: PhantomData,
        }
    }

    /// Reference built from a token, which must stand for `T`
    pub fn from_token(token: TypeToken) -> Result<Self, ConstructionError> {
        if token.is::<T>() {
            Ok(Self {
                token,
                _marker: PhantomData,
            })
        } else {
            Err(ConstructionError::new(format!(
                "token {} does not reference {}",
                token,
                T::type_query()
            )))
        }
    }
}

impl<T> TypeRef<T> {
    /// The referenced token
    pub fn token(&self) -> &TypeToken {
        &self.token
    }
}

impl<T: Resolvable> Default for TypeRef<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for TypeRef<T> {
    fn clone(&self) -> Self {
        Self {
            token: self.token.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for TypeRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}

impl<T> fmt::Debug for TypeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef<{}>", self.token)
    }
}

impl<T: Resolvable> Resolvable for TypeRef<T> {
    fn type_query() -> TypeQuery {
        TypeQuery::parameterized::<Self>(TYPE_REF, vec![T::type_query()])
    }

    fn describe() -> Option<TypeDescriptor> {
        Some(TypeDescriptor::composite::<Self>(vec![Constructor::new(
            "from_token",
            ConstructorKind::Declared,
            vec![ParameterDescriptor::named::<TypeToken>("token")],
            |mut args| TypeRef::<T>::from_token(args.take::<TypeToken>()?),
        )]))
    }
}
