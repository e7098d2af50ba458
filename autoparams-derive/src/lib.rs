//! Derive macros for the AutoParams fixture generation library
//!
//! This crate provides the `Resolvable` derive, which exposes a type's
//! constructors to the autoparams resolution pipeline.

use proc_macro::TokenStream;

mod derive;

/// Derive macro for automatically implementing the Resolvable trait
///
/// Structs get one primary constructor taking every field in declaration
/// order. Enums get one constructor per variant; the pipeline picks a
/// variant at random and resolves its fields.
///
/// # Basic Usage
///
/// ```rust
/// use autoparams::Resolvable;
///
/// #[derive(Debug, Clone, Resolvable)]
/// struct User {
///     id: u32,
///     name: String,
///     active: bool,
/// }
/// ```
///
/// # Customization
///
/// ```rust
/// use autoparams::Resolvable;
///
/// #[derive(Debug, Clone, Default, Resolvable)]
/// #[autoparams(default, properties)]
/// struct Account {
///     #[autoparams(min = 18, max = 99)]
///     age: u8,
///     owner: String,
/// }
/// ```
///
/// # Supported Attributes
///
/// - `#[autoparams(default)]` on a struct: also register a constructor
///   backed by `Default`. It is synthesized, so the pipeline never selects it.
/// - `#[autoparams(properties)]` on a struct with named fields: tag the
///   constructor with the field names.
/// - `#[autoparams(min = .., max = ..)]` on an integer field: keep generated
///   values within the inclusive bounds.
///
/// # Generic Types
///
/// Type parameters must implement `Resolvable`; the type is queried by its
/// name and type arguments:
///
/// ```rust
/// use autoparams::Resolvable;
///
/// #[derive(Debug, Clone, Resolvable)]
/// struct Labelled<T> {
///     label: String,
///     value: T,
/// }
/// ```
///
/// # Enums
///
/// ```rust
/// use autoparams::Resolvable;
///
/// #[derive(Debug, Clone, Resolvable)]
/// enum Status {
///     Active,
///     Inactive(String),
///     Pending { reason: String },
/// }
/// ```
#[proc_macro_derive(Resolvable, attributes(autoparams))]
pub fn derive_resolvable(input: TokenStream) -> TokenStream {
    derive::derive_resolvable_impl(input)
}
