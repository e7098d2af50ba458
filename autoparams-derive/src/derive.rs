//! Derive macro implementation for the Resolvable trait
//!
//! The generated implementation describes the type to the resolution
//! pipeline: one constructor per struct, or one variant constructor per enum
//! variant, with a parameter for every field in declaration order.

use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::Parser;
use syn::{
    Attribute, Data, DeriveInput, Error, Expr, Fields, GenericParam, Meta, MetaNameValue, Result,
    Type, Variant, parse_macro_input, parse_quote,
};

/// Main entry point for the Resolvable derive macro
pub fn derive_resolvable_impl(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_resolvable_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Options of a struct-level `#[autoparams(...)]` attribute
#[derive(Debug, Default, PartialEq)]
struct TypeOptions {
    /// Register a synthesized constructor backed by `Default`
    default: bool,
    /// Tag the constructor with the field names
    properties: bool,
}

/// Options of a field-level `#[autoparams(...)]` attribute
#[derive(Default)]
struct FieldOptions {
    min: Option<Expr>,
    max: Option<Expr>,
}

/// Generate the Resolvable implementation for the given input
fn generate_resolvable_impl(input: &DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let options = parse_type_options(&input.attrs)?;

    let mut bounded_generics = input.generics.clone();
    add_trait_bounds(&mut bounded_generics);
    let (impl_generics, ty_generics, where_clause) = bounded_generics.split_for_impl();

    let describe_body = match &input.data {
        Data::Struct(data_struct) => generate_struct_descriptor(&data_struct.fields, &options)?,
        Data::Enum(data_enum) => {
            if options != TypeOptions::default() {
                return Err(Error::new_spanned(
                    name,
                    "`default` and `properties` apply to structs only",
                ));
            }
            generate_enum_descriptor(name, &data_enum.variants.iter().collect::<Vec<_>>())?
        }
        Data::Union(_) => {
            return Err(Error::new_spanned(
                input,
                "Resolvable derive is not supported for unions",
            ));
        }
    };

    let type_query = generate_type_query(input);

    Ok(quote! {
        impl #impl_generics ::autoparams::Resolvable for #name #ty_generics #where_clause {
            #type_query

            fn describe() -> ::core::option::Option<::autoparams::TypeDescriptor> {
                ::core::option::Option::Some(#describe_body)
            }
        }
    })
}

/// Add the Resolvable bound to every type parameter
fn add_trait_bounds(generics: &mut syn::Generics) {
    for param in &mut generics.params {
        if let GenericParam::Type(ref mut type_param) = *param {
            type_param.bounds.push(parse_quote!(::autoparams::Resolvable));
        }
    }
}

/// Generic types are queried by their name and type arguments
fn generate_type_query(input: &DeriveInput) -> TokenStream {
    let type_params: Vec<_> = input
        .generics
        .params
        .iter()
        .filter_map(|param| match param {
            GenericParam::Type(type_param) => Some(&type_param.ident),
            _ => None,
        })
        .collect();

    if type_params.is_empty() {
        return quote! {};
    }

    let raw = input.ident.to_string();
    quote! {
        fn type_query() -> ::autoparams::TypeQuery {
            ::autoparams::TypeQuery::parameterized::<Self>(
                #raw,
                vec![#(<#type_params as ::autoparams::Resolvable>::type_query()),*],
            )
        }
    }
}

/// Parse `#[autoparams(default, properties)]` on the type
fn parse_type_options(attrs: &[Attribute]) -> Result<TypeOptions> {
    let mut options = TypeOptions::default();

    for meta in autoparams_metas(attrs)? {
        match &meta {
            Meta::Path(path) if path.is_ident("default") => options.default = true,
            Meta::Path(path) if path.is_ident("properties") => options.properties = true,
            _ => {
                return Err(Error::new_spanned(
                    meta,
                    "Unsupported autoparams attribute, expected `default` or `properties`",
                ));
            }
        }
    }

    Ok(options)
}

/// Parse `#[autoparams(min = .., max = ..)]` on a field
fn parse_field_options(attrs: &[Attribute]) -> Result<FieldOptions> {
    let mut options = FieldOptions::default();

    for meta in autoparams_metas(attrs)? {
        match meta {
            Meta::NameValue(MetaNameValue { path, value, .. }) if path.is_ident("min") => {
                options.min = Some(value);
            }
            Meta::NameValue(MetaNameValue { path, value, .. }) if path.is_ident("max") => {
                options.max = Some(value);
            }
            other => {
                return Err(Error::new_spanned(
                    other,
                    "Unsupported autoparams field attribute, expected `min = ..` or `max = ..`",
                ));
            }
        }
    }

    Ok(options)
}

/// All metas of the `#[autoparams(...)]` attributes in `attrs`
fn autoparams_metas(attrs: &[Attribute]) -> Result<Vec<Meta>> {
    let mut metas = Vec::new();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("autoparams")) {
        let Meta::List(list) = &attr.meta else {
            return Err(Error::new_spanned(
                attr,
                "autoparams attribute must be a list",
            ));
        };
        let parser = syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated;
        metas.extend(parser.parse2(list.tokens.clone())?);
    }

    Ok(metas)
}

/// Descriptor of one parameter, with the field's bounds
fn parameter_descriptor(
    field_name: Option<String>,
    field_type: &Type,
    attrs: &[Attribute],
) -> Result<TokenStream> {
    let options = parse_field_options(attrs)?;

    let descriptor = match field_name {
        Some(field_name) => {
            quote! { ::autoparams::ParameterDescriptor::named::<#field_type>(#field_name) }
        }
        None => quote! { ::autoparams::ParameterDescriptor::of::<#field_type>() },
    };

    Ok(match (options.min, options.max) {
        (None, None) => descriptor,
        (min, max) => {
            if !is_integer(field_type) {
                return Err(Error::new_spanned(
                    field_type,
                    "`min` and `max` apply to integer fields only",
                ));
            }
            let min = min
                .map(|min| quote! { (#min) as i128 })
                .unwrap_or_else(|| quote! { i128::MIN });
            let max = max
                .map(|max| quote! { (#max) as i128 })
                .unwrap_or_else(|| quote! { i128::MAX });
            quote! { #descriptor.with_bounds(#min, #max) }
        }
    })
}

const INTEGER_TYPES: &[&str] = &[
    "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize",
];

/// Whether `ty` names a primitive integer type
fn is_integer(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) if type_path.qself.is_none() => type_path
            .path
            .get_ident()
            .is_some_and(|ident| INTEGER_TYPES.iter().any(|name| ident == name)),
        Type::Group(group) => is_integer(&group.elem),
        Type::Paren(paren) => is_integer(&paren.elem),
        _ => false,
    }
}

/// Parameters and the value expression of a set of fields
fn generate_fields(fields: &Fields, path: TokenStream) -> Result<(Vec<TokenStream>, TokenStream)> {
    match fields {
        Fields::Named(fields_named) => {
            let mut parameters = Vec::new();
            let mut initializers = Vec::new();
            for field in &fields_named.named {
                let Some(field_name) = field.ident.as_ref() else {
                    return Err(Error::new_spanned(field, "Named field without identifier"));
                };
                let field_type = &field.ty;
                parameters.push(parameter_descriptor(
                    Some(field_name.to_string()),
                    field_type,
                    &field.attrs,
                )?);
                initializers.push(quote! { #field_name: args.take::<#field_type>()? });
            }
            Ok((parameters, quote! { #path { #(#initializers,)* } }))
        }
        Fields::Unnamed(fields_unnamed) => {
            let mut parameters = Vec::new();
            let mut initializers = Vec::new();
            for field in &fields_unnamed.unnamed {
                let field_type = &field.ty;
                parameters.push(parameter_descriptor(None, field_type, &field.attrs)?);
                initializers.push(quote! { args.take::<#field_type>()? });
            }
            Ok((parameters, quote! { #path( #(#initializers,)* ) }))
        }
        Fields::Unit => Ok((Vec::new(), path)),
    }
}

/// A constructor expression building `value` from `parameters`
fn constructor(
    name: &str,
    kind: TokenStream,
    parameters: &[TokenStream],
    value: TokenStream,
) -> TokenStream {
    let args = if parameters.is_empty() {
        quote! { _args }
    } else {
        quote! { mut args }
    };

    quote! {
        ::autoparams::Constructor::new(
            #name,
            #kind,
            vec![#(#parameters),*],
            |#args: ::autoparams::ConstructorArgs|
                -> ::core::result::Result<Self, ::autoparams::ConstructionError> {
                ::core::result::Result::Ok(#value)
            },
        )
    }
}

/// Generate the descriptor of a struct
fn generate_struct_descriptor(fields: &Fields, options: &TypeOptions) -> Result<TokenStream> {
    let (parameters, value) = generate_fields(fields, quote! { Self })?;

    let kind = if options.properties {
        let Fields::Named(fields_named) = fields else {
            return Err(Error::new_spanned(
                fields,
                "`properties` requires a struct with named fields",
            ));
        };
        let names = fields_named
            .named
            .iter()
            .filter_map(|field| field.ident.as_ref().map(ToString::to_string));
        quote! { ::autoparams::ConstructorKind::Properties(vec![#(#names),*]) }
    } else {
        quote! { ::autoparams::ConstructorKind::Primary }
    };

    let mut constructors = vec![constructor("new", kind, &parameters, value)];
    if options.default {
        constructors.push(constructor(
            "default",
            quote! { ::autoparams::ConstructorKind::Synthesized },
            &[],
            quote! { <Self as ::core::default::Default>::default() },
        ));
    }

    Ok(quote! {
        ::autoparams::TypeDescriptor::composite::<Self>(vec![#(#constructors),*])
    })
}

/// Generate the descriptor of an enum
fn generate_enum_descriptor(name: &syn::Ident, variants: &[&Variant]) -> Result<TokenStream> {
    if variants.is_empty() {
        return Err(Error::new_spanned(
            name,
            "Cannot derive Resolvable for empty enum",
        ));
    }

    let variant_descriptors = variants
        .iter()
        .map(|variant| {
            let variant_name = &variant.ident;
            let variant_label = variant_name.to_string();
            let (parameters, value) =
                generate_fields(&variant.fields, quote! { Self::#variant_name })?;
            let constructor = constructor(
                &variant_label,
                quote! { ::autoparams::ConstructorKind::Declared },
                &parameters,
                value,
            );

            Ok(quote! {
                ::autoparams::Variant::new(#variant_label, #constructor)
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(quote! {
        ::autoparams::TypeDescriptor::enumeration::<Self>(vec![#(#variant_descriptors),*])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_add_trait_bounds() {
        let mut generics: syn::Generics = parse_quote! { <T, U> };
        add_trait_bounds(&mut generics);

        if let GenericParam::Type(type_param) = &generics.params[0] {
            assert_eq!(type_param.bounds.len(), 1);
        }
    }

    #[test]
    fn test_parse_type_options() {
        let attrs: Vec<Attribute> = vec![parse_quote! { #[autoparams(default, properties)] }];
        let options = parse_type_options(&attrs).unwrap();
        assert!(options.default);
        assert!(options.properties);

        let attrs: Vec<Attribute> = vec![parse_quote! { #[autoparams(unknown)] }];
        assert!(parse_type_options(&attrs).is_err());
    }

    #[test]
    fn test_field_bounds() {
        let field_type: Type = parse_quote! { u8 };
        let attrs: Vec<Attribute> = vec![parse_quote! { #[autoparams(min = 1, max = 9)] }];
        let tokens = parameter_descriptor(Some("age".to_string()), &field_type, &attrs)
            .unwrap()
            .to_string();
        assert!(tokens.contains("with_bounds"));
        assert!(tokens.contains("\"age\""));

        let tokens = parameter_descriptor(None, &field_type, &[]).unwrap().to_string();
        assert!(!tokens.contains("with_bounds"));
    }

    #[test]
    fn test_bounds_on_non_integer_fields_are_rejected() {
        let attrs: Vec<Attribute> = vec![parse_quote! { #[autoparams(min = 1)] }];
        let rejected: [Type; 3] = [
            parse_quote! { String },
            parse_quote! { f64 },
            parse_quote! { Option<u8> },
        ];
        for field_type in &rejected {
            let error = parameter_descriptor(Some("x".to_string()), field_type, &attrs)
                .unwrap_err();
            assert!(error.to_string().contains("integer fields only"));
        }

        let field_type: Type = parse_quote! { i64 };
        assert!(parameter_descriptor(None, &field_type, &attrs).is_ok());
    }

    #[test]
    fn test_unit_struct_has_no_parameters() {
        let (parameters, value) = generate_fields(&Fields::Unit, quote! { Self }).unwrap();
        assert!(parameters.is_empty());
        assert_eq!(value.to_string(), quote! { Self }.to_string());
    }

    #[test]
    fn test_unions_are_rejected() {
        let input: DeriveInput = parse_quote! {
            union Bits { a: u32, b: f32 }
        };
        assert!(generate_resolvable_impl(&input).is_err());
    }

    #[test]
    fn test_properties_need_named_fields() {
        let input: DeriveInput = parse_quote! {
            #[autoparams(properties)]
            struct Pair(u8, u8);
        };
        assert!(generate_resolvable_impl(&input).is_err());
    }
}
