//! Derive macros for idiocy
//!
//! `#[derive(Component)]` generates the `Component` implementation for a
//! struct with named fields: the fields marked `#[inject]` become the
//! constructor's dependency list, everything else is filled with `Default`.
//!
//! `#[provides(dyn Trait, ...)]` additionally generates the `Upcast`
//! conversions so the component can be bound to those trait objects.
//!
//! # Example
//!
//! ```rust,ignore
//! use idiocy::{Component, Container};
//! use std::sync::Arc;
//!
//! trait Mailer: Send + Sync {}
//!
//! #[derive(Component)]
//! #[provides(dyn Mailer)]
//! struct SmtpMailer;
//!
//! impl Mailer for SmtpMailer {}
//!
//! #[derive(Component)]
//! struct Signup {
//!     #[inject]
//!     mailer: Arc<dyn Mailer>,
//!     // Non-injected fields use Default
//!     attempts: u64,
//! }
//!
//! let container = Container::new();
//! container.singleton::<dyn Mailer, SmtpMailer>().unwrap();
//! container.transient::<Signup, Signup>().unwrap();
//!
//! let signup = container.resolve::<Signup>().unwrap();
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::punctuated::Punctuated;
use syn::{Attribute, Data, DeriveInput, Fields, Token, Type, parse_macro_input};

/// Derive macro for the `Component` trait.
///
/// # Attributes
///
/// - `#[inject]` - Required dependency. The field type must be `Arc<T>`.
/// - `#[inject(optional)]` - Dependency that may be unregistered. The field
///   type must be `Option<Arc<T>>`.
/// - `#[provides(dyn A, dyn B)]` - On the struct: implement `Upcast` to each
///   listed service type.
///
/// Fields without `#[inject]` use `Default::default()`. Dependencies are
/// resolved in field declaration order.
///
/// # Generated Code
///
/// ```rust,ignore
/// #[derive(Component)]
/// struct Report {
///     #[inject]
///     store: Arc<dyn Store>,
///     #[inject(optional)]
///     audit: Option<Arc<Audit>>,
///     pages: u32,
/// }
///
/// // impl Component for Report {
/// //     type Dependencies = (Arc<dyn Store>, Option<Arc<Audit>>);
/// //     fn construct((store, audit): Self::Dependencies) -> Self {
/// //         Self { store, audit, pages: Default::default() }
/// //     }
/// // }
/// ```
///
/// Enums, unions and tuple structs are rejected: a component has exactly one
/// constructor, and it is built from named fields.
#[proc_macro_derive(Component, attributes(inject, provides))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand_component(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_component(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Some(&fields.named),
            Fields::Unit => None,
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Component can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Component can only be derived for structs",
            ));
        }
    };

    let mut dep_types: Vec<&Type> = Vec::new();
    let mut dep_names: Vec<syn::Ident> = Vec::new();
    let mut field_inits: Vec<TokenStream2> = Vec::new();

    for field in fields.into_iter().flatten() {
        let Some(field_name) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        let field_type = &field.ty;

        match find_inject_attr(&field.attrs)? {
            Some(InjectAttr::Required) => {
                if extract_arc_inner_type(field_type).is_none() {
                    return Err(syn::Error::new_spanned(
                        field_type,
                        "Fields marked with #[inject] must have type Arc<T>",
                    ));
                }
            }
            Some(InjectAttr::Optional) => {
                if extract_option_arc_inner_type(field_type).is_none() {
                    return Err(syn::Error::new_spanned(
                        field_type,
                        "Fields marked with #[inject(optional)] must have type Option<Arc<T>>",
                    ));
                }
            }
            None => {
                field_inits.push(quote! {
                    #field_name: ::std::default::Default::default()
                });
                continue;
            }
        }

        let dep_name = format_ident!("__dep_{}", dep_names.len(), span = field_name.span());
        field_inits.push(quote! { #field_name: #dep_name });
        dep_types.push(field_type);
        dep_names.push(dep_name);
    }

    let (deps_type, deps_pattern) = match dep_types.as_slice() {
        [] => (quote! { () }, quote! { _ }),
        [ty] => {
            let name = &dep_names[0];
            (quote! { #ty }, quote! { #name })
        }
        types => (quote! { (#(#types),*) }, quote! { (#(#dep_names),*) }),
    };

    let body = match fields {
        Some(_) => quote! { Self { #(#field_inits),* } },
        None => quote! { Self },
    };

    let upcasts = find_provides_attrs(&input.attrs)?
        .into_iter()
        .map(|service| {
            quote! {
                impl #impl_generics ::idiocy::Upcast<#service> for #name #ty_generics #where_clause {
                    #[inline]
                    fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<#service> {
                        self
                    }
                }
            }
        });

    Ok(quote! {
        impl #impl_generics ::idiocy::Component for #name #ty_generics #where_clause {
            type Dependencies = #deps_type;

            fn construct(#deps_pattern: Self::Dependencies) -> Self {
                #body
            }
        }

        #(#upcasts)*
    })
}

/// Types of inject attributes
enum InjectAttr {
    Required,
    Optional,
}

/// Find and parse the #[inject] attribute
fn find_inject_attr(attrs: &[Attribute]) -> syn::Result<Option<InjectAttr>> {
    let Some(attr) = attrs.iter().find(|attr| attr.path().is_ident("inject")) else {
        return Ok(None);
    };

    if attr.meta.require_path_only().is_ok() {
        return Ok(Some(InjectAttr::Required));
    }

    let mut optional = false;
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("optional") {
            optional = true;
            Ok(())
        } else {
            Err(meta.error("expected `optional`"))
        }
    })?;

    Ok(Some(if optional {
        InjectAttr::Optional
    } else {
        InjectAttr::Required
    }))
}

/// Collect the service types from every #[provides(...)] attribute
fn find_provides_attrs(attrs: &[Attribute]) -> syn::Result<Vec<Type>> {
    let mut services = Vec::new();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("provides")) {
        let listed = attr.parse_args_with(Punctuated::<Type, Token![,]>::parse_terminated)?;
        if listed.is_empty() {
            return Err(syn::Error::new_spanned(
                attr,
                "#[provides] expects at least one service type",
            ));
        }
        services.extend(listed);
    }

    Ok(services)
}

/// Extract T from Arc<T>
fn extract_arc_inner_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty {
        let segment = type_path.path.segments.last()?;
        if segment.ident == "Arc" {
            if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
                    return Some(inner);
                }
            }
        }
    }
    None
}

/// Extract T from Option<Arc<T>>
fn extract_option_arc_inner_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty {
        let segment = type_path.path.segments.last()?;
        if segment.ident == "Option" {
            if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
                    return extract_arc_inner_type(inner);
                }
            }
        }
    }
    None
}
