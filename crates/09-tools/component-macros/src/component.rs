//! `#[derive(Component)]` 实现

use crate::utils;
use proc_macro2::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{Attribute, DeriveInput, Error, Result, Token, Type};

/// `#[component(...)]` 参数
#[derive(Default)]
struct ComponentArgs {
    /// 满足的能力, 只接受 `dyn Trait`
    provides: Vec<Type>,
    /// 构造函数和 setter 来自 `#[injectable]` impl 块
    injectable: bool,
}

impl ComponentArgs {
    fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
        let mut args = Self::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("component")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("injectable") {
                    args.injectable = true;
                    Ok(())
                } else if meta.path.is_ident("provides") {
                    let content;
                    syn::parenthesized!(content in meta.input);
                    for ty in Punctuated::<Type, Token![,]>::parse_terminated(&content)? {
                        if !utils::is_capability(&ty) {
                            return Err(Error::new_spanned(ty, "provides 只接受 dyn Trait"));
                        }
                        args.provides.push(ty);
                    }
                    Ok(())
                } else {
                    Err(meta.error("不支持的 component 参数, 可用: provides(...), injectable"))
                }
            })?;
        }
        Ok(args)
    }
}

pub(super) fn expand_component(input: &DeriveInput) -> Result<TokenStream> {
    let fields = utils::struct_fields(input, "Component")?;
    let args = ComponentArgs::from_attrs(&input.attrs)?;
    let injections = utils::field_injections(fields)?;
    let name = &input.ident;

    let capabilities = args.provides.iter().map(|capability| {
        quote! {
            ::di_abstractions::CapabilityBinding::new::<Self, #capability>(
                |component: ::std::sync::Arc<Self>| -> ::std::sync::Arc<#capability> { component }
            )
        }
    });

    let construction = if args.injectable {
        quote! {
            fn constructor() -> ::di_abstractions::Constructor<Self> {
                <Self as ::di_abstractions::InjectionMethods>::constructor()
            }

            fn setters() -> ::std::vec::Vec<::di_abstractions::SetterInjection<Self>> {
                <Self as ::di_abstractions::InjectionMethods>::setters()
            }
        }
    } else {
        quote! {
            fn constructor() -> ::di_abstractions::Constructor<Self> {
                ::di_abstractions::Constructor::from_default()
            }
        }
    };

    Ok(quote! {
        impl ::di_abstractions::Component for #name {
            fn capabilities() -> ::std::vec::Vec<::di_abstractions::CapabilityBinding> {
                ::std::vec![#(#capabilities),*]
            }

            #construction

            fn fields() -> ::std::vec::Vec<::di_abstractions::FieldInjection<Self>> {
                ::std::vec![#(#injections),*]
            }
        }
    })
}
