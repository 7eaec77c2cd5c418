//! `#[derive(Configuration)]` 实现

use crate::utils;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub(super) fn expand_configuration(input: &DeriveInput) -> Result<TokenStream> {
    let fields = utils::struct_fields(input, "Configuration")?;
    let injections = utils::field_injections(fields)?;
    let name = &input.ident;

    Ok(quote! {
        impl ::di_abstractions::Configuration for #name {
            fn fields() -> ::std::vec::Vec<::di_abstractions::FieldInjection<Self>> {
                ::std::vec![#(#injections),*]
            }

            fn beans() -> ::std::vec::Vec<::di_abstractions::BeanMethod<Self>> {
                <Self as ::di_abstractions::InjectionMethods>::beans()
            }
        }
    })
}
