//! `#[injectable]` 实现
//!
//! 从固有 impl 块中收集注入式构造函数、setter 和工厂方法,
//! 生成 `InjectionMethods` 实现, 并移除辅助属性。

use crate::utils::{self, InjectedParams};
use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Attribute, Error, FnArg, ImplItem, ImplItemFn, ItemImpl, LitStr, Result, ReturnType, Type};

/// `#[bean]` 参数
#[derive(Default)]
struct BeanArgs {
    name: Option<LitStr>,
}

impl BeanArgs {
    fn from_attr(attr: &Attribute) -> Result<Self> {
        let mut args = Self::default();
        if matches!(attr.meta, syn::Meta::Path(_)) {
            return Ok(args);
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                args.name = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("不支持的 bean 参数, 可用: name = \"...\""))
            }
        })?;
        Ok(args)
    }
}

#[derive(Default)]
struct Collected {
    constructor: Option<TokenStream>,
    no_arg_new: bool,
    setters: Vec<TokenStream>,
    beans: Vec<TokenStream>,
}

pub(super) fn expand_injectable(args: TokenStream, mut item: ItemImpl) -> Result<TokenStream> {
    if !args.is_empty() {
        return Err(Error::new_spanned(args, "#[injectable] 不接受参数"));
    }
    if let Some((_, path, _)) = &item.trait_ {
        return Err(Error::new_spanned(path, "#[injectable] 只能用于固有 impl 块"));
    }
    if !item.generics.params.is_empty() {
        return Err(Error::new_spanned(&item.generics, "#[injectable] 不支持泛型 impl 块"));
    }

    let self_ty = (*item.self_ty).clone();
    let mut collected = Collected::default();
    for impl_item in item.items.iter_mut() {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };
        collect_method(method, &self_ty, &mut collected)?;
    }

    let constructor = match collected.constructor {
        Some(constructor) => constructor,
        None if collected.no_arg_new => quote!(::di_abstractions::Constructor::NoArgs(Self::new)),
        None => quote!(::di_abstractions::Constructor::Missing),
    };
    let setters = &collected.setters;
    let beans = &collected.beans;

    Ok(quote! {
        #item

        impl ::di_abstractions::InjectionMethods for #self_ty {
            fn constructor() -> ::di_abstractions::Constructor<Self> {
                #constructor
            }

            fn setters() -> ::std::vec::Vec<::di_abstractions::SetterInjection<Self>> {
                ::std::vec![#(#setters),*]
            }

            fn beans() -> ::std::vec::Vec<::di_abstractions::BeanMethod<Self>> {
                ::std::vec![#(#beans),*]
            }
        }
    })
}

fn collect_method(method: &mut ImplItemFn, self_ty: &Type, collected: &mut Collected) -> Result<()> {
    let autowired = utils::take_attr(&mut method.attrs, "autowired");
    let bean = utils::take_attr(&mut method.attrs, "bean");
    let has_receiver = method.sig.receiver().is_some();

    match (autowired, bean) {
        (Some(attr), Some(_)) => Err(Error::new_spanned(
            attr,
            "方法不能同时标注 #[autowired] 和 #[bean]",
        )),
        (Some(attr), None) => {
            attr.meta.require_path_only()?;
            if has_receiver {
                collected.setters.push(setter(method)?);
            } else if collected.constructor.is_some() {
                return Err(Error::new_spanned(
                    &method.sig.ident,
                    "只能有一个 #[autowired] 构造函数",
                ));
            } else {
                collected.constructor = Some(constructor(method, self_ty)?);
            }
            Ok(())
        }
        (None, Some(attr)) => {
            collected.beans.push(bean_method(method, &attr)?);
            Ok(())
        }
        (None, None) => {
            let sig = &method.sig;
            if sig.ident == "new" && sig.inputs.is_empty() {
                if let ReturnType::Type(_, ty) = &sig.output {
                    collected.no_arg_new = utils::is_self_type(ty, self_ty);
                }
            }
            Ok(())
        }
    }
}

fn constructor(method: &mut ImplItemFn, self_ty: &Type) -> Result<TokenStream> {
    let ident = method.sig.ident.clone();
    let ReturnType::Type(_, output) = &method.sig.output else {
        return Err(Error::new_spanned(&method.sig, "构造函数必须返回 Self 或 Result<Self, E>"));
    };
    let fallible = match utils::wrapped_type(output, "Result") {
        Some(ok) if utils::is_self_type(ok, self_ty) => true,
        None if utils::is_self_type(output, self_ty) => false,
        _ => {
            return Err(Error::new_spanned(
                output,
                "构造函数必须返回 Self 或 Result<Self, E>",
            ))
        }
    };

    let params = utils::injected_params(&mut method.sig)?;
    let InjectedParams { points, values } = &params;
    let pattern = params.pattern();
    let call = quote!(Self::#ident(#(#values),*));
    let body = if fallible {
        let failure = utils::construction_failure();
        quote!(#call.map_err(#failure))
    } else {
        quote!(::std::result::Result::Ok(#call))
    };

    Ok(quote! {
        ::di_abstractions::Constructor::Injected {
            params: ::std::vec![#(#points),*],
            build: |#pattern: ::di_abstractions::Arguments| #body,
        }
    })
}

fn setter(method: &mut ImplItemFn) -> Result<TokenStream> {
    let ident = method.sig.ident.clone();
    let name = ident.unraw().to_string();
    let unit = utils::returns_unit(&method.sig.output);
    if !unit && utils::wrapped_type(return_type(&method.sig.output)?, "Result").is_none() {
        return Err(Error::new_spanned(
            &method.sig.output,
            "setter 必须返回 () 或 Result<(), E>",
        ));
    }

    let params = utils::injected_params(&mut method.sig)?;
    let InjectedParams { points, values } = &params;
    let pattern = params.pattern();
    let call = quote!(target.#ident(#(#values),*));
    let body = if unit {
        quote! {
            #call;
            ::std::result::Result::Ok(())
        }
    } else {
        let failure = utils::construction_failure();
        quote!(#call.map_err(#failure))
    };

    Ok(quote! {
        ::di_abstractions::SetterInjection::new(
            #name,
            ::std::vec![#(#points),*],
            |target: &Self, #pattern: ::di_abstractions::Arguments| { #body },
        )
    })
}

fn bean_method(method: &ImplItemFn, attr: &Attribute) -> Result<TokenStream> {
    let args = BeanArgs::from_attr(attr)?;
    let sig = &method.sig;
    let only_self = sig.inputs.len() == 1
        && matches!(sig.inputs.first(), Some(FnArg::Receiver(receiver)) if receiver.reference.is_some() && receiver.mutability.is_none());
    if !only_self {
        return Err(Error::new_spanned(&sig.inputs, "工厂方法只能有 &self 参数"));
    }

    let ident = &sig.ident;
    let method_name = ident.unraw().to_string();
    let output = return_type(&sig.output)?;
    let (value, fallible) = match utils::wrapped_type(output, "Result") {
        Some(ok) => (ok, true),
        None => (output, false),
    };
    let (key, wrap) = match utils::wrapped_type(value, "Arc") {
        Some(inner) => (inner, None),
        None => (value, Some(quote!(::std::sync::Arc::new))),
    };

    let call = quote!(factory.#ident());
    let mut bean = if fallible {
        let failure = utils::construction_failure();
        let produce = match wrap {
            Some(wrap) => quote!(#call.map(#wrap).map_err(#failure)),
            None => quote!(#call.map_err(#failure)),
        };
        quote! {
            ::di_abstractions::BeanMethod::fallible::<#key>(#method_name, |factory: &Self| #produce)
        }
    } else {
        let produce = match wrap {
            Some(wrap) => quote!(#wrap(#call)),
            None => call,
        };
        quote! {
            ::di_abstractions::BeanMethod::new::<#key>(#method_name, |factory: &Self| #produce)
        }
    };
    if let Some(name) = &args.name {
        bean = quote!(#bean.named(#name));
    }
    Ok(bean)
}

fn return_type(output: &ReturnType) -> Result<&Type> {
    match output {
        ReturnType::Type(_, ty) => Ok(ty),
        ReturnType::Default => Err(Error::new_spanned(output, "缺少返回类型")),
    }
}
