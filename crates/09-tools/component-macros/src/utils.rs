//! 宏工具函数

use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{
    Attribute, Data, DeriveInput, Error, Fields, FnArg, GenericArgument, LitStr, PathArguments,
    Result, ReturnType, Signature, Type,
};

/// 取出 `Wrapper<T>` 中的 `T`, 只比较最后一段路径
pub fn wrapped_type<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    if type_path.qself.is_some() {
        return None;
    }
    let segment = type_path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        }),
        _ => None,
    }
}

/// `dyn Trait` 是能力类型
pub fn is_capability(ty: &Type) -> bool {
    match ty {
        Type::TraitObject(_) => true,
        Type::Paren(paren) => is_capability(&paren.elem),
        Type::Group(group) => is_capability(&group.elem),
        _ => false,
    }
}

/// 类型是否为 `Self` 或给定的自身类型
pub fn is_self_type(ty: &Type, self_ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) if type_path.path.is_ident("Self") => true,
        _ => quote!(#ty).to_string() == quote!(#self_ty).to_string(),
    }
}

/// 返回类型是否为 `()`
pub fn returns_unit(output: &ReturnType) -> bool {
    match output {
        ReturnType::Default => true,
        ReturnType::Type(_, ty) => matches!(&**ty, Type::Tuple(tuple) if tuple.elems.is_empty()),
    }
}

/// 生成注入点表达式
pub fn injection_point(ty: &Type, qualifier: Option<&LitStr>) -> TokenStream {
    let point = if is_capability(ty) {
        quote!(::di_abstractions::InjectionPoint::capability::<#ty>())
    } else {
        quote!(::di_abstractions::InjectionPoint::concrete::<#ty>())
    };
    match qualifier {
        Some(qualifier) => quote!(#point.with_qualifier(#qualifier)),
        None => point,
    }
}

/// 把错误值转换为构造失败
pub fn construction_failure() -> TokenStream {
    quote! {
        |err| ::di_abstractions::DependencyError::construction_failure(
            ::std::any::type_name::<Self>(),
            err.to_string(),
        )
    }
}

/// 移除并返回指定名称的属性
pub fn take_attr(attrs: &mut Vec<Attribute>, name: &str) -> Option<Attribute> {
    let index = attrs.iter().position(|attr| attr.path().is_ident(name))?;
    Some(attrs.remove(index))
}

/// 注入方法的参数
pub struct InjectedParams {
    /// 注入点表达式
    pub points: Vec<TokenStream>,
    /// 从 `args` 取值的表达式
    pub values: Vec<TokenStream>,
}

impl InjectedParams {
    /// 参数列表的闭包模式, 没有参数时忽略实参
    pub fn pattern(&self) -> TokenStream {
        if self.values.is_empty() {
            quote!(_)
        } else {
            quote!(mut args)
        }
    }
}

/// 解析注入方法的参数并移除参数上的 `#[qualifier("x")]`
///
/// 每个参数都必须是 `Arc<T>`。
pub fn injected_params(sig: &mut Signature) -> Result<InjectedParams> {
    let mut points = Vec::new();
    let mut values = Vec::new();
    for input in sig.inputs.iter_mut() {
        let FnArg::Typed(param) = input else {
            continue;
        };
        let qualifier = take_attr(&mut param.attrs, "qualifier")
            .map(|attr| attr.parse_args::<LitStr>())
            .transpose()?;
        let target = wrapped_type(&param.ty, "Arc")
            .ok_or_else(|| Error::new_spanned(&param.ty, "注入参数的类型必须是 Arc<T>"))?;
        points.push(injection_point(target, qualifier.as_ref()));
        values.push(quote!(args.next::<#target>()?));
    }
    Ok(InjectedParams { points, values })
}

/// `#[autowired]` 字段参数
#[derive(Default)]
struct AutowiredArgs {
    qualifier: Option<LitStr>,
}

impl AutowiredArgs {
    fn from_attr(attr: &Attribute) -> Result<Self> {
        let mut args = Self::default();
        if matches!(attr.meta, syn::Meta::Path(_)) {
            return Ok(args);
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("qualifier") {
                args.qualifier = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("不支持的 autowired 参数, 可用: qualifier = \"...\""))
            }
        })?;
        Ok(args)
    }
}

/// 为 `#[autowired]` 字段生成 `FieldInjection` 表达式
pub fn field_injections(fields: &Fields) -> Result<Vec<TokenStream>> {
    let named = match fields {
        Fields::Named(named) => &named.named,
        Fields::Unit => return Ok(Vec::new()),
        Fields::Unnamed(unnamed) => {
            return Err(Error::new_spanned(unnamed, "只支持具名字段结构体"));
        }
    };

    let mut injections = Vec::new();
    for field in named {
        let Some(attr) = field.attrs.iter().find(|attr| attr.path().is_ident("autowired")) else {
            continue;
        };
        let Some(ident) = &field.ident else {
            continue;
        };
        let args = AutowiredArgs::from_attr(attr)?;
        let target = wrapped_type(&field.ty, "Autowired").ok_or_else(|| {
            Error::new_spanned(&field.ty, "#[autowired] 字段的类型必须是 Autowired<T>")
        })?;

        let name = ident.unraw().to_string();
        let kind = if is_capability(target) {
            quote!(capability)
        } else {
            quote!(concrete)
        };
        let mut injection = quote! {
            ::di_abstractions::FieldInjection::#kind::<#target>(#name, |target: &Self| &target.#ident)
        };
        if let Some(qualifier) = &args.qualifier {
            injection = quote!(#injection.with_qualifier(#qualifier));
        }
        injections.push(injection);
    }
    Ok(injections)
}

/// 检查派生目标是无泛型的结构体并返回其字段
pub fn struct_fields<'a>(input: &'a DeriveInput, derive: &str) -> Result<&'a Fields> {
    let Data::Struct(data) = &input.data else {
        return Err(Error::new_spanned(
            &input.ident,
            format!("#[derive({derive})] 只支持结构体"),
        ));
    };
    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            format!("#[derive({derive})] 不支持泛型类型"),
        ));
    }
    Ok(&data.fields)
}
