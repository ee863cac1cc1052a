//! 可注入类型派生宏实现

use crate::utils::{
    extract_generic_type, is_arc_type, is_option_type, is_type_named, last_segment_name,
    trait_object_name,
};
use proc_macro2::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{Data, DeriveInput, Expr, Field, Fields, LitStr, Token, Type};

/// 结构体级别的 `#[injectable(...)]` 参数
#[derive(Default)]
struct InjectableOptions {
    id: Option<String>,
    bare_on_cycle: bool,
    /// `provides(dyn Trait, ...)`，接口标识取 trait 名
    provides: Vec<(String, Type)>,
}

/// 字段级别的 `#[inject(...)]` 参数
#[derive(Default)]
struct InjectOptions {
    id: Option<String>,
    optional: bool,
    default: Option<DefaultValue>,
}

enum DefaultValue {
    /// `#[inject(default)]`，使用 `Default::default()`
    Implicit,
    /// `#[inject(default = expr)]`
    Expr(Expr),
}

/// 字段的取值方式
enum FieldKind {
    /// `Arc<T>`，按 `T` 向下转型
    Shared(Type),
    /// `Arc<dyn Trait>`，实例中保存的是整个 `Arc`
    SharedDyn(Type),
    /// 未转型的 `Instance`
    Raw,
    /// 可克隆的值
    Value(Type),
}

struct FieldShape {
    kind: FieldKind,
    optional: bool,
    /// 从字段类型推断出的服务标识
    hint: Option<String>,
}

pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Injectable 不支持泛型类型，请为具体类型单独实现",
        ));
    }

    let name = &input.ident;
    let options = parse_injectable_options(input)?;
    let id = options.id.unwrap_or_else(|| name.to_string());
    let bare = options.bare_on_cycle.then(|| quote!(.bare_on_cycle()));
    let provides = options.provides.iter().map(|(interface, object)| {
        quote! {
            .provides::<#name, #object, _>(
                #interface,
                |concrete: ::std::sync::Arc<#name>| -> ::std::sync::Arc<#object> { concrete },
            )
        }
    });

    let data = match &input.data {
        Data::Struct(data) => data,
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Injectable 只能用于结构体",
            ))
        }
    };

    let (construct, parameters) = match &data.fields {
        Fields::Unit => (quote!(#name), Vec::new()),
        Fields::Named(fields) => {
            let mut initializers = Vec::new();
            let mut parameters = Vec::new();
            for field in &fields.named {
                let (initializer, parameter) = expand_field(field)?;
                initializers.push(initializer);
                parameters.push(parameter);
            }
            (quote!(#name { #(#initializers),* }), parameters)
        }
        Fields::Unnamed(fields) => {
            return Err(syn::Error::new_spanned(
                fields,
                "Injectable 不支持元组结构体，字段名即参数名",
            ))
        }
    };

    let arguments = if parameters.is_empty() {
        quote!(_arguments)
    } else {
        quote!(arguments)
    };

    Ok(quote! {
        impl ::di_abstractions::Injectable for #name {
            fn type_descriptor() -> ::di_abstractions::TypeDescriptor {
                ::di_abstractions::TypeDescriptor::concrete(
                    #id,
                    |#arguments: ::di_abstractions::Arguments| {
                        ::std::result::Result::Ok(::di_abstractions::into_instance(#construct))
                    },
                )
                #(.parameter(#parameters))*
                #(#provides)*
                #bare
            }
        }
    })
}

fn parse_injectable_options(input: &DeriveInput) -> syn::Result<InjectableOptions> {
    let mut options = InjectableOptions::default();
    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("injectable")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                let value: LitStr = meta.value()?.parse()?;
                options.id = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("bare_on_cycle") {
                options.bare_on_cycle = true;
                Ok(())
            } else if meta.path.is_ident("provides") {
                let content;
                syn::parenthesized!(content in meta.input);
                let objects = Punctuated::<Type, Token![,]>::parse_terminated(&content)?;
                for object in objects {
                    let Some(interface) = trait_object_name(&object) else {
                        return Err(syn::Error::new_spanned(
                            &object,
                            "provides 只接受 trait 对象，例如 provides(dyn Mailer)",
                        ));
                    };
                    options.provides.push((interface, object));
                }
                Ok(())
            } else {
                Err(meta.error("不支持的 injectable 参数，可用: id, bare_on_cycle, provides"))
            }
        })?;
    }
    Ok(options)
}

fn parse_inject_options(field: &Field) -> syn::Result<InjectOptions> {
    let mut options = InjectOptions::default();
    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("inject")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                let value: LitStr = meta.value()?.parse()?;
                options.id = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("optional") {
                options.optional = true;
                Ok(())
            } else if meta.path.is_ident("default") {
                options.default = if meta.input.peek(Token![=]) {
                    Some(DefaultValue::Expr(meta.value()?.parse()?))
                } else {
                    Some(DefaultValue::Implicit)
                };
                Ok(())
            } else {
                Err(meta.error("不支持的 inject 参数，可用: id, optional, default"))
            }
        })?;
    }
    Ok(options)
}

fn classify(ty: &Type) -> FieldShape {
    if is_option_type(ty) {
        if let Some(inner) = extract_generic_type(ty) {
            let mut shape = classify_required(inner);
            shape.optional = true;
            return shape;
        }
    }
    classify_required(ty)
}

fn classify_required(ty: &Type) -> FieldShape {
    if is_arc_type(ty) {
        if let Some(target) = extract_generic_type(ty) {
            if let Some(name) = trait_object_name(target) {
                return FieldShape {
                    kind: FieldKind::SharedDyn(ty.clone()),
                    optional: false,
                    hint: Some(name),
                };
            }
            return FieldShape {
                kind: FieldKind::Shared(target.clone()),
                optional: false,
                hint: last_segment_name(target),
            };
        }
    }
    if is_type_named(ty, "Instance") && extract_generic_type(ty).is_none() {
        return FieldShape {
            kind: FieldKind::Raw,
            optional: false,
            hint: None,
        };
    }
    FieldShape {
        kind: FieldKind::Value(ty.clone()),
        optional: false,
        hint: None,
    }
}

/// 生成字段初始化表达式和参数描述
fn expand_field(field: &Field) -> syn::Result<(TokenStream, TokenStream)> {
    let Some(ident) = field.ident.as_ref() else {
        return Err(syn::Error::new_spanned(field, "缺少字段名"));
    };
    let name = ident.to_string();
    let options = parse_inject_options(field)?;
    let shape = classify(&field.ty);

    let extraction = match (&shape.kind, shape.optional) {
        (FieldKind::Shared(target), false) => quote!(arguments.get::<#target>(#name)?),
        (FieldKind::Shared(target), true) => quote!(arguments.optional::<#target>(#name)?),
        (FieldKind::SharedDyn(shared), false) => quote!(arguments.value::<#shared>(#name)?),
        (FieldKind::SharedDyn(shared), true) => {
            quote!(arguments.optional_value::<#shared>(#name)?)
        }
        (FieldKind::Raw, false) => quote!(arguments.instance(#name)?),
        (FieldKind::Raw, true) => quote!(arguments.optional_instance(#name)),
        (FieldKind::Value(value), false) => quote!(arguments.value::<#value>(#name)?),
        (FieldKind::Value(value), true) => quote!(arguments.optional_value::<#value>(#name)?),
    };

    let mut parameter = quote!(::di_abstractions::ParameterDescriptor::new(#name));
    if let Some(type_id) = options.id.or(shape.hint) {
        parameter = quote!(#parameter.with_type(#type_id));
    }
    if shape.optional || options.optional {
        parameter = quote!(#parameter.optional());
    }
    if let Some(default) = options.default {
        let stored = match &shape.kind {
            FieldKind::Shared(target) => target,
            FieldKind::SharedDyn(shared) => shared,
            FieldKind::Value(value) => value,
            FieldKind::Raw => {
                let DefaultValue::Expr(expr) = default else {
                    return Err(syn::Error::new_spanned(
                        field,
                        "Instance 字段的 default 需要显式给出表达式",
                    ));
                };
                parameter = quote!(#parameter.with_default_instance(#expr));
                return Ok((quote!(#ident: #extraction), parameter));
            }
        };
        let value = match default {
            DefaultValue::Implicit => quote!(<#stored as ::std::default::Default>::default()),
            DefaultValue::Expr(expr) => quote!(#expr),
        };
        parameter = quote!(#parameter.with_default::<#stored>(#value));
    }

    Ok((quote!(#ident: #extraction), parameter))
}
