use crate::utils::{
    apply_derives, parse_bool_value, reject_untrackable_field, serde_rename, serde_rename_all,
};
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{
    Attribute, Fields, Item, ItemStruct, Result, Token, parse::Parse, parse::ParseStream,
    parse_macro_input,
};

/// #[record] 宏实现
/// - 合并/追加派生：Clone, PartialEq, Serialize, Deserialize, (Debug 可控)
/// - 生成可写视图 `XxxMut<'a>`：每个字段的 `set_xxx` / `update_xxx`，
///   `#[track(nested)]` 字段额外生成返回嵌套视图的同名访问器
/// - 实现 `::orm_core::record::Record`
/// - 参数：`#[record(debug = true|false, filter = path::to::fn)]`
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as RecordAttrConfig);
    let input = parse_macro_input!(item as Item);

    let st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[record] only on struct")
                .to_compile_error()
                .into();
        }
    };

    match expand_struct(cfg, st) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct TrackedField {
    ident: syn::Ident,
    key: String,
    ty: syn::Type,
    nested: bool,
}

fn expand_struct(cfg: RecordAttrConfig, mut st: ItemStruct) -> Result<proc_macro2::TokenStream> {
    if !st.generics.params.is_empty() {
        return Err(syn::Error::new(
            st.generics.span(),
            "#[record] does not support generic structs",
        ));
    }

    let rename_all = serde_rename_all(&st.attrs, "record")?;

    let fields_named = match &mut st.fields {
        Fields::Named(f) => f,
        _ => {
            return Err(syn::Error::new(
                st.span(),
                "#[record] supports only named-field struct",
            ));
        }
    };

    let mut tracked = Vec::with_capacity(fields_named.named.len());
    for field in fields_named.named.iter_mut() {
        let nested = take_track_attr(&mut field.attrs)?;
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        reject_untrackable_field(field, "record")?;
        // 键名与 serde 序列化结果保持一致：字段 rename 优先，其次容器 rename_all
        let key = match (serde_rename(field)?, rename_all) {
            (Some(renamed), _) => renamed,
            (None, Some(rule)) => rule.apply_to_field(&ident.unraw().to_string()),
            (None, None) => ident.unraw().to_string(),
        };
        tracked.push(TrackedField {
            ident,
            key,
            ty: field.ty.clone(),
            nested,
        });
    }

    let mut required: Vec<syn::Path> = vec![
        syn::parse_quote!(Clone),
        syn::parse_quote!(PartialEq),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ];
    if cfg.derive_debug.unwrap_or(true) {
        required.insert(0, syn::parse_quote!(Debug));
    }
    apply_derives(&mut st.attrs, required);

    let vis = &st.vis;
    let ident = &st.ident;
    let view = format_ident!("{}Mut", ident);
    let view_doc = format!("`{ident}` 的可写视图，所有写入都会被变更追踪记录");

    let keys = tracked.iter().map(|f| &f.key);
    let methods = tracked.iter().map(field_methods);

    let filter_fn = cfg.filter.map(|path| {
        quote! {
            fn filter_object(
                object: ::orm_core::object::Object,
                options: &::orm_core::object::ToObjectOptions,
            ) -> ::orm_core::object::Object {
                #path(object, options)
            }
        }
    });

    Ok(quote! {
        #st

        #[doc = #view_doc]
        #vis struct #view<'a> {
            record: &'a mut #ident,
            scope: ::orm_core::tracking::Scope<'a>,
        }

        #[allow(dead_code)]
        impl<'a> #view<'a> {
            /// 视图标识：值未被替换前保持不变
            pub fn scope_id(&self) -> ::orm_core::tracking::ScopeId {
                self.scope.id()
            }

            #(#methods)*
        }

        impl<'a> ::core::ops::Deref for #view<'a> {
            type Target = #ident;

            fn deref(&self) -> &Self::Target {
                &*self.record
            }
        }

        impl ::orm_core::record::Record for #ident {
            const FIELDS: &'static [&'static str] = &[#(#keys),*];

            type Mut<'a> = #view<'a> where Self: 'a;

            fn tracked<'a>(
                &'a mut self,
                scope: ::orm_core::tracking::Scope<'a>,
            ) -> Self::Mut<'a> {
                #view { record: self, scope }
            }

            #filter_fn
        }
    })
}

fn field_methods(field: &TrackedField) -> proc_macro2::TokenStream {
    let TrackedField {
        ident,
        key,
        ty,
        nested,
    } = field;
    let name = ident.unraw();
    let setter = format_ident!("set_{}", name);
    let updater = format_ident!("update_{}", name);

    let accessor = nested.then(|| {
        quote! {
            pub fn #ident(&mut self) -> <#ty as ::orm_core::record::Record>::Mut<'_> {
                let scope = self.scope.nest(#key, &self.record.#ident);
                ::orm_core::record::Record::tracked(&mut self.record.#ident, scope)
            }
        }
    });

    quote! {
        pub fn #setter(&mut self, value: impl ::core::convert::Into<#ty>) -> bool {
            self.scope.assign(#key, &mut self.record.#ident, value.into())
        }

        pub fn #updater(&mut self, f: impl ::core::ops::FnOnce(&mut #ty)) -> bool {
            self.scope.update(#key, &mut self.record.#ident, f)
        }

        #accessor
    }
}

// 取出并移除字段上的 #[track(...)]，返回是否标记为 nested
fn take_track_attr(attrs: &mut Vec<Attribute>) -> Result<bool> {
    let mut nested = false;
    for attr in attrs.iter().filter(|a| a.path().is_ident("track")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("nested") {
                nested = true;
                Ok(())
            } else {
                Err(meta.error("unknown key in #[track]; expected 'nested'"))
            }
        })?;
    }
    attrs.retain(|a| !a.path().is_ident("track"));
    Ok(nested)
}

// -------- parsing --------

struct RecordAttrConfig {
    derive_debug: Option<bool>,
    filter: Option<syn::Path>,
}

impl Parse for RecordAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut derive_debug: Option<bool> = None;
        let mut filter: Option<syn::Path> = None;

        if input.is_empty() {
            return Ok(Self {
                derive_debug,
                filter,
            });
        }

        let elems: Punctuated<RecordAttrElem, Token![,]> = Punctuated::parse_terminated(input)?;
        for elem in elems {
            match elem {
                RecordAttrElem::Debug(b) => {
                    if derive_debug.is_some() {
                        return Err(syn::Error::new(
                            proc_macro2::Span::call_site(),
                            "duplicate key 'debug' in attribute",
                        ));
                    }
                    derive_debug = Some(b);
                }
                RecordAttrElem::Filter(path) => {
                    if filter.is_some() {
                        return Err(syn::Error::new(
                            path.span(),
                            "duplicate key 'filter' in attribute",
                        ));
                    }
                    filter = Some(path);
                }
            }
        }

        Ok(Self {
            derive_debug,
            filter,
        })
    }
}

enum RecordAttrElem {
    Debug(bool),
    Filter(syn::Path),
}

impl Parse for RecordAttrElem {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: syn::Ident = input.parse()?;
        if key == "debug" {
            Ok(Self::Debug(parse_bool_value(input, "debug")?))
        } else if key == "filter" {
            let _eq: Token![=] = input.parse()?;
            Ok(Self::Filter(input.parse()?))
        } else {
            Err(syn::Error::new(
                key.span(),
                "unknown key in attribute; expected 'debug' or 'filter'",
            ))
        }
    }
}
