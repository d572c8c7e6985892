use crate::utils::{apply_derives, parse_bool_value, serde_rename};
use proc_macro::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Fields, Item, Result, Token, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[relations] 宏实现
/// - 合并/追加派生：(Debug 可控), (Default 可选)
/// - 实现 `::orm_core::object::Relations`：逐字段调用 `ToObject::to_object`
/// - 参数：`#[relations(debug = true|false, default = true|false)]`，
///   `debug` 默认 true；`default` 默认 false，必填的单个关联（如 `Entity<Post>`）无法派生 Default
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as RelationsAttrConfig);
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[relations] only on struct")
                .to_compile_error()
                .into();
        }
    };

    let fields_named = match &st.fields {
        Fields::Named(f) => f,
        _ => {
            return syn::Error::new(st.span(), "#[relations] supports only named-field struct")
                .to_compile_error()
                .into();
        }
    };

    let mut inserts = Vec::with_capacity(fields_named.named.len());
    for field in fields_named.named.iter() {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let key = match serde_rename(field) {
            Ok(Some(renamed)) => renamed,
            Ok(None) => ident.unraw().to_string(),
            Err(err) => return err.to_compile_error().into(),
        };
        inserts.push(quote! {
            object.insert(
                ::std::string::String::from(#key),
                ::orm_core::object::ToObject::to_object(&self.#ident, options)?,
            );
        });
    }

    let mut required: Vec<syn::Path> = Vec::new();
    if cfg.derive_debug.unwrap_or(true) {
        required.push(syn::parse_quote!(Debug));
    }
    if cfg.derive_default.unwrap_or(false) {
        required.push(syn::parse_quote!(Default));
    }
    apply_derives(&mut st.attrs, required);

    let ident = &st.ident;
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    let out = quote! {
        #st

        impl #impl_generics ::orm_core::object::Relations for #ident #ty_generics #where_clause {
            fn to_object(
                &self,
                options: &::orm_core::object::ToObjectOptions,
            ) -> ::orm_core::error::PersistResult<::orm_core::object::Object> {
                let mut object = ::orm_core::object::Object::new();
                #(#inserts)*
                ::std::result::Result::Ok(object)
            }
        }
    };

    TokenStream::from(out)
}

// -------- parsing --------

struct RelationsAttrConfig {
    derive_debug: Option<bool>,
    derive_default: Option<bool>,
}

impl Parse for RelationsAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut derive_debug: Option<bool> = None;
        let mut derive_default: Option<bool> = None;

        if input.is_empty() {
            return Ok(Self {
                derive_debug,
                derive_default,
            });
        }

        let pairs: Punctuated<RelationsAttrElem, Token![,]> = Punctuated::parse_terminated(input)?;
        for elem in pairs {
            let (slot, key, value) = match elem {
                RelationsAttrElem::Debug(b) => (&mut derive_debug, "debug", b),
                RelationsAttrElem::Default(b) => (&mut derive_default, "default", b),
            };
            if slot.is_some() {
                return Err(syn::Error::new(
                    proc_macro2::Span::call_site(),
                    format!("duplicate key '{key}' in attribute"),
                ));
            }
            *slot = Some(value);
        }
        Ok(Self {
            derive_debug,
            derive_default,
        })
    }
}

enum RelationsAttrElem {
    Debug(bool),
    Default(bool),
}

impl Parse for RelationsAttrElem {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: syn::Ident = input.parse()?;
        if key == "debug" {
            Ok(Self::Debug(parse_bool_value(input, "debug")?))
        } else if key == "default" {
            Ok(Self::Default(parse_bool_value(input, "default")?))
        } else {
            Err(syn::Error::new(
                key.span(),
                "unknown key in attribute; expected 'debug' or 'default'",
            ))
        }
    }
}
