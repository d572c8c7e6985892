use quote::ToTokens;
use syn::spanned::Spanned;
use syn::{Attribute, Field, LitStr, Result, Token, parse::ParseStream};

// 提取非 derive 属性与已有 derive 列表
pub(crate) fn split_derives(attrs: &[Attribute]) -> (Vec<Attribute>, Vec<syn::Path>) {
    let mut retained = Vec::new();
    let mut existing = Vec::new();
    for attr in attrs.iter() {
        if attr.path().is_ident("derive") {
            if let Ok(list) = attr.parse_args_with(
                syn::punctuated::Punctuated::<syn::Path, Token![,]>::parse_terminated,
            ) {
                existing.extend(list);
            }
        } else {
            retained.push(attr.clone());
        }
    }
    (retained, existing)
}

// 合并默认与已有 derive（去重，优先保留 required）
pub(crate) fn merge_derives(existing: Vec<syn::Path>, required: Vec<syn::Path>) -> Attribute {
    let mut seen = std::collections::HashSet::<String>::new();
    let mut final_list: Vec<syn::Path> = Vec::new();
    for p in required.into_iter().chain(existing) {
        if seen.insert(derive_key(&p)) {
            final_list.push(p);
        }
    }
    syn::parse_quote!(#[derive(#(#final_list),*)])
}

// 归一化 derive 的 key，避免 Serialize/serde::Serialize 重复
pub(crate) fn derive_key(p: &syn::Path) -> String {
    if let Some(last) = p.segments.last() {
        let last_ident = last.ident.to_string();
        match last_ident.as_str() {
            "Serialize" | "Deserialize" => format!("serde::{}", last_ident),
            _ => last_ident,
        }
    } else {
        p.to_token_stream().to_string()
    }
}

// 直接在 attrs 上应用默认派生合并
pub(crate) fn apply_derives(attrs: &mut Vec<Attribute>, required: Vec<syn::Path>) {
    let (retained, existing) = split_derives(attrs);
    let merged = merge_derives(existing, required);
    *attrs = std::iter::once(merged).chain(retained).collect();
}

// 解析 `key = true|false`（key 已被调用方读取）
pub(crate) fn parse_bool_value(input: ParseStream, key: &str) -> Result<bool> {
    let _eq: Token![=] = input.parse()?;
    let expr: syn::Expr = input.parse()?;
    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Bool(b),
            ..
        }) => Ok(b.value()),
        other => Err(syn::Error::new(
            other.span(),
            format!("expected boolean literal for '{key}'"),
        )),
    }
}

// 遍历 `#[serde(...)]` 中的每一项；未被 `visit` 消费的值会被跳过
fn walk_serde_attrs<F>(attrs: &[Attribute], mut visit: F) -> Result<()>
where
    F: FnMut(&syn::meta::ParseNestedMeta) -> Result<bool>,
{
    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if visit(&meta)? {
                return Ok(());
            }
            if meta.input.peek(Token![=]) {
                let _: syn::Expr = meta.value()?.parse()?;
            } else if meta.input.peek(syn::token::Paren) {
                let _: proc_macro2::TokenTree = meta.input.parse()?;
            }
            Ok(())
        })?;
    }
    Ok(())
}

// 读取字段上的 `#[serde(rename = "...")]`，其余 serde 选项忽略
pub(crate) fn serde_rename(field: &Field) -> Result<Option<String>> {
    let mut renamed = None;
    walk_serde_attrs(&field.attrs, |meta| {
        if meta.path.is_ident("rename") && meta.input.peek(Token![=]) {
            let lit: LitStr = meta.value()?.parse()?;
            renamed = Some(lit.value());
            return Ok(true);
        }
        Ok(false)
    })?;
    Ok(renamed)
}

// 会让字段在序列化结果中缺失或被展开的 serde 选项，脏字段无法与之对应
const UNTRACKABLE_FIELD_OPTIONS: &[&str] = &[
    "flatten",
    "skip",
    "skip_serializing",
    "skip_serializing_if",
];

// 拒绝无法按字段名追踪的 serde 字段选项
pub(crate) fn reject_untrackable_field(field: &Field, macro_name: &str) -> Result<()> {
    walk_serde_attrs(&field.attrs, |meta| {
        match UNTRACKABLE_FIELD_OPTIONS
            .iter()
            .find(|option| meta.path.is_ident(option))
        {
            Some(option) => Err(meta.error(format!(
                "#[{macro_name}] does not support `#[serde({option})]`: every field must serialize under its own key"
            ))),
            None => Ok(false),
        }
    })
}

/// serde 的 `rename_all` 字段命名规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    fn parse(rule: &str) -> Option<Self> {
        Some(match rule {
            "lowercase" => Self::Lower,
            "UPPERCASE" => Self::Upper,
            "PascalCase" => Self::Pascal,
            "camelCase" => Self::Camel,
            "snake_case" => Self::Snake,
            "SCREAMING_SNAKE_CASE" => Self::ScreamingSnake,
            "kebab-case" => Self::Kebab,
            "SCREAMING-KEBAB-CASE" => Self::ScreamingKebab,
            _ => return None,
        })
    }

    // 与 serde_derive 对 snake_case 字段名的转换一致
    pub(crate) fn apply_to_field(self, field: &str) -> String {
        match self {
            Self::Lower | Self::Snake => field.to_owned(),
            Self::Upper | Self::ScreamingSnake => field.to_ascii_uppercase(),
            Self::Pascal => {
                let mut pascal = String::with_capacity(field.len());
                let mut capitalize = true;
                for ch in field.chars() {
                    if ch == '_' {
                        capitalize = true;
                    } else if capitalize {
                        pascal.push(ch.to_ascii_uppercase());
                        capitalize = false;
                    } else {
                        pascal.push(ch);
                    }
                }
                pascal
            }
            Self::Camel => {
                let pascal = Self::Pascal.apply_to_field(field);
                let mut chars = pascal.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
                    None => pascal,
                }
            }
            Self::Kebab => field.replace('_', "-"),
            Self::ScreamingKebab => field.to_ascii_uppercase().replace('_', "-"),
        }
    }
}

// 读取容器上的 `#[serde(rename_all = "...")]`；
// 分别指定序列化/反序列化规则的写法无法确定字段键，直接报错
pub(crate) fn serde_rename_all(attrs: &[Attribute], macro_name: &str) -> Result<Option<RenameRule>> {
    let mut rule = None;
    walk_serde_attrs(attrs, |meta| {
        if !meta.path.is_ident("rename_all") {
            return Ok(false);
        }
        if !meta.input.peek(Token![=]) {
            return Err(meta.error(format!(
                "#[{macro_name}] supports only `rename_all = \"...\"`"
            )));
        }
        let lit: LitStr = meta.value()?.parse()?;
        rule = Some(RenameRule::parse(&lit.value()).ok_or_else(|| {
            syn::Error::new(lit.span(), format!("unknown rename_all rule `{}`", lit.value()))
        })?);
        Ok(true)
    })?;
    Ok(rule)
}
