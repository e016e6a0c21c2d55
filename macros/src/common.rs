//! Shared utilities for the shellbridge procedural macros.

use proc_macro2::TokenStream as TokenStream2;
use quote::format_ident;
use syn::{Attribute, Expr, Ident, Meta};

/// Reads the optional `key = ident` argument of an attribute. Empty tokens
/// mean no argument; anything else is an error.
pub(crate) fn parse_name_value(tokens: TokenStream2, key: &str) -> syn::Result<Option<Ident>> {
    if tokens.is_empty() {
        return Ok(None);
    }

    let meta: Meta = syn::parse2(tokens)?;
    match meta {
        Meta::NameValue(nv) if nv.path.is_ident(key) => {
            if let Expr::Path(expr_path) = &nv.value {
                if let Some(ident) = expr_path.path.get_ident() {
                    return Ok(Some(ident.clone()));
                }
            }
            Err(syn::Error::new_spanned(
                &nv.value,
                format!("[shellbridge] {} must be an identifier", key),
            ))
        }
        _ => Err(syn::Error::new_spanned(
            meta,
            format!("[shellbridge] expected `{} = identifier`, or no arguments", key),
        )),
    }
}

/// The member name an item declares through `#[attr_name]`, or `None` when the
/// item does not carry the attribute.
pub(crate) fn get_name_from_item(
    item_attrs: &[Attribute],
    attr_name: &str,
    key: &str,
    item_name: &Ident,
) -> syn::Result<Option<Ident>> {
    let Some(attr) = item_attrs.iter().find(|a| a.path().is_ident(attr_name)) else {
        return Ok(None);
    };

    let tokens = match &attr.meta {
        Meta::Path(_) => TokenStream2::new(),
        Meta::List(list) => list.tokens.clone(),
        Meta::NameValue(_) => {
            return Err(syn::Error::new_spanned(
                attr,
                format!("[shellbridge] invalid attribute syntax for `#[{}]`", attr_name),
            ));
        }
    };

    get_name_from_tokens(tokens, attr_name, key, item_name).map(Some)
}

/// Resolves the name from the tokens passed to an attribute macro, deriving
/// it from `item_name` when none is given.
pub(crate) fn get_name_from_tokens(
    attr_tokens: TokenStream2,
    attr_name: &str,
    key: &str,
    item_name: &Ident,
) -> syn::Result<Ident> {
    if let Some(name) = parse_name_value(attr_tokens, key)? {
        return Ok(name);
    }

    let derived = match attr_name {
        "bridge_const" => to_screaming_snake_case(&item_name.to_string()),
        "bridge_package" => format!("build_{}_package", item_name),
        _ => item_name.to_string(),
    };
    Ok(format_ident!("{}", derived, span = item_name.span()))
}

/// Name of the struct `#[bridge_fn]` generates for script name `name`.
pub(crate) fn struct_name(name: &Ident) -> Ident {
    format_ident!("{}", to_pascal_case(&name.to_string()), span = name.span())
}

/// `safe_div` -> `SafeDiv`. Repeated and leading underscores are dropped.
pub fn to_pascal_case(s: &str) -> String {
    s.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars
                .next()
                .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
                .unwrap_or_default()
        })
        .collect()
}

/// `max_depth` -> `MAX_DEPTH`.
pub fn to_screaming_snake_case(s: &str) -> String {
    s.to_ascii_uppercase()
}
