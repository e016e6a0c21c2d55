//! Implementation of the `#[bridge_package]` attribute macro
//!
//! Transforms a module containing `#[bridge_fn]` and `#[bridge_const]` items
//! into a package with a generated builder returning a `Map` of its members.

use std::collections::BTreeSet;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Ident, Item, ItemMod};

use crate::common::{get_name_from_item, get_name_from_tokens, struct_name};

/// A member of the package, in declaration order.
enum Member {
    /// A `#[bridge_fn]`, registered through its generated struct.
    Function { name: Ident },
    /// A `#[bridge_const]`, registered with the value its function returns.
    Constant { name: Ident, rust_fn_name: Ident },
}

pub fn bridge_package_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    match expand(attr.into(), item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

pub(crate) fn expand(attr: TokenStream2, item: TokenStream2) -> syn::Result<TokenStream2> {
    let mut input_mod: ItemMod = syn::parse2(item)?;
    let builder_name = get_name_from_tokens(attr, "bridge_package", "builder", &input_mod.ident)?;

    let Some((brace, mut content)) = input_mod.content.take() else {
        return Err(syn::Error::new_spanned(
            &input_mod,
            "[shellbridge] bridge_package requires a module with inline content (not a file module)",
        ));
    };

    let mut members = Vec::new();
    let mut seen = BTreeSet::new();
    for item in content.iter() {
        let Item::Fn(item_fn) = item else {
            continue;
        };
        let fn_name = &item_fn.sig.ident;
        let function = get_name_from_item(&item_fn.attrs, "bridge_fn", "name", fn_name)?;
        let constant = get_name_from_item(&item_fn.attrs, "bridge_const", "name", fn_name)?;
        let member = match (function, constant) {
            (Some(name), None) => Member::Function { name },
            (None, Some(name)) => Member::Constant {
                name,
                rust_fn_name: fn_name.clone(),
            },
            (None, None) => continue,
            (Some(_), Some(_)) => {
                return Err(syn::Error::new_spanned(
                    fn_name,
                    "[shellbridge] an item cannot be both a bridge_fn and a bridge_const",
                ));
            }
        };
        let name = match &member {
            Member::Function { name } | Member::Constant { name, .. } => name,
        };
        if !seen.insert(name.to_string()) {
            return Err(syn::Error::new_spanned(
                name,
                format!("[shellbridge] duplicate package member `{}`", name),
            ));
        }
        members.push(member);
    }

    content.push(syn::parse2(generate_builder_function(&builder_name, &members))?);
    input_mod.content = Some((brace, content));

    Ok(quote! { #input_mod })
}

fn generate_builder_function(builder_name: &Ident, members: &[Member]) -> TokenStream2 {
    let registrations = members.iter().map(|member| match member {
        Member::Function { name } => {
            let name_str = name.to_string();
            let struct_name = struct_name(name);
            quote! {
                __package.set(#name_str, #struct_name::new().into_value());
            }
        }
        Member::Constant { name, rust_fn_name } => {
            let name_str = name.to_string();
            quote! {
                __package.set(#name_str, ::shellbridge_core::values::Bridge::into_value(#rust_fn_name()));
            }
        }
    });

    quote! {
        pub fn #builder_name() -> ::shellbridge_core::Map {
            let __package = ::shellbridge_core::Map::new();
            #(#registrations)*
            __package
        }
    }
}
