//! Implementation of the `#[bridge_fn]` attribute macro
//!
//! Parses the function signature, validates it, and generates a struct
//! implementing `FunctionBase` that checks arguments against the declared
//! parameter types before calling the function.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    FnArg, GenericArgument, GenericParam, Ident, ItemFn, Pat, PatType, PathArguments, ReturnType,
    Type,
};

use crate::common::{get_name_from_tokens, struct_name};

/// Entry point for the `#[bridge_fn]` attribute macro.
pub fn bridge_fn_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    match expand(attr.into(), item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

pub(crate) fn expand(attr: TokenStream2, item: TokenStream2) -> syn::Result<TokenStream2> {
    let input_fn: ItemFn = syn::parse2(item)?;
    let name = get_name_from_tokens(attr, "bridge_fn", "name", &input_fn.sig.ident)?;
    let sig = parse_signature(&input_fn)?;
    Ok(generate_output(&input_fn, &name, &sig))
}

/// Parsed function signature information
struct ParsedSignature {
    fn_name: Ident,
    params: Vec<(Ident, Box<Type>)>,
    /// The return type, unwrapped if `Result<T, E>`
    ok_return_type: Box<Type>,
    is_fallible: bool,
}

fn parse_signature(func: &ItemFn) -> syn::Result<ParsedSignature> {
    check_generics(&func.sig.generics)?;
    if let Some(asyncness) = &func.sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "[shellbridge] async functions are not supported",
        ));
    }
    let (ok_return_type, is_fallible) = match &func.sig.output {
        ReturnType::Default => (Box::new(syn::parse_quote!(())), false),
        ReturnType::Type(_, ty) => match extract_result_ok_type(ty) {
            Some(ok_type) => (ok_type, true),
            None => (ty.clone(), false),
        },
    };
    Ok(ParsedSignature {
        fn_name: func.sig.ident.clone(),
        params: parse_params(&func.sig)?,
        ok_return_type,
        is_fallible,
    })
}

fn check_generics(generics: &syn::Generics) -> syn::Result<()> {
    match generics.params.first() {
        None => Ok(()),
        Some(GenericParam::Lifetime(param)) => Err(syn::Error::new_spanned(
            param,
            "[shellbridge] parameters must be owned values; lifetimes are not supported",
        )),
        Some(param) => Err(syn::Error::new_spanned(
            param,
            "[shellbridge] generic parameters are not supported",
        )),
    }
}

/// Check if a type is `Result<T, E>` and extract the Ok type `T`.
fn extract_result_ok_type(ty: &Type) -> Option<Box<Type>> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let last_segment = type_path.path.segments.last()?;
    if last_segment.ident != "Result" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &last_segment.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(ok_type)) => Some(Box::new(ok_type.clone())),
        _ => None,
    }
}

fn parse_params(sig: &syn::Signature) -> syn::Result<Vec<(Ident, Box<Type>)>> {
    sig.inputs
        .iter()
        .map(|input| {
            let FnArg::Typed(PatType { pat, ty, .. }) = input else {
                return Err(syn::Error::new_spanned(
                    input,
                    "[shellbridge] normal typed argument expected (name: type)",
                ));
            };
            let Pat::Ident(pat_ident) = &**pat else {
                return Err(syn::Error::new_spanned(
                    pat,
                    "[shellbridge] no pattern matching supported in bridge functions",
                ));
            };
            if let Type::Reference(reference) = &**ty {
                return Err(syn::Error::new_spanned(
                    reference,
                    "[shellbridge] parameters must be owned values",
                ));
            }
            Ok((pat_ident.ident.clone(), ty.clone()))
        })
        .collect()
}

/// Generate the output: original function + wrapper struct + trait impl.
fn generate_output(input_fn: &ItemFn, name: &Ident, sig: &ParsedSignature) -> TokenStream2 {
    let struct_name = struct_name(name);
    let name_str = name.to_string();
    let fn_name = &sig.fn_name;
    let vis = &input_fn.vis;

    let param_names: Vec<_> = sig.params.iter().map(|(name, _)| name).collect();
    let param_strs: Vec<_> = param_names.iter().map(|name| name.to_string()).collect();
    let param_types: Vec<_> = sig.params.iter().map(|(_, ty)| ty).collect();
    let param_indices: Vec<_> = (0..sig.params.len()).collect();
    let ok_ty = &sig.ok_return_type;

    let result_handling = if sig.is_fallible {
        quote! {
            let __result = __result.map_err(::core::convert::Into::<::shellbridge_core::Error>::into)?;
        }
    } else {
        quote! {}
    };

    quote! {
        #input_fn

        #vis struct #struct_name {
            __signature: ::shellbridge_core::bridge::Signature,
        }

        impl #struct_name {
            pub fn new() -> Self {
                use ::shellbridge_core::values::Bridge;
                Self {
                    __signature: ::shellbridge_core::bridge::Signature::from_iter([
                        #( ::shellbridge_core::bridge::Param::typed(#param_strs, <#param_types as Bridge>::VALUE_TYPE) ),*
                    ]),
                }
            }

            pub fn into_value(self) -> ::shellbridge_core::Value {
                ::shellbridge_core::Value::function(self)
            }
        }

        impl ::core::default::Default for #struct_name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl ::shellbridge_core::bridge::FunctionBase for #struct_name {
            fn name(&self) -> &str {
                #name_str
            }

            fn signature(&self) -> &[::shellbridge_core::bridge::Param] {
                &self.__signature
            }

            fn return_type(&self) -> ::core::option::Option<::shellbridge_core::ValueType> {
                <#ok_ty as ::shellbridge_core::values::Bridge>::VALUE_TYPE
            }

            fn invoke(
                &self,
                __args: &[::shellbridge_core::Value],
            ) -> ::shellbridge_core::Result<::shellbridge_core::Value> {
                use ::shellbridge_core::values::Bridge;
                let __args = ::shellbridge_core::bridge::validate_args(
                    #name_str,
                    &self.__signature,
                    __args,
                    false,
                )?;
                #(
                    let #param_names = <#param_types as Bridge>::from_value(&__args[#param_indices])?;
                )*
                let __result = #fn_name(#(#param_names),*);
                #result_handling
                Ok(<#ok_ty as Bridge>::into_value(__result))
            }
        }
    }
}
