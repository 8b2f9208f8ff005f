// Copyright (C) Microsoft Corporation. All rights reserved.

//! `#[test]` replacement used through `test_with_tracing::test`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ItemFn;
use syn::parse_macro_input;

/// Wraps a test function so that it installs the shared tracing subscriber
/// and runs inside a span named after the test.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr = TokenStream2::from(attr);
    let item = parse_macro_input!(item as ItemFn);
    make_test(attr, item)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn make_test(attr: TokenStream2, item: ItemFn) -> syn::Result<TokenStream2> {
    if !attr.is_empty() {
        return Err(syn::Error::new_spanned(
            attr,
            "test_with_tracing::test takes no arguments",
        ));
    }
    if let Some(asyncness) = &item.sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "async tests are not supported",
        ));
    }

    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = item;
    let name = sig.ident.to_string();

    Ok(quote! {
        #[::core::prelude::v1::test]
        #(#attrs)*
        #vis #sig {
            ::test_with_tracing::init();
            let _span = ::test_with_tracing::tracing::info_span!(#name).entered();
            #block
        }
    })
}
