// Copyright (c) The Libra Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! `#[derive(CryptoHash)]` generates a `CryptoHash` implementation that
//! hashes a value's canonical LCS encoding under a domain separator tied
//! to the type's name, so that e.g. a `Block` and a `Transaction` that
//! happen to LCS-encode to the same bytes never collide on the same hash.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

#[proc_macro_derive(CryptoHash)]
pub fn crypto_hash_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let domain_separator = format!("blockcore::{}", name);

    let expanded = quote! {
        impl #impl_generics bc_crypto::hash::CryptoHash for #name #ty_generics #where_clause {
            fn hash(&self) -> bc_crypto::hash::HashValue {
                let mut preimage = #domain_separator.as_bytes().to_vec();
                preimage.extend(
                    bc_lcs::to_bytes(self).expect("LCS encoding of a hashable type never fails"),
                );
                bc_crypto::hash::HashValue::sha3_256_of(&preimage)
            }
        }
    };
    TokenStream::from(expanded)
}
