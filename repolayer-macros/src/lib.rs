//! Procedural macros for the repolayer project.
//!
//! This crate provides compile-time code generation for the repolayer
//! framework, currently the `#[derive(Model)]` macro implementing the
//! model capability contract from a `#[model(...)]` attribute.

#[allow(unused_extern_crates)]
extern crate self as repolayer_macros;

use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, LitStr, parse_macro_input};

/// Derives the `Model` capability contract.
///
/// Requires a `#[model(...)]` attribute naming the logical database and
/// collection the type lives in:
///
/// ```ignore
/// use repolayer::prelude::*;
/// use bson::oid::ObjectId;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize, Model)]
/// #[model(database = "app", collection = "users")]
/// pub struct User {
///     #[serde(rename = "_id")]
///     pub id: ObjectId,
///     pub name: String,
/// }
/// ```
///
/// The generated impl refers to the `repolayer` facade crate, which must
/// be in scope under that name.
#[proc_macro_derive(Model, attributes(model))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let mut database: Option<LitStr> = None;
    let mut collection: Option<LitStr> = None;

    for attr in &input.attrs {
        if !attr.path().is_ident("model") {
            continue;
        }

        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("database") {
                database = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("collection") {
                collection = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `database` or `collection`"))
            }
        });

        if let Err(err) = parsed {
            return err.to_compile_error().into();
        }
    }

    let ident = &input.ident;

    let (Some(database), Some(collection)) = (database, collection) else {
        return syn::Error::new_spanned(
            ident,
            "#[derive(Model)] requires #[model(database = \"...\", collection = \"...\")]",
        )
        .to_compile_error()
        .into();
    };

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    quote! {
        impl #impl_generics ::repolayer::model::Model for #ident #ty_generics #where_clause {
            fn database_name() -> &'static str {
                #database
            }

            fn collection_name() -> &'static str {
                #collection
            }
        }
    }
    .into()
}
